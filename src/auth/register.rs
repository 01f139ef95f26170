//! The route for registering new users, optionally into an inviter's account group.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error, PasswordHash, User, UserCode, ValidatedPassword,
    account_group::resolve_account_group_in_transaction,
    auth::{JwtKeys, encode_token},
    db::{begin_immediate, lock_connection},
    extract::ApiJson,
    user::{NewUser, create_user, find_user_by_code, generate_unique_user_code, get_user_by_email},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub jwt_keys: JwtKeys,
    pub token_duration: Duration,
    /// The bcrypt cost used to hash the new user's password.
    pub password_hash_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// The user code of an existing user whose account group to join.
    #[serde(default)]
    pub invitation_code: Option<String>,
}

/// Create a user, place them in an account group and return a bearer token.
///
/// # Errors
///
/// Returns a 400 error if the email or password is missing, the password is
/// too short, the email is taken, or the invitation code is malformed or
/// does not belong to a user. Any other error is an internal error.
pub async fn register_user(
    State(state): State<RegistrationState>,
    ApiJson(user_data): ApiJson<RegisterData>,
) -> Result<Response, Error> {
    if user_data.email.trim().is_empty() || user_data.password.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let validated_password = ValidatedPassword::new(&user_data.password)?;

    let invited_by_code = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_email(&user_data.email, &connection) {
            Ok(_) => return Err(Error::DuplicateEmail),
            Err(Error::NotFound) => {}
            Err(error) => return Err(error),
        }

        let invited_by_code = user_data
            .invitation_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .map(|code| UserCode::parse(code).ok_or(Error::InvalidInvitationCodeFormat))
            .transpose()?;

        if let Some(code) = &invited_by_code {
            if find_user_by_code(code, &connection)?.is_none() {
                return Err(Error::UnknownInvitationCode);
            }
        }

        invited_by_code
    };

    let password_hash = PasswordHash::new(validated_password, state.password_hash_cost)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        let transaction = begin_immediate(&connection)?;

        let user_code = generate_unique_user_code(&transaction)?;
        let user = create_user(
            NewUser {
                email: user_data.email,
                password_hash,
                user_code,
                invited_by_code,
            },
            &transaction,
        )?;
        let account_group_id = resolve_account_group_in_transaction(user.id, &transaction)?;

        transaction.commit()?;

        User {
            account_group_id: Some(account_group_id),
            ..user
        }
    };

    tracing::info!(
        "Registered user {} with code {} in account group {:?}",
        user.id,
        user.user_code,
        user.account_group_id
    );

    let token = encode_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.jwt_keys,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": user.view(),
            "token": token,
        })),
    )
        .into_response())
}
