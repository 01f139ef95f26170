//! This file defines the route for handling log-in requests.
//! The auth module handles the lower level password and token logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{JwtKeys, encode_token},
    db::lock_connection,
    extract::ApiJson,
    user::get_user_by_email,
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The keys used to sign bearer tokens.
    pub jwt_keys: JwtKeys,
    /// The duration for which issued tokens are valid.
    pub token_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials sent in a log-in request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogInData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the user and a new bearer token are returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing, the email is not registered or the
///   password is not correct. These all produce [Error::InvalidCredentials].
/// - An internal error occurred when verifying the password or signing the token.
pub async fn post_log_in(
    State(state): State<LoginState>,
    ApiJson(log_in_data): ApiJson<LogInData>,
) -> Result<Response, Error> {
    if log_in_data.email.trim().is_empty() || log_in_data.password.is_empty() {
        return Err(Error::InvalidCredentials);
    }

    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_email(&log_in_data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&log_in_data.password)
        .map_err(|error| {
            tracing::error!("Error verifying password for user {}: {error}", user.id);
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.jwt_keys,
    )?;

    Ok(Json(json!({
        "success": true,
        "user": user.summary_view(),
        "token": token,
    }))
    .into_response())
}
