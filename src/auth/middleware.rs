//! Authentication middleware that checks bearer tokens on protected routes.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use rusqlite::Connection;

use crate::{
    AppState, Error, User,
    auth::{JwtKeys, decode_token},
    db::lock_connection,
    user::get_user_by_id,
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys used to verify bearer tokens.
    pub jwt_keys: JwtKeys,
    /// The connection used to look up the token's user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// If the token is valid, the user it was issued to is placed into the
/// request and the request is executed normally. Otherwise a 401 response
/// is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<User>` to receive the user.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<User, Error> {
    let Authorization(bearer) = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(Error::MissingToken)?;
    let claims = decode_token(bearer.token(), &state.jwt_keys)?;

    let connection = lock_connection(&state.db_connection)?;

    match get_user_by_id(claims.sub, &connection) {
        Ok(user) => Ok(user),
        Err(Error::NotFound) => {
            tracing::debug!("bearer token refers to unknown user {}", claims.sub);
            Err(Error::InvalidToken)
        }
        Err(error) => Err(error),
    }
}
