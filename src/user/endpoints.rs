//! Route handlers for reading user details.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    db::lock_connection,
    extract::ApiPath,
    user::{User, UserCode, find_user_by_code},
};

/// The state needed to look up users.
#[derive(Debug, Clone)]
pub struct UserState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the details of the authenticated user.
pub async fn get_current_user(Extension(user): Extension<User>) -> Response {
    Json(json!({
        "success": true,
        "user": user.view(),
    }))
    .into_response()
}

/// Check whether a user code exists, e.g. to validate an invitation code
/// before registering. This route does not require authentication.
pub async fn get_user_by_code_endpoint(
    State(state): State<UserState>,
    ApiPath(raw_code): ApiPath<String>,
) -> Result<Response, Error> {
    let Some(user_code) = UserCode::parse(&raw_code) else {
        return Ok(Json(json!({"success": true, "exists": false})).into_response());
    };

    let connection = lock_connection(&state.db_connection)?;

    let response = match find_user_by_code(&user_code, &connection)? {
        Some(user) => json!({
            "success": true,
            "exists": true,
            "user": user.summary_view(),
        }),
        None => json!({"success": true, "exists": false}),
    };

    Ok(Json(response).into_response())
}
