use axum::{Extension, Json};
use serde_json::{Value, json};

use crate::User;

/// Confirm that the bearer token is valid and return the user it belongs to.
///
/// The token itself is checked by [crate::auth::auth_guard].
pub async fn get_verify(Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": user.summary_view(),
    }))
}
