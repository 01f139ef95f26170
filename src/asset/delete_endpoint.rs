use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    Error, User,
    account_group::resolve_account_group,
    asset::{
        AssetState,
        core::{AssetId, delete_asset},
    },
    db::lock_connection,
    extract::ApiPath,
};

/// A route handler for deleting an asset of the caller's account group.
///
/// # Errors
/// Returns [Error::AssetNotFound] if the asset does not exist or belongs to
/// another account group.
pub async fn delete_asset_endpoint(
    State(state): State<AssetState>,
    Extension(user): Extension<User>,
    ApiPath(raw_asset_id): ApiPath<String>,
) -> Result<Response, Error> {
    let asset_id: AssetId = raw_asset_id.parse().map_err(|_| Error::AssetNotFound)?;

    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;

    match delete_asset(asset_id, account_group_id, &connection)? {
        0 => Err(Error::AssetNotFound),
        _ => Ok(Json(json!({
            "success": true,
            "message": "Asset deleted",
        }))
        .into_response()),
    }
}
