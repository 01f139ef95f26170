use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    Error, User,
    account_group::resolve_account_group,
    amount::round_to_cents,
    asset::{
        AssetState,
        core::{AssetView, get_assets, get_total_asset_amount},
    },
    db::lock_connection,
};

/// A route handler for listing the caller's assets with their total value.
pub async fn get_assets_endpoint(
    State(state): State<AssetState>,
    Extension(user): Extension<User>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;
    let assets = get_assets(account_group_id, &connection)?;
    let total = get_total_asset_amount(account_group_id, &connection)?;

    Ok(Json(json!({
        "success": true,
        "assets": assets.iter().map(|asset| asset.view()).collect::<Vec<AssetView>>(),
        "total": round_to_cents(total),
    }))
    .into_response())
}
