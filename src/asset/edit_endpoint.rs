//! Defines the endpoint for updating an asset.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Error, User,
    account_group::resolve_account_group,
    amount::validate_amount,
    asset::{
        AssetState,
        core::{AssetId, AssetUpdate, update_asset, validate_asset_name},
    },
    db::lock_connection,
    extract::{ApiJson, ApiPath},
};

/// The request body for updating an asset. Missing fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EditAssetData {
    pub name: Option<String>,
    pub amount: Option<Value>,
}

impl EditAssetData {
    fn validate(self) -> Result<AssetUpdate, Error> {
        let name = match self.name {
            Some(name) => Some(validate_asset_name(Some(&name))?),
            None => None,
        };
        let amount = match self.amount {
            Some(amount) => Some(validate_amount(amount.as_f64())?),
            None => None,
        };

        Ok(AssetUpdate { name, amount })
    }
}

/// A route handler for renaming or revaluing an asset of the caller's account group.
///
/// # Errors
/// Returns [Error::AssetNotFound] if the asset does not exist or belongs to
/// another account group, or a 400 error if a given field is invalid.
pub async fn edit_asset_endpoint(
    State(state): State<AssetState>,
    Extension(user): Extension<User>,
    ApiPath(raw_asset_id): ApiPath<String>,
    ApiJson(data): ApiJson<EditAssetData>,
) -> Result<Response, Error> {
    let asset_id: AssetId = raw_asset_id.parse().map_err(|_| Error::AssetNotFound)?;
    let update = data.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;
    let asset = update_asset(asset_id, account_group_id, update, &connection)?
        .ok_or(Error::AssetNotFound)?;

    Ok(Json(json!({
        "success": true,
        "asset": asset.view(),
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        Error,
        asset::{core::AssetUpdate, edit_endpoint::EditAssetData},
    };

    fn validate(data: serde_json::Value) -> Result<AssetUpdate, Error> {
        serde_json::from_value::<EditAssetData>(data).unwrap().validate()
    }

    #[test]
    fn empty_update_is_valid() {
        assert_eq!(validate(json!({})), Ok(AssetUpdate::default()));
    }

    #[test]
    fn trims_name() {
        assert_eq!(
            validate(json!({"name": " Car ", "amount": 5000})),
            Ok(AssetUpdate {
                name: Some("Car".to_owned()),
                amount: Some(5000.0),
            })
        );
    }

    #[test]
    fn rejects_invalid_fields() {
        assert_eq!(validate(json!({"name": ""})), Err(Error::EmptyAssetName));
        assert_eq!(validate(json!({"amount": -1})), Err(Error::InvalidAmount));
        assert_eq!(validate(json!({"amount": "5"})), Err(Error::InvalidAmount));
    }
}
