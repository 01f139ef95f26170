//! Defines the endpoint for creating a new asset.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::{
    Error, User,
    account_group::resolve_account_group,
    amount::validate_amount,
    asset::{
        AssetState,
        core::{NewAsset, create_asset, validate_asset_name},
    },
    date::parse_client_date,
    db::lock_connection,
    extract::ApiJson,
};

/// The request body for creating an asset.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AssetData {
    pub name: Option<String>,
    /// The value of the asset, which must be a positive number.
    pub amount: Option<Value>,
    /// An RFC 3339 timestamp or a plain date. Defaults to now.
    pub date: Option<String>,
}

/// A route handler for creating a new asset in the caller's account group.
///
/// # Errors
/// Returns a 400 error if the name, amount or date is invalid.
pub async fn create_asset_endpoint(
    State(state): State<AssetState>,
    Extension(user): Extension<User>,
    ApiJson(data): ApiJson<AssetData>,
) -> Result<Response, Error> {
    let name = validate_asset_name(data.name.as_deref())?;
    let amount = validate_amount(data.amount.as_ref().and_then(Value::as_f64))?;
    let date = match data.date.as_deref() {
        Some(raw_date) if !raw_date.is_empty() => parse_client_date(raw_date)?,
        _ => OffsetDateTime::now_utc(),
    };

    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;
    let asset = create_asset(
        NewAsset { name, amount, date },
        user.id,
        account_group_id,
        &connection,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "asset": asset.view(),
        })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::{Extension, extract::State, http::StatusCode, response::Response};
    use serde_json::{Value, json};

    use crate::{
        Error,
        asset::{AssetState, create_asset_endpoint, create_endpoint::AssetData},
        extract::ApiJson,
        test_utils::{get_test_state, insert_test_user},
    };

    async fn create(data: Value) -> Result<Response, Error> {
        let app_state = get_test_state();
        let (user, _) = insert_test_user(&app_state, "foo@bar.baz", "ABC123", None);
        let state = AssetState {
            db_connection: app_state.db_connection.clone(),
        };
        let data: AssetData = serde_json::from_value(data).unwrap();

        create_asset_endpoint(State(state), Extension(user), ApiJson(data)).await
    }

    #[tokio::test]
    async fn can_create_asset() {
        let response = create(json!({"name": " Savings ", "amount": 100.5})).await;

        assert_eq!(response.unwrap().status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let response = create(json!({"name": "   ", "amount": 100.5})).await;

        assert_eq!(response.unwrap_err(), Error::EmptyAssetName);
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let response = create(json!({"name": "Savings", "amount": 0})).await;

        assert_eq!(response.unwrap_err(), Error::InvalidAmount);
    }
}
