//! Defines the endpoint for creating a new transaction.

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
    date::parse_client_date,
    db::lock_connection,
    extract::ApiJson,
    transaction::{Transaction, TransactionState, TransactionType, core::create_transaction},
};

/// The request body for creating a transaction.
///
/// Fields are loosely typed so that wrong values are reported with the same
/// messages as missing ones.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionData {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The value of the transaction, which must be a positive number.
    pub amount: Option<Value>,
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// An RFC 3339 timestamp or a plain date. Defaults to now.
    pub date: Option<String>,
}

/// A route handler for creating a new transaction in the caller's account group.
///
/// # Errors
/// Returns a 400 error if the type, amount or date is invalid.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    ApiJson(data): ApiJson<TransactionData>,
) -> Result<Response, Error> {
    let transaction_type = data
        .transaction_type
        .as_deref()
        .and_then(TransactionType::parse)
        .ok_or(Error::InvalidTransactionType)?;
    let amount = validate_amount(data.amount.as_ref().and_then(Value::as_f64))?;
    let date = match data.date.as_deref() {
        Some(raw_date) if !raw_date.is_empty() => parse_client_date(raw_date)?,
        _ => OffsetDateTime::now_utc(),
    };

    let mut builder = Transaction::build(transaction_type, amount, date);
    if let Some(description) = &data.description {
        builder = builder.description(description);
    }

    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;
    let transaction = create_transaction(builder, user.id, account_group_id, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "transaction": transaction.view(),
        })),
    )
        .into_response())
}
