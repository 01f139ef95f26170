use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    Error, User,
    account_group::{AccountGroupId, resolve_account_group},
    db::lock_connection,
    extract::ApiPath,
    transaction::{TransactionId, TransactionState},
};

/// A route handler for deleting a transaction of the caller's account group.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if the transaction does not exist or
/// belongs to another account group.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    ApiPath(raw_transaction_id): ApiPath<String>,
) -> Result<Response, Error> {
    let transaction_id: TransactionId = raw_transaction_id
        .parse()
        .map_err(|_| Error::TransactionNotFound)?;

    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;

    match delete_transaction(transaction_id, account_group_id, &connection)? {
        0 => Err(Error::TransactionNotFound),
        _ => Ok(Json(json!({
            "success": true,
            "message": "Transaction deleted",
        }))
        .into_response()),
    }
}

type RowsAffected = usize;

fn delete_transaction(
    id: TransactionId,
    account_group_id: AccountGroupId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND account_group_id = ?2",
            (id, account_group_id),
        )
        .map_err(|err| err.into())
}
