//! Defines the endpoints for listing transactions and their monthly totals.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    Error, User,
    account_group::resolve_account_group,
    date::DateWindow,
    db::lock_connection,
    extract::ApiQuery,
    transaction::{
        TransactionState, TransactionView,
        query::{TransactionFilter, get_transactions},
        stats::get_monthly_stats,
    },
};

/// The query parameters for listing transactions.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionListQuery {
    pub year: Option<i32>,
    /// The zero-based month, 0 = January.
    pub month: Option<i32>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

/// A route handler for listing the transactions of the caller's account group.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> Result<Response, Error> {
    let filter = TransactionFilter::from_query(
        query.year,
        query.month,
        query.transaction_type.as_deref(),
        OffsetDateTime::now_utc(),
    )?;

    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;
    let transactions = get_transactions(account_group_id, &filter, &connection)?;

    Ok(Json(json!({
        "success": true,
        "transactions": transactions
            .iter()
            .map(|transaction| transaction.view())
            .collect::<Vec<TransactionView>>(),
    }))
    .into_response())
}

/// The query parameters for the monthly totals.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StatsQuery {
    pub year: Option<i32>,
    /// The zero-based month, 0 = January.
    pub month: Option<i32>,
}

/// A route handler for the income and expense totals of one month.
///
/// # Errors
/// Returns a 400 error if the year or month is missing, or the month is
/// outside 0-11.
pub async fn get_transaction_stats_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Response, Error> {
    let (Some(year), Some(month)) = (query.year, query.month) else {
        return Err(Error::MissingStatsPeriod);
    };
    let window = DateWindow::month(year, month)?;

    let connection = lock_connection(&state.db_connection)?;
    let account_group_id = resolve_account_group(user.id, &connection)?;
    let stats = get_monthly_stats(account_group_id, window, &connection)?;

    Ok(Json(json!({
        "success": true,
        "stats": stats,
    }))
    .into_response())
}
