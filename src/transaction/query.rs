//! Database queries for listing an account group's transactions.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{Error, account_group::AccountGroupId, date::DateWindow};

use super::core::{TRANSACTION_COLUMNS, Transaction, TransactionType, map_transaction_row};

/// Restrictions on the transactions returned by [get_transactions].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions dated inside this window.
    pub window: Option<DateWindow>,
    /// Only include transactions of this type.
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    /// Build a filter from the raw query parameters of the list endpoint.
    ///
    /// A valid zero-based `month` selects that month of `year`, or of the
    /// year of `now` if `year` is missing. Otherwise `year` selects the whole
    /// year. A `month` outside 0-11 and an unrecognised `raw_type` are
    /// ignored.
    ///
    /// # Errors
    /// Returns [Error::InvalidYear] if the window cannot be represented.
    pub fn from_query(
        year: Option<i32>,
        month: Option<i32>,
        raw_type: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Self, Error> {
        let month = month.filter(|month| (0..12).contains(month));

        let window = match (year, month) {
            (year, Some(month)) => Some(DateWindow::month(year.unwrap_or(now.year()), month)?),
            (Some(year), None) => Some(DateWindow::year(year)?),
            (None, None) => None,
        };

        Ok(Self {
            window,
            transaction_type: raw_type.and_then(TransactionType::parse),
        })
    }
}

/// Get the transactions of `account_group_id` that match `filter`.
///
/// Transactions are sorted newest first by date, then by when they were
/// recorded and then by ID so that the order is stable.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn get_transactions(
    account_group_id: AccountGroupId,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" \
        WHERE account_group_id = ?1 \
        AND (?2 IS NULL OR date >= ?2) \
        AND (?3 IS NULL OR date < ?3) \
        AND (?4 IS NULL OR type = ?4) \
        ORDER BY date DESC, created_at DESC, id DESC"
    );

    connection
        .prepare(&query)?
        .query_map(
            (
                account_group_id,
                filter.window.map(|window| window.start),
                filter.window.map(|window| window.end),
                filter.transaction_type,
            ),
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}
