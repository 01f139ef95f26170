//! Monthly income and expense totals.

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, account_group::AccountGroupId, amount::round_to_cents, date::DateWindow};

/// The income and expense totals of an account group for one month.
///
/// All values are rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub income: f64,
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// Income as a percentage of income plus expenses, or 0 with no transactions.
    pub income_percentage: f64,
    /// Expenses as a percentage of income plus expenses, or 0 with no transactions.
    pub expense_percentage: f64,
}

impl MonthlyStats {
    /// Derive the balance and percentages from the raw sums.
    ///
    /// The expense percentage is taken as the remainder of the rounded
    /// income percentage so that the two always add up to 100.
    pub fn from_totals(income: f64, expenses: f64) -> Self {
        let total = income + expenses;
        let (income_percentage, expense_percentage) = if total > 0.0 {
            let income_percentage = round_to_cents(income / total * 100.0);
            (income_percentage, round_to_cents(100.0 - income_percentage))
        } else {
            (0.0, 0.0)
        };

        Self {
            income: round_to_cents(income),
            expenses: round_to_cents(expenses),
            balance: round_to_cents(income - expenses),
            income_percentage,
            expense_percentage,
        }
    }
}

/// Sum the income and expenses of `account_group_id` dated inside `window`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_monthly_stats(
    account_group_id: AccountGroupId,
    window: DateWindow,
    connection: &Connection,
) -> Result<MonthlyStats, Error> {
    let (income, expenses) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0.0),
            COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0.0)
         FROM \"transaction\"
         WHERE account_group_id = ?1 AND date >= ?2 AND date < ?3",
        (account_group_id, window.start, window.end),
        |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
    )?;

    Ok(MonthlyStats::from_totals(income, expenses))
}
