//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, UserID, account_group::AccountGroupId};

/// The ID of a transaction in the database.
pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl TransactionType {
    /// Parse the lower case name of a transaction type.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// The lower case name of the transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// The description used when a transaction is created without one.
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;

        Self::parse(raw).ok_or_else(|| FromSqlError::Other(format!("invalid type {raw}").into()))
    }
}

/// An expense or income recorded against an account group.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user who recorded the transaction.
    pub user_id: UserID,
    /// The account group the transaction is shared with.
    pub account_group_id: AccountGroupId,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened, in UTC.
    pub date: OffsetDateTime,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: f64,
        date: OffsetDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            amount,
            date,
            description: None,
        }
    }

    /// The JSON representation of the transaction sent to clients.
    pub fn view(&self) -> TransactionView {
        TransactionView {
            id: self.id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            description: self.description.clone(),
            date: self.date,
        }
    }
}

/// The fields of a transaction that are sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// A builder for creating [Transaction] instances.
///
/// ```ignore
/// use time::macros::datetime;
///
/// let transaction = create_transaction(
///     Transaction::build(TransactionType::Expense, 45.99, datetime!(2025-01-15 0:00 UTC))
///         .description("Coffee"),
///     user.id,
///     account_group_id,
///     &connection,
/// )?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,

    /// The monetary amount of the transaction, which must be positive.
    pub amount: f64,

    /// When the transaction occurred.
    pub date: OffsetDateTime,

    /// A human-readable description of the transaction.
    ///
    /// A missing or empty description is replaced with
    /// [TransactionType::default_description].
    pub description: Option<String>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(super) const TRANSACTION_COLUMNS: &str = "id, user_id, account_group_id, type, amount, description, date, created_at, updated_at";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return an [Error::SqlError] if `user_id` or
/// `account_group_id` do not exist, or there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    account_group_id: AccountGroupId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let description = builder
        .description
        .filter(|description| !description.is_empty())
        .unwrap_or_else(|| builder.transaction_type.default_description().to_owned());
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, account_group_id, type, amount, description, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                account_group_id,
                builder.transaction_type,
                builder.amount,
                description,
                builder.date,
                now,
            ),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(Error::from)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id),
                account_group_id INTEGER NOT NULL REFERENCES account_group(id),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                amount REAL NOT NULL CHECK (amount > 0),
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    // Listing and the monthly totals filter by group and date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_group_date ON \"transaction\"(account_group_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must have the columns in [TRANSACTION_COLUMNS] order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let account_group_id = row.get(2)?;
    let transaction_type = row.get(3)?;
    let amount = row.get(4)?;
    let description = row.get(5)?;
    let date = row.get(6)?;
    let created_at = row.get(7)?;
    let updated_at = row.get(8)?;

    Ok(Transaction {
        id,
        user_id: UserID::new(user_id),
        account_group_id,
        transaction_type,
        amount,
        description,
        date,
        created_at,
        updated_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================
