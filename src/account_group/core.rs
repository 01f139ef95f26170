//! The account group table and its queries.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{Error, UserCode, UserID};

/// The database ID of an account group.
pub type AccountGroupId = i64;

/// A set of users that share one ledger of transactions and assets.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountGroup {
    /// The id for the account group.
    pub id: AccountGroupId,
    /// The code of the user the group was created for.
    pub group_code: UserCode,
    /// The user the group was created for.
    pub created_by: UserID,
    /// When the group was created.
    pub created_at: OffsetDateTime,
}

pub fn create_account_group_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_group (
            id INTEGER PRIMARY KEY,
            group_code TEXT NOT NULL UNIQUE,
            created_by INTEGER NOT NULL REFERENCES user(id),
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_account_group(row: &Row) -> Result<AccountGroup, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_group_code: String = row.get(1)?;
    let created_by = row.get(2)?;
    let created_at = row.get(3)?;

    Ok(AccountGroup {
        id,
        group_code: UserCode::new_unchecked(&raw_group_code),
        created_by: UserID::new(created_by),
        created_at,
    })
}

/// Create a new account group.
///
/// # Errors
/// Returns [Error::SqlError] if `group_code` is already used by another group,
/// `created_by` is not a user, or there is some other SQL error.
#[cfg(test)]
pub fn create_account_group(
    group_code: &UserCode,
    created_by: UserID,
    connection: &Connection,
) -> Result<AccountGroup, Error> {
    connection
        .prepare(
            "INSERT INTO account_group (group_code, created_by, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id, group_code, created_by, created_at",
        )?
        .query_row(
            (
                group_code.as_str(),
                created_by.as_i64(),
                OffsetDateTime::now_utc(),
            ),
            map_row_to_account_group,
        )
        .map_err(Error::from)
}

/// Get the account group with the code `group_code`, creating it for
/// `created_by` if there is no such group.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_or_create_account_group(
    group_code: &UserCode,
    created_by: UserID,
    connection: &Connection,
) -> Result<AccountGroup, Error> {
    let inserted_rows = connection.execute(
        "INSERT INTO account_group (group_code, created_by, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(group_code) DO NOTHING",
        (
            group_code.as_str(),
            created_by.as_i64(),
            OffsetDateTime::now_utc(),
        ),
    )?;

    if inserted_rows > 0 {
        tracing::info!("Created account group {group_code} for user {created_by}");
    }

    connection
        .prepare(
            "SELECT id, group_code, created_by, created_at FROM account_group
             WHERE group_code = :group_code",
        )?
        .query_row(&[(":group_code", group_code.as_str())], map_row_to_account_group)
        .map_err(Error::from)
}

/// Get an account group by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such group, or [Error::SqlError]
/// if there is some other SQL error.
#[cfg(test)]
pub fn get_account_group(
    id: AccountGroupId,
    connection: &Connection,
) -> Result<AccountGroup, Error> {
    connection
        .prepare(
            "SELECT id, group_code, created_by, created_at FROM account_group WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_row_to_account_group)
        .map_err(Error::from)
}
