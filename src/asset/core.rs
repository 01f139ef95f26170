use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, UserID, account_group::AccountGroupId};

pub type AssetId = i64;

/// Something of value owned by an account group, e.g. savings or a car.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// The id for the asset.
    pub id: AssetId,
    /// The user who recorded the asset.
    pub user_id: UserID,
    /// The account group the asset is shared with.
    pub account_group_id: AccountGroupId,
    /// The name of the asset, trimmed and non-empty.
    pub name: String,
    /// The value of the asset, always positive.
    pub amount: f64,
    /// When the asset was valued.
    pub date: OffsetDateTime,
    /// When the asset was recorded.
    pub created_at: OffsetDateTime,
    /// When the asset was last changed.
    pub updated_at: OffsetDateTime,
}

impl Asset {
    /// The fields of the asset that are sent to clients.
    pub fn view(&self) -> AssetView {
        AssetView {
            id: self.id,
            name: self.name.clone(),
            amount: self.amount,
            date: self.date,
        }
    }
}

/// The JSON representation of an asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetView {
    pub id: AssetId,
    pub name: String,
    pub amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// The validated fields of a new asset.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub name: String,
    pub amount: f64,
    pub date: OffsetDateTime,
}

/// Changes to an asset. Fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub amount: Option<f64>,
}

/// Trim an asset name and check that it is not empty.
///
/// # Errors
/// Returns [Error::EmptyAssetName] if `name` is missing or only whitespace.
pub fn validate_asset_name(name: Option<&str>) -> Result<String, Error> {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or(Error::EmptyAssetName)
}

pub fn create_asset_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS asset (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id),
            account_group_id INTEGER NOT NULL REFERENCES account_group(id),
            name TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_asset_group_date ON asset(account_group_id, date);",
        (),
    )?;

    Ok(())
}

const ASSET_COLUMNS: &str =
    "id, user_id, account_group_id, name, amount, date, created_at, updated_at";

pub fn map_row_to_asset(row: &Row) -> Result<Asset, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let account_group_id = row.get(2)?;
    let name = row.get(3)?;
    let amount = row.get(4)?;
    let date = row.get(5)?;
    let created_at = row.get(6)?;
    let updated_at = row.get(7)?;

    Ok(Asset {
        id,
        user_id: UserID::new(user_id),
        account_group_id,
        name,
        amount,
        date,
        created_at,
        updated_at,
    })
}

/// Insert a new asset for `account_group_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the user or group does not exist, or there is
/// some other SQL error.
pub fn create_asset(
    new_asset: NewAsset,
    user_id: UserID,
    account_group_id: AccountGroupId,
    connection: &Connection,
) -> Result<Asset, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO asset (user_id, account_group_id, name, amount, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {ASSET_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                account_group_id,
                new_asset.name,
                new_asset.amount,
                new_asset.date,
                now,
            ),
            map_row_to_asset,
        )
        .map_err(Error::from)
}

/// Get the assets of `account_group_id`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_assets(
    account_group_id: AccountGroupId,
    connection: &Connection,
) -> Result<Vec<Asset>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM asset WHERE account_group_id = ?1
             ORDER BY date DESC, created_at DESC, id DESC"
        ))?
        .query_map([account_group_id], map_row_to_asset)?
        .map(|asset_result| asset_result.map_err(Error::from))
        .collect()
}

/// Get the total value of the assets of `account_group_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_total_asset_amount(
    account_group_id: AccountGroupId,
    connection: &Connection,
) -> Result<f64, Error> {
    let mut stmt = connection
        .prepare("SELECT COALESCE(SUM(amount), 0.0) FROM asset WHERE account_group_id = ?1")?;

    let total: f64 = stmt.query_row([account_group_id], |row| row.get(0))?;

    Ok(total)
}

/// Apply `update` to the asset `id` if it belongs to `account_group_id`.
///
/// Returns `None` if there is no such asset in the group.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn update_asset(
    id: AssetId,
    account_group_id: AccountGroupId,
    update: AssetUpdate,
    connection: &Connection,
) -> Result<Option<Asset>, Error> {
    connection
        .prepare(&format!(
            "UPDATE asset
             SET name = COALESCE(?3, name),
                 amount = COALESCE(?4, amount),
                 updated_at = ?5
             WHERE id = ?1 AND account_group_id = ?2
             RETURNING {ASSET_COLUMNS}"
        ))?
        .query_row(
            (
                id,
                account_group_id,
                update.name,
                update.amount,
                OffsetDateTime::now_utc(),
            ),
            map_row_to_asset,
        )
        .optional()
        .map_err(Error::from)
}

type RowsAffected = usize;

/// Delete the asset `id` if it belongs to `account_group_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn delete_asset(
    id: AssetId,
    account_group_id: AccountGroupId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM asset WHERE id = ?1 AND account_group_id = ?2",
            (id, account_group_id),
        )
        .map_err(|err| err.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error, PasswordHash, UserCode, UserID,
        account_group::{AccountGroupId, resolve_account_group},
        asset::core::{
            AssetUpdate, NewAsset, create_asset, delete_asset, get_assets,
            get_total_asset_amount, update_asset, validate_asset_name,
        },
        db::initialize,
        user::{NewUser, create_user},
    };

    fn get_test_connection() -> (Connection, UserID, AccountGroupId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            NewUser {
                email: "foo@bar.baz".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                user_code: UserCode::new_unchecked("ABC123"),
                invited_by_code: None,
            },
            &conn,
        )
        .unwrap();
        let group_id = resolve_account_group(user.id, &conn).unwrap();

        (conn, user.id, group_id)
    }

    fn new_asset(name: &str, amount: f64, date: time::OffsetDateTime) -> NewAsset {
        NewAsset {
            name: name.to_owned(),
            amount,
            date,
        }
    }

    #[test]
    fn validate_name_trims() {
        assert_eq!(validate_asset_name(Some("  Car ")), Ok("Car".to_owned()));
        assert_eq!(validate_asset_name(Some("   ")), Err(Error::EmptyAssetName));
        assert_eq!(validate_asset_name(None), Err(Error::EmptyAssetName));
    }

    #[test]
    fn create_and_list_assets() {
        let (conn, user_id, group_id) = get_test_connection();
        let older = create_asset(
            new_asset("Savings", 100.5, datetime!(2024-01-01 0:00 UTC)),
            user_id,
            group_id,
            &conn,
        )
        .unwrap();
        let newer = create_asset(
            new_asset("Car", 250.75, datetime!(2024-02-01 0:00 UTC)),
            user_id,
            group_id,
            &conn,
        )
        .unwrap();

        let got = get_assets(group_id, &conn).unwrap();

        assert_eq!(got, [newer, older]);
    }

    #[test]
    fn total_sums_group_assets() {
        let (conn, user_id, group_id) = get_test_connection();
        for amount in [100.5, 250.75] {
            create_asset(
                new_asset("Savings", amount, datetime!(2024-01-01 0:00 UTC)),
                user_id,
                group_id,
                &conn,
            )
            .unwrap();
        }

        assert_eq!(get_total_asset_amount(group_id, &conn), Ok(351.25));
        assert_eq!(get_total_asset_amount(group_id + 1, &conn), Ok(0.0));
    }

    #[test]
    fn update_changes_only_given_fields() {
        let (conn, user_id, group_id) = get_test_connection();
        let asset = create_asset(
            new_asset("Savings", 100.0, datetime!(2024-01-01 0:00 UTC)),
            user_id,
            group_id,
            &conn,
        )
        .unwrap();

        let updated = update_asset(
            asset.id,
            group_id,
            AssetUpdate {
                name: None,
                amount: Some(200.0),
            },
            &conn,
        )
        .unwrap()
        .unwrap();

        assert_eq!(updated.name, "Savings");
        assert_eq!(updated.amount, 200.0);
        assert_eq!(updated.date, asset.date);
        assert!(updated.updated_at >= asset.updated_at);
    }

    #[test]
    fn update_and_delete_are_scoped_to_group() {
        let (conn, user_id, group_id) = get_test_connection();
        let asset = create_asset(
            new_asset("Savings", 100.0, datetime!(2024-01-01 0:00 UTC)),
            user_id,
            group_id,
            &conn,
        )
        .unwrap();

        assert_eq!(
            update_asset(asset.id, group_id + 1, AssetUpdate::default(), &conn),
            Ok(None)
        );
        assert_eq!(delete_asset(asset.id, group_id + 1, &conn), Ok(0));
        assert_eq!(delete_asset(asset.id, group_id, &conn), Ok(1));
        assert!(get_assets(group_id, &conn).unwrap().is_empty());
    }
}
