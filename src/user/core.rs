//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, account_group::AccountGroupId, user::UserCode};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email, trimmed and lower-cased.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The code other users can register with to share this user's ledger.
    pub user_code: UserCode,
    /// The code of the user who invited this user, if any.
    pub invited_by_code: Option<UserCode>,
    /// The account group the user's records are filed under, once resolved.
    pub account_group_id: Option<AccountGroupId>,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// The JSON representation of a user sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserID,
    pub email: String,
    pub user_code: UserCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by_code: Option<UserCode>,
}

impl User {
    /// The fields of the user that are safe to send to the client.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            user_code: self.user_code.clone(),
            invited_by_code: self.invited_by_code.clone(),
        }
    }

    /// The fields of the user that are sent on login and token checks,
    /// which leave out who invited the user.
    pub fn summary_view(&self) -> UserView {
        UserView {
            invited_by_code: None,
            ..self.view()
        }
    }
}

/// The data needed to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's email. It is normalized with [normalize_email] before insertion.
    pub email: String,
    pub password_hash: PasswordHash,
    pub user_code: UserCode,
    pub invited_by_code: Option<UserCode>,
}

/// Trim and lower-case an email so that lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                user_code TEXT NOT NULL UNIQUE,
                invited_by_code TEXT,
                account_group_id INTEGER REFERENCES account_group(id),
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_user_invited_by_code ON user(invited_by_code);",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str =
    "id, email, password, user_code, invited_by_code, account_group_id, created_at";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let email = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let raw_user_code: String = row.get(3)?;
    let raw_invited_by_code: Option<String> = row.get(4)?;
    let account_group_id = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(User {
        id: UserID::new(raw_id),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        user_code: UserCode::new_unchecked(&raw_user_code),
        invited_by_code: raw_invited_by_code.as_deref().map(UserCode::new_unchecked),
        account_group_id,
        created_at,
    })
}

/// Create and insert a new user into the database.
///
/// The user starts without an account group; see
/// [crate::resolve_account_group].
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if the email is already registered, or
/// [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO user (email, password, user_code, invited_by_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                normalize_email(&new_user.email),
                new_user.password_hash.as_ref(),
                new_user.user_code.as_str(),
                new_user.invited_by_code.as_ref().map(UserCode::as_str),
                OffsetDateTime::now_utc(),
            ),
            map_user_row,
        )
        .map_err(Error::from)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(Error::from)
}

/// Get the user registered with `email`, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email, or [Error::SqlError]
/// if there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_row(&[(":email", &normalize_email(email))], map_user_row)
        .map_err(Error::from)
}

/// Find the user that owns `user_code`.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an error trying to access the store.
pub fn find_user_by_code(
    user_code: &UserCode,
    connection: &Connection,
) -> Result<Option<User>, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE user_code = :user_code"
        ))?
        .query_row(&[(":user_code", user_code.as_str())], map_user_row)
        .optional()
        .map_err(Error::from)
}

/// Find the earliest registered user, other than `excluded_user`, that was
/// invited with `user_code`.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an error trying to access the store.
pub fn find_first_user_invited_by(
    user_code: &UserCode,
    excluded_user: UserID,
    connection: &Connection,
) -> Result<Option<User>, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user
             WHERE invited_by_code = :user_code AND id != :excluded_id
             ORDER BY id ASC
             LIMIT 1"
        ))?
        .query_row(
            rusqlite::named_params! {
                ":user_code": user_code.as_str(),
                ":excluded_id": excluded_user.as_i64(),
            },
            map_user_row,
        )
        .optional()
        .map_err(Error::from)
}

/// Whether `code` is already used as a user code or an account group code.
///
/// # Errors
///
/// Returns [Error::SqlError] if there was an error trying to access the store.
pub fn is_code_taken(code: &UserCode, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM user WHERE user_code = ?1)
                 OR EXISTS (SELECT 1 FROM account_group WHERE group_code = ?1)",
            (code.as_str(),),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Assign `account_group_id` to the user unless the user already has a group.
///
/// The check and the write happen in a single statement, so concurrent callers
/// cannot both assign a group. Returns the group the user belongs to after the
/// update, which is the existing group if one was already set.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or
/// [Error::SqlError] if there was an error trying to access the store.
pub fn set_account_group_if_unset(
    user_id: UserID,
    account_group_id: AccountGroupId,
    connection: &Connection,
) -> Result<AccountGroupId, Error> {
    connection.execute(
        "UPDATE user SET account_group_id = ?1 WHERE id = ?2 AND account_group_id IS NULL",
        (account_group_id, user_id.as_i64()),
    )?;

    connection
        .query_row(
            "SELECT account_group_id FROM user WHERE id = ?1",
            (user_id.as_i64(),),
            |row| row.get::<_, Option<AccountGroupId>>(0),
        )?
        .ok_or(Error::NotFound)
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
#[cfg(test)]
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash, initialize_db,
        account_group::create_account_group,
        user::{
            NewUser, UserCode, UserID, count_users, create_user, find_first_user_invited_by,
            find_user_by_code, get_user_by_email, get_user_by_id, is_code_taken,
            set_account_group_if_unset,
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize_db(&conn).expect("Could not initialize database");

        conn
    }

    fn new_user(email: &str, code: &str, invited_by: Option<&str>) -> NewUser {
        NewUser {
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            user_code: UserCode::new_unchecked(code),
            invited_by_code: invited_by.map(UserCode::new_unchecked),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user =
            create_user(new_user("Foo@Bar.baz ", "ABC123", None), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "foo@bar.baz");
        assert_eq!(inserted_user.user_code, UserCode::new_unchecked("ABC123"));
        assert_eq!(inserted_user.account_group_id, None);
    }

    #[test]
    fn insert_user_fails_on_duplicate_email_in_any_case() {
        let db_connection = get_db_connection();
        create_user(new_user("foo@bar.baz", "ABC123", None), &db_connection).unwrap();

        let result = create_user(new_user("FOO@BAR.BAZ", "XYZ789", None), &db_connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
        assert_eq!(count_users(&db_connection), Ok(1));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user =
            create_user(new_user("foo@bar.baz", "ABC123", None), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_ignores_case() {
        let db_connection = get_db_connection();
        let test_user =
            create_user(new_user("foo@bar.baz", "ABC123", None), &db_connection).unwrap();

        let retrieved_user = get_user_by_email("  FoO@bAr.BaZ", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn find_user_by_code_returns_none_for_unknown_code() {
        let db_connection = get_db_connection();

        let result = find_user_by_code(&UserCode::new_unchecked("NOPE00"), &db_connection);

        assert_eq!(result, Ok(None));
    }

    #[test]
    fn find_first_user_invited_by_skips_excluded_user_and_picks_earliest() {
        let db_connection = get_db_connection();
        let inviter =
            create_user(new_user("a@bar.baz", "AAAAAA", None), &db_connection).unwrap();
        let first =
            create_user(new_user("b@bar.baz", "BBBBBB", Some("AAAAAA")), &db_connection).unwrap();
        create_user(new_user("c@bar.baz", "CCCCCC", Some("AAAAAA")), &db_connection).unwrap();

        let found = find_first_user_invited_by(&inviter.user_code, inviter.id, &db_connection)
            .unwrap()
            .unwrap();
        let excluding_first =
            find_first_user_invited_by(&inviter.user_code, first.id, &db_connection)
                .unwrap()
                .unwrap();

        assert_eq!(found.id, first.id);
        assert_eq!(excluding_first.email, "c@bar.baz");
    }

    #[test]
    fn code_is_taken_by_users_and_groups() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("a@bar.baz", "AAAAAA", None), &db_connection).unwrap();
        create_account_group(&UserCode::new_unchecked("GGGGGG"), user.id, &db_connection)
            .unwrap();

        assert_eq!(
            is_code_taken(&UserCode::new_unchecked("AAAAAA"), &db_connection),
            Ok(true)
        );
        assert_eq!(
            is_code_taken(&UserCode::new_unchecked("GGGGGG"), &db_connection),
            Ok(true)
        );
        assert_eq!(
            is_code_taken(&UserCode::new_unchecked("FREE00"), &db_connection),
            Ok(false)
        );
    }

    #[test]
    fn set_account_group_only_writes_once() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("a@bar.baz", "AAAAAA", None), &db_connection).unwrap();
        let first_group =
            create_account_group(&UserCode::new_unchecked("AAAAAA"), user.id, &db_connection)
                .unwrap();
        let second_group =
            create_account_group(&UserCode::new_unchecked("BBBBBB"), user.id, &db_connection)
                .unwrap();

        let assigned = set_account_group_if_unset(user.id, first_group.id, &db_connection);
        let reassigned = set_account_group_if_unset(user.id, second_group.id, &db_connection);

        assert_eq!(assigned, Ok(first_group.id));
        assert_eq!(reassigned, Ok(first_group.id));
        assert_eq!(
            get_user_by_id(user.id, &db_connection)
                .unwrap()
                .account_group_id,
            Some(first_group.id)
        );
    }

    #[test]
    fn set_account_group_fails_for_missing_user() {
        let db_connection = get_db_connection();

        let result = set_account_group_if_unset(UserID::new(42), 1, &db_connection);

        assert_eq!(result, Err(Error::NotFound));
    }
}
