//! Household Ledger is a JSON API for tracking a personal or shared budget.
//!
//! Users register with an email and password and receive a bearer token.
//! Transactions and assets are filed under an account group, which users
//! share by registering with another user's invitation code.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account_group;
mod amount;
mod app_state;
mod asset;
mod auth;
mod date;
mod db;
mod endpoints;
mod extract;
mod health;
mod logging;
mod not_found;
mod routing;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use account_group::{AccountGroup, AccountGroupId, resolve_account_group};
pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use user::{User, UserCode, UserID, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email or password was missing from a registration request.
    #[error("Email and password are required")]
    MissingCredentials,

    /// The password is shorter than the minimum length.
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// A user with the same (case-folded) email already exists.
    #[error("Email already exists")]
    DuplicateEmail,

    /// The invitation code does not have the length of a user code.
    #[error("Invalid invitation code format")]
    InvalidInvitationCodeFormat,

    /// The invitation code does not belong to any user.
    #[error("Invalid invitation code")]
    UnknownInvitationCode,

    /// The email and password combination did not match a user.
    ///
    /// The message is the same for an unknown email and a wrong password so
    /// that clients cannot probe for registered emails.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The request to a protected route did not include a bearer token.
    #[error("Unauthorized - No token provided")]
    MissingToken,

    /// The bearer token was malformed, expired, badly signed, or refers to a
    /// user that no longer exists.
    #[error("Unauthorized - Invalid or expired token")]
    InvalidToken,

    /// The transaction type was neither "income" nor "expense".
    #[error("Type must be 'income' or 'expense'")]
    InvalidTransactionType,

    /// The amount was missing, zero, negative or not finite.
    #[error("Amount must be a positive number")]
    InvalidAmount,

    /// An asset was created or renamed with an empty name.
    #[error("Asset name is required")]
    EmptyAssetName,

    /// A date string sent by the client could not be parsed.
    #[error("Invalid date \"{0}\"")]
    InvalidDate(String),

    /// A year outside the supported calendar range was requested.
    #[error("Invalid year {0}")]
    InvalidYear(i32),

    /// The monthly statistics were requested without a year or month.
    #[error("Year and month are required")]
    MissingStatsPeriod,

    /// The zero-based month was outside of 0-11.
    #[error("Month must be between 0 and 11")]
    InvalidMonth,

    /// The request body or query string could not be parsed.
    #[error("{0}")]
    InvalidRequest(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transaction does not exist or belongs to another account group.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The asset does not exist or belongs to another account group.
    #[error("Asset not found")]
    AssetNotFound,

    /// Could not find an unused user code within the attempt limit.
    #[error("could not generate a unique user code after {0} attempts")]
    UserCodeExhausted(usize),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The bearer token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("rejected path parameters: {}", rejection.body_text());
        Error::NotFound
    }
}

impl Error {
    /// The HTTP status code that the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingCredentials
            | Error::PasswordTooShort(_)
            | Error::DuplicateEmail
            | Error::InvalidInvitationCodeFormat
            | Error::UnknownInvitationCode
            | Error::InvalidTransactionType
            | Error::InvalidAmount
            | Error::EmptyAssetName
            | Error::InvalidDate(_)
            | Error::InvalidYear(_)
            | Error::MissingStatsPeriod
            | Error::InvalidMonth
            | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::MissingToken | Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound | Error::TransactionNotFound | Error::AssetNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::UserCodeExhausted(_)
            | Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The message sent to clients for any internal error.
pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Server error";

/// A 500 response with the generic error message.
pub(crate) fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": INTERNAL_ERROR_MESSAGE,
        })),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            return internal_error_response();
        }

        (
            status,
            Json(json!({
                "success": false,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
