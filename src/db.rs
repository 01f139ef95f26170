/*! This module sets up the application's database and guards access to the shared connection. */

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account_group::create_account_group_table, asset::create_asset_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create the application tables in the database if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_group_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_asset_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Open an immediate transaction on `connection`.
///
/// The write lock is taken when the transaction begins, so the reads made
/// inside it cannot go stale before the transaction writes.
///
/// # Errors
/// Returns an error if a transaction is already open on `connection` or there
/// is some other SQL error.
pub fn begin_immediate(connection: &Connection) -> Result<SqlTransaction<'_>, Error> {
    SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate).map_err(Error::from)
}
