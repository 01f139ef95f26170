//! Assets: things of value owned by an account group, and their total.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::create_asset_table;
pub use create_endpoint::create_asset_endpoint;
pub use delete_endpoint::delete_asset_endpoint;
pub use edit_endpoint::edit_asset_endpoint;
pub use list_endpoint::get_assets_endpoint;

/// The state needed by the asset route handlers.
#[derive(Debug, Clone)]
pub struct AssetState {
    /// The database connection for managing assets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AssetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
