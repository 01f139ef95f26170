//! The public health check reports whether the API and its database are up.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{AppState, db::lock_connection};

/// The state needed to probe the database.
#[derive(Debug, Clone)]
pub struct HealthState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Report that the API is running along with the database status.
///
/// This route always responds with 200 OK, a failing database shows up as
/// `"connected": false`.
pub async fn get_health(State(state): State<HealthState>) -> Json<Value> {
    let connected = is_database_connected(&state.db_connection);
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "success": true,
        "message": "API is running",
        "timestamp": timestamp,
        "database": {
            "status": if connected { "connected" } else { "disconnected" },
            "connected": connected,
        },
    }))
}

fn is_database_connected(db_connection: &Mutex<Connection>) -> bool {
    let Ok(connection) = lock_connection(db_connection) else {
        return false;
    };

    match connection.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => true,
        Err(error) => {
            tracing::warn!("database health check failed: {error}");
            false
        }
    }
}
