//! The shared state handed to every route handler.
//!
//! Handlers do not take [AppState] directly. Each one declares a smaller state
//! struct with the fields it needs and implements `FromRef<AppState>` for it.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig, timezone::get_local_offset};

/// Everything the expense tracker needs to serve requests.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Canonical timezone name used to work out "today", e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// How many expenses or categories to show per page.
    pub pagination_config: PaginationConfig,

    /// The single SQLite connection shared by all handlers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Build the app state, creating the expense and category tables if needed.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone name,
    /// - or [Error::SqlError] if the tables cannot be created.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
