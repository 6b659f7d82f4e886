// Finance Tracker - Core Library
// Exposes the store and API layers for the server binary and tests

pub mod api;
pub mod db;

// Re-export commonly used types
pub use api::{router, ApiError, AppState};
pub use db::{
    delete_record, insert_record, list_records, open_database, setup_database, update_record,
    DbError, DbResult, NewRecord, Record, Resource,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
