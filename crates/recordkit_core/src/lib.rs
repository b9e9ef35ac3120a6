//! Soft-delete aware active-record layer over SQLite.
//! A model declares its table name and domain columns; identity, audit and
//! tombstone columns plus the lifecycle operations come from this crate.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{open_db, open_db_in_memory, DbError, DbResult, Session};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::column::{ColumnDefault, ColumnSpec, ColumnType, StandardField};
pub use model::record::{Field, Model, RecordMeta, TableDef};
pub use model::value::{FieldValue, ValueTypeError};
pub use repo::record_repo::{
    Params, RecordError, RecordOps, RecordResult, SentinelExt, EDITABLE_COLUMNS_KEY,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
