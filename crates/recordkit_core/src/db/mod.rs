//! SQLite storage bootstrap, sessions and model table DDL.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Provide the caller-owned `Session` that record operations flush into.
//! - Create, drop and recreate model tables from their column sets.
//!
//! # Invariants
//! - Nothing in this layer commits on the caller's behalf.
//! - Identifiers are validated before they are spliced into SQL.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;
mod session;

pub use open::{open_db, open_db_in_memory};
pub use schema::{create_table, create_table_sql, drop_table, recreate_table, table_exists};
pub use session::Session;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidIdentifier(String),
    DuplicateColumn {
        table: &'static str,
        column: String,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidIdentifier(name) => write!(f, "invalid SQL identifier `{name}`"),
            Self::DuplicateColumn { table, column } => {
                write!(f, "column `{column}` is declared twice on table `{table}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidIdentifier(_) | Self::DuplicateColumn { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
