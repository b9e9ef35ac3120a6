//! Record model: column contribution, lifecycle metadata and field values.
//!
//! # Responsibility
//! - Describe what every model table looks like before it touches storage.
//! - Map params keys and stored cells onto typed model fields.
//!
//! # Invariants
//! - Every model carries exactly one `<table>_id` and one `<table>_pid` column.
//! - Deletion is a soft-delete tombstone (`deleted`), never a physical delete.

pub mod column;
pub mod record;
pub mod value;
