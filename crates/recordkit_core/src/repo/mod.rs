//! Record lifecycle operations over caller-owned sessions.
//!
//! # Responsibility
//! - Implement create/get/update/soft-delete once for every model.
//! - Keep SQL details out of model declarations.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Ambiguous`) in
//!   addition to classified store errors.
//! - Soft-deleted rows are invisible to every lookup.

pub mod record_repo;
