//! Model capability, lifecycle metadata and the per-model field registry.
//!
//! # Responsibility
//! - Define the `Model` trait a concrete record type implements.
//! - Hold the standard lifecycle fields in `RecordMeta`.
//! - Build `TableDef`, the ordered column set and name → field registry
//!   consulted by create/update and row mapping.
//!
//! # Invariants
//! - `Model::TABLE_NAME` is a valid identifier; violations fail to compile.
//! - A fresh `RecordMeta` gets its own public id.
//! - Registry lookups resolve standard fields before domain fields.

use crate::model::column::{ColumnSpec, StandardField};
use crate::model::value::{FieldValue, ValueTypeError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

/// Identity, audit and soft-delete fields shared by every model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Store-generated primary key; `None` until the first flush.
    pub internal_id: Option<i64>,
    /// Opaque external identifier, 32 hex characters by default.
    pub public_id: String,
    pub created_at: Option<i64>,
    pub created_by: Option<String>,
    pub updated_at: Option<i64>,
    pub updated_by: Option<String>,
    /// Soft delete tombstone.
    pub deleted: bool,
    pub deleted_at: Option<i64>,
    pub deleted_by: Option<String>,
}

impl RecordMeta {
    /// Creates unsaved metadata with a freshly generated public id.
    pub fn new() -> Self {
        Self {
            internal_id: None,
            public_id: new_public_id(),
            created_at: None,
            created_by: Some(String::new()),
            updated_at: None,
            updated_by: Some(String::new()),
            deleted: false,
            deleted_at: None,
            deleted_by: Some(String::new()),
        }
    }

    /// Marks the record as softly deleted by `actor`.
    ///
    /// `deleted_at` stays unset here; `RecordOps::soft_delete` stamps it in
    /// the store.
    pub fn mark_deleted(&mut self, actor: impl Into<String>) {
        self.deleted = true;
        self.deleted_by = Some(actor.into());
    }

    /// Clears the tombstone and its actor/time.
    pub fn restore(&mut self) {
        self.deleted = false;
        self.deleted_at = None;
        self.deleted_by = Some(String::new());
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates one public id: a random UUID rendered as 32 lowercase hex chars.
pub fn new_public_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Returns whether `name` is `[A-Za-z_][A-Za-z0-9_]*`.
pub const fn is_valid_identifier(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        let allowed = byte == b'_'
            || byte.is_ascii_alphabetic()
            || (index > 0 && byte.is_ascii_digit());
        if !allowed {
            return false;
        }
        index += 1;
    }
    true
}

/// A domain column declared by a concrete model.
///
/// Getter and setter are plain function pointers so a model can list its
/// fields in a `static` slice.
pub struct Field<M> {
    pub name: &'static str,
    pub spec: ColumnSpec,
    pub get: fn(&M) -> FieldValue,
    pub set: fn(&mut M, FieldValue) -> Result<(), ValueTypeError>,
}

/// A relational record type with standard lifecycle columns.
///
/// Implementors declare a table name, their domain fields and which columns
/// `update` may touch; everything else comes from `RecordOps`.
pub trait Model: Default + Sized + 'static {
    /// Table name; also the prefix of the `_id`/`_pid` columns.
    const TABLE_NAME: &'static str;

    /// Columns `update` is allowed to assign. Nothing by default.
    ///
    /// `updated_at` is rewritten by the store on every update, so listing it
    /// here has no effect.
    const EDITABLE_COLUMNS: &'static [&'static str] = &[];

    #[doc(hidden)]
    const TABLE_NAME_CHECK: () = assert!(
        is_valid_identifier(Self::TABLE_NAME),
        "Model::TABLE_NAME must be a non-empty ASCII identifier"
    );

    /// Domain columns in declaration order.
    fn domain_fields() -> &'static [Field<Self>] {
        &[]
    }

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;
}

/// Where a mapped column reads and writes its value.
pub enum FieldRef<M: 'static> {
    Standard(StandardField),
    Domain(&'static Field<M>),
}

impl<M: 'static> Clone for FieldRef<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: 'static> Copy for FieldRef<M> {}

impl<M: Model> FieldRef<M> {
    pub fn get(self, record: &M) -> FieldValue {
        match self {
            Self::Standard(field) => field.get(record.meta()),
            Self::Domain(field) => (field.get)(record),
        }
    }

    pub fn set(self, record: &mut M, value: FieldValue) -> Result<(), ValueTypeError> {
        match self {
            Self::Standard(field) => field.set(record.meta_mut(), value),
            Self::Domain(field) => (field.set)(record, value),
        }
    }
}

/// One mapped column of a model table.
pub struct Column<M: 'static> {
    name: Cow<'static, str>,
    spec: ColumnSpec,
    field: FieldRef<M>,
}

impl<M: Model> Column<M> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> ColumnSpec {
        self.spec
    }

    pub fn field(&self) -> FieldRef<M> {
        self.field
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.field, FieldRef::Standard(_))
    }
}

/// Ordered column set of one model: standard columns, then domain columns.
pub struct TableDef<M: 'static> {
    name: &'static str,
    columns: Vec<Column<M>>,
}

impl<M: Model> TableDef<M> {
    /// Contributes the standard columns for `M` and appends its domain fields.
    pub fn of() -> Self {
        let () = M::TABLE_NAME_CHECK;

        let table = M::TABLE_NAME;
        let mut columns: Vec<Column<M>> = StandardField::ALL
            .iter()
            .map(|field| Column {
                name: field.column_name(table),
                spec: field.spec(),
                field: FieldRef::Standard(*field),
            })
            .collect();

        columns.extend(M::domain_fields().iter().map(|field| Column {
            name: Cow::Borrowed(field.name),
            spec: field.spec,
            field: FieldRef::Domain(field),
        }));

        Self {
            name: table,
            columns,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &[Column<M>] {
        &self.columns
    }

    /// `"<table>_id"`
    pub fn id_column(&self) -> &str {
        self.standard_column(StandardField::InternalId)
    }

    /// `"<table>_pid"`
    pub fn pid_column(&self) -> &str {
        self.standard_column(StandardField::PublicId)
    }

    /// Resolves a params key to a mapped field.
    ///
    /// Accepts column names plus the `internal_id`/`public_id` aliases.
    /// Standard columns shadow domain fields of the same name.
    pub fn field(&self, key: &str) -> Option<FieldRef<M>> {
        let standard = StandardField::ALL.iter().find(|field| {
            field.column_name(self.name) == key || field.alias() == Some(key)
        });
        if let Some(field) = standard {
            return Some(FieldRef::Standard(*field));
        }

        self.columns
            .iter()
            .filter(|column| !column.is_standard())
            .find(|column| column.name() == key)
            .map(Column::field)
    }

    fn standard_column(&self, wanted: StandardField) -> &str {
        self.columns
            .iter()
            .find(|column| matches!(column.field, FieldRef::Standard(field) if field == wanted))
            .map_or("", Column::name)
    }
}
