//! Column primitives and the standard lifecycle column set.
//!
//! # Responsibility
//! - Describe column storage types, nullability and defaults.
//! - Contribute the identity/audit columns every model carries, deriving
//!   the internal and public id column names from the table name.
//!
//! # Invariants
//! - Standard columns are always contributed in `StandardField::ALL` order,
//!   internal id first.
//! - Only the two id columns depend on the table name.

use crate::model::record::RecordMeta;
use crate::model::value::{FieldValue, ValueTypeError};
use std::borrow::Cow;

/// SQL expression producing "now" in epoch milliseconds.
pub const STORE_NOW_SQL: &str = "(strftime('%s', 'now') * 1000)";

/// Maximum length of public ids and actor columns.
pub const ID_TEXT_LEN: u32 = 36;

/// Storage type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    /// Text bounded to `max_len` characters by a store-level check.
    Text {
        max_len: u32,
    },
    Boolean,
    /// Unix epoch milliseconds.
    Timestamp,
}

/// Default applied by the store when an insert omits the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    None,
    Null,
    Integer(i64),
    Bool(bool),
    Text(&'static str),
    /// Insert time, assigned by the store.
    StoreNow,
}

/// Column shape without its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub ty: ColumnType,
    pub primary_key: bool,
    pub nullable: bool,
    pub default: ColumnDefault,
    /// Store rewrites this column to "now" on every update.
    pub refresh_on_update: bool,
}

impl ColumnSpec {
    pub const fn new(ty: ColumnType) -> Self {
        Self {
            ty,
            primary_key: false,
            nullable: true,
            default: ColumnDefault::None,
            refresh_on_update: false,
        }
    }

    pub const fn integer() -> Self {
        Self::new(ColumnType::Integer)
    }

    pub const fn text(max_len: u32) -> Self {
        Self::new(ColumnType::Text { max_len })
    }

    pub const fn boolean() -> Self {
        Self::new(ColumnType::Boolean)
    }

    pub const fn timestamp() -> Self {
        Self::new(ColumnType::Timestamp)
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub const fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = default;
        self
    }

    pub const fn refreshed_on_update(mut self) -> Self {
        self.refresh_on_update = true;
        self
    }

    /// True when an insert should leave a null value to the store, so the
    /// key or the declared default fills it in.
    pub fn store_assigned(&self) -> bool {
        self.primary_key || !matches!(self.default, ColumnDefault::None | ColumnDefault::Null)
    }
}

/// Identity and audit columns contributed to every model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardField {
    InternalId,
    PublicId,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
    Deleted,
    DeletedAt,
    DeletedBy,
}

impl StandardField {
    pub const ALL: [Self; 9] = [
        Self::InternalId,
        Self::PublicId,
        Self::CreatedAt,
        Self::CreatedBy,
        Self::UpdatedAt,
        Self::UpdatedBy,
        Self::Deleted,
        Self::DeletedAt,
        Self::DeletedBy,
    ];

    /// Column name for this field inside `table`.
    pub fn column_name(self, table: &str) -> Cow<'static, str> {
        match self {
            Self::InternalId => Cow::Owned(internal_id_column(table)),
            Self::PublicId => Cow::Owned(public_id_column(table)),
            Self::CreatedAt => Cow::Borrowed("created_at"),
            Self::CreatedBy => Cow::Borrowed("created_by"),
            Self::UpdatedAt => Cow::Borrowed("updated_at"),
            Self::UpdatedBy => Cow::Borrowed("updated_by"),
            Self::Deleted => Cow::Borrowed("deleted"),
            Self::DeletedAt => Cow::Borrowed("deleted_at"),
            Self::DeletedBy => Cow::Borrowed("deleted_by"),
        }
    }

    /// Attribute alias accepted in params besides the column name.
    pub fn alias(self) -> Option<&'static str> {
        match self {
            Self::InternalId => Some("internal_id"),
            Self::PublicId => Some("public_id"),
            _ => None,
        }
    }

    pub const fn spec(self) -> ColumnSpec {
        match self {
            Self::InternalId => ColumnSpec::integer().primary_key(),
            Self::PublicId => ColumnSpec::text(ID_TEXT_LEN),
            Self::CreatedAt => ColumnSpec::timestamp().with_default(ColumnDefault::StoreNow),
            Self::UpdatedAt => ColumnSpec::timestamp()
                .with_default(ColumnDefault::StoreNow)
                .refreshed_on_update(),
            Self::CreatedBy | Self::UpdatedBy | Self::DeletedBy => {
                ColumnSpec::text(ID_TEXT_LEN).with_default(ColumnDefault::Text(""))
            }
            Self::Deleted => ColumnSpec::boolean()
                .not_null()
                .with_default(ColumnDefault::Bool(false)),
            Self::DeletedAt => ColumnSpec::timestamp().with_default(ColumnDefault::Null),
        }
    }

    pub fn get(self, meta: &RecordMeta) -> FieldValue {
        match self {
            Self::InternalId => meta.internal_id.into(),
            Self::PublicId => FieldValue::Text(meta.public_id.clone()),
            Self::CreatedAt => meta.created_at.into(),
            Self::CreatedBy => (&meta.created_by).into(),
            Self::UpdatedAt => meta.updated_at.into(),
            Self::UpdatedBy => (&meta.updated_by).into(),
            Self::Deleted => meta.deleted.into(),
            Self::DeletedAt => meta.deleted_at.into(),
            Self::DeletedBy => (&meta.deleted_by).into(),
        }
    }

    pub fn set(self, meta: &mut RecordMeta, value: FieldValue) -> Result<(), ValueTypeError> {
        match self {
            Self::InternalId => meta.internal_id = value.into_opt_i64()?,
            Self::PublicId => meta.public_id = value.into_string()?,
            Self::CreatedAt => meta.created_at = value.into_opt_i64()?,
            Self::CreatedBy => meta.created_by = value.into_opt_string()?,
            Self::UpdatedAt => meta.updated_at = value.into_opt_i64()?,
            Self::UpdatedBy => meta.updated_by = value.into_opt_string()?,
            Self::Deleted => meta.deleted = value.into_bool()?,
            Self::DeletedAt => meta.deleted_at = value.into_opt_i64()?,
            Self::DeletedBy => meta.deleted_by = value.into_opt_string()?,
        }
        Ok(())
    }
}

/// `"<table>_id"`
pub fn internal_id_column(table: &str) -> String {
    format!("{table}_id")
}

/// `"<table>_pid"`
pub fn public_id_column(table: &str) -> String {
    format!("{table}_pid")
}
