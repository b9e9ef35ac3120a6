//! Soft-delete aware lifecycle operations for every `Model`.
//!
//! # Responsibility
//! - Provide `create`, `get_by_id`, `get_by_pid`, `update`, `soft_delete`
//!   and `restore` as type-level operations over a caller-owned `Session`.
//! - Classify store failures into `RecordError` and log every failure at the
//!   operation boundary.
//!
//! # Invariants
//! - Lookups only ever return active rows (`deleted != 1`).
//! - `create` assigns every params key naming a mapped field; `update`
//!   assigns only keys listed in the model's editable columns.
//! - Operations flush into the session and never commit or roll back.
//! - Errors are returned, never panicked, and never retried.

use crate::db::{DbError, Session};
use crate::model::column::STORE_NOW_SQL;
use crate::model::record::{FieldRef, Model, TableDef};
use crate::model::value::FieldValue;
use log::{debug, error, info, warn};
use rusqlite::{params, params_from_iter, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Untyped key/value input for `create` and `update`.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Control key carrying an allow-list in update params; never assigned.
pub const EDITABLE_COLUMNS_KEY: &str = "editable_columns";

pub type RecordResult<T> = Result<T, RecordError>;

/// Failure of a record lifecycle operation.
#[derive(Debug)]
pub enum RecordError {
    /// No active record matched, or the lookup key was missing.
    NotFound { table: &'static str, lookup: String },
    /// An exactly-one lookup matched several active rows.
    Ambiguous { table: &'static str, lookup: String },
    ConstraintViolation(rusqlite::Error),
    StoreUnavailable(rusqlite::Error),
    Store(DbError),
    /// A params value did not fit the field it targets.
    InvalidValue {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A persisted row could not be mapped back onto the model.
    InvalidData(String),
}

impl RecordError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Ambiguous { .. } => "ambiguous",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Store(_) => "store_error",
            Self::InvalidValue { .. } => "invalid_value",
            Self::InvalidData(_) => "invalid_data",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { table, lookup } => {
                write!(f, "no active `{table}` record for {lookup}")
            }
            Self::Ambiguous { table, lookup } => {
                write!(f, "more than one active `{table}` record for {lookup}")
            }
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidValue {
                field,
                expected,
                found,
            } => write!(f, "invalid value for `{field}`: expected {expected}, found {found}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConstraintViolation(err) | Self::StoreUnavailable(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound { .. }
            | Self::Ambiguous { .. }
            | Self::InvalidValue { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RecordError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(value),
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
                | ErrorCode::ReadOnly,
            ) => Self::StoreUnavailable(value),
            _ => Self::Store(DbError::Sqlite(value)),
        }
    }
}

impl From<DbError> for RecordError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Store(other),
        }
    }
}

/// Collapses a typed result into the legacy "null means failure" shape.
pub trait SentinelExt<T> {
    fn into_sentinel(self) -> Option<T>;
}

impl<T> SentinelExt<T> for RecordResult<T> {
    fn into_sentinel(self) -> Option<T> {
        self.ok()
    }
}

/// Lifecycle operations available on every model type.
///
/// Implemented for all `M: Model`; models customize behaviour through
/// `Model::EDITABLE_COLUMNS`, not by overriding these.
pub trait RecordOps: Model {
    /// Loads the active record whose internal id is `id`.
    fn get_by_id(id: i64, session: &Session<'_>) -> RecordResult<Self>;

    /// Loads the active record with public id `pid`, lowest internal id first.
    fn get_by_pid(pid: &str, session: &Session<'_>) -> RecordResult<Self>;

    /// Inserts a record built from every params key naming a mapped field.
    fn create(params: &Params, session: &Session<'_>) -> RecordResult<Self>;

    /// Updates the record named by `<table>_id` using `EDITABLE_COLUMNS`.
    fn update(params: &Params, session: &Session<'_>) -> RecordResult<Self>;

    /// Same as `update` with an explicit allow-list.
    fn update_with(
        params: &Params,
        editable_columns: &[&str],
        session: &Session<'_>,
    ) -> RecordResult<Self>;

    /// Tombstones the active record `id`, stamping `deleted_at`/`deleted_by`.
    fn soft_delete(id: i64, actor: &str, session: &Session<'_>) -> RecordResult<Self>;

    /// Clears the tombstone of the soft-deleted record `id`.
    fn restore(id: i64, session: &Session<'_>) -> RecordResult<Self>;
}

impl<M: Model> RecordOps for M {
    fn get_by_id(id: i64, session: &Session<'_>) -> RecordResult<Self> {
        let table = TableDef::<M>::of();
        let started_at = Instant::now();
        let result = fetch_active_by_id(&table, id, session);
        log_outcome("record_get_by_id", &table, started_at, result)
    }

    fn get_by_pid(pid: &str, session: &Session<'_>) -> RecordResult<Self> {
        let table = TableDef::<M>::of();
        let started_at = Instant::now();
        let result = fetch_active_by_pid(&table, pid, session);
        log_outcome("record_get_by_pid", &table, started_at, result)
    }

    fn create(params: &Params, session: &Session<'_>) -> RecordResult<Self> {
        let table = TableDef::<M>::of();
        let started_at = Instant::now();
        let result = create_record(&table, params, session);
        log_outcome("record_create", &table, started_at, result)
    }

    fn update(params: &Params, session: &Session<'_>) -> RecordResult<Self> {
        Self::update_with(params, M::EDITABLE_COLUMNS, session)
    }

    fn update_with(
        params: &Params,
        editable_columns: &[&str],
        session: &Session<'_>,
    ) -> RecordResult<Self> {
        let table = TableDef::<M>::of();
        let started_at = Instant::now();
        let result = update_record(&table, params, editable_columns, session);
        log_outcome("record_update", &table, started_at, result)
    }

    fn soft_delete(id: i64, actor: &str, session: &Session<'_>) -> RecordResult<Self> {
        let table = TableDef::<M>::of();
        let started_at = Instant::now();
        let result = soft_delete_record(&table, id, actor, session);
        log_outcome("record_soft_delete", &table, started_at, result)
    }

    fn restore(id: i64, session: &Session<'_>) -> RecordResult<Self> {
        let table = TableDef::<M>::of();
        let started_at = Instant::now();
        let result = restore_record(&table, id, session);
        log_outcome("record_restore", &table, started_at, result)
    }
}

fn create_record<M: Model>(
    table: &TableDef<M>,
    params: &Params,
    session: &Session<'_>,
) -> RecordResult<M> {
    let mut record = M::default();
    for (key, value) in params {
        if let Some(field) = table.field(key) {
            assign(field, &mut record, key, value)?;
        }
    }

    let id = insert_row(table, &record, session)?;
    fetch_by_id(table, id, false, session)
}

fn update_record<M: Model>(
    table: &TableDef<M>,
    params: &Params,
    editable_columns: &[&str],
    session: &Session<'_>,
) -> RecordResult<M> {
    let id_key = table.id_column();
    let Some(raw_id) = params.get(id_key) else {
        return Err(RecordError::NotFound {
            table: table.name(),
            lookup: format!("missing `{id_key}` key"),
        });
    };
    let id = FieldValue::from_json(raw_id)
        .and_then(FieldValue::into_i64)
        .map_err(|err| RecordError::InvalidValue {
            field: id_key.to_string(),
            expected: "integer",
            found: err.found,
        })?;

    let mut record = fetch_active_by_id(table, id, session)?;
    for (key, value) in params {
        if key == id_key || key == EDITABLE_COLUMNS_KEY {
            continue;
        }
        if !editable_columns.iter().any(|column| *column == key.as_str()) {
            debug!(
                "event=record_update module=record status=skip table={} field={key} reason=not_editable",
                table.name()
            );
            continue;
        }
        if let Some(field) = table.field(key) {
            assign(field, &mut record, key, value)?;
        }
    }

    update_row(table, id, &record, session)?;
    fetch_by_id(table, id, false, session)
}

fn soft_delete_record<M: Model>(
    table: &TableDef<M>,
    id: i64,
    actor: &str,
    session: &Session<'_>,
) -> RecordResult<M> {
    let mut record = fetch_active_by_id(table, id, session)?;
    record.meta_mut().mark_deleted(actor);
    let meta = record.meta();

    let changed = session.execute(
        &format!(
            "UPDATE \"{table_name}\"
             SET
                \"deleted\" = ?2,
                \"deleted_at\" = {STORE_NOW_SQL},
                \"deleted_by\" = ?3,
                \"updated_at\" = {STORE_NOW_SQL}
             WHERE \"{id_column}\" = ?1
               AND \"deleted\" != 1;",
            table_name = table.name(),
            id_column = table.id_column(),
        ),
        params![id, meta.deleted, meta.deleted_by],
    )?;

    if changed == 0 {
        return Err(not_found_by_id(table, id));
    }

    fetch_by_id(table, id, false, session)
}

fn restore_record<M: Model>(
    table: &TableDef<M>,
    id: i64,
    session: &Session<'_>,
) -> RecordResult<M> {
    let mut record = fetch_by_id(table, id, false, session)?;
    if record.meta().is_active() {
        return Err(RecordError::NotFound {
            table: table.name(),
            lookup: format!("deleted {} = {id}", table.id_column()),
        });
    }

    record.meta_mut().restore();
    update_row(table, id, &record, session)?;
    fetch_active_by_id(table, id, session)
}

fn assign<M: Model>(
    field: FieldRef<M>,
    record: &mut M,
    key: &str,
    value: &serde_json::Value,
) -> RecordResult<()> {
    FieldValue::from_json(value)
        .and_then(|value| field.set(record, value))
        .map_err(|err| RecordError::InvalidValue {
            field: key.to_string(),
            expected: err.expected,
            found: err.found,
        })
}

fn insert_row<M: Model>(
    table: &TableDef<M>,
    record: &M,
    session: &Session<'_>,
) -> RecordResult<i64> {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for column in table.columns() {
        let value = column.field().get(record);
        if value.is_null() && column.spec().store_assigned() {
            continue;
        }
        names.push(format!("\"{}\"", column.name()));
        values.push(value);
    }

    let placeholders = (1..=values.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({placeholders});",
        table.name(),
        names.join(", ")
    );

    session.execute(&sql, params_from_iter(values.iter()))?;
    Ok(session.last_insert_rowid())
}

fn update_row<M: Model>(
    table: &TableDef<M>,
    id: i64,
    record: &M,
    session: &Session<'_>,
) -> RecordResult<()> {
    let mut assignments = Vec::new();
    let mut values = Vec::new();
    for column in table.columns() {
        let spec = column.spec();
        if spec.primary_key {
            continue;
        }
        if spec.refresh_on_update {
            assignments.push(format!("\"{}\" = {STORE_NOW_SQL}", column.name()));
            continue;
        }
        values.push(column.field().get(record));
        assignments.push(format!("\"{}\" = ?{}", column.name(), values.len()));
    }
    values.push(FieldValue::Integer(id));

    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE \"{}\" = ?{};",
        table.name(),
        assignments.join(", "),
        table.id_column(),
        values.len()
    );

    let changed = session.execute(&sql, params_from_iter(values.iter()))?;
    if changed == 0 {
        return Err(not_found_by_id(table, id));
    }
    Ok(())
}

fn fetch_active_by_id<M: Model>(
    table: &TableDef<M>,
    id: i64,
    session: &Session<'_>,
) -> RecordResult<M> {
    fetch_by_id(table, id, true, session)
}

/// Exactly-one lookup by internal id; `active_only` adds the tombstone filter.
fn fetch_by_id<M: Model>(
    table: &TableDef<M>,
    id: i64,
    active_only: bool,
    session: &Session<'_>,
) -> RecordResult<M> {
    let mut sql = format!("{} WHERE \"{}\" = ?1", select_sql(table), table.id_column());
    if active_only {
        sql.push_str(" AND \"deleted\" != 1");
    }

    let mut rows = session.fetch_at_most(&sql, [id], 2, |row| map_row(table, row))?;
    match rows.len() {
        0 => Err(not_found_by_id(table, id)),
        1 => rows.pop().ok_or_else(|| not_found_by_id(table, id)),
        _ => Err(RecordError::Ambiguous {
            table: table.name(),
            lookup: format!("{} = {id}", table.id_column()),
        }),
    }
}

fn fetch_active_by_pid<M: Model>(
    table: &TableDef<M>,
    pid: &str,
    session: &Session<'_>,
) -> RecordResult<M> {
    let sql = format!(
        "{} WHERE \"{pid_column}\" = ?1 AND \"deleted\" != 1 ORDER BY \"{id_column}\" ASC",
        select_sql(table),
        pid_column = table.pid_column(),
        id_column = table.id_column(),
    );

    let mut rows = session.fetch_at_most(&sql, [pid], 1, |row| map_row(table, row))?;
    rows.pop().ok_or_else(|| RecordError::NotFound {
        table: table.name(),
        lookup: format!("{} = {pid}", table.pid_column()),
    })
}

fn select_sql<M: Model>(table: &TableDef<M>) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|column| format!("\"{}\"", column.name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM \"{}\"", table.name())
}

fn map_row<M: Model>(table: &TableDef<M>, row: &Row<'_>) -> RecordResult<M> {
    let mut record = M::default();
    for (index, column) in table.columns().iter().enumerate() {
        let invalid = |detail: String| {
            RecordError::InvalidData(format!("{}.{}: {detail}", table.name(), column.name()))
        };
        let value =
            FieldValue::from_sql(row.get_ref(index)?).map_err(|err| invalid(err.to_string()))?;
        column
            .field()
            .set(&mut record, value)
            .map_err(|err| invalid(err.to_string()))?;
    }
    Ok(record)
}

fn not_found_by_id<M: Model>(table: &TableDef<M>, id: i64) -> RecordError {
    RecordError::NotFound {
        table: table.name(),
        lookup: format!("{} = {id}", table.id_column()),
    }
}

fn log_outcome<M: Model>(
    event: &str,
    table: &TableDef<M>,
    started_at: Instant,
    result: RecordResult<M>,
) -> RecordResult<M> {
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(record) => info!(
            "event={event} module=record status=ok table={} id={} duration_ms={duration_ms}",
            table.name(),
            record.meta().internal_id.unwrap_or_default()
        ),
        Err(err @ RecordError::NotFound { .. }) => warn!(
            "event={event} module=record status=error table={} duration_ms={duration_ms} error_code={} error={err}",
            table.name(),
            err.code()
        ),
        Err(err) => error!(
            "event={event} module=record status=error table={} duration_ms={duration_ms} error_code={} error={err:?}",
            table.name(),
            err.code()
        ),
    }
    result
}
