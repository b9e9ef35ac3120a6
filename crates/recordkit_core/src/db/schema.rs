//! Model table DDL.
//!
//! # Responsibility
//! - Render `CREATE TABLE` statements from a model's column set.
//! - Create, drop and recreate model tables.
//!
//! # Invariants
//! - Bounded text columns carry a `length(...) <= N` check, booleans a
//!   `IN (0, 1)` check, so violations surface as constraint errors at flush.
//! - Every identifier is validated and double-quoted.

use super::{DbError, DbResult};
use crate::model::column::{ColumnDefault, ColumnSpec, ColumnType, STORE_NOW_SQL};
use crate::model::record::{is_valid_identifier, Model, TableDef};
use log::info;
use rusqlite::Connection;
use std::collections::HashSet;

/// Renders the `CREATE TABLE IF NOT EXISTS` statement for `M`.
pub fn create_table_sql<M: Model>() -> DbResult<String> {
    let table = TableDef::<M>::of();
    let mut seen = HashSet::new();
    let mut definitions = Vec::with_capacity(table.columns().len());

    for column in table.columns() {
        let name = column.name();
        if !seen.insert(name) {
            return Err(DbError::DuplicateColumn {
                table: table.name(),
                column: name.to_string(),
            });
        }
        definitions.push(column_sql(name, column.spec())?);
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        quote_identifier(table.name())?,
        definitions.join(",\n    ")
    ))
}

/// Creates the table for `M` if it does not exist yet.
pub fn create_table<M: Model>(conn: &Connection) -> DbResult<()> {
    let sql = create_table_sql::<M>()?;
    conn.execute_batch(&sql)?;
    info!(
        "event=table_create module=schema status=ok table={}",
        M::TABLE_NAME
    );
    Ok(())
}

/// Drops the table for `M` if it exists.
pub fn drop_table<M: Model>(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {};",
        quote_identifier(M::TABLE_NAME)?
    ))?;
    info!(
        "event=table_drop module=schema status=ok table={}",
        M::TABLE_NAME
    );
    Ok(())
}

/// Drops and recreates the table for `M`, discarding its rows.
pub fn recreate_table<M: Model>(conn: &Connection) -> DbResult<()> {
    drop_table::<M>(conn)?;
    create_table::<M>(conn)
}

/// Returns whether a table named `name` exists.
pub fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Double-quotes `name` after checking it is a plain identifier.
pub fn quote_identifier(name: &str) -> DbResult<String> {
    if !is_valid_identifier(name) {
        return Err(DbError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{name}\""))
}

fn column_sql(name: &str, spec: ColumnSpec) -> DbResult<String> {
    let quoted = quote_identifier(name)?;
    let mut sql = format!("{quoted} {}", storage_type(spec.ty));

    if spec.primary_key {
        sql.push_str(" PRIMARY KEY");
    } else if !spec.nullable {
        sql.push_str(" NOT NULL");
    }

    match spec.default {
        ColumnDefault::None => {}
        ColumnDefault::Null => sql.push_str(" DEFAULT NULL"),
        ColumnDefault::Integer(value) => sql.push_str(&format!(" DEFAULT {value}")),
        ColumnDefault::Bool(flag) => sql.push_str(&format!(" DEFAULT {}", i64::from(flag))),
        ColumnDefault::Text(text) => {
            sql.push_str(&format!(" DEFAULT '{}'", text.replace('\'', "''")))
        }
        ColumnDefault::StoreNow => sql.push_str(&format!(" DEFAULT {STORE_NOW_SQL}")),
    }

    match spec.ty {
        ColumnType::Text { max_len } => {
            sql.push_str(&format!(" CHECK (length({quoted}) <= {max_len})"))
        }
        ColumnType::Boolean => sql.push_str(&format!(" CHECK ({quoted} IN (0, 1))")),
        ColumnType::Integer | ColumnType::Timestamp => {}
    }

    Ok(sql)
}

fn storage_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Integer | ColumnType::Boolean | ColumnType::Timestamp => "INTEGER",
        ColumnType::Text { .. } => "TEXT",
    }
}
