mod common;

use common::{open_with_tables, Bare, TestModel, M};
use recordkit_core::db::{create_table, create_table_sql};
use recordkit_core::{
    open_db_in_memory, ColumnSpec, ColumnType, DbError, Field, FieldValue, Model, RecordMeta,
    TableDef,
};
use rusqlite::Connection;

const AUDIT_COLUMNS: [&str; 7] = [
    "created_at",
    "created_by",
    "updated_at",
    "updated_by",
    "deleted",
    "deleted_at",
    "deleted_by",
];

#[test]
fn standard_columns_are_contributed_in_order() {
    let table = TableDef::<TestModel>::of();
    let names: Vec<&str> = table.columns().iter().map(|column| column.name()).collect();

    let mut expected = vec!["test_model_id", "test_model_pid"];
    expected.extend(AUDIT_COLUMNS);
    expected.push("test_field");
    assert_eq!(names, expected);

    assert_eq!(table.id_column(), "test_model_id");
    assert_eq!(table.pid_column(), "test_model_pid");

    let id = &table.columns()[0];
    assert_eq!(id.spec().ty, ColumnType::Integer);
    assert!(id.spec().primary_key);
    assert_eq!(table.columns()[1].spec().ty, ColumnType::Text { max_len: 36 });
}

#[test]
fn model_without_domain_columns_has_only_standard_set() {
    let table = TableDef::<Bare>::of();
    assert_eq!(table.columns().len(), 2 + AUDIT_COLUMNS.len());
    assert!(table.columns().iter().all(|column| column.is_standard()));
}

#[test]
fn created_tables_match_contributed_columns() {
    let conn = open_with_tables();

    let mut expected = vec!["test_model_id".to_string(), "test_model_pid".to_string()];
    expected.extend(AUDIT_COLUMNS.iter().map(|name| name.to_string()));
    expected.push("test_field".to_string());
    assert_eq!(table_columns(&conn, "test_model"), expected);

    assert_eq!(primary_key_columns(&conn, "test_model"), vec!["test_model_id"]);
    assert_eq!(primary_key_columns(&conn, "m"), vec!["m_id"]);
}

#[test]
fn id_columns_never_collide_across_models() {
    let m = TableDef::<M>::of();
    let test = TableDef::<TestModel>::of();

    assert_ne!(m.id_column(), test.id_column());
    assert_ne!(m.pid_column(), test.pid_column());
    assert_eq!(m.id_column(), "m_id");
    assert_eq!(m.pid_column(), "m_pid");
}

#[test]
fn field_lookup_resolves_columns_and_aliases() {
    let table = TableDef::<M>::of();

    assert!(table.field("m_id").is_some());
    assert!(table.field("internal_id").is_some());
    assert!(table.field("public_id").is_some());
    assert!(table.field("name").is_some());
    assert!(table.field("deleted_at").is_some());
    assert!(table.field("editable_columns").is_none());
    assert!(table.field("test_model_id").is_none());
}

#[test]
fn create_table_sql_declares_store_defaults() {
    let sql = create_table_sql::<Bare>().unwrap();

    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"bare\""));
    assert!(sql.contains("\"bare_id\" INTEGER PRIMARY KEY"));
    assert!(sql.contains("\"bare_pid\" TEXT CHECK (length(\"bare_pid\") <= 36)"));
    assert!(sql.contains("\"created_at\" INTEGER DEFAULT (strftime('%s', 'now') * 1000)"));
    assert!(sql.contains("\"deleted\" INTEGER NOT NULL DEFAULT 0"));
    assert!(sql.contains("\"deleted_at\" INTEGER DEFAULT NULL"));
    assert!(sql.contains("\"deleted_by\" TEXT DEFAULT ''"));
}

#[test]
fn raw_insert_gets_store_defaults() {
    let conn = open_with_tables();
    conn.execute("INSERT INTO bare (bare_pid) VALUES ('raw');", [])
        .unwrap();

    let (deleted, created_at, created_by): (i64, Option<i64>, Option<String>) = conn
        .query_row(
            "SELECT deleted, created_at, created_by FROM bare WHERE bare_pid = 'raw';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(deleted, 0);
    assert!(created_at.is_some());
    assert_eq!(created_by.as_deref(), Some(""));
}

#[derive(Debug, Default)]
struct Shadowing {
    meta: RecordMeta,
    deleted: bool,
}

impl Model for Shadowing {
    const TABLE_NAME: &'static str = "shadowing";

    fn domain_fields() -> &'static [Field<Self>] {
        static FIELDS: [Field<Shadowing>; 1] = [Field {
            name: "deleted",
            spec: ColumnSpec::boolean(),
            get: |record| FieldValue::Bool(record.deleted),
            set: |record, value| {
                record.deleted = value.into_bool()?;
                Ok(())
            },
        }];
        &FIELDS
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Debug, Default)]
struct BadColumn {
    meta: RecordMeta,
}

impl Model for BadColumn {
    const TABLE_NAME: &'static str = "bad_column";

    fn domain_fields() -> &'static [Field<Self>] {
        static FIELDS: [Field<BadColumn>; 1] = [Field {
            name: "bad name",
            spec: ColumnSpec::integer(),
            get: |_| FieldValue::Null,
            set: |_, _| Ok(()),
        }];
        &FIELDS
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[test]
fn domain_column_shadowing_a_standard_column_is_rejected() {
    let err = create_table_sql::<Shadowing>().unwrap_err();
    assert!(matches!(
        err,
        DbError::DuplicateColumn {
            table: "shadowing",
            ref column,
        } if column == "deleted"
    ));

    let table = TableDef::<Shadowing>::of();
    assert!(table.columns().iter().filter(|c| c.name() == "deleted").count() == 2);
}

#[test]
fn invalid_domain_column_name_is_rejected_before_sql_runs() {
    let conn = open_db_in_memory().unwrap();
    let err = create_table::<BadColumn>(&conn).unwrap_err();
    assert!(matches!(err, DbError::InvalidIdentifier(name) if name == "bad name"));
}

fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn primary_key_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>("name")?, row.get::<_, i64>("pk")?))
        })
        .unwrap()
        .filter_map(|row| {
            let (name, pk) = row.unwrap();
            (pk > 0).then_some(name)
        })
        .collect();
    names
}
