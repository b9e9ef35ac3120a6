#![allow(dead_code)]

use recordkit_core::db::recreate_table;
use recordkit_core::{
    open_db_in_memory, ColumnDefault, ColumnSpec, Field, FieldValue, Model, Params, RecordMeta,
};
use rusqlite::Connection;
use serde_json::Value;

/// Model with one domain column and no editable columns.
#[derive(Debug, Clone, Default)]
pub struct TestModel {
    pub meta: RecordMeta,
    pub test_field: Option<String>,
}

impl Model for TestModel {
    const TABLE_NAME: &'static str = "test_model";

    fn domain_fields() -> &'static [Field<Self>] {
        static FIELDS: [Field<TestModel>; 1] = [Field {
            name: "test_field",
            spec: ColumnSpec::text(36).with_default(ColumnDefault::Text("")),
            get: |record| FieldValue::from(record.test_field.clone()),
            set: |record, value| {
                record.test_field = value.into_opt_string()?;
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

/// Model `m`; `name` and `visits` are editable, `phantom` is listed but unmapped.
#[derive(Debug, Clone, Default)]
pub struct M {
    pub meta: RecordMeta,
    pub name: Option<String>,
    pub note: Option<String>,
    pub visits: i64,
}

impl Model for M {
    const TABLE_NAME: &'static str = "m";
    const EDITABLE_COLUMNS: &'static [&'static str] = &["name", "visits", "phantom"];

    fn domain_fields() -> &'static [Field<Self>] {
        static FIELDS: [Field<M>; 3] = [
            Field {
                name: "name",
                spec: ColumnSpec::text(36),
                get: |record| FieldValue::from(record.name.clone()),
                set: |record, value| {
                    record.name = value.into_opt_string()?;
                    Ok(())
                },
            },
            Field {
                name: "note",
                spec: ColumnSpec::text(36),
                get: |record| FieldValue::from(record.note.clone()),
                set: |record, value| {
                    record.note = value.into_opt_string()?;
                    Ok(())
                },
            },
            Field {
                name: "visits",
                spec: ColumnSpec::integer()
                    .not_null()
                    .with_default(ColumnDefault::Integer(0)),
                get: |record| FieldValue::Integer(record.visits),
                set: |record, value| {
                    record.visits = value.into_i64()?;
                    Ok(())
                },
            },
        ];
        &FIELDS
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Model with only the standard columns.
#[derive(Debug, Clone, Default)]
pub struct Bare {
    pub meta: RecordMeta,
}

impl Model for Bare {
    const TABLE_NAME: &'static str = "bare";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Opens an in-memory database with fresh tables for every test model.
pub fn open_with_tables() -> Connection {
    let conn = open_db_in_memory().unwrap();
    recreate_table::<TestModel>(&conn).unwrap();
    recreate_table::<M>(&conn).unwrap();
    recreate_table::<Bare>(&conn).unwrap();
    conn
}

pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("params must be a JSON object, got {other}"),
    }
}
