//! Reference model used by the CLI scenario.

use recordkit_core::{ColumnDefault, ColumnSpec, Field, FieldValue, Model, RecordMeta};
use serde::Serialize;

/// A user row in `user_table`; only `user_name` is editable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserModel {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_name: Option<String>,
}

impl Model for UserModel {
    const TABLE_NAME: &'static str = "user_table";
    const EDITABLE_COLUMNS: &'static [&'static str] = &["user_name"];

    fn domain_fields() -> &'static [Field<Self>] {
        static FIELDS: [Field<UserModel>; 1] = [Field {
            name: "user_name",
            spec: ColumnSpec::text(36).with_default(ColumnDefault::Text("")),
            get: |user| FieldValue::from(user.user_name.clone()),
            set: |user, value| {
                user.user_name = value.into_opt_string()?;
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

#[cfg(test)]
mod tests {
    use super::UserModel;
    use recordkit_core::db::create_table;
    use recordkit_core::{open_db_in_memory, Params, RecordOps, Session};
    use serde_json::json;

    fn params(value: serde_json::Value) -> Params {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn update_only_touches_user_name() {
        let mut conn = open_db_in_memory().unwrap();
        create_table::<UserModel>(&conn).unwrap();
        let session = Session::begin(&mut conn).unwrap();

        let created = UserModel::create(&params(json!({"user_name": "ryan"})), &session).unwrap();
        let updated = UserModel::update(
            &params(json!({
                "user_table_id": created.meta.internal_id,
                "user_name": "jayson",
                "updated_by": "someone",
            })),
            &session,
        )
        .unwrap();

        assert_eq!(updated.user_name.as_deref(), Some("jayson"));
        assert_eq!(updated.meta.updated_by.as_deref(), Some(""));
    }

    #[test]
    fn create_without_name_gets_empty_default() {
        let mut conn = open_db_in_memory().unwrap();
        create_table::<UserModel>(&conn).unwrap();
        let session = Session::begin(&mut conn).unwrap();

        let created = UserModel::create(&Params::new(), &session).unwrap();
        assert_eq!(created.user_name.as_deref(), Some(""));
    }

    #[test]
    fn serializes_meta_inline() {
        let user = UserModel {
            user_name: Some("ryan".to_string()),
            ..UserModel::default()
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["user_name"], "ryan");
        assert_eq!(value["deleted"], false);
        assert_eq!(value["public_id"].as_str().map(str::len), Some(32));
    }
}
