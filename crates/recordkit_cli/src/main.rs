//! Reference application wiring for `recordkit_core`.
//!
//! # Responsibility
//! - Open a database (file path from argv, in-memory otherwise).
//! - Run the create → get → update → commit scenario on `UserModel`.
//! - Print each step as JSON so runs are easy to diff.

mod user;

use recordkit_core::db::create_table;
use recordkit_core::{
    core_version, init_logging, open_db, open_db_in_memory, LogSettings, Params, RecordOps,
    Session,
};
use serde_json::json;
use std::error::Error;
use std::process::ExitCode;
use user::UserModel;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("recordkit_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Some(settings) = LogSettings::from_env()? {
        init_logging(&settings)?;
    }
    println!("recordkit_core version={}", core_version());

    let mut conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    create_table::<UserModel>(&conn)?;

    let session = Session::begin(&mut conn)?;
    let created = UserModel::create(&to_params(json!({"user_name": "ryan"})), &session)?;
    print_step("create", &created)?;

    let id = created
        .meta
        .internal_id
        .ok_or("created user has no internal id")?;
    let fetched = UserModel::get_by_id(id, &session)?;
    print_step("get_by_id", &fetched)?;

    let updated = UserModel::update(
        &to_params(json!({"user_table_id": id, "user_name": "jayson"})),
        &session,
    )?;
    print_step("update", &updated)?;

    session.commit()?;
    log::info!("event=cli_run module=cli status=ok user_id={id}");
    Ok(())
}

fn to_params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Params::new(),
    }
}

fn print_step(step: &str, user: &UserModel) -> Result<(), serde_json::Error> {
    println!("{step} {}", serde_json::to_string(user)?);
    Ok(())
}
