//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `todo_core` linkage.
//! - Confirm migrations apply on a scratch database.

use std::process::ExitCode;

use todo_core::db::migrations::current_user_version;

fn main() -> ExitCode {
    println!("todo_core ping={}", todo_core::ping());
    println!("todo_core version={}", todo_core::core_version());
    println!("todo_core schema_version={}", todo_core::schema_version());

    let migrated = todo_core::open_db_in_memory()
        .map_err(|err| err.to_string())
        .and_then(|conn| current_user_version(&conn).map_err(|err| err.to_string()));
    match migrated {
        Ok(version) => {
            println!("todo_core scratch_db user_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("todo_core scratch_db failed: {err}");
            ExitCode::FAILURE
        }
    }
}
