//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `item_core` linkage and run one create/update/delete cycle
//!   against an in-memory database.
//! - Optionally write core logs to the absolute directory given as the first
//!   argument.

use item_core::db::open_db_in_memory;
use item_core::{
    default_log_level, init_logging, CreateItemRequest, ItemService, SqliteItemRepository,
    UpdateItemRequest,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("item_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = std::env::args().nth(1) {
        init_logging(default_log_level(), &log_dir)?;
    }

    println!("item_core ping={}", item_core::ping());
    println!("item_core version={}", item_core::core_version());

    let conn = open_db_in_memory()?;
    let service = ItemService::new(SqliteItemRepository::try_new(&conn)?);

    let created = service.create(&CreateItemRequest::new("BMW", "bmw-1", "German car"))?;
    let id = created.id.ok_or("created item has no id")?;
    println!("created id={id} code={}", created.code);

    let updated = service.update(id, &UpdateItemRequest::new("BMW M3", "Sports sedan"))?;
    println!(
        "updated id={id} update_date={}",
        updated.update_date.unwrap_or_default()
    );

    match service.create(&CreateItemRequest::new("Duplicate", "bmw-1", "")) {
        Err(err) => println!("duplicate rejected: {err}"),
        Ok(_) => return Err("duplicate code was accepted".into()),
    }

    service.delete_by_id(id)?;
    println!("items after delete={}", service.find_all()?.len());
    Ok(())
}
