//! Protecting settings with a read-only table
//!
//! Run with: `cargo run --example readonly_table`

use serde_json::json;
use tabset::{
    ReadonlySettingStore, Settings, SqliteStorage, StorageBackend, StoreConfig, TableColumns,
};

fn main() -> tabset::Result<()> {
    env_logger::init();

    let storage = SqliteStorage::in_memory()?;
    for table in ["settings", "settings_locked"] {
        storage.ensure_table(table, &TableColumns::default())?;
    }
    storage.execute(
        "INSERT INTO settings_locked (name, content, multiple) VALUES (?, ?, 0)",
        &[json!("app.edition"), json!("enterprise")],
    )?;

    let config = StoreConfig::builder("settings")
        .readonly_table("settings_locked")
        .build();
    let store = ReadonlySettingStore::new(config, storage)?;

    println!("Protected: {:?}", store.protected_names());
    println!("Edition: {}", store.get_setting("app.edition", "community").to_json());

    match store.set("app.edition", "community") {
        Ok(_) => println!("unexpectedly changed a protected setting"),
        Err(e) => println!("Rejected ({:?}): {e}", e.code()),
    }
    match store.remove("app.edition") {
        Ok(_) => println!("unexpectedly removed a protected setting"),
        Err(e) => println!("Rejected ({:?}): {e}", e.code()),
    }

    store.set("ui.theme", "dark")?;
    println!("Theme: {}", store.get_setting("ui.theme", "light").to_json());

    Ok(())
}
