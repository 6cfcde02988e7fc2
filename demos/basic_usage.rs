//! Basic usage of a write-through settings store
//!
//! Run with: `RUST_LOG=debug cargo run --example basic_usage`

use serde_json::json;
use tabset::{Settings, SettingsRegistry, SqliteStorage, StoreConfig, TableColumns};

fn main() -> tabset::Result<()> {
    env_logger::init();

    let dir = std::env::temp_dir().join("tabset-demo");
    std::fs::create_dir_all(&dir).map_err(|e| tabset::Error::Config(e.to_string()))?;

    let storage = SqliteStorage::open(dir.join("settings.db"))?;
    storage.ensure_table("settings", &TableColumns::default())?;

    let registry = SettingsRegistry::builder(storage)
        .with_store(StoreConfig::builder("settings").build())
        .build()?;
    let settings = registry.store("settings")?;

    settings.events().on_change(|name, old, new| {
        println!("  changed {name}: {old:?} -> {new:?}");
    });

    println!("Loaded {} settings", settings.len());

    settings
        .set("ui.theme", "dark")?
        .set("ui.font_size", 14)?
        .set_temporary("session.started", true)?;

    if !settings.contains("mail.hosts") {
        settings
            .append("mail.hosts", "mx1.example.org")?
            .append("mail.hosts", "mx2.example.org")?;
    }

    let theme = settings.get_setting("ui.theme", "light");
    let hosts: Vec<String> = settings.get_as("mail.hosts")?.unwrap_or_default();
    println!("Theme: {}", theme.to_json());
    println!("Mail hosts: {hosts:?}");
    println!("Language: {}", settings.get_setting("ui.language", json!("en")).to_json());

    settings.remove_setting("session.started", true)?;
    println!("Settings now: {:#?}", settings.settings());

    Ok(())
}
