use std::path::PathBuf;

use crate::db::{seed_defaults, SqliteStore, DB_FILENAME};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let store = SqliteStore::open(&resolved.join(DB_FILENAME))?;
    let seeded = seed_defaults(
        store.connection(),
        &settings.default_categories,
        &settings.default_rules,
    )?;

    println!("Initialized bookkeeper at {}", resolved.display());
    if seeded {
        println!(
            "Seeded {} categories and {} rules",
            settings.default_categories.len(),
            settings.default_rules.len()
        );
    }
    Ok(())
}
