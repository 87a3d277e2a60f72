use crate::cli::db_path;
use crate::db::{LedgerStore, SqliteStore};
use crate::error::Result;
use crate::models::Category;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `bookkeeper init` to set up.");
        return Ok(());
    }

    let store = SqliteStore::open(&db_path)?;
    let ledger = store.load_ledger()?;
    let uncategorized = ledger
        .transactions
        .iter()
        .filter(|t| t.category == Category::Uncategorized)
        .count();
    let unpaid = ledger.items.iter().filter(|i| i.is_unpaid()).count();

    println!();
    println!("Transactions:   {}", ledger.transactions.len());
    println!("Uncategorized:  {uncategorized}");
    println!("AP/AR items:    {} ({unpaid} unpaid)", ledger.items.len());
    println!("Rules:          {}", ledger.rules.len());
    println!("Categories:     {}", ledger.categories.len());
    println!("Imports:        {}", store.import_history()?.len());
    if let Some((filename, when)) = store.last_import()? {
        println!("Last import:    {filename} ({when})");
    }
    Ok(())
}
