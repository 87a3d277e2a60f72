use crate::categorizer::categorize_uncategorized;
use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::error::Result;
use crate::models::LedgerDelta;

pub fn run() -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let result = categorize_uncategorized(&mut ledger);
    store.save_ledger(&LedgerDelta {
        transactions: result.changed,
        ..Default::default()
    })?;
    println!(
        "{} categorized, {} still uncategorized",
        result.categorized, result.still_uncategorized
    );
    Ok(())
}
