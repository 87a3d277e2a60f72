use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::error::{BookkeeperError, Result};

pub fn run(yes: bool) -> Result<()> {
    if !yes {
        return Err(BookkeeperError::Other(
            "This deletes every transaction and AP/AR item. Re-run with --yes to confirm.".to_string(),
        ));
    }
    let store = open_store()?;
    let ledger = store.load_ledger()?;
    store.clear()?;
    println!(
        "Deleted {} transactions and {} AP/AR items",
        ledger.transactions.len(),
        ledger.items.len()
    );
    Ok(())
}
