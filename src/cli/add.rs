use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::editor::{add_transaction, NewTransaction};
use crate::error::Result;
use crate::fmt::money;

pub fn run(
    date: String,
    description: String,
    amount: String,
    category: Option<String>,
    job: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let input = NewTransaction {
        date,
        description,
        amount,
        category,
        job,
        notes,
    };
    let (txn, delta) = add_transaction(&mut ledger, &input)?;
    store.save_ledger(&delta)?;
    println!(
        "Added {} {} {} \u{2192} {}",
        txn.date,
        txn.description,
        money(txn.amount),
        txn.category
    );
    println!("ID: {}", txn.id);
    Ok(())
}
