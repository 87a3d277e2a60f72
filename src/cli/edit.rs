use colored::Colorize;

use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::editor::{apply_batch, edit_transaction, TransactionEdit};
use crate::error::Result;

pub fn run(
    id: &str,
    description: Option<String>,
    category: Option<String>,
    job: Option<String>,
    notes: Option<String>,
    batch: bool,
    rule: bool,
) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let edit = TransactionEdit {
        description,
        category,
        job,
        notes,
    };
    let outcome = edit_transaction(&mut ledger, id, &edit, rule)?;
    store.save_ledger(&outcome.delta)?;

    let txn = &outcome.updated;
    println!("Updated {}: {} \u{2192} {}", txn.id, txn.description, txn.category);
    if outcome.rule_created {
        println!("Added rule: '{}' \u{2192} {}", txn.description, txn.category);
    }

    if outcome.similar.is_empty() {
        return Ok(());
    }
    let first_word = txn.description.split_whitespace().next().unwrap_or("");
    if batch {
        let delta = apply_batch(&mut ledger, &outcome.similar, &txn.category);
        store.save_ledger(&delta)?;
        println!(
            "Also updated {} similar transactions like \"{first_word}...\"",
            delta.transactions.len()
        );
    } else {
        println!(
            "{}",
            format!(
                "{} other {} transactions look like \"{first_word}...\"; re-run with --batch to update them too.",
                outcome.similar.len(),
                outcome.previous_category
            )
            .yellow()
        );
    }
    Ok(())
}
