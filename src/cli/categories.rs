use std::collections::HashMap;

use comfy_table::{Cell, Table};

use crate::categorizer::{add_category, delete_category};
use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::error::Result;
use crate::models::{Category, LedgerDelta};

pub fn add(name: &str) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    if add_category(&mut ledger, name) {
        store.save_ledger(&LedgerDelta::rules_and_categories(&ledger))?;
        println!("Added category: {}", name.trim());
    } else {
        println!("Category already exists: {}", name.trim());
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in &ledger.transactions {
        *counts.entry(t.category.as_str()).or_default() += 1;
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Transactions", ""]);
    for name in &ledger.categories {
        let reserved = if Category::parse(name).is_sentinel() { "reserved" } else { "" };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(counts.get(name.as_str()).copied().unwrap_or(0)),
            Cell::new(reserved),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

/// Transactions keep their category name; only the list entry goes away.
pub fn delete(name: &str) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    delete_category(&mut ledger, name)?;
    store.save_ledger(&LedgerDelta::rules_and_categories(&ledger))?;
    println!("Deleted category: {name}");
    Ok(())
}
