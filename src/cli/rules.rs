use comfy_table::{Cell, Table};

use crate::categorizer::{add_rule, delete_rule};
use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::error::Result;
use crate::models::LedgerDelta;

pub fn add(keyword: &str, category: &str) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    if !add_rule(&mut ledger, keyword, category)? {
        println!("Rule already exists: '{}' \u{2192} {}", keyword.trim(), category.trim());
        return Ok(());
    }
    store.save_ledger(&LedgerDelta::rules_and_categories(&ledger))?;
    println!("Added rule: '{}' \u{2192} {}", keyword.trim(), category.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let mut table = Table::new();
    table.set_header(vec!["#", "Keyword", "Category"]);
    for (i, rule) in ledger.rules.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(&rule.keyword), Cell::new(&rule.category)]);
    }
    println!("Rules (first match wins)\n{table}");
    Ok(())
}

pub fn delete(position: usize) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let removed = delete_rule(&mut ledger, position)?;
    store.save_ledger(&LedgerDelta::rules_and_categories(&ledger))?;
    println!("Deleted rule {position}: '{}' \u{2192} {}", removed.keyword, removed.category);
    Ok(())
}
