use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::editor::{set_reconciled, toggle_reconciled};
use crate::error::{BookkeeperError, Result};
use crate::fmt::money;
use crate::normalize::clean_currency;
use crate::reports::{reconciliation, PeriodFilter};

pub fn toggle(id: &str) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let (reconciled, delta) = toggle_reconciled(&mut ledger, id)?;
    store.save_ledger(&delta)?;
    let state = if reconciled { "reconciled" } else { "not reconciled" };
    let description = ledger.transaction(id).map(|t| t.description.as_str()).unwrap_or("");
    println!("{id} ({description}) is now {state}");
    Ok(())
}

pub fn mark(filter: PeriodFilter, search: Option<&str>, reconciled: bool) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let delta = set_reconciled(&mut ledger, &filter, search, reconciled);
    store.save_ledger(&delta)?;
    let verb = if reconciled { "Marked" } else { "Unmarked" };
    println!("{verb} {} transactions in {}", delta.transactions.len(), filter.label());
    Ok(())
}

pub fn check(balance: &str, filter: PeriodFilter) -> Result<()> {
    let balance = clean_currency(balance).ok_or_else(|| BookkeeperError::InvalidValue {
        field: "balance",
        value: balance.to_string(),
    })?;
    let ledger = open_store()?.load_ledger()?;
    let rec = reconciliation(&ledger, &filter, balance);

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Bank balance"), Cell::new(money(rec.bank_balance))]);
    table.add_row(vec![
        Cell::new(format!("Cleared ({} transactions)", rec.cleared_count)),
        Cell::new(money(rec.cleared_total)),
    ]);
    table.add_row(vec![Cell::new("Difference"), Cell::new(money(rec.difference))]);
    println!("Reconciliation ({})\n{table}", filter.label());

    if rec.is_balanced() {
        println!("{}", "Balanced".green().bold());
    } else {
        println!("{}", format!("Off by {}", money(rec.difference)).red().bold());
    }
    Ok(())
}
