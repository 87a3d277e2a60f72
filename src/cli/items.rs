use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::editor::{add_item, toggle_item_status, NewItem};
use crate::error::Result;
use crate::fmt::money;
use crate::models::{ApArKind, ApArStatus};
use crate::reports::PeriodFilter;

pub fn add(kind: ApArKind, party: String, number: String, date: String, amount: String) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let input = NewItem {
        kind,
        party,
        number,
        date,
        amount,
    };
    let (item, delta) = add_item(&mut ledger, &input)?;
    store.save_ledger(&delta)?;
    println!(
        "Added {} {} for {} ({}, {})",
        kind.key().to_uppercase(),
        item.number,
        item.party,
        money(item.amount),
        item.date
    );
    println!("ID: {}", item.id);
    Ok(())
}

pub fn toggle(id: &str) -> Result<()> {
    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let (status, delta) = toggle_item_status(&mut ledger, id)?;
    store.save_ledger(&delta)?;
    println!("{id} is now {}", status.key());
    Ok(())
}

pub fn list(kind: Option<ApArKind>, filter: PeriodFilter) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Type", "Party", "Number", "Date", "Amount", "Status"]);
    let mut count = 0usize;
    for item in ledger
        .items
        .iter()
        .filter(|i| kind.map_or(true, |k| i.kind == k) && filter.matches(i.date))
    {
        count += 1;
        let status = match item.status {
            ApArStatus::Paid => item.status.key().green(),
            ApArStatus::Unpaid => item.status.key().yellow(),
        };
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(item.kind.key().to_uppercase()),
            Cell::new(&item.party),
            Cell::new(&item.number),
            Cell::new(item.date),
            Cell::new(money(item.amount)),
            Cell::new(status),
        ]);
    }
    println!("AP/AR Items ({})\n{table}", filter.label());
    println!("{count} items");
    Ok(())
}
