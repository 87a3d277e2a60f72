use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::error::Result;
use crate::fmt::{money, money_or_dash, percent};
use crate::models::ApArKind;
use crate::reports::{self, PeriodFilter};
use crate::settings::{check_tax_rate, load_settings};

fn net_label(label: &str, value: Decimal) -> colored::ColoredString {
    if value >= Decimal::ZERO {
        label.green().bold()
    } else {
        label.red().bold()
    }
}

pub fn dashboard(filter: PeriodFilter) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let d = reports::dashboard(&ledger, &filter);

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Amount"]);
    table.add_row(vec![Cell::new("Income"), Cell::new(money(d.income))]);
    table.add_row(vec![Cell::new("Expenses"), Cell::new(money(d.expense))]);
    table.add_row(vec![Cell::new(net_label("Net", d.net)), Cell::new(money(d.net))]);
    table.add_row(vec![Cell::new("Owner's Draws"), Cell::new(money(d.draws))]);
    table.add_row(vec![Cell::new("AR Outstanding"), Cell::new(money(d.ar_outstanding))]);
    table.add_row(vec![Cell::new("AP Outstanding"), Cell::new(money(d.ap_outstanding))]);
    println!("Dashboard ({})\n{table}", filter.label());

    if d.uncategorized > 0 {
        println!(
            "{}",
            format!("{} uncategorized transactions", d.uncategorized).yellow()
        );
    }
    Ok(())
}

pub fn transactions(filter: PeriodFilter, search: Option<&str>, limit: usize) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let register = reports::register(&ledger, &filter, search, limit);

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Category", "Job", "Rec"]);
    for t in &register.rows {
        let amount = if t.amount < Decimal::ZERO {
            money(t.amount).red()
        } else {
            money(t.amount).green()
        };
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(amount),
            Cell::new(&t.category),
            Cell::new(t.job_name().unwrap_or("")),
            Cell::new(if t.reconciled { "\u{2713}" } else { "" }),
        ]);
    }
    println!("Transactions ({})\n{table}", filter.label());
    println!("Showing {} of {}", register.rows.len(), register.total_count);
    Ok(())
}

pub fn pnl(filter: PeriodFilter) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let pnl = reports::pnl(&ledger, &filter);

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount"]);

    table.add_row(vec![Cell::new("INCOME".green().bold()), Cell::new("")]);
    for line in &pnl.income {
        table.add_row(vec![
            Cell::new(format!("  {}", line.category)),
            Cell::new(money(line.total)),
        ]);
    }
    table.add_row(vec![Cell::new("Total Income".bold()), Cell::new(money(pnl.total_income))]);
    table.add_row(vec![Cell::new(""), Cell::new("")]);

    table.add_row(vec![Cell::new("EXPENSES".red().bold()), Cell::new("")]);
    for line in &pnl.expenses {
        table.add_row(vec![
            Cell::new(format!("  {}", line.category)),
            Cell::new(money(line.total)),
        ]);
    }
    table.add_row(vec![Cell::new("Total Expenses".bold()), Cell::new(money(pnl.total_expenses))]);
    table.add_row(vec![Cell::new(""), Cell::new("")]);

    table.add_row(vec![
        Cell::new(net_label("NET PROFIT", pnl.net_profit)),
        Cell::new(money(pnl.net_profit)),
    ]);
    println!("Profit & Loss ({})\n{table}", filter.label());
    Ok(())
}

pub fn jobs(filter: PeriodFilter) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let jobs = reports::jobs(&ledger, &filter);
    if jobs.is_empty() {
        println!("No transactions with a job in {}.", filter.label());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Job", "Income", "Expenses", "Net", "Count"]);
    for job in &jobs {
        table.add_row(vec![
            Cell::new(&job.job),
            Cell::new(money(job.income)),
            Cell::new(money(job.expense)),
            Cell::new(net_label(&money(job.net), job.net)),
            Cell::new(job.count),
        ]);
    }
    println!("Job Profitability ({})\n{table}", filter.label());
    Ok(())
}

pub fn aging(kind: ApArKind, filter: PeriodFilter) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let today = chrono::Local::now().date_naive();
    let report = reports::aging(&ledger, &filter, kind, today);

    let mut summary = Table::new();
    summary.set_header(vec!["Bucket", "Items", "Amount"]);
    for bucket in &report.buckets {
        summary.add_row(vec![
            Cell::new(bucket.label),
            Cell::new(bucket.items.len()),
            Cell::new(money(bucket.total)),
        ]);
    }
    summary.add_row(vec![Cell::new("Total".bold()), Cell::new(""), Cell::new(money(report.total))]);
    println!("{} Aging ({})\n{summary}", report.kind.label(), filter.label());

    let mut detail = Table::new();
    detail.set_header(vec!["Bucket", "Party", "Number", "Date", "Amount"]);
    let mut any = false;
    for bucket in &report.buckets {
        for item in &bucket.items {
            any = true;
            detail.add_row(vec![
                Cell::new(bucket.label),
                Cell::new(&item.party),
                Cell::new(&item.number),
                Cell::new(item.date),
                Cell::new(money(item.amount)),
            ]);
        }
    }
    if any {
        println!("\n{detail}");
    }
    Ok(())
}

pub fn tax(filter: PeriodFilter, rate: Option<Decimal>) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let rate = match rate {
        Some(rate) => check_tax_rate(rate)?,
        None => load_settings().tax_rate,
    };
    let est = reports::tax_estimate(&ledger, &filter, rate);

    let mut table = Table::new();
    table.set_header(vec!["Item", "Amount"]);
    table.add_row(vec![Cell::new("Taxable Profit"), Cell::new(money(est.taxable_profit))]);
    table.add_row(vec![Cell::new("Rate"), Cell::new(percent(est.rate))]);
    table.add_row(vec![Cell::new("Estimated Tax".bold()), Cell::new(money(est.tax_due))]);
    table.add_row(vec![Cell::new("Per Quarter"), Cell::new(money_or_dash(est.quarterly))]);
    println!("Tax Estimate ({})\n{table}", filter.label());
    if est.quarterly.is_none() {
        println!("Pass --year for a quarterly estimate.");
    }
    println!("{}", "Estimate only; not a filing.".dimmed());
    Ok(())
}
