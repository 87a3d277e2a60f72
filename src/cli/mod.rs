pub mod add;
pub mod categories;
pub mod categorize;
pub mod clear;
pub mod config;
pub mod edit;
pub mod export;
pub mod import;
pub mod init;
pub mod items;
pub mod reconcile;
pub mod report;
pub mod rules;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::db::{SqliteStore, DB_FILENAME};
use crate::error::{BookkeeperError, Result};
use crate::models::ApArKind;
use crate::reports::PeriodFilter;
use crate::settings::get_data_dir;

pub(crate) fn db_path() -> PathBuf {
    get_data_dir().join(DB_FILENAME)
}

/// Open the ledger database, refusing to create one outside of `init`.
pub(crate) fn open_store() -> Result<SqliteStore> {
    let path = db_path();
    if !path.exists() {
        return Err(BookkeeperError::Other(format!(
            "No ledger at {}. Run `bookkeeper init` first.",
            path.display()
        )));
    }
    SqliteStore::open(&path)
}

#[derive(Parser)]
#[command(name = "bookkeeper", version, about = "Import bank and invoice exports into a categorized ledger and report on it.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Year and/or month restriction shared by reports. Neither means all years.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct PeriodArgs {
    /// Calendar year, e.g. 2024
    #[arg(long)]
    pub year: Option<i32>,
    /// Month number 1-12
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl From<PeriodArgs> for PeriodFilter {
    fn from(args: PeriodArgs) -> Self {
        PeriodFilter::new(args.year, args.month)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    /// Accounts receivable (invoices you sent)
    Ar,
    /// Accounts payable (bills you owe)
    Ap,
}

impl From<KindArg> for ApArKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ar => ApArKind::Receivable,
            KindArg::Ap => ApArKind::Payable,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and database, seeded with default categories and rules.
    Init {
        /// Path for ledger data (default: ~/Documents/bookkeeper)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a delimited bank statement or invoice export.
    Import {
        /// Path to the CSV file
        file: String,
        /// Whether invoice-shaped files are receivables or payables
        #[arg(long, value_enum, default_value = "ar")]
        kind: KindArg,
        /// Import anyway when every row matches an existing record
        #[arg(long)]
        force: bool,
    },
    /// Enter a transaction by hand.
    Add {
        /// Date, e.g. 2024-03-07 or 03/07/2024
        #[arg(long)]
        date: String,
        #[arg(long)]
        description: String,
        /// Signed amount; negative for money out
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// Category (default: decided by rules)
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        job: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change a transaction's description, category, job, or notes.
    Edit {
        /// Transaction ID as shown by `report transactions`
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Job name; pass "" to clear
        #[arg(long)]
        job: Option<String>,
        /// Notes; pass "" to clear
        #[arg(long)]
        notes: Option<String>,
        /// Apply the new category to similar transactions too
        #[arg(long)]
        batch: bool,
        /// Create a rule from the description and new category
        #[arg(long)]
        rule: bool,
    },
    /// Re-run categorization rules on uncategorized transactions.
    Categorize,
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Manage the category list.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Mark transactions as cleared and check against a bank balance.
    Reconcile {
        #[command(subcommand)]
        command: ReconcileCommands,
    },
    /// Accounts receivable and payable items.
    Items {
        #[command(subcommand)]
        command: ItemsCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export transactions for an accounting package.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Delete every transaction and AP/AR item. Rules and categories are kept.
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show the data location and record counts.
    Status,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Append a rule: descriptions containing KEYWORD get CATEGORY.
    Add {
        keyword: String,
        category: String,
    },
    /// List rules in evaluation order.
    List,
    /// Delete the rule at a listed position.
    Delete {
        position: usize,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    Add {
        name: String,
    },
    List,
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ReconcileCommands {
    /// Flip one transaction's reconciled flag.
    Toggle {
        id: String,
    },
    /// Set the flag on every transaction in the period matching a search.
    Mark {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long)]
        search: Option<String>,
        /// Clear the flag instead of setting it
        #[arg(long)]
        unmark: bool,
    },
    /// Compare cleared transactions against a bank statement balance.
    Check {
        /// Statement ending balance, e.g. "$1,234.56"
        #[arg(long, allow_hyphen_values = true)]
        balance: String,
        #[command(flatten)]
        period: PeriodArgs,
    },
}

#[derive(Subcommand)]
pub enum ItemsCommands {
    /// Record an invoice or bill by hand.
    Add {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        party: String,
        #[arg(long, default_value = "")]
        number: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        amount: String,
    },
    /// Flip an item between paid and unpaid.
    Toggle {
        id: String,
    },
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[command(flatten)]
        period: PeriodArgs,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income, expenses, draws, net, and outstanding AR/AP.
    Dashboard {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Transaction register, newest first.
    Transactions {
        #[command(flatten)]
        period: PeriodArgs,
        /// Match description or category
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Profit & Loss by category.
    Pnl {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Profitability per job.
    Jobs {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Unpaid AR or AP by days outstanding.
    Aging {
        #[arg(long, value_enum, default_value = "ar")]
        kind: KindArg,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Estimated income tax on profit.
    Tax {
        #[command(flatten)]
        period: PeriodArgs,
        /// Override the configured rate (percent)
        #[arg(long)]
        rate: Option<Decimal>,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Write an IIF file for QuickBooks-style import.
    Iif {
        #[command(flatten)]
        period: PeriodArgs,
        /// Output path (default: <data_dir>/exports/transactions-YYYY-MM-DD.iif)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    Show,
    /// Set the default tax rate (percent).
    SetTaxRate {
        rate: Decimal,
    },
}
