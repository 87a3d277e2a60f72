use std::path::Path;

use colored::Colorize;

use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::error::{BookkeeperError, Result};
use crate::importer::{apply_import, plan_import, PlanStatus};
use crate::models::ApArKind;
use crate::schema::SchemaKind;

pub fn run(file: &str, kind: ApArKind, force: bool) -> Result<()> {
    let path = Path::new(file);
    let bytes = std::fs::read(path)?;
    // Invalid UTF-8 (e.g. Latin-1 exports) decodes to U+FFFD per byte.
    let text = String::from_utf8_lossy(&bytes);
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    let store = open_store()?;
    let mut ledger = store.load_ledger()?;
    let plan = plan_import(&ledger, &text, &source, kind)?;

    let plan = match plan.status() {
        PlanStatus::Empty => return Err(BookkeeperError::EmptyImport(source)),
        PlanStatus::AllDuplicates if !force => {
            println!(
                "All {} rows in {source} match records already in the ledger; nothing imported.",
                plan.duplicate_count
            );
            println!("Re-run with --force to import them anyway.");
            return Ok(());
        }
        PlanStatus::AllDuplicates => plan.force(),
        PlanStatus::Ready => plan,
    };

    let report = apply_import(&mut ledger, plan);
    store.save_ledger(&report.delta)?;

    let noun = match report.kind {
        SchemaKind::Transactions => "transactions",
        SchemaKind::Invoices => kind.label(),
    };
    println!("{} {noun} imported from {source}", report.imported.to_string().green());
    if report.forced {
        println!("{}", "Forced: rows matching existing records were imported again.".yellow());
    }
    println!(
        "{} skipped (duplicates), {} rejected (unreadable date or amount)",
        report.duplicate_count, report.rejected_count
    );
    Ok(())
}
