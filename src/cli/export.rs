use std::io::BufWriter;
use std::path::PathBuf;

use crate::cli::open_store;
use crate::db::LedgerStore;
use crate::error::Result;
use crate::export::write_iif;
use crate::models::Transaction;
use crate::reports::PeriodFilter;
use crate::settings::get_data_dir;

fn default_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir().join("exports").join(format!("transactions-{date}.iif"))
}

pub fn iif(filter: PeriodFilter, output: Option<String>) -> Result<()> {
    let ledger = open_store()?.load_ledger()?;
    let transactions: Vec<Transaction> = filter.transactions(&ledger).cloned().collect();

    let path = output.map(PathBuf::from).unwrap_or_else(default_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(std::fs::File::create(&path)?);
    write_iif(&mut out, &transactions)?;
    std::io::Write::flush(&mut out)?;

    tracing::info!(path = %path.display(), count = transactions.len(), "wrote IIF export");
    println!("Wrote {} transactions to {}", transactions.len(), path.display());
    Ok(())
}
