//! Tab-delimited accounting interchange (IIF) export.

use std::io::Write;

use rust_decimal::Decimal;

use crate::models::{Category, Transaction};

const BANK_ACCOUNT: &str = "Checking";
const UNKNOWN_ACCOUNT: &str = "Ask Accountant";

const HEADER: &str = "!TRNS\tTRNSID\tTRNSTYPE\tDATE\tACCNT\tNAME\tAMOUNT\tDOCNUM\tMEMO\n\
                      !SPL\tSPLID\tTRNSTYPE\tDATE\tACCNT\tNAME\tAMOUNT\tDOCNUM\tMEMO\n\
                      !ENDTRNS\n";

/// Tabs and line breaks would split a field.
fn field(raw: &str) -> String {
    raw.replace(['\t', '\r', '\n'], " ")
}

fn split_account(category: &Category) -> String {
    match category {
        Category::Uncategorized => UNKNOWN_ACCOUNT.to_string(),
        other => field(other.as_str()),
    }
}

fn amount(val: Decimal) -> String {
    let val = val.round_dp(2);
    // -0 would print as "-0.00".
    let val = if val.is_zero() { Decimal::ZERO } else { val };
    format!("{val:.2}")
}

/// One TRNS/SPL/ENDTRNS block per transaction; the split mirrors the amount.
pub fn write_iif<W: Write>(out: &mut W, transactions: &[Transaction]) -> std::io::Result<()> {
    out.write_all(HEADER.as_bytes())?;
    for t in transactions {
        let kind = if t.amount < Decimal::ZERO { "EXPENSE" } else { "DEPOSIT" };
        let date = t.date.format("%m/%d/%Y");
        let name = field(t.job_name().unwrap_or(""));
        writeln!(
            out,
            "TRNS\t\t{kind}\t{date}\t{BANK_ACCOUNT}\t{name}\t{}\t\t{}",
            amount(t.amount),
            field(&t.description)
        )?;
        writeln!(
            out,
            "SPL\t\t{kind}\t{date}\t{}\t\t{}\t\t",
            split_account(&t.category),
            amount(-t.amount)
        )?;
        writeln!(out, "ENDTRNS")?;
    }
    Ok(())
}
