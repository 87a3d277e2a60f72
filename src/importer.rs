use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::categorizer::categorize;
use crate::dedup::{dedupe_items, dedupe_transactions};
use crate::error::Result;
use crate::models::{
    new_id, ApArItem, ApArKind, ApArStatus, ImportRecord, Ledger, LedgerDelta, Rule, Transaction,
};
use crate::normalize::{clean_currency, clean_date, clean_text, NO_DESCRIPTION, UNKNOWN};
use crate::schema::{self, ColumnMap, InvoiceColumns, Schema, SchemaKind, TransactionColumns};

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A delimited file read fully into memory, headers cleaned.
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<StringRecord>,
}

pub fn read_delimited(text: &str) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.iter().map(schema::clean_header).collect();
    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        records.push(record);
    }
    Ok(RawTable { headers, records })
}

pub fn compute_checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// One data row addressed by header name.
struct Row<'a> {
    headers: &'a [String],
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    fn get(&self, column: &str) -> &'a str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.record.get(i))
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Row builder
// ---------------------------------------------------------------------------

/// Signed amount for a transaction row.
///
/// The mapped amount column wins when it holds a non-zero value. Otherwise a
/// non-zero debit becomes an outflow, else a non-zero credit an inflow. A
/// valid zero in the amount column is kept when neither side has a value.
fn resolve_amount(row: &Row, cols: &TransactionColumns) -> Option<Decimal> {
    let primary = clean_currency(row.get(&cols.amount));
    if let Some(amount) = primary.filter(|a| !a.is_zero()) {
        return Some(amount);
    }
    let debit = clean_currency(row.get(&cols.debit)).filter(|d| !d.is_zero());
    let credit = clean_currency(row.get(&cols.credit)).filter(|c| !c.is_zero());
    match (debit, credit) {
        (Some(d), _) => Some(-d.abs()),
        (None, Some(c)) => Some(c.abs()),
        (None, None) => primary,
    }
}

fn build_transaction(row: &Row, cols: &TransactionColumns, rules: &[Rule]) -> Option<Transaction> {
    let date = clean_date(row.get(&cols.date))?;
    let amount = resolve_amount(row, cols)?;
    let description = clean_text(row.get(&cols.description), NO_DESCRIPTION);
    let category = categorize(&description, rules);
    Some(Transaction {
        id: new_id("tx"),
        date,
        description,
        amount,
        category,
        job: None,
        reconciled: false,
        notes: None,
    })
}

/// "Paid" anywhere in the status text, unless it is a negation such as
/// "Unpaid" or "Not paid".
pub fn status_from_text(raw: &str) -> ApArStatus {
    let lower = raw.to_lowercase();
    if lower.contains("paid") && !lower.contains("unpaid") && !lower.contains("not paid") {
        ApArStatus::Paid
    } else {
        ApArStatus::Unpaid
    }
}

fn build_item(row: &Row, cols: &InvoiceColumns, kind: ApArKind) -> Option<ApArItem> {
    let date = clean_date(row.get(&cols.date))?;
    let amount = clean_currency(row.get(&cols.amount))?.abs();
    Some(ApArItem {
        id: new_id(kind.key()),
        kind,
        party: clean_text(row.get(&cols.party), UNKNOWN),
        number: clean_text(row.get(&cols.number), ApArItem::NO_NUMBER),
        date,
        amount,
        status: status_from_text(row.get(&cols.status)),
    })
}

// ---------------------------------------------------------------------------
// Two-phase import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Records {
    Transactions(Vec<Transaction>),
    Items(Vec<ApArItem>),
}

impl Records {
    pub fn len(&self) -> usize {
        match self {
            Self::Transactions(t) => t.len(),
            Self::Items(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dates(&self) -> Vec<NaiveDate> {
        match self {
            Self::Transactions(t) => t.iter().map(|t| t.date).collect(),
            Self::Items(i) => i.iter().map(|i| i.date).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// Nothing in the file could be parsed.
    Empty,
    /// Every parsed row is already in the ledger; import only if forced.
    AllDuplicates,
    Ready,
}

/// Proposed outcome of an import, computed without touching the ledger.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub source: String,
    pub checksum: String,
    pub kind: SchemaKind,
    pub accepted: Records,
    pub duplicates: Records,
    pub rejected_count: usize,
    pub duplicate_count: usize,
    pub forced: bool,
}

impl ImportPlan {
    pub fn status(&self) -> PlanStatus {
        if self.accepted.is_empty() && self.duplicate_count == 0 {
            PlanStatus::Empty
        } else if self.accepted.is_empty() {
            PlanStatus::AllDuplicates
        } else {
            PlanStatus::Ready
        }
    }

    pub fn force_available(&self) -> bool {
        self.status() == PlanStatus::AllDuplicates
    }

    /// Accept the full batch despite every row looking like a duplicate.
    /// Has no effect unless [`force_available`](Self::force_available).
    pub fn force(mut self) -> Self {
        if self.force_available() {
            let empty = match self.duplicates {
                Records::Transactions(_) => Records::Transactions(Vec::new()),
                Records::Items(_) => Records::Items(Vec::new()),
            };
            self.accepted = std::mem::replace(&mut self.duplicates, empty);
            self.forced = true;
        }
        self
    }
}

/// Parse `text`, build candidate records, and dedupe them against `ledger`.
///
/// Rows with an unusable date or amount are counted in `rejected_count`.
/// Invoice-shaped files become AP/AR items of `item_kind`.
pub fn plan_import(ledger: &Ledger, text: &str, source: &str, item_kind: ApArKind) -> Result<ImportPlan> {
    let table = read_delimited(text)?;
    let Schema { kind, columns } = schema::detect(&table.headers);

    let mut rejected_count = 0usize;
    let rows = table.records.iter().map(|record| Row {
        headers: &table.headers,
        record,
    });

    let (accepted, duplicates, duplicate_count) = match columns {
        ColumnMap::Transactions(cols) => {
            let mut candidates = Vec::new();
            for (i, row) in rows.enumerate() {
                match build_transaction(&row, &cols, &ledger.rules) {
                    Some(txn) => candidates.push(txn),
                    None => {
                        rejected_count += 1;
                        tracing::debug!(row = i + 2, "rejected transaction row");
                    }
                }
            }
            let outcome = dedupe_transactions(&ledger.transactions, candidates);
            if outcome.all_duplicates() {
                tracing::debug!(source, "every transaction row matches the ledger");
            }
            let count = outcome.duplicates.len();
            (
                Records::Transactions(outcome.kept),
                Records::Transactions(outcome.duplicates),
                count,
            )
        }
        ColumnMap::Invoices(cols) => {
            let mut candidates = Vec::new();
            for (i, row) in rows.enumerate() {
                match build_item(&row, &cols, item_kind) {
                    Some(item) => candidates.push(item),
                    None => {
                        rejected_count += 1;
                        tracing::debug!(row = i + 2, "rejected invoice row");
                    }
                }
            }
            let outcome = dedupe_items(&ledger.items, candidates);
            if outcome.all_duplicates() {
                tracing::debug!(source, "every invoice row matches the ledger");
            }
            let count = outcome.duplicates.len();
            (Records::Items(outcome.kept), Records::Items(outcome.duplicates), count)
        }
    };

    let plan = ImportPlan {
        source: source.to_string(),
        checksum: compute_checksum(text),
        kind,
        accepted,
        duplicates,
        rejected_count,
        duplicate_count,
        forced: false,
    };
    tracing::debug!(
        source,
        kind = kind.key(),
        accepted = plan.accepted.len(),
        duplicates = plan.duplicate_count,
        rejected = plan.rejected_count,
        "planned import"
    );
    Ok(plan)
}

pub struct ImportReport {
    pub kind: SchemaKind,
    pub imported: usize,
    pub rejected_count: usize,
    pub duplicate_count: usize,
    pub forced: bool,
    pub delta: LedgerDelta,
}

/// Commit a plan's accepted records to the ledger and describe what to persist.
pub fn apply_import(ledger: &mut Ledger, plan: ImportPlan) -> ImportReport {
    let dates = plan.accepted.dates();
    let record = ImportRecord {
        filename: plan.source.clone(),
        kind: plan.kind.key().to_string(),
        record_count: plan.accepted.len(),
        date_range_start: dates.iter().min().copied(),
        date_range_end: dates.iter().max().copied(),
        checksum: plan.checksum.clone(),
        forced: plan.forced,
    };

    let imported = plan.accepted.len();
    let mut delta = LedgerDelta {
        import: Some(record),
        ..Default::default()
    };
    match plan.accepted {
        Records::Transactions(txns) => {
            ledger.transactions.extend(txns.iter().cloned());
            delta.transactions = txns;
        }
        Records::Items(items) => {
            ledger.items.extend(items.iter().cloned());
            delta.items = items;
        }
    }

    if plan.forced {
        tracing::warn!(source = %plan.source, imported, "forced import of rows that matched existing records");
    }
    tracing::info!(
        source = %plan.source,
        imported,
        duplicates = plan.duplicate_count,
        rejected = plan.rejected_count,
        "applied import"
    );

    ImportReport {
        kind: plan.kind,
        imported,
        rejected_count: plan.rejected_count,
        duplicate_count: plan.duplicate_count,
        forced: plan.forced,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use rust_decimal_macros::dec;

    const BANK_CSV: &str = "\
Date,Description,Amount,Balance
01/15/2025,HOME DEPOT #4521,-100.00,900.00
01/16/2025,CLIENT PAYMENT,\"2,500.00\",3400.00
01/17/2025,SPEEDWAY 0123,-42.10,3357.90
";

    fn plan(ledger: &Ledger, text: &str) -> ImportPlan {
        plan_import(ledger, text, "stmt.csv", ApArKind::Receivable).unwrap()
    }

    fn transactions(records: &Records) -> &[Transaction] {
        match records {
            Records::Transactions(t) => t,
            Records::Items(_) => panic!("expected transactions"),
        }
    }

    fn items(records: &Records) -> &[ApArItem] {
        match records {
            Records::Items(i) => i,
            Records::Transactions(_) => panic!("expected items"),
        }
    }

    #[test]
    fn test_plan_builds_categorized_transactions() {
        let ledger = Ledger {
            rules: vec![Rule::new("Home Depot", "Materials")],
            ..Default::default()
        };
        let plan = plan(&ledger, BANK_CSV);
        assert_eq!(plan.kind, SchemaKind::Transactions);
        assert_eq!(plan.status(), PlanStatus::Ready);
        let txns = transactions(&plan.accepted);
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].amount, dec!(-100.00));
        assert_eq!(txns[0].category, Category::parse("Materials"));
        assert_eq!(txns[0].date.to_string(), "2025-01-15");
        assert_eq!(txns[1].amount, dec!(2500.00));
        assert_eq!(txns[1].category, Category::Uncategorized);
        assert!(txns.iter().all(|t| !t.reconciled));
    }

    #[test]
    fn test_debit_credit_columns() {
        let text = "\
Date,Memo,Debit,Credit
2024-02-01,RENT,250.00,
2024-02-02,REFUND,,75.25
2024-02-03,NOTHING,,
";
        let plan = plan(&Ledger::default(), text);
        let txns = transactions(&plan.accepted);
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount, dec!(-250.00));
        assert_eq!(txns[1].amount, dec!(75.25));
        assert_eq!(plan.rejected_count, 1);
    }

    #[test]
    fn test_bad_rows_are_rejected_and_counted() {
        let text = "\
Date,Description,Amount
not a date,COFFEE,-3.00
2024-01-05,PARENS,(500)
2024-01-06,,12.00
";
        let plan = plan(&Ledger::default(), text);
        assert_eq!(plan.rejected_count, 2);
        let txns = transactions(&plan.accepted);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "No Description");
    }

    #[test]
    fn test_reimport_is_all_duplicates_without_forcing() {
        let mut ledger = Ledger::default();
        let first = plan(&ledger, BANK_CSV);
        apply_import(&mut ledger, first);
        assert_eq!(ledger.transactions.len(), 3);

        let second = plan(&ledger, BANK_CSV);
        assert_eq!(second.accepted.len(), 0);
        assert_eq!(second.duplicate_count, 3);
        assert!(!second.forced);
        assert_eq!(second.status(), PlanStatus::AllDuplicates);
    }

    #[test]
    fn test_force_only_offered_on_second_pass() {
        let text = "Date,Description,Amount\n2024-03-01,WIRE FEE,-15.00\n";
        let mut ledger = Ledger::default();

        let first = plan(&ledger, text);
        assert!(!first.force_available());
        let report = apply_import(&mut ledger, first.force());
        assert!(!report.forced);
        assert_eq!(report.imported, 1);

        let second = plan(&ledger, text);
        assert!(second.force_available());
        let forced = second.force();
        assert!(forced.forced);
        assert_eq!(forced.accepted.len(), 1);
        assert_eq!(forced.duplicate_count, 1);
        let report = apply_import(&mut ledger, forced);
        assert!(report.forced);
        assert_eq!(ledger.transactions.len(), 2);
        assert!(report.delta.import.as_ref().unwrap().forced);
    }

    #[test]
    fn test_empty_file_is_distinct_from_duplicates() {
        let plan = plan(&Ledger::default(), "Date,Description,Amount\nbad,x,y\n");
        assert_eq!(plan.status(), PlanStatus::Empty);
        assert_eq!(plan.rejected_count, 1);
        assert!(!plan.force_available());
    }

    #[test]
    fn test_invoice_import() {
        let text = "\
Date,Customer,Invoice #,Grand Total,Invoice Status
2024-01-10,Acme Corp,INV-100,\"$1,200.00\",Unpaid
2024-01-12,Globex,INV-101,-300.00,Paid
2024-01-13,,,50.00,
bad date,Initech,INV-103,10.00,Paid
";
        let plan = plan_import(&Ledger::default(), text, "invoices.csv", ApArKind::Receivable).unwrap();
        assert_eq!(plan.kind, SchemaKind::Invoices);
        assert_eq!(plan.rejected_count, 1);
        let items = items(&plan.accepted);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].amount, dec!(1200.00));
        assert_eq!(items[0].status, ApArStatus::Unpaid);
        assert_eq!(items[1].amount, dec!(300.00));
        assert_eq!(items[1].status, ApArStatus::Paid);
        assert_eq!(items[2].party, "Unknown");
        assert_eq!(items[2].number, "N/A");
        assert!(items.iter().all(|i| i.kind == ApArKind::Receivable));
    }

    #[test]
    fn test_invoice_reimport_dedupes_on_number() {
        let text = "Date,Customer,Invoice #,Grand Total\n2024-01-10,Acme,INV-1,100\n";
        let mut ledger = Ledger::default();
        let first = plan_import(&ledger, text, "a.csv", ApArKind::Payable).unwrap();
        apply_import(&mut ledger, first);
        let second = plan_import(&ledger, text, "a.csv", ApArKind::Payable).unwrap();
        assert_eq!(second.duplicate_count, 1);
        assert!(second.force_available());
    }

    #[test]
    fn test_status_from_text() {
        assert_eq!(status_from_text("Paid"), ApArStatus::Paid);
        assert_eq!(status_from_text("PAID IN FULL"), ApArStatus::Paid);
        assert_eq!(status_from_text("Partially Paid"), ApArStatus::Paid);
        assert_eq!(status_from_text("Unpaid"), ApArStatus::Unpaid);
        assert_eq!(status_from_text("Not Paid"), ApArStatus::Unpaid);
        assert_eq!(status_from_text(""), ApArStatus::Unpaid);
    }

    #[test]
    fn test_apply_records_import_history() {
        let mut ledger = Ledger::default();
        let p = plan(&ledger, BANK_CSV);
        let checksum = p.checksum.clone();
        let report = apply_import(&mut ledger, p);
        let record = report.delta.import.unwrap();
        assert_eq!(record.record_count, 3);
        assert_eq!(record.checksum, checksum);
        assert_eq!(record.date_range_start.unwrap().to_string(), "2025-01-15");
        assert_eq!(record.date_range_end.unwrap().to_string(), "2025-01-17");
        assert_eq!(report.delta.transactions.len(), 3);
    }

    #[test]
    fn test_quoted_headers_tolerated() {
        let text = "\"Date\",\"Description\",\"Amount\"\n2024-01-05,Coffee,-4.50\n";
        let plan = plan(&Ledger::default(), text);
        assert_eq!(plan.accepted.len(), 1);
    }

    #[test]
    fn test_out_of_range_amounts_are_rejected_and_reports_stay_total() {
        let text = "\
Date,Description,Amount
01/05/2024,HUGE ONE,79228162514264337593543950335
01/06/2024,HUGE TWO,79228162514264337593543950335
01/07/2024,COFFEE,-4.50
";
        let mut ledger = Ledger::default();
        let plan = plan(&ledger, text);
        assert_eq!(plan.rejected_count, 2);
        assert_eq!(transactions(&plan.accepted).len(), 1);
        apply_import(&mut ledger, plan);

        let filter = crate::reports::PeriodFilter::new(Some(2024), None);
        let d = crate::reports::dashboard(&ledger, &filter);
        assert_eq!(d.expense, dec!(4.50));
        assert_eq!(d.net, dec!(-4.50));
    }
}
