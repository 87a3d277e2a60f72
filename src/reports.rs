use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::models::{ApArItem, ApArKind, Category, Ledger, Transaction};

// ---------------------------------------------------------------------------
// Period filter
// ---------------------------------------------------------------------------

/// Optional year and/or month restriction. Both `None` means every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl PeriodFilter {
    pub fn new(year: Option<i32>, month: Option<u32>) -> Self {
        Self { year, month }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.year.map_or(true, |y| date.year() == y) && self.month.map_or(true, |m| date.month() == m)
    }

    pub fn spans_all_years(&self) -> bool {
        self.year.is_none()
    }

    pub fn label(&self) -> String {
        match (self.year, self.month) {
            (Some(y), Some(m)) => format!("{y}-{m:02}"),
            (Some(y), None) => y.to_string(),
            (None, Some(m)) => format!("month {m}, all years"),
            (None, None) => "all years".to_string(),
        }
    }

    pub fn transactions<'a>(&self, ledger: &'a Ledger) -> impl Iterator<Item = &'a Transaction> + 'a {
        let filter = *self;
        ledger.transactions.iter().filter(move |t| filter.matches(t.date))
    }

    pub fn items<'a>(&self, ledger: &'a Ledger, kind: ApArKind) -> impl Iterator<Item = &'a ApArItem> + 'a {
        let filter = *self;
        ledger
            .items
            .iter()
            .filter(move |i| i.kind == kind && filter.matches(i.date))
    }
}

// ---------------------------------------------------------------------------
// Category exclusion policy
// ---------------------------------------------------------------------------

fn income_of(t: &Transaction) -> Decimal {
    if t.amount > Decimal::ZERO && t.category != Category::Transfer {
        t.amount
    } else {
        Decimal::ZERO
    }
}

fn expense_of(t: &Transaction) -> Decimal {
    if t.amount < Decimal::ZERO && !matches!(t.category, Category::Transfer | Category::OwnersDraw) {
        t.amount.abs()
    } else {
        Decimal::ZERO
    }
}

fn draw_of(t: &Transaction) -> Decimal {
    if t.amount < Decimal::ZERO && t.category == Category::OwnersDraw {
        t.amount.abs()
    } else {
        Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub income: Decimal,
    pub expense: Decimal,
    /// Shown alongside, never subtracted from `net`.
    pub draws: Decimal,
    pub net: Decimal,
    pub ar_outstanding: Decimal,
    pub ap_outstanding: Decimal,
    pub uncategorized: usize,
}

fn outstanding(ledger: &Ledger, filter: &PeriodFilter, kind: ApArKind) -> Decimal {
    filter
        .items(ledger, kind)
        .filter(|i| i.is_unpaid())
        .map(|i| i.amount)
        .sum()
}

pub fn dashboard(ledger: &Ledger, filter: &PeriodFilter) -> Dashboard {
    let mut d = Dashboard::default();
    for t in filter.transactions(ledger) {
        d.income += income_of(t);
        d.expense += expense_of(t);
        d.draws += draw_of(t);
        if t.category == Category::Uncategorized {
            d.uncategorized += 1;
        }
    }
    d.net = d.income - d.expense;
    d.ar_outstanding = outstanding(ledger, filter, ApArKind::Receivable);
    d.ap_outstanding = outstanding(ledger, filter, ApArKind::Payable);
    d
}

// ---------------------------------------------------------------------------
// P&L
// ---------------------------------------------------------------------------

pub struct PnlLine {
    pub category: String,
    pub total: Decimal,
}

pub struct PnlReport {
    pub income: Vec<PnlLine>,
    /// Totals are magnitudes.
    pub expenses: Vec<PnlLine>,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
}

fn to_lines(map: BTreeMap<String, Decimal>) -> Vec<PnlLine> {
    map.into_iter()
        .map(|(category, total)| PnlLine { category, total })
        .collect()
}

pub fn pnl(ledger: &Ledger, filter: &PeriodFilter) -> PnlReport {
    let mut income: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut expenses: BTreeMap<String, Decimal> = BTreeMap::new();

    for t in filter.transactions(ledger) {
        if t.category == Category::Transfer {
            continue;
        }
        if t.amount >= Decimal::ZERO {
            *income.entry(t.category.to_string()).or_default() += t.amount;
        } else if t.category != Category::OwnersDraw {
            *expenses.entry(t.category.to_string()).or_default() += t.amount.abs();
        }
    }

    let total_income: Decimal = income.values().copied().sum();
    let total_expenses: Decimal = expenses.values().copied().sum();
    PnlReport {
        income: to_lines(income),
        expenses: to_lines(expenses),
        total_income,
        total_expenses,
        net_profit: total_income - total_expenses,
    }
}

// ---------------------------------------------------------------------------
// Job profitability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub job: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub count: usize,
}

/// Per-job totals over transactions with a non-blank job, sorted by name.
/// `net` is the plain signed sum; no category exclusions apply.
pub fn jobs(ledger: &Ledger, filter: &PeriodFilter) -> Vec<JobSummary> {
    let mut by_job: BTreeMap<String, JobSummary> = BTreeMap::new();
    for t in filter.transactions(ledger) {
        let Some(job) = t.job_name() else { continue };
        let entry = by_job.entry(job.to_string()).or_insert_with(|| JobSummary {
            job: job.to_string(),
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            net: Decimal::ZERO,
            count: 0,
        });
        if t.amount >= Decimal::ZERO {
            entry.income += t.amount;
        } else {
            entry.expense += t.amount.abs();
        }
        entry.net += t.amount;
        entry.count += 1;
    }
    by_job.into_values().collect()
}

// ---------------------------------------------------------------------------
// Aging
// ---------------------------------------------------------------------------

pub const AGING_BUCKETS: [&str; 5] = ["Current", "1-30", "31-60", "61-90", "90+"];

fn bucket_index(days_overdue: i64) -> usize {
    match days_overdue {
        i64::MIN..=0 => 0,
        1..=30 => 1,
        31..=60 => 2,
        61..=90 => 3,
        _ => 4,
    }
}

pub struct AgingBucket {
    pub label: &'static str,
    pub items: Vec<ApArItem>,
    pub total: Decimal,
}

pub struct AgingReport {
    pub kind: ApArKind,
    pub buckets: Vec<AgingBucket>,
    pub total: Decimal,
}

/// Unpaid items of `kind`, bucketed by whole days since their date.
pub fn aging(ledger: &Ledger, filter: &PeriodFilter, kind: ApArKind, today: NaiveDate) -> AgingReport {
    let mut buckets: Vec<AgingBucket> = AGING_BUCKETS
        .into_iter()
        .map(|label| AgingBucket {
            label,
            items: Vec::new(),
            total: Decimal::ZERO,
        })
        .collect();

    for item in filter.items(ledger, kind).filter(|i| i.is_unpaid()) {
        let days = (today - item.date).num_days();
        let bucket = &mut buckets[bucket_index(days)];
        bucket.total += item.amount;
        bucket.items.push(item.clone());
    }

    let total = buckets.iter().map(|b| b.total).sum();
    AgingReport { kind, buckets, total }
}

// ---------------------------------------------------------------------------
// Tax estimate
// ---------------------------------------------------------------------------

pub struct TaxEstimate {
    pub taxable_profit: Decimal,
    pub rate: Decimal,
    pub tax_due: Decimal,
    /// `None` when the filter spans all years.
    pub quarterly: Option<Decimal>,
}

pub fn tax_estimate(ledger: &Ledger, filter: &PeriodFilter, rate: Decimal) -> TaxEstimate {
    let taxable_profit: Decimal = filter
        .transactions(ledger)
        .filter(|t| t.category != Category::Transfer)
        .filter(|t| !(t.amount < Decimal::ZERO && t.category == Category::OwnersDraw))
        .map(|t| t.amount)
        .sum();
    let tax_due = (taxable_profit * rate / Decimal::ONE_HUNDRED).max(Decimal::ZERO);
    let quarterly = (!filter.spans_all_years()).then(|| tax_due / Decimal::from(4));
    TaxEstimate {
        taxable_profit,
        rate,
        tax_due,
        quarterly,
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

pub struct Reconciliation {
    pub cleared_total: Decimal,
    pub cleared_count: usize,
    pub bank_balance: Decimal,
    pub difference: Decimal,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.difference.abs() < Decimal::new(1, 2)
    }
}

pub fn reconciliation(ledger: &Ledger, filter: &PeriodFilter, bank_balance: Decimal) -> Reconciliation {
    let cleared: Vec<&Transaction> = filter.transactions(ledger).filter(|t| t.reconciled).collect();
    let cleared_total: Decimal = cleared.iter().map(|t| t.amount).sum();
    Reconciliation {
        cleared_total,
        cleared_count: cleared.len(),
        bank_balance,
        difference: bank_balance - cleared_total,
    }
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

pub struct Register {
    pub rows: Vec<Transaction>,
    /// Matches before the display limit was applied.
    pub total_count: usize,
}

/// Case-insensitive match on description or category.
pub fn matches_search(t: &Transaction, search: Option<&str>) -> bool {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        None => true,
        Some(s) => {
            let needle = s.to_lowercase();
            t.description.to_lowercase().contains(&needle) || t.category.as_str().to_lowercase().contains(&needle)
        }
    }
}

/// Filtered transactions, newest first, truncated to `limit`.
pub fn register(ledger: &Ledger, filter: &PeriodFilter, search: Option<&str>, limit: usize) -> Register {
    let mut rows: Vec<Transaction> = filter
        .transactions(ledger)
        .filter(|t| matches_search(t, search))
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    let total_count = rows.len();
    rows.truncate(limit);
    Register { rows, total_count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApArStatus;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn txn(d: &str, amount: Decimal, category: &str) -> Transaction {
        Transaction {
            id: format!("tx-{d}-{amount}"),
            date: date(d),
            description: format!("{category} entry"),
            amount,
            category: Category::parse(category),
            job: None,
            reconciled: false,
            notes: None,
        }
    }

    fn item(kind: ApArKind, d: &str, amount: Decimal, status: ApArStatus) -> ApArItem {
        ApArItem {
            id: format!("{}-{d}", kind.key()),
            kind,
            party: "Acme".into(),
            number: format!("N-{d}"),
            date: date(d),
            amount,
            status,
        }
    }

    fn scenario() -> Ledger {
        Ledger {
            transactions: vec![
                txn("2024-01-05", dec!(500), "Income"),
                txn("2024-01-10", dec!(-120), "Utilities"),
                txn("2024-01-15", dec!(-200), "Owner's Draw"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_dashboard_scenario() {
        let d = dashboard(&scenario(), &PeriodFilter::default());
        assert_eq!(d.income, dec!(500));
        assert_eq!(d.expense, dec!(120));
        assert_eq!(d.draws, dec!(200));
        assert_eq!(d.net, dec!(380));
    }

    #[test]
    fn test_empty_ledger_is_all_zero() {
        let ledger = Ledger::default();
        let filter = PeriodFilter::default();
        let d = dashboard(&ledger, &filter);
        assert_eq!(d, Dashboard::default());
        assert_eq!(d.net, Decimal::ZERO);
        let p = pnl(&ledger, &filter);
        assert!(p.income.is_empty() && p.expenses.is_empty());
        assert_eq!(p.net_profit, Decimal::ZERO);
        let a = aging(&ledger, &filter, ApArKind::Receivable, date("2024-01-01"));
        assert_eq!(a.buckets.len(), 5);
        assert!(a.buckets.iter().all(|b| b.items.is_empty()));
    }

    #[test]
    fn test_transfers_excluded_everywhere() {
        let mut ledger = scenario();
        ledger.transactions.push(txn("2024-01-20", dec!(1000), "Transfer"));
        ledger.transactions.push(txn("2024-01-21", dec!(-1000), "Transfer"));
        let d = dashboard(&ledger, &PeriodFilter::default());
        assert_eq!(d.income, dec!(500));
        assert_eq!(d.expense, dec!(120));
        let p = pnl(&ledger, &PeriodFilter::default());
        assert!(p.income.iter().all(|l| l.category != "Transfer"));
        assert!(p.expenses.iter().all(|l| l.category != "Transfer"));
    }

    #[test]
    fn test_net_matches_pnl_for_filtered_subsets() {
        let mut ledger = scenario();
        ledger.transactions.push(txn("2024-02-01", dec!(75.25), "Income"));
        ledger.transactions.push(txn("2024-02-03", dec!(-10.10), "Supplies"));
        ledger.transactions.push(txn("2023-12-31", dec!(-5), "Supplies"));
        for filter in [
            PeriodFilter::default(),
            PeriodFilter::new(Some(2024), None),
            PeriodFilter::new(Some(2024), Some(2)),
            PeriodFilter::new(Some(2022), None),
        ] {
            let d = dashboard(&ledger, &filter);
            let p = pnl(&ledger, &filter);
            assert_eq!(d.net, d.income - d.expense);
            assert_eq!(d.net, p.net_profit);
        }
    }

    #[test]
    fn test_pnl_lines_sorted_and_magnitudes() {
        let ledger = Ledger {
            transactions: vec![
                txn("2024-01-01", dec!(-30), "Utilities"),
                txn("2024-01-02", dec!(-20), "Insurance"),
                txn("2024-01-03", dec!(-5), "Utilities"),
                txn("2024-01-04", dec!(100), "Sales"),
            ],
            ..Default::default()
        };
        let p = pnl(&ledger, &PeriodFilter::default());
        let names: Vec<&str> = p.expenses.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(names, vec!["Insurance", "Utilities"]);
        assert_eq!(p.expenses[1].total, dec!(35));
        assert_eq!(p.total_expenses, dec!(55));
        assert_eq!(p.net_profit, dec!(45));
    }

    #[test]
    fn test_period_filter() {
        let f = PeriodFilter::new(Some(2024), Some(3));
        assert!(f.matches(date("2024-03-31")));
        assert!(!f.matches(date("2024-04-01")));
        assert!(!f.matches(date("2023-03-01")));
        let month_only = PeriodFilter::new(None, Some(3));
        assert!(month_only.matches(date("2019-03-10")));
        assert!(month_only.spans_all_years());
        assert_eq!(f.label(), "2024-03");
    }

    #[test]
    fn test_jobs_group_and_skip_blank() {
        let mut a = txn("2024-01-01", dec!(1000), "Sales");
        a.job = Some("Smith Remodel".into());
        let mut b = txn("2024-01-02", dec!(-400), "Materials");
        b.job = Some(" Smith Remodel ".into());
        let mut c = txn("2024-01-03", dec!(-50), "Materials");
        c.job = Some("  ".into());
        let mut d = txn("2024-01-04", dec!(200), "Sales");
        d.job = Some("Avery Deck".into());
        let ledger = Ledger {
            transactions: vec![a, b, c, d],
            ..Default::default()
        };
        let jobs = jobs(&ledger, &PeriodFilter::default());
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job, "Avery Deck");
        assert_eq!(jobs[1].net, dec!(600));
        assert_eq!(jobs[1].expense, dec!(400));
        assert_eq!(jobs[1].count, 2);
    }

    #[test]
    fn test_aging_buckets_partition_unpaid() {
        let today = date("2024-06-30");
        let ledger = Ledger {
            items: vec![
                item(ApArKind::Receivable, "2024-07-05", dec!(10), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-06-30", dec!(20), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-06-29", dec!(30), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-05-31", dec!(40), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-05-30", dec!(50), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-04-01", dec!(60), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-01-01", dec!(70), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-01-02", dec!(999), ApArStatus::Paid),
                item(ApArKind::Payable, "2024-01-03", dec!(888), ApArStatus::Unpaid),
            ],
            ..Default::default()
        };
        let report = aging(&ledger, &PeriodFilter::default(), ApArKind::Receivable, today);
        let counts: Vec<usize> = report.buckets.iter().map(|b| b.items.len()).collect();
        // 0 days is current, 30 days is 1-30, 31 days is 31-60, 90 days is 61-90
        assert_eq!(counts, vec![2, 2, 1, 1, 1]);
        assert_eq!(report.buckets[0].total, dec!(30));
        assert_eq!(report.total, dec!(280));
        let bucket_sum: Decimal = report.buckets.iter().map(|b| b.total).sum();
        assert_eq!(bucket_sum, outstanding(&ledger, &PeriodFilter::default(), ApArKind::Receivable));
    }

    #[test]
    fn test_outstanding_by_kind() {
        let ledger = Ledger {
            items: vec![
                item(ApArKind::Receivable, "2024-01-01", dec!(100), ApArStatus::Unpaid),
                item(ApArKind::Receivable, "2024-01-02", dec!(50), ApArStatus::Paid),
                item(ApArKind::Payable, "2024-01-03", dec!(25), ApArStatus::Unpaid),
            ],
            ..Default::default()
        };
        let d = dashboard(&ledger, &PeriodFilter::default());
        assert_eq!(d.ar_outstanding, dec!(100));
        assert_eq!(d.ap_outstanding, dec!(25));
    }

    #[test]
    fn test_tax_estimate() {
        let mut ledger = scenario();
        ledger.transactions.push(txn("2024-03-01", dec!(300), "Transfer"));
        let year = tax_estimate(&ledger, &PeriodFilter::new(Some(2024), None), dec!(25));
        assert_eq!(year.taxable_profit, dec!(380));
        assert_eq!(year.tax_due, dec!(95));
        assert_eq!(year.quarterly, Some(dec!(23.75)));

        let all = tax_estimate(&ledger, &PeriodFilter::default(), dec!(25));
        assert_eq!(all.quarterly, None);
    }

    #[test]
    fn test_tax_never_negative() {
        let ledger = Ledger {
            transactions: vec![txn("2024-01-01", dec!(-500), "Rent")],
            ..Default::default()
        };
        let t = tax_estimate(&ledger, &PeriodFilter::new(Some(2024), None), dec!(30));
        assert_eq!(t.taxable_profit, dec!(-500));
        assert_eq!(t.tax_due, Decimal::ZERO);
        assert_eq!(t.quarterly, Some(Decimal::ZERO));
    }

    #[test]
    fn test_reconciliation_tolerance() {
        let mut a = txn("2024-01-01", dec!(1200.00), "Sales");
        a.reconciled = true;
        let mut b = txn("2024-01-02", dec!(-200.00), "Rent");
        b.reconciled = true;
        let c = txn("2024-01-03", dec!(-99), "Rent");
        let ledger = Ledger {
            transactions: vec![a, b, c],
            ..Default::default()
        };
        let filter = PeriodFilter::default();
        let exact = reconciliation(&ledger, &filter, dec!(1000.00));
        assert_eq!(exact.cleared_total, dec!(1000.00));
        assert_eq!(exact.difference, dec!(0.00));
        assert!(exact.is_balanced());
        assert_eq!(exact.cleared_count, 2);

        let off = reconciliation(&ledger, &filter, dec!(1000.02));
        assert!(!off.is_balanced());
        let just_under = reconciliation(&ledger, &filter, dec!(1000.009));
        assert!(just_under.is_balanced());
    }

    #[test]
    fn test_register_search_sort_limit() {
        let ledger = scenario();
        let all = register(&ledger, &PeriodFilter::default(), None, 100);
        assert_eq!(all.total_count, 3);
        assert_eq!(all.rows[0].date, date("2024-01-15"));

        let limited = register(&ledger, &PeriodFilter::default(), None, 1);
        assert_eq!(limited.rows.len(), 1);
        assert_eq!(limited.total_count, 3);

        let searched = register(&ledger, &PeriodFilter::default(), Some("UTIL"), 100);
        assert_eq!(searched.total_count, 1);
        let by_category = register(&ledger, &PeriodFilter::default(), Some("owner's"), 100);
        assert_eq!(by_category.total_count, 1);
    }
}
