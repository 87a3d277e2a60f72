use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger category. The three reserved names get their own variants so that
/// aggregation exclusions are checked by the compiler rather than by string
/// comparison scattered through the reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Uncategorized,
    Transfer,
    OwnersDraw,
    Other(String),
}

impl Category {
    pub const UNCATEGORIZED: &'static str = "Uncategorized";
    pub const TRANSFER: &'static str = "Transfer";
    pub const OWNERS_DRAW: &'static str = "Owner's Draw";

    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "" | Self::UNCATEGORIZED => Self::Uncategorized,
            Self::TRANSFER => Self::Transfer,
            Self::OWNERS_DRAW => Self::OwnersDraw,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Uncategorized => Self::UNCATEGORIZED,
            Self::Transfer => Self::TRANSFER,
            Self::OwnersDraw => Self::OWNERS_DRAW,
            Self::Other(name) => name,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Positive = inflow, negative = outflow.
    pub amount: Decimal,
    pub category: Category,
    pub job: Option<String>,
    pub reconciled: bool,
    pub notes: Option<String>,
}

impl Transaction {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.date, &self.description, self.amount)
    }

    /// Job label with surrounding whitespace removed; `None` when blank.
    pub fn job_name(&self) -> Option<&str> {
        self.job.as_deref().map(str::trim).filter(|j| !j.is_empty())
    }
}

/// Identity used to spot a row that is already in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
}

impl Fingerprint {
    pub fn new(date: NaiveDate, description: &str, amount: Decimal) -> Self {
        Self {
            date,
            description: description.trim().to_lowercase(),
            amount: amount.round_dp(2).normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApArKind {
    Receivable,
    Payable,
}

impl ApArKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Receivable => "ar",
            Self::Payable => "ap",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Receivable => "Accounts Receivable",
            Self::Payable => "Accounts Payable",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "ar" | "receivable" | "invoice" => Some(Self::Receivable),
            "ap" | "payable" | "bill" => Some(Self::Payable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApArStatus {
    Unpaid,
    Paid,
}

impl ApArStatus {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("paid") {
            Self::Paid
        } else {
            Self::Unpaid
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Unpaid => Self::Paid,
            Self::Paid => Self::Unpaid,
        }
    }
}

/// An invoice (receivable) or bill (payable).
#[derive(Debug, Clone, PartialEq)]
pub struct ApArItem {
    pub id: String,
    pub kind: ApArKind,
    pub party: String,
    pub number: String,
    pub date: NaiveDate,
    /// Unsigned magnitude.
    pub amount: Decimal,
    pub status: ApArStatus,
}

impl ApArItem {
    pub const NO_NUMBER: &'static str = "N/A";

    pub fn is_unpaid(&self) -> bool {
        self.status == ApArStatus::Unpaid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub keyword: String,
    pub category: Category,
}

impl Rule {
    pub fn new(keyword: &str, category: &str) -> Self {
        Self {
            keyword: keyword.trim().to_string(),
            category: Category::parse(category),
        }
    }
}

/// Snapshot of everything the engine reads and mutates. The caller owns the
/// single long-lived value and threads it through each operation.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub items: Vec<ApArItem>,
    /// Evaluation order matters: first match wins.
    pub rules: Vec<Rule>,
    pub categories: Vec<String>,
}

impl Ledger {
    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn transaction_mut(&mut self, id: &str) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|t| t.id == id)
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut ApArItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }
}

/// History entry for one applied import batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub filename: String,
    pub kind: String,
    pub record_count: usize,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub checksum: String,
    pub forced: bool,
}

/// New or changed records produced by one operation, for the caller to persist.
/// `rules` / `categories` are full replacements when present.
#[derive(Debug, Clone, Default)]
pub struct LedgerDelta {
    pub transactions: Vec<Transaction>,
    pub items: Vec<ApArItem>,
    pub rules: Option<Vec<Rule>>,
    pub categories: Option<Vec<String>>,
    pub import: Option<ImportRecord>,
}

impl LedgerDelta {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
            && self.items.is_empty()
            && self.rules.is_none()
            && self.categories.is_none()
            && self.import.is_none()
    }

    /// Delta carrying the current rule list and category set.
    pub fn rules_and_categories(ledger: &Ledger) -> Self {
        Self {
            rules: Some(ledger.rules.clone()),
            categories: Some(ledger.categories.clone()),
            ..Default::default()
        }
    }
}

pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
