//! Header inspection: decide what an uploaded file contains and where each
//! canonical field lives.

/// Header fragments that only appear in invoice/bill exports. Checked before
/// anything else because invoice files are the narrower, more recognisable shape.
const INVOICE_MARKERS: &[&str] = &["invoice #", "invoice number", "invoice no", "grand total", "invoice status"];

const DATE_TOKENS: &[&str] = &["date", "time"];
const DESCRIPTION_TOKENS: &[&str] = &["desc", "memo", "payee", "name"];
const AMOUNT_TOKENS: &[&str] = &["amount", "amt", "value"];
const DEBIT_TOKENS: &[&str] = &["debit", "withdrawal"];
const CREDIT_TOKENS: &[&str] = &["credit", "deposit"];

// Invoice headers are matched by whole name, preferred name first.
const INVOICE_DATE_HEADERS: &[&str] = &["Date", "TransDate", "Invoice Date"];
const INVOICE_PARTY_HEADERS: &[&str] = &["Customer", "Bill-To", "Bill To", "Vendor"];
const INVOICE_NUMBER_HEADERS: &[&str] = &["Invoice #", "Invoice Number", "Invoice No", "Num"];
const INVOICE_AMOUNT_HEADERS: &[&str] = &["Amount", "Grand Total", "Total"];
const INVOICE_STATUS_HEADERS: &[&str] = &["Status", "Invoice Status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Transactions,
    Invoices,
}

impl SchemaKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Invoices => "invoices",
        }
    }
}

/// Header names (as they appear in the file, cleaned) for each ledger field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionColumns {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub debit: String,
    pub credit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceColumns {
    pub date: String,
    pub party: String,
    pub number: String,
    pub amount: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMap {
    Transactions(TransactionColumns),
    Invoices(InvoiceColumns),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub columns: ColumnMap,
}

/// Strip whitespace and any quote characters wrapped around a header.
pub fn clean_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

pub fn detect_kind(headers: &[String]) -> SchemaKind {
    let is_invoice = headers.iter().any(|h| {
        let lower = h.to_lowercase();
        INVOICE_MARKERS.iter().any(|m| lower.contains(m))
    });
    if is_invoice {
        SchemaKind::Invoices
    } else {
        SchemaKind::Transactions
    }
}

pub fn detect(raw_headers: &[String]) -> Schema {
    let headers: Vec<String> = raw_headers.iter().map(|h| clean_header(h)).collect();
    let kind = detect_kind(&headers);
    let columns = match kind {
        SchemaKind::Transactions => ColumnMap::Transactions(map_transaction_columns(&headers)),
        SchemaKind::Invoices => ColumnMap::Invoices(map_invoice_columns(&headers)),
    };
    tracing::debug!(kind = kind.key(), ?columns, "detected schema");
    Schema { kind, columns }
}

/// First header containing any of `tokens` (case-insensitive), else `default`.
fn find_by_token(headers: &[String], tokens: &[&str], default: &str) -> String {
    headers
        .iter()
        .find(|h| {
            let lower = h.to_lowercase();
            tokens.iter().any(|t| lower.contains(t))
        })
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Like [`find_by_token`], skipping headers that also match any of `exclude`
/// so that "Debit Amount" is never taken as the signed amount column.
fn find_by_token_excluding(headers: &[String], tokens: &[&str], exclude: &[&[&str]], default: &str) -> String {
    let candidates: Vec<String> = headers
        .iter()
        .filter(|h| {
            let lower = h.to_lowercase();
            !exclude.iter().flat_map(|e| e.iter()).any(|t| lower.contains(t))
        })
        .cloned()
        .collect();
    find_by_token(&candidates, tokens, default)
}

/// First of `names` present as a whole header (case-insensitive), else the
/// first name.
fn find_by_name(headers: &[String], names: &[&str]) -> String {
    names
        .iter()
        .find_map(|name| headers.iter().find(|h| h.eq_ignore_ascii_case(name)))
        .cloned()
        .unwrap_or_else(|| names[0].to_string())
}

pub fn map_transaction_columns(headers: &[String]) -> TransactionColumns {
    TransactionColumns {
        date: find_by_token(headers, DATE_TOKENS, "Date"),
        description: find_by_token(headers, DESCRIPTION_TOKENS, "Description"),
        amount: find_by_token_excluding(headers, AMOUNT_TOKENS, &[DEBIT_TOKENS, CREDIT_TOKENS], "Amount"),
        debit: find_by_token(headers, DEBIT_TOKENS, "Debit"),
        credit: find_by_token(headers, CREDIT_TOKENS, "Credit"),
    }
}

pub fn map_invoice_columns(headers: &[String]) -> InvoiceColumns {
    InvoiceColumns {
        date: find_by_name(headers, INVOICE_DATE_HEADERS),
        party: find_by_name(headers, INVOICE_PARTY_HEADERS),
        number: find_by_name(headers, INVOICE_NUMBER_HEADERS),
        amount: find_by_name(headers, INVOICE_AMOUNT_HEADERS),
        status: find_by_name(headers, INVOICE_STATUS_HEADERS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bank_export_is_transactions() {
        let schema = detect(&headers(&["Posted Date", "Payee", "Amount", "Balance"]));
        assert_eq!(schema.kind, SchemaKind::Transactions);
        let ColumnMap::Transactions(cols) = schema.columns else {
            panic!("expected transaction columns");
        };
        assert_eq!(cols.date, "Posted Date");
        assert_eq!(cols.description, "Payee");
        assert_eq!(cols.amount, "Amount");
        assert_eq!(cols.debit, "Debit");
        assert_eq!(cols.credit, "Credit");
    }

    #[test]
    fn test_invoice_markers_win() {
        let schema = detect(&headers(&["Date", "Customer", "Invoice #", "Grand Total", "Invoice Status"]));
        assert_eq!(schema.kind, SchemaKind::Invoices);
        let ColumnMap::Invoices(cols) = schema.columns else {
            panic!("expected invoice columns");
        };
        assert_eq!(cols.number, "Invoice #");
        assert_eq!(cols.amount, "Grand Total");
        assert_eq!(cols.status, "Invoice Status");
        assert_eq!(cols.party, "Customer");
    }

    #[test]
    fn test_invoice_alternate_headers() {
        let cols = map_invoice_columns(&headers(&["TransDate", "Bill-To", "Num", "Grand Total"]));
        assert_eq!(cols.date, "TransDate");
        assert_eq!(cols.party, "Bill-To");
        assert_eq!(cols.number, "Num");
        assert_eq!(cols.status, "Status");
    }

    #[test]
    fn test_quoted_headers_are_cleaned() {
        let schema = detect(&headers(&["\"Date\"", " 'Memo' ", "\"Debit\"", "\"Credit\""]));
        let ColumnMap::Transactions(cols) = schema.columns else {
            panic!("expected transaction columns");
        };
        assert_eq!(cols.date, "Date");
        assert_eq!(cols.description, "Memo");
        assert_eq!(cols.debit, "Debit");
        assert_eq!(cols.credit, "Credit");
        assert_eq!(cols.amount, "Amount");
    }

    #[test]
    fn test_first_matching_header_wins() {
        let cols = map_transaction_columns(&headers(&["Transaction Date", "Post Date", "Description"]));
        assert_eq!(cols.date, "Transaction Date");
    }

    #[test]
    fn test_split_amount_columns_are_not_the_signed_amount() {
        let cols = map_transaction_columns(&headers(&["Date", "Description", "Debit Amount", "Credit Amount"]));
        assert_eq!(cols.amount, "Amount");
        assert_eq!(cols.debit, "Debit Amount");
        assert_eq!(cols.credit, "Credit Amount");
    }

    #[test]
    fn test_clean_header_strips_bom() {
        assert_eq!(clean_header("\u{feff}Date"), "Date");
    }
}
