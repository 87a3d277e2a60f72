use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{BookkeeperError, Result};
use crate::models::{
    ApArItem, ApArKind, ApArStatus, Category, ImportRecord, Ledger, LedgerDelta, Rule, Transaction,
};
use crate::normalize::canonical_date;

pub const DB_FILENAME: &str = "bookkeeper.db";

// Amounts are stored as decimal text so they read back exactly.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'Uncategorized',
    job TEXT,
    reconciled INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS ap_ar_items (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN ('ar', 'ap')),
    party TEXT NOT NULL,
    number TEXT NOT NULL,
    date TEXT NOT NULL,
    amount TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'unpaid',
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS rules (
    position INTEGER PRIMARY KEY,
    keyword TEXT NOT NULL,
    category TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    kind TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT,
    forced INTEGER NOT NULL DEFAULT 0
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Seed categories and rules on a fresh database. Returns whether anything
/// was written; an existing ledger is left alone.
pub fn seed_defaults(conn: &Connection, categories: &[String], rules: &[Rule]) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT (SELECT count(*) FROM categories) + (SELECT count(*) FROM rules)",
        [],
        |row| row.get(0),
    )?;
    if count > 0 {
        return Ok(false);
    }
    let tx = conn.unchecked_transaction()?;
    let mut names: Vec<&str> = categories.iter().map(String::as_str).collect();
    names.push(Category::UNCATEGORIZED);
    for name in names {
        tx.execute("INSERT OR IGNORE INTO categories (name) VALUES (?1)", [name])?;
    }
    write_rules(&tx, rules)?;
    tx.commit()?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Persistence collaborator
// ---------------------------------------------------------------------------

/// Where a [`Ledger`] comes from and where its changes go.
pub trait LedgerStore {
    fn load_ledger(&self) -> Result<Ledger>;
    fn save_ledger(&self, delta: &LedgerDelta) -> Result<()>;
    /// Delete every transaction and AP/AR item. Rules and categories stay.
    fn clear(&self) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn import_history(&self) -> Result<Vec<ImportRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT filename, kind, record_count, date_range_start, date_range_end, checksum, forced \
             FROM imports ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ImportRecord {
                filename: row.get(0)?,
                kind: row.get(1)?,
                record_count: row.get::<_, i64>(2)? as usize,
                date_range_start: optional_date(row, 3)?,
                date_range_end: optional_date(row, 4)?,
                checksum: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                forced: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn last_import(&self) -> Result<Option<(String, String)>> {
        Ok(self
            .conn
            .query_row(
                "SELECT filename, import_date FROM imports ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }

    fn write_delta(&self, delta: &LedgerDelta) -> rusqlite::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for t in &delta.transactions {
            tx.execute(
                "INSERT INTO transactions (id, date, description, amount, category, job, reconciled, notes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(id) DO UPDATE SET date = excluded.date, description = excluded.description, \
                 amount = excluded.amount, category = excluded.category, job = excluded.job, \
                 reconciled = excluded.reconciled, notes = excluded.notes",
                params![
                    t.id,
                    canonical_date(t.date),
                    t.description,
                    t.amount.to_string(),
                    t.category.as_str(),
                    t.job,
                    t.reconciled,
                    t.notes,
                ],
            )?;
        }
        for i in &delta.items {
            tx.execute(
                "INSERT INTO ap_ar_items (id, kind, party, number, date, amount, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT(id) DO UPDATE SET kind = excluded.kind, party = excluded.party, \
                 number = excluded.number, date = excluded.date, amount = excluded.amount, \
                 status = excluded.status",
                params![
                    i.id,
                    i.kind.key(),
                    i.party,
                    i.number,
                    canonical_date(i.date),
                    i.amount.to_string(),
                    i.status.key(),
                ],
            )?;
        }
        if let Some(rules) = &delta.rules {
            write_rules(&tx, rules)?;
        }
        if let Some(categories) = &delta.categories {
            tx.execute("DELETE FROM categories", [])?;
            for name in categories {
                tx.execute("INSERT OR IGNORE INTO categories (name) VALUES (?1)", [name])?;
            }
        }
        if let Some(record) = &delta.import {
            tx.execute(
                "INSERT INTO imports (filename, kind, record_count, date_range_start, date_range_end, checksum, forced) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.filename,
                    record.kind,
                    record.record_count as i64,
                    record.date_range_start.map(canonical_date),
                    record.date_range_end.map(canonical_date),
                    record.checksum,
                    record.forced,
                ],
            )?;
        }
        tx.commit()
    }
}

fn write_rules(conn: &Connection, rules: &[Rule]) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM rules", [])?;
    for (position, rule) in rules.iter().enumerate() {
        conn.execute(
            "INSERT INTO rules (position, keyword, category) VALUES (?1, ?2, ?3)",
            params![position as i64, rule.keyword, rule.category.as_str()],
        )?;
    }
    Ok(())
}

fn conversion_error(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn decimal_col(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn date_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

fn optional_date(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => date_col(row, idx).map(Some),
        None => Ok(None),
    }
}

impl LedgerStore for SqliteStore {
    fn load_ledger(&self) -> Result<Ledger> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, description, amount, category, job, reconciled, notes \
             FROM transactions ORDER BY date, created_at, id",
        )?;
        let transactions = stmt
            .query_map([], |row| {
                Ok(Transaction {
                    id: row.get(0)?,
                    date: date_col(row, 1)?,
                    description: row.get(2)?,
                    amount: decimal_col(row, 3)?,
                    category: Category::parse(&row.get::<_, String>(4)?),
                    job: row.get(5)?,
                    reconciled: row.get(6)?,
                    notes: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, kind, party, number, date, amount, status FROM ap_ar_items ORDER BY date, created_at, id",
        )?;
        let items = stmt
            .query_map([], |row| {
                let kind: String = row.get(1)?;
                Ok(ApArItem {
                    id: row.get(0)?,
                    kind: ApArKind::parse(&kind).unwrap_or(ApArKind::Receivable),
                    party: row.get(2)?,
                    number: row.get(3)?,
                    date: date_col(row, 4)?,
                    amount: decimal_col(row, 5)?,
                    status: ApArStatus::parse(&row.get::<_, String>(6)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare("SELECT keyword, category FROM rules ORDER BY position")?;
        let rules = stmt
            .query_map([], |row| {
                Ok(Rule {
                    keyword: row.get(0)?,
                    category: Category::parse(&row.get::<_, String>(1)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare("SELECT name FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        tracing::debug!(
            transactions = transactions.len(),
            items = items.len(),
            rules = rules.len(),
            "loaded ledger"
        );
        Ok(Ledger {
            transactions,
            items,
            rules,
            categories,
        })
    }

    fn save_ledger(&self, delta: &LedgerDelta) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }
        self.write_delta(delta).map_err(|e| {
            tracing::warn!(error = %e, "saving ledger changes failed");
            BookkeeperError::Persistence(e.to_string())
        })
    }

    fn clear(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM transactions", [])?;
        tx.execute("DELETE FROM ap_ar_items", [])?;
        tx.commit()?;
        tracing::info!("cleared all transactions and AP/AR items");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{apply_import, plan_import};
    use rust_decimal_macros::dec;

    fn test_db() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn txn(id: &str, amount: Decimal) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            description: "Coffee".to_string(),
            amount,
            category: Category::Uncategorized,
            job: None,
            reconciled: false,
            notes: None,
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, store) = test_db();
        let tables: Vec<String> = store
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["transactions", "ap_ar_items", "rules", "categories", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, store) = test_db();
        init_db(store.connection()).unwrap();
    }

    #[test]
    fn test_seed_defaults_only_once() {
        let (_dir, store) = test_db();
        let categories = vec!["Utilities".to_string()];
        let rules = vec![Rule::new("b", "B"), Rule::new("a", "A")];
        assert!(seed_defaults(store.connection(), &categories, &rules).unwrap());
        assert!(!seed_defaults(store.connection(), &[], &[]).unwrap());
        let ledger = store.load_ledger().unwrap();
        assert_eq!(ledger.categories, vec!["Uncategorized", "Utilities"]);
        let keywords: Vec<&str> = ledger.rules.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["b", "a"]);
    }

    #[test]
    fn test_upsert_round_trips_exact_amounts() {
        let (_dir, store) = test_db();
        let mut t = txn("tx-1", dec!(-1234.567));
        store
            .save_ledger(&LedgerDelta {
                transactions: vec![t.clone()],
                ..Default::default()
            })
            .unwrap();
        t.category = Category::OwnersDraw;
        t.reconciled = true;
        t.job = Some("Smith".into());
        store
            .save_ledger(&LedgerDelta {
                transactions: vec![t.clone()],
                ..Default::default()
            })
            .unwrap();
        let ledger = store.load_ledger().unwrap();
        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(ledger.transactions[0], t);
    }

    #[test]
    fn test_items_persist() {
        let (_dir, store) = test_db();
        let item = ApArItem {
            id: "ap-1".into(),
            kind: ApArKind::Payable,
            party: "Trane Supply".into(),
            number: "B-77".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            amount: dec!(812.40),
            status: ApArStatus::Paid,
        };
        store
            .save_ledger(&LedgerDelta {
                items: vec![item.clone()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.load_ledger().unwrap().items, vec![item]);
    }

    #[test]
    fn test_import_history_and_clear() {
        let (_dir, store) = test_db();
        let mut ledger = store.load_ledger().unwrap();
        let text = "Date,Description,Amount\n2024-01-02,Deposit,100\n2024-01-09,Fee,-2.50\n";
        let plan = plan_import(&ledger, text, "jan.csv", ApArKind::Receivable).unwrap();
        let report = apply_import(&mut ledger, plan);
        store.save_ledger(&report.delta).unwrap();

        let history = store.import_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].filename, "jan.csv");
        assert_eq!(history[0].record_count, 2);
        assert_eq!(history[0].date_range_end.unwrap().to_string(), "2024-01-09");
        assert!(store.last_import().unwrap().is_some());

        store
            .save_ledger(&LedgerDelta {
                rules: Some(vec![Rule::new("fee", "Bank Fees")]),
                ..Default::default()
            })
            .unwrap();
        store.clear().unwrap();
        let ledger = store.load_ledger().unwrap();
        assert!(ledger.transactions.is_empty());
        assert_eq!(ledger.rules.len(), 1);
    }

    #[test]
    fn test_empty_delta_is_noop() {
        let (_dir, store) = test_db();
        store.save_ledger(&LedgerDelta::default()).unwrap();
        assert!(store.import_history().unwrap().is_empty());
    }
}
