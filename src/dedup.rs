use std::collections::{HashMap, HashSet};

use crate::models::{ApArItem, ApArKind, Fingerprint, Transaction};

pub struct DedupOutcome<T> {
    pub kept: Vec<T>,
    pub duplicates: Vec<T>,
}

impl<T> DedupOutcome<T> {
    /// A non-empty batch where nothing survived. The caller decides whether
    /// to import it anyway rather than silently importing zero rows.
    pub fn all_duplicates(&self) -> bool {
        self.kept.is_empty() && !self.duplicates.is_empty()
    }
}

/// Drop candidates whose fingerprint is already in the ledger.
///
/// Fingerprints are counted, not just collected: if the ledger holds two
/// identical coffees on the same day and the file holds three, one survives.
pub fn dedupe_transactions(existing: &[Transaction], candidates: Vec<Transaction>) -> DedupOutcome<Transaction> {
    let mut remaining: HashMap<Fingerprint, usize> = HashMap::new();
    for txn in existing {
        *remaining.entry(txn.fingerprint()).or_default() += 1;
    }

    let mut kept = Vec::new();
    let mut duplicates = Vec::new();
    for candidate in candidates {
        match remaining.get_mut(&candidate.fingerprint()) {
            Some(count) if *count > 0 => {
                *count -= 1;
                duplicates.push(candidate);
            }
            _ => kept.push(candidate),
        }
    }
    DedupOutcome { kept, duplicates }
}

fn number_key(item: &ApArItem) -> Option<(ApArKind, String)> {
    let number = item.number.trim();
    if number.is_empty() || number.eq_ignore_ascii_case(ApArItem::NO_NUMBER) {
        return None;
    }
    Some((item.kind, number.to_lowercase()))
}

/// Invoices and bills are identified by document number alone
/// (case-insensitive, per kind). Items without a number are always kept.
pub fn dedupe_items(existing: &[ApArItem], candidates: Vec<ApArItem>) -> DedupOutcome<ApArItem> {
    let mut seen: HashSet<(ApArKind, String)> = existing.iter().filter_map(number_key).collect();

    let mut kept = Vec::new();
    let mut duplicates = Vec::new();
    for candidate in candidates {
        match number_key(&candidate) {
            Some(key) if seen.contains(&key) => duplicates.push(candidate),
            Some(key) => {
                seen.insert(key);
                kept.push(candidate);
            }
            None => kept.push(candidate),
        }
    }
    DedupOutcome { kept, duplicates }
}
