//! In-place changes to existing records and manual entry. Every function
//! mutates the ledger it is given and returns the records to persist.

use crate::categorizer::{add_category, add_rule, categorize, find_similar, recategorize};
use crate::error::{BookkeeperError, Result};
use crate::models::{
    new_id, ApArItem, ApArKind, ApArStatus, Category, Ledger, LedgerDelta, Transaction,
};
use crate::normalize::{clean_currency, clean_date, clean_text, NO_DESCRIPTION, UNKNOWN};
use crate::reports::{matches_search, PeriodFilter};

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Transaction edit
// ---------------------------------------------------------------------------

/// Fields to change. `None` leaves a field as is; for `job` and `notes`, an
/// empty string clears it.
#[derive(Debug, Default)]
pub struct TransactionEdit {
    pub description: Option<String>,
    pub category: Option<String>,
    pub job: Option<String>,
    pub notes: Option<String>,
}

pub struct EditOutcome {
    pub updated: Transaction,
    pub previous_category: Category,
    /// Ids of transactions that look like the edited one and still carry
    /// `previous_category`. Empty unless the category changed.
    pub similar: Vec<String>,
    pub rule_created: bool,
    pub delta: LedgerDelta,
}

pub fn edit_transaction(ledger: &mut Ledger, id: &str, edit: &TransactionEdit, create_rule: bool) -> Result<EditOutcome> {
    let txn = ledger
        .transaction_mut(id)
        .ok_or_else(|| BookkeeperError::UnknownTransaction(id.to_string()))?;
    let previous_category = txn.category.clone();

    if let Some(description) = &edit.description {
        txn.description = clean_text(description, NO_DESCRIPTION);
    }
    if let Some(category) = &edit.category {
        txn.category = Category::parse(category);
    }
    if let Some(job) = &edit.job {
        txn.job = optional_text(job);
    }
    if let Some(notes) = &edit.notes {
        txn.notes = optional_text(notes);
    }
    let updated = txn.clone();

    let mut catalog_changed = add_category(ledger, updated.category.as_str());
    let mut rule_created = false;
    if create_rule && edit.category.is_some() {
        rule_created = add_rule(ledger, &updated.description, updated.category.as_str())?;
        catalog_changed |= rule_created;
    }

    let similar = if updated.category != previous_category {
        find_similar(&updated, &previous_category, &ledger.transactions)
            .into_iter()
            .map(|t| t.id.clone())
            .collect()
    } else {
        Vec::new()
    };

    let mut delta = if catalog_changed {
        LedgerDelta::rules_and_categories(ledger)
    } else {
        LedgerDelta::default()
    };
    delta.transactions.push(updated.clone());

    tracing::info!(id, category = %updated.category, similar = similar.len(), rule_created, "edited transaction");
    Ok(EditOutcome {
        updated,
        previous_category,
        similar,
        rule_created,
        delta,
    })
}

/// Apply `category` to the transactions proposed by [`edit_transaction`].
pub fn apply_batch(ledger: &mut Ledger, ids: &[String], category: &Category) -> LedgerDelta {
    let changed = recategorize(ledger, ids, category);
    tracing::info!(count = changed.len(), category = %category, "batch recategorized");
    LedgerDelta {
        transactions: changed,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Manual entry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NewTransaction {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category: Option<String>,
    pub job: Option<String>,
    pub notes: Option<String>,
}

/// Normalize and append a hand-entered transaction. Without an explicit
/// category the rules decide, as they would on import.
pub fn add_transaction(ledger: &mut Ledger, input: &NewTransaction) -> Result<(Transaction, LedgerDelta)> {
    let date = clean_date(&input.date).ok_or_else(|| BookkeeperError::InvalidValue {
        field: "date",
        value: input.date.clone(),
    })?;
    let amount = clean_currency(&input.amount).ok_or_else(|| BookkeeperError::InvalidValue {
        field: "amount",
        value: input.amount.clone(),
    })?;
    let description = clean_text(&input.description, NO_DESCRIPTION);
    let category = match input.category.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(name) => Category::parse(name),
        None => categorize(&description, &ledger.rules),
    };

    let txn = Transaction {
        id: new_id("tx"),
        date,
        description,
        amount,
        category,
        job: input.job.as_deref().and_then(optional_text),
        reconciled: false,
        notes: input.notes.as_deref().and_then(optional_text),
    };

    let mut delta = if add_category(ledger, txn.category.as_str()) {
        LedgerDelta::rules_and_categories(ledger)
    } else {
        LedgerDelta::default()
    };
    ledger.transactions.push(txn.clone());
    delta.transactions.push(txn.clone());
    Ok((txn, delta))
}

pub struct NewItem {
    pub kind: ApArKind,
    pub party: String,
    pub number: String,
    pub date: String,
    pub amount: String,
}

pub fn add_item(ledger: &mut Ledger, input: &NewItem) -> Result<(ApArItem, LedgerDelta)> {
    let date = clean_date(&input.date).ok_or_else(|| BookkeeperError::InvalidValue {
        field: "date",
        value: input.date.clone(),
    })?;
    let amount = clean_currency(&input.amount).ok_or_else(|| BookkeeperError::InvalidValue {
        field: "amount",
        value: input.amount.clone(),
    })?;
    let item = ApArItem {
        id: new_id(input.kind.key()),
        kind: input.kind,
        party: clean_text(&input.party, UNKNOWN),
        number: clean_text(&input.number, ApArItem::NO_NUMBER),
        date,
        amount: amount.abs(),
        status: ApArStatus::Unpaid,
    };
    ledger.items.push(item.clone());
    let delta = LedgerDelta {
        items: vec![item.clone()],
        ..Default::default()
    };
    Ok((item, delta))
}

// ---------------------------------------------------------------------------
// Toggles
// ---------------------------------------------------------------------------

pub fn toggle_reconciled(ledger: &mut Ledger, id: &str) -> Result<(bool, LedgerDelta)> {
    let txn = ledger
        .transaction_mut(id)
        .ok_or_else(|| BookkeeperError::UnknownTransaction(id.to_string()))?;
    txn.reconciled = !txn.reconciled;
    let delta = LedgerDelta {
        transactions: vec![txn.clone()],
        ..Default::default()
    };
    Ok((txn.reconciled, delta))
}

/// Set `reconciled` on every transaction in the period that matches `search`.
/// Only records whose flag actually changed are returned for saving.
pub fn set_reconciled(ledger: &mut Ledger, filter: &PeriodFilter, search: Option<&str>, reconciled: bool) -> LedgerDelta {
    let changed: Vec<Transaction> = ledger
        .transactions
        .iter_mut()
        .filter(|t| filter.matches(t.date) && matches_search(t, search))
        .filter(|t| t.reconciled != reconciled)
        .map(|t| {
            t.reconciled = reconciled;
            t.clone()
        })
        .collect();
    tracing::info!(count = changed.len(), reconciled, "marked transactions");
    LedgerDelta {
        transactions: changed,
        ..Default::default()
    }
}

pub fn toggle_item_status(ledger: &mut Ledger, id: &str) -> Result<(ApArStatus, LedgerDelta)> {
    let item = ledger
        .item_mut(id)
        .ok_or_else(|| BookkeeperError::UnknownItem(id.to_string()))?;
    item.status = item.status.toggled();
    let delta = LedgerDelta {
        items: vec![item.clone()],
        ..Default::default()
    };
    Ok((item.status, delta))
}
