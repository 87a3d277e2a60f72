use crate::error::{BookkeeperError, Result};
use crate::models::{Category, Ledger, Rule, Transaction};

fn matches(description: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    !keyword.is_empty() && description.to_lowercase().contains(&keyword.to_lowercase())
}

/// First rule whose keyword appears in `description` wins.
pub fn categorize(description: &str, rules: &[Rule]) -> Category {
    rules
        .iter()
        .find(|r| matches(description, &r.keyword))
        .map(|r| r.category.clone())
        .unwrap_or_default()
}

pub struct CategorizeResult {
    pub categorized: usize,
    pub still_uncategorized: usize,
    pub changed: Vec<Transaction>,
}

/// Re-run the rules over every `Uncategorized` transaction.
pub fn categorize_uncategorized(ledger: &mut Ledger) -> CategorizeResult {
    let mut categorized = 0usize;
    let mut still_uncategorized = 0usize;
    let mut changed = Vec::new();

    let rules = ledger.rules.clone();
    for txn in ledger
        .transactions
        .iter_mut()
        .filter(|t| t.category == Category::Uncategorized)
    {
        match categorize(&txn.description, &rules) {
            Category::Uncategorized => still_uncategorized += 1,
            category => {
                txn.category = category;
                changed.push(txn.clone());
                categorized += 1;
            }
        }
    }

    CategorizeResult {
        categorized,
        still_uncategorized,
        changed,
    }
}

/// Lower-cased first whitespace-delimited word of a description.
pub fn similarity_key(description: &str) -> Option<String> {
    description
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
}

/// Transactions that look like `edited` and still carry its old category.
///
/// "Looks like" is a coarse heuristic: the other description contains the
/// first word of the edited one. It can over-match short common words
/// ("THE", "POS") and under-match vendors whose exports vary the first word.
pub fn find_similar<'a>(
    edited: &Transaction,
    previous_category: &Category,
    transactions: &'a [Transaction],
) -> Vec<&'a Transaction> {
    let Some(key) = similarity_key(&edited.description) else {
        return Vec::new();
    };
    transactions
        .iter()
        .filter(|t| t.id != edited.id)
        .filter(|t| &t.category == previous_category)
        .filter(|t| t.description.to_lowercase().contains(&key))
        .collect()
}

/// Assign `category` to every transaction in `ids`; returns the changed records.
pub fn recategorize(ledger: &mut Ledger, ids: &[String], category: &Category) -> Vec<Transaction> {
    ledger
        .transactions
        .iter_mut()
        .filter(|t| ids.contains(&t.id) && &t.category != category)
        .map(|t| {
            t.category = category.clone();
            t.clone()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rule and category maintenance
// ---------------------------------------------------------------------------

/// Append a rule unless an identical one exists. Returns whether it was added.
pub fn add_rule(ledger: &mut Ledger, keyword: &str, category: &str) -> Result<bool> {
    let rule = Rule::new(keyword, category);
    if rule.keyword.is_empty() {
        return Err(BookkeeperError::Other("Rule keyword cannot be empty".to_string()));
    }
    if ledger.rules.contains(&rule) {
        return Ok(false);
    }
    add_category(ledger, category);
    ledger.rules.push(rule);
    Ok(true)
}

/// Remove the rule at `position` (1-based, as listed).
pub fn delete_rule(ledger: &mut Ledger, position: usize) -> Result<Rule> {
    if position == 0 || position > ledger.rules.len() {
        return Err(BookkeeperError::Other(format!("No rule at position {position}")));
    }
    Ok(ledger.rules.remove(position - 1))
}

/// Add a category name, keeping the set sorted. Returns whether it was new.
pub fn add_category(ledger: &mut Ledger, name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() || ledger.has_category(name) {
        return false;
    }
    ledger.categories.push(name.to_string());
    ledger.categories.sort();
    true
}

pub fn delete_category(ledger: &mut Ledger, name: &str) -> Result<()> {
    if Category::parse(name) == Category::Uncategorized {
        return Err(BookkeeperError::Other(
            "The Uncategorized category cannot be deleted".to_string(),
        ));
    }
    if !ledger.has_category(name) {
        return Err(BookkeeperError::UnknownCategory(name.to_string()));
    }
    ledger.categories.retain(|c| c != name);
    Ok(())
}
