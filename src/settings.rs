use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BookkeeperError, Result};
use crate::models::Rule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Percentage applied to taxable profit, e.g. 25 for 25%.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
    #[serde(default = "default_categories")]
    pub default_categories: Vec<String>,
    #[serde(default = "default_rules")]
    pub default_rules: Vec<Rule>,
}

fn default_tax_rate() -> Decimal {
    Decimal::from(25)
}

const DEFAULT_CATEGORIES: &[&str] = &[
    "COGS - Equipment",
    "COGS - Parts & Materials",
    "Income (Sales/Service)",
    "Insurance",
    "Marketing & Advertising",
    "Office Supplies & Software",
    "Owner's Draw",
    "Payroll Expenses (Wages & Taxes)",
    "Permits & Licenses",
    "Rent/Lease",
    "Subcontractors",
    "Tools & Small Equipment",
    "Transfer",
    "Uncategorized",
    "Utilities",
    "Vehicle Expenses (Fuel, Repairs)",
];

// (keyword, category), evaluated in this order
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("IRS", "Payroll Expenses (Wages & Taxes)"),
    ("Payroll", "Payroll Expenses (Wages & Taxes)"),
    ("Gusto", "Payroll Expenses (Wages & Taxes)"),
    ("ADP", "Payroll Expenses (Wages & Taxes)"),
    ("Intuit", "Office Supplies & Software"),
    ("Speedway", "Vehicle Expenses (Fuel, Repairs)"),
    ("Shell", "Vehicle Expenses (Fuel, Repairs)"),
    ("Marathon", "Vehicle Expenses (Fuel, Repairs)"),
    ("Home Depot", "COGS - Parts & Materials"),
    ("Lowe", "COGS - Parts & Materials"),
    ("Supply", "COGS - Parts & Materials"),
    ("Trane", "COGS - Equipment"),
    ("Carrier", "COGS - Equipment"),
    ("Lennox", "COGS - Equipment"),
    ("Google", "Marketing & Advertising"),
    ("Stripe", "Office Supplies & Software"),
    ("Transfer", "Transfer"),
];

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn default_rules() -> Vec<Rule> {
    DEFAULT_RULES.iter().map(|(k, c)| Rule::new(k, c)).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            tax_rate: default_tax_rate(),
            default_categories: default_categories(),
            default_rules: default_rules(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bookkeeper")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("bookkeeper")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    match serde_json::from_str::<Settings>(&content) {
        Ok(mut settings) => {
            if check_tax_rate(settings.tax_rate).is_err() {
                tracing::warn!(rate = %settings.tax_rate, "tax rate out of range, using default");
                settings.tax_rate = Settings::default().tax_rate;
            }
            settings
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BookkeeperError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn check_tax_rate(rate: Decimal) -> Result<Decimal> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(BookkeeperError::Settings(format!(
            "Tax rate must be between 0 and 100, got {rate}"
        )));
    }
    Ok(rate)
}

pub fn set_tax_rate(settings: &mut Settings, rate: Decimal) -> Result<()> {
    settings.tax_rate = check_tax_rate(rate)?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
