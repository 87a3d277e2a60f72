use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::fmt::percent;
use crate::settings::{load_settings, save_settings, set_tax_rate as apply_tax_rate};

pub fn show() -> Result<()> {
    let settings = load_settings();
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![Cell::new("Data dir"), Cell::new(&settings.data_dir)]);
    table.add_row(vec![Cell::new("Tax rate"), Cell::new(percent(settings.tax_rate))]);
    table.add_row(vec![
        Cell::new("Default categories"),
        Cell::new(settings.default_categories.len()),
    ]);
    table.add_row(vec![Cell::new("Default rules"), Cell::new(settings.default_rules.len())]);
    println!("Settings\n{table}");
    Ok(())
}

pub fn set_tax_rate(rate: Decimal) -> Result<()> {
    let mut settings = load_settings();
    apply_tax_rate(&mut settings, rate)?;
    save_settings(&settings)?;
    println!("Tax rate set to {}", percent(settings.tax_rate));
    Ok(())
}
