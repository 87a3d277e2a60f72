use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount in dollars with thousands separators: $1,234.56
pub fn money(val: Decimal) -> String {
    let rounded = val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let cents = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Money, or an em dash when there is no value to show.
pub fn money_or_dash(val: Option<Decimal>) -> String {
    val.map(money).unwrap_or_else(|| "\u{2014}".to_string())
}

/// Tax rate as entered, without trailing zeros: 25%, 27.5%
pub fn percent(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}
