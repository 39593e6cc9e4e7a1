//! Quantity parsing shared by the spreadsheet and API sources.

use serde_json::Value;

/// Parses a stock quantity from text.
///
/// Accepts non-negative integers and integral floats (`"12.0"`, as spreadsheet
/// exports often write them). Anything else, including values above
/// `u32::MAX`, is `None`.
pub fn parse_quantity(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(quantity) = raw.parse::<u32>() {
        return Some(quantity);
    }
    let value: f64 = raw.parse().ok()?;
    integral(value)
}

/// Reads a quantity from a JSON number or numeric string.
pub fn quantity_from_json(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => match number.as_u64() {
            Some(quantity) => u32::try_from(quantity).ok(),
            None => number.as_f64().and_then(integral),
        },
        Value::String(raw) => parse_quantity(raw),
        _ => None,
    }
}

fn integral(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}
