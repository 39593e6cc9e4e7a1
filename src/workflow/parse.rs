//! Free-text `product: quantity` lists, as typed by operators or found in orders.
//!
//! Items are separated by commas and split at the first colon. Only the digits
//! of the quantity part count, so `"Widget: 5 units"` reads as 5. An item
//! without a colon, without a product name or without any digit is skipped
//! with a warning.

use tracing::warn;

/// Parses an order: every quantity must be positive.
///
/// `"Widget: 5, Gear Box: 2"` -> `[("Widget", 5), ("Gear Box", 2)]`
pub fn parse_order_items(text: &str) -> Vec<(String, u32)> {
    parse_items(text, false)
}

/// Parses a manual stock entry, where zero is a valid quantity.
pub fn parse_stock_entries(text: &str) -> Vec<(String, u32)> {
    parse_items(text, true)
}

fn parse_items(text: &str, allow_zero: bool) -> Vec<(String, u32)> {
    let mut items = Vec::new();
    for item in text.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let Some((product, raw_quantity)) = item.split_once(':') else {
            warn!(item, "Skipping item without ':'");
            continue;
        };
        let product = product.trim();
        if product.is_empty() {
            warn!(item, "Skipping item without product name");
            continue;
        }

        let digits: String = raw_quantity.chars().filter(char::is_ascii_digit).collect();
        let quantity = match digits.parse::<u32>() {
            Ok(quantity) => quantity,
            Err(e) => {
                warn!(item, error = %e, "Skipping item with unreadable quantity");
                continue;
            }
        };
        if quantity == 0 && !allow_zero {
            warn!(item, "Skipping item with zero quantity");
            continue;
        }
        items.push((product.to_string(), quantity));
    }
    items
}
