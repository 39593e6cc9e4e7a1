use super::parse::parse_order_items;
use crate::model::StockSnapshot;
use serde::Serialize;
use std::fmt::Display;

/// Availability of one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockCheckLine {
    pub product: String,
    pub needed: u32,
    pub available: u32,
}

impl StockCheckLine {
    pub fn is_available(&self) -> bool {
        self.available >= self.needed
    }
}

/// Result of checking an incoming order against current stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockCheck {
    pub lines: Vec<StockCheckLine>,
}

impl StockCheck {
    /// True when the order has at least one line and every line is covered.
    pub fn all_available(&self) -> bool {
        !self.lines.is_empty() && self.lines.iter().all(StockCheckLine::is_available)
    }
}

impl Display for StockCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Stock Check:")?;
        if self.lines.is_empty() {
            return writeln!(f, "No valid items found in order");
        }
        for line in &self.lines {
            let status = if line.is_available() {
                "✓ Available"
            } else {
                "✗ Insufficient"
            };
            writeln!(
                f,
                "{}: Need {}, Have {} {status}",
                line.product, line.needed, line.available
            )?;
        }
        Ok(())
    }
}

/// Verifies an order text against `stock` without touching the ledger.
pub fn check_order(text: &str, stock: &StockSnapshot) -> StockCheck {
    let lines = parse_order_items(text)
        .into_iter()
        .map(|(product, needed)| {
            let available = stock.get(&product).copied().unwrap_or(0);
            StockCheckLine {
                product,
                needed,
                available,
            }
        })
        .collect();
    StockCheck { lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_order_report() {
        let stock: StockSnapshot = [("Widget".to_string(), 10), ("Gear".to_string(), 1)].into();
        let check = check_order("Widget: 5, Gear: 2, Bolt: 1", &stock);

        assert!(!check.all_available());
        assert!(check.lines[0].is_available());
        assert_eq!(check.lines[2].available, 0);
        assert_eq!(
            check.to_string(),
            "Stock Check:\n\
             Widget: Need 5, Have 10 ✓ Available\n\
             Gear: Need 2, Have 1 ✗ Insufficient\n\
             Bolt: Need 1, Have 0 ✗ Insufficient\n"
        );
    }

    #[test]
    fn test_empty_order() {
        let check = check_order("hello", &StockSnapshot::new());
        assert!(!check.all_available());
        assert_eq!(check.to_string(), "Stock Check:\nNo valid items found in order\n");
    }
}
