use crate::model::StockSnapshot;
use serde::Serialize;

/// Stock-level metrics for the oversight report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockOverview {
    pub product_count: usize,
    pub total_units: u64,
    /// Products below the threshold, zero included.
    pub low_stock: Vec<String>,
    pub out_of_stock: Vec<String>,
    pub insights: Vec<String>,
}

pub fn overview(stock: &StockSnapshot, low_stock_threshold: u32) -> StockOverview {
    let total_units: u64 = stock.values().map(|&quantity| u64::from(quantity)).sum();
    let low_stock: Vec<String> = stock
        .iter()
        .filter(|&(_, &quantity)| quantity < low_stock_threshold)
        .map(|(product, _)| product.clone())
        .collect();
    let out_of_stock: Vec<String> = stock
        .iter()
        .filter(|&(_, &quantity)| quantity == 0)
        .map(|(product, _)| product.clone())
        .collect();

    let mut insights = Vec::new();
    if !low_stock.is_empty() {
        insights.push(format!("Low stock items: {} - Reorder soon", low_stock.join(", ")));
    }
    if !out_of_stock.is_empty() {
        insights.push(format!("Out of stock: {}", out_of_stock.join(", ")));
    }
    insights.push(format!(
        "{total_units} units across {} products",
        stock.len()
    ));

    StockOverview {
        product_count: stock.len(),
        total_units,
        low_stock,
        out_of_stock,
        insights,
    }
}
