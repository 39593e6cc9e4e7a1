//! Order-processing steps that touch stock.
//!
//! - [`intake`]: check an incoming order against current stock
//! - [`warehouse`]: operator stock entry
//! - [`fulfillment`]: deduct an order and write the spreadsheet back
//! - [`oversight`]: stock-level metrics and insights
//!
//! Routing, order status and approval live outside this crate.

pub mod fulfillment;
pub mod intake;
pub mod oversight;
pub mod parse;
pub mod warehouse;

pub use fulfillment::{deduct_item, fulfill_order, FulfilledLine, Fulfillment};
pub use intake::{check_order, StockCheck, StockCheckLine};
pub use oversight::{overview, StockOverview};
pub use parse::{parse_order_items, parse_stock_entries};
pub use warehouse::{manual_update, set_item};
