//! Messages understood by the [`LedgerActor`](super::LedgerActor).
//!
//! Each variant maps 1:1 to a [`Ledger`](crate::clients::Ledger) operation and
//! carries the responder the actor answers on.

use crate::error::StockError;
use crate::framework::Response;
use crate::model::StockSnapshot;

#[derive(Debug)]
pub enum LedgerRequest {
    Get {
        product: String,
        respond_to: Response<u32, StockError>,
    },
    GetAll {
        respond_to: Response<StockSnapshot, StockError>,
    },
    /// Overwrites one quantity; answers the previous value (0 if unknown).
    Set {
        product: String,
        quantity: u32,
        respond_to: Response<u32, StockError>,
    },
    /// Merges every entry, persisting once.
    BulkSet {
        items: StockSnapshot,
        respond_to: Response<(), StockError>,
    },
    /// Answers how many of the named products were present.
    RemoveMany {
        products: Vec<String>,
        respond_to: Response<usize, StockError>,
    },
    /// Answers the remaining quantity.
    Deduct {
        product: String,
        quantity: u32,
        respond_to: Response<u32, StockError>,
    },
    /// All-or-nothing; answers the remaining quantity per line.
    DeductMany {
        items: Vec<(String, u32)>,
        respond_to: Response<Vec<(String, u32)>, StockError>,
    },
    /// Answers the new quantity.
    Add {
        product: String,
        quantity: u32,
        respond_to: Response<u32, StockError>,
    },
    Flush {
        respond_to: Response<(), StockError>,
    },
}
