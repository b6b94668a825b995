//! Transaction ledger.
//!
//! Every successful stock mutation appends one immutable row here; the
//! reporting side reads the whole history back as a pure projection.

mod log;

pub use log::{TransactionLog, LOG_COLUMNS};
