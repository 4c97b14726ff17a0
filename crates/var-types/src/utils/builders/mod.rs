//! Builders for receipts and logs, mainly for tests in downstream crates.

pub mod log;
pub mod transaction_receipt;

pub use log::LogBuilder;
pub use transaction_receipt::TransactionReceiptBuilder;
