//! Helpers shared by the flows and the CLI.

pub mod address;
pub mod amount;
pub mod builders;

pub use address::{format_address_short, is_valid_address, parse_address};
pub use amount::{format_amount, parse_amount, TOKEN_DECIMALS};
