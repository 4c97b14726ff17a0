//! Common types for the VAR deployment manager.
//!
//! Everything that crosses a crate boundary lives here: network profiles,
//! transaction and receipt shapes, decoded events and the exact amount and
//! address helpers used by every flow.

use thiserror::Error;

/// Transaction, receipt and log types exchanged with the delivery layer.
pub mod delivery;
/// Decoded event representation.
pub mod events;
/// Network profiles.
pub mod network;
/// Registry keys and role tags.
pub mod registry;
/// Amount, address and formatting helpers.
pub mod utils;

pub use delivery::*;
pub use events::ParsedEvent;
pub use network::NetworkProfile;
pub use registry::{RegistryKey, RoleTag};

/// Errors raised while validating operator input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
	/// The input is not a well-formed 20-byte hex address.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// The input is not an exact decimal amount at the requested scale.
	#[error("Invalid amount '{input}': {reason}")]
	InvalidAmount { input: String, reason: String },
}
