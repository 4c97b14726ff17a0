//! Decoded contract events.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;

/// An event decoded from a raw log against a contract interface.
///
/// Arguments keep the declaration order of the event; unnamed arguments are
/// keyed by their position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
	/// Event name as declared in the interface.
	pub name: String,
	/// Contract that emitted the log.
	pub emitter: Address,
	/// Named arguments in declaration order.
	pub args: Vec<(String, DynSolValue)>,
}

impl ParsedEvent {
	/// Returns the argument with the given name.
	pub fn arg(&self, name: &str) -> Option<&DynSolValue> {
		self.args
			.iter()
			.find(|(arg_name, _)| arg_name == name)
			.map(|(_, value)| value)
	}

	/// Returns the argument with the given name if it is an address.
	pub fn address_arg(&self, name: &str) -> Option<Address> {
		self.arg(name).and_then(DynSolValue::as_address)
	}
}
