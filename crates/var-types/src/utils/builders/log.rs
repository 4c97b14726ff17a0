//! Log builder.

use crate::Log;
use alloy_primitives::{Address, Bytes, B256};

/// Builder for raw `Log` entries.
#[derive(Debug, Clone, Default)]
pub struct LogBuilder {
	address: Address,
	topics: Vec<B256>,
	data: Vec<u8>,
}

impl LogBuilder {
	pub fn new(address: Address) -> Self {
		Self {
			address,
			..Default::default()
		}
	}

	pub fn topic(mut self, topic: B256) -> Self {
		self.topics.push(topic);
		self
	}

	/// Adds an address as an indexed topic, left-padded to 32 bytes.
	pub fn address_topic(self, address: Address) -> Self {
		self.topic(address.into_word())
	}

	pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
		self.data = data.into();
		self
	}

	pub fn build(self) -> Log {
		Log {
			address: self.address,
			topics: self.topics,
			data: Bytes::from(self.data),
		}
	}
}
