//! Errors raised by the orchestrator.

use alloy_primitives::{Address, Bytes};
use std::fmt;
use thiserror::Error;
use var_compiler::CompilationError;
use var_delivery::{DeliveryError, EventError};
use var_storage::RegistryError;
use var_types::{TransactionHash, TypesError};

/// Errors that can occur while running a deployment step or a token command.
#[derive(Debug, Error)]
pub enum OrchestratorError {
	/// The bot flow needs a factory and none is recorded on the network.
	#[error("No factory recorded on {network}; run the owner deployment first")]
	NoFactory { network: String },
	/// A token command needs a proxy and none was given or recorded.
	#[error("No token proxy recorded on {network}")]
	NoProxy { network: String },
	/// The ecosystem transaction succeeded but its proxy could not be found.
	#[error(
		"Proxy deployed on-chain but address undiscoverable (tx {tx_hash}, implementation {implementation}): {reason}"
	)]
	ProxyUndiscoverable {
		tx_hash: TransactionHash,
		implementation: Address,
		reason: String,
	},
	/// A step was attempted out of order.
	#[error("Invalid transition from {from} to {to}")]
	InvalidTransition { from: String, to: String },
	/// A view function returned something other than what it declares.
	#[error("Unexpected output from {function}: {value}")]
	UnexpectedOutput { function: String, value: String },
	#[error(transparent)]
	Compilation(#[from] CompilationError),
	#[error(transparent)]
	Delivery(#[from] DeliveryError),
	#[error(transparent)]
	Event(#[from] EventError),
	#[error("Registry error: {0}")]
	Registry(#[from] RegistryError),
	#[error("Activity log error: {0}")]
	ActivityLog(std::io::Error),
	#[error(transparent)]
	Types(#[from] TypesError),
}

impl OrchestratorError {
	/// Raw revert payload of a failed transaction, if the node returned one.
	pub fn revert_data(&self) -> Option<&Bytes> {
		match self {
			OrchestratorError::Delivery(e) => e.revert_data(),
			_ => None,
		}
	}
}

/// States of a deployment flow.
pub trait FlowState: Copy + fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static {
	/// Whether a step may move the flow from `self` to `to`.
	fn can_transition_to(self, to: Self) -> bool;
}

/// A flow failure together with the last state the flow completed.
///
/// Steps that completed before the failure are not rolled back; `reached`
/// tells the operator exactly what is on chain and in the registry.
#[derive(Debug, Error)]
#[error("{source} (flow stopped at {reached})")]
pub struct FlowError<S: FlowState> {
	pub reached: S,
	pub source: OrchestratorError,
}

impl<S: FlowState> FlowError<S> {
	pub fn revert_data(&self) -> Option<&Bytes> {
		self.source.revert_data()
	}
}

/// Error returned by [`dispatch`](crate::dispatch).
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error(transparent)]
	Owner(#[from] FlowError<crate::OwnerState>),
	#[error(transparent)]
	Bot(#[from] FlowError<crate::BotState>),
	#[error(transparent)]
	Orchestrator(#[from] OrchestratorError),
}

impl DispatchError {
	pub fn revert_data(&self) -> Option<&Bytes> {
		match self {
			DispatchError::Owner(e) => e.revert_data(),
			DispatchError::Bot(e) => e.revert_data(),
			DispatchError::Orchestrator(e) => e.revert_data(),
		}
	}
}

/// Validates `from -> to` before a step runs.
pub(crate) fn check_transition<S: FlowState>(from: S, to: S) -> Result<(), OrchestratorError> {
	if from.can_transition_to(to) {
		Ok(())
	} else {
		Err(OrchestratorError::InvalidTransition {
			from: from.to_string(),
			to: to.to_string(),
		})
	}
}
