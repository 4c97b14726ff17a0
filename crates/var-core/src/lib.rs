//! Deployment orchestration for the VAR token ecosystem.
//!
//! Two roles share one factory contract. The owner deploys and initializes the
//! factory and authorizes a deployer bot; the bot deploys a fresh token
//! implementation, links it into the factory and asks the factory for a proxy.
//! Both flows are explicit state machines driven one step at a time, and both
//! record what they deployed in the contract registry as soon as it exists on
//! chain. Post-deployment token operations go through the same session.
//!
//! Everything runs against a [`Session`], which binds one network, one signer
//! and one registry. Switching networks produces a new session.

pub mod command;
pub mod error;
pub mod flows;
pub mod interaction;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{dispatch, Command, Outcome};
pub use error::{DispatchError, FlowError, FlowState, OrchestratorError};
pub use flows::bot::{BotFlow, BotState, EcosystemDeployment, EcosystemParams};
pub use flows::owner::{OwnerFlow, OwnerReport, OwnerState};
pub use interaction::{AccessReport, TokenAction, TokenClient, TokenOutcome};
pub use session::{ContractSources, Session};
