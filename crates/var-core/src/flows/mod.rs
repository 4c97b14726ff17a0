//! Deployment state machines.

pub mod bot;
pub mod owner;
