//! Inbound adapters (driving side): the operator CLI and the gateway's
//! control channel.

pub mod cli;
pub mod control;

pub use control::ControlChannel;
