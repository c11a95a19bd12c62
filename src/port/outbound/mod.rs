//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the external processes the launcher drives: the
//! container runtime, the compose engine and the gateway's management API.

pub mod compose;
pub mod runtime;
pub mod wallet;

pub use compose::ComposeEngine;
pub use runtime::{ContainerRuntime, ContainerState, LogFollow};
pub use wallet::WalletApi;
