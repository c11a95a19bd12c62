//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams between the lifecycle core and everything it drives:
//!
//! ```text
//!                    ┌─────────────────────────┐
//!   control channel ─┤      Application        ├─ container runtime
//!   (inbound)        │  registry · poller ·    ├─ compose engine
//!                    │  coordinator            ├─ gateway wallet API
//!                    └─────────────────────────┘   (outbound)
//! ```
//!
//! - [`service`] - Apply-time context shared between service adapters
//! - [`outbound`] - Driven side: [`ContainerRuntime`], [`ComposeEngine`], [`WalletApi`]
//! - [`inbound`] - Driving side: control-channel messages and [`ControlHandler`]

pub mod inbound;
pub mod outbound;
pub mod service;

pub use inbound::{ControlCall, ControlHandler, ControlRequest, ControlResponse};
pub use outbound::{ComposeEngine, ContainerRuntime, ContainerState, LogFollow, WalletApi};
pub use service::{ApplyContext, Resolved, ResolvedServices};
