//! Application services (use cases).
//!
//! These services sequence the lifecycle of the stack on top of the service
//! adapters and the outbound ports.

pub mod artifact;
pub mod bootstrap;
pub mod control;
pub mod coordinator;
pub mod poller;

pub use coordinator::{Coordinator, CoordinatorDeps, ServiceReport};
pub use poller::Poller;
