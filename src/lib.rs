//! xud-launcher - lifecycle controller for the xud trading-node stack.
//!
//! Brings a network's containers up in dependency order, waits for each
//! service to become usable, bootstraps the order-matching daemon's wallets
//! and then serves the gateway's control channel.
//!
//! # Architecture
//!
//! The crate uses a hexagonal layout:
//!
//! - [`domain`] - Networks, descriptors, RPC descriptors, the status ladder
//! - [`port`] - Traits at the seams: container runtime, compose engine,
//!   gateway wallet API and the control-channel handler
//! - [`adapter`] - Service adapters per kind, docker-backed outbound adapters,
//!   the CLI and the control-channel client
//! - [`application`] - Registry-driven bring-up and tear-down, readiness
//!   polling, wallet bootstrap and artifact generation
//! - [`infrastructure`] - Configuration, workspace paths and wiring
//!
//! # Features
//!
//! - `testkit` - Scripted fakes for the outbound ports, for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
