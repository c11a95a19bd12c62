//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`runtime`] - Scripted [`ContainerRuntime`](crate::port::ContainerRuntime)
//!   and a [`ComposeEngine`](crate::port::ComposeEngine) that records calls.
//! - [`wallet`] - Scripted [`WalletApi`](crate::port::WalletApi).
//! - [`service`] - A [`Service`](crate::adapter::service::Service) that
//!   replays a status script.
//! - [`domain`] - Builders for apply contexts and resolved dependencies.

pub mod domain;
pub mod runtime;
pub mod service;
pub mod wallet;
