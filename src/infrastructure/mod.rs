//! Infrastructure layer.
//!
//! - [`config`] - Configuration loading, validation and logging setup
//! - [`paths`] - Workspace location and state recovered from earlier runs
//! - [`builder`] - Composition root wiring the coordinator to its adapters

pub mod builder;
pub mod config;
pub mod paths;
