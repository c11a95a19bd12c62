//! Outbound adapters (driven side).

pub mod compose;
pub mod docker;
pub mod gateway;
pub mod tls;

pub use compose::DockerCompose;
pub use docker::DockerCli;
pub use gateway::HttpWalletApi;
