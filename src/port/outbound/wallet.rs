//! Gateway wallet management port.

use async_trait::async_trait;

use crate::domain::GatewayRpc;
use crate::error::Result;

/// Management API exposed by the gateway for the order-matching daemon's
/// wallets.
///
/// Both calls fail with [`BootstrapError::Rejected`](crate::error::BootstrapError::Rejected)
/// carrying the gateway's message when it answers with a non-success status.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Create wallets protected by `password`.
    async fn create(&self, gateway: &GatewayRpc, password: &str) -> Result<()>;

    /// Unlock existing wallets.
    async fn unlock(&self, gateway: &GatewayRpc, password: &str) -> Result<()>;
}
