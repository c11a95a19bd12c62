//! Wallet bootstrap for the order-matching daemon.
//!
//! Runs inline from the readiness poll: a missing wallet is created with the
//! default password and a locked one is unlocked with it. Gateway rejections
//! are surfaced verbatim and end the poll.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::poller::StatusHook;
use crate::domain::{GatewayRpc, Status};
use crate::error::{BootstrapError, Result};
use crate::port::outbound::WalletApi;

/// Password the wallets are created with until the operator changes it.
pub const DEFAULT_WALLET_PASSWORD: &str = "OpenDEX!Rocks";

pub struct WalletBootstrap {
    api: Arc<dyn WalletApi>,
    gateway: GatewayRpc,
    marker: PathBuf,
}

impl WalletBootstrap {
    #[must_use]
    pub fn new(api: Arc<dyn WalletApi>, gateway: GatewayRpc, marker: PathBuf) -> Self {
        Self {
            api,
            gateway,
            marker,
        }
    }

    /// Create wallets, then write the default-password marker.
    ///
    /// The marker is only written when the gateway accepted the request.
    pub async fn create(&self) -> Result<()> {
        info!(gateway = %self.gateway.api_url(), "Creating wallets");
        self.api.create(&self.gateway, DEFAULT_WALLET_PASSWORD).await?;
        tokio::fs::write(&self.marker, b"")
            .await
            .map_err(BootstrapError::Marker)?;
        Ok(())
    }

    pub async fn unlock(&self) -> Result<()> {
        info!(gateway = %self.gateway.api_url(), "Unlocking wallets");
        self.api.unlock(&self.gateway, DEFAULT_WALLET_PASSWORD).await
    }
}

#[async_trait]
impl StatusHook for WalletBootstrap {
    async fn on_status(&self, _service: &str, status: &Status) -> Result<()> {
        match status {
            Status::WalletMissing => self.create().await,
            Status::WalletLocked => self.unlock().await,
            _ => Ok(()),
        }
    }
}
