//! Compose engine port.

use async_trait::async_trait;

use crate::error::Result;

/// External engine that materializes containers from the generated
/// composition descriptor in the network directory.
///
/// Output of the engine is logged, never parsed for control decisions.
#[async_trait]
pub trait ComposeEngine: Send + Sync {
    /// Create (if needed) and start one service in the background.
    async fn up(&self, service: &str) -> Result<()>;

    /// Pull every image referenced by the descriptor.
    async fn pull(&self) -> Result<()>;

    /// Stop and remove every container and network of the project.
    async fn down(&self) -> Result<()>;
}
