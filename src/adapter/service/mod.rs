//! Service adapters: one implementation per service kind.
//!
//! Every adapter owns a [`ServiceBase`] and lowers its configuration table
//! into a [`ServiceDescriptor`](crate::domain::ServiceDescriptor) on `apply`.
//! The readiness ladder is computed on demand by `status`.

pub mod arby;
pub mod base;
pub mod boltz;
pub mod chain;
pub mod connext;
pub mod geth;
pub mod lnd;
pub mod proxy;
pub mod registry;
pub mod sync;
pub mod webui;
pub mod xud;

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{EmptyRpc, RpcDescriptor, ServiceDescriptor, ServiceKind, Status};
use crate::error::Result;
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::{ApplyContext, Resolved};

pub use arby::Arby;
pub use base::ServiceBase;
pub use boltz::Boltz;
pub use chain::{ChainData, ChainDaemon};
pub use connext::Connext;
pub use geth::Geth;
pub use lnd::{Chain, Lnd};
pub use proxy::Proxy;
pub use registry::{ApplyInputs, ServiceRegistry};
pub use sync::{NeutrinoSyncParser, SyncLogParser};
pub use webui::Webui;
pub use xud::Xud;

/// A managed service of the stack.
#[async_trait]
pub trait Service: Send + Sync {
    fn base(&self) -> &ServiceBase;

    /// Recompute the descriptor and RPC descriptor from configuration.
    ///
    /// Dependencies are read from `ctx.resolved`; callers apply services in
    /// registry order so every dependency is already there.
    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()>;

    /// Current rung of the status ladder.
    ///
    /// Known transient probe failures map to a status. Anything else is an
    /// error.
    async fn status(&self) -> Result<Status>;

    /// RPC descriptor published to dependents and the inventory.
    fn rpc_params(&self) -> RpcDescriptor {
        unresolved_rpc()
    }

    /// Operating mode for kinds that have one.
    fn mode(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn kind(&self) -> ServiceKind {
        self.base().descriptor().kind
    }

    fn descriptor(&self) -> &ServiceDescriptor {
        self.base().descriptor()
    }

    fn container(&self) -> &str {
        self.base().container()
    }

    fn data_dir(&self) -> &Path {
        self.base().data_dir()
    }

    fn is_disabled(&self) -> bool {
        self.base().descriptor().disabled
    }

    /// Snapshot of what this service publishes to later services.
    fn resolved(&self) -> Resolved {
        Resolved {
            rpc: self.rpc_params(),
            data_dir: self.data_dir().to_path_buf(),
            mode: self.mode().map(str::to_string),
        }
    }
}

/// Descriptor of a service that has not been applied.
pub(crate) fn unresolved_rpc() -> RpcDescriptor {
    RpcDescriptor::Empty(EmptyRpc {})
}
