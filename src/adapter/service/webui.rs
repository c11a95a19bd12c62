//! Web front end.

use std::sync::Arc;

use async_trait::async_trait;

use super::base::{default_image, ServiceBase};
use super::Service;
use crate::domain::{Network, ServiceKind, Status};
use crate::error::Result;
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

pub struct Webui {
    base: ServiceBase,
}

impl Webui {
    #[must_use]
    pub fn new(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new("webui", ServiceKind::Webui, network, runtime),
        }
    }
}

#[async_trait]
impl Service for Webui {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let image = default_image(ctx.network, "webui", "1.0.0");
        self.base.apply_common(&config.webui.common, &image, true, ctx);
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        self.base.running_is_ready().await
    }
}
