//! Handler for the `setup` command.

use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::control::ControlChannel;
use crate::application::control::dispatch_calls;
use crate::application::Coordinator;
use crate::error::Result;

/// Pending control requests; the gateway sends them one at a time.
const CONTROL_QUEUE: usize = 8;

/// Bring the stack up, then serve gateway requests until interrupted or
/// the gateway goes away.
pub async fn execute(coordinator: &mut Coordinator, shutdown: watch::Receiver<bool>) -> Result<()> {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Network", coordinator.network());
    output::field(
        "Directory",
        coordinator.workspace().network_dir().display(),
    );

    let pb = output::spinner("Bringing up services");
    if let Err(e) = coordinator.setup().await {
        output::spinner_fail(&pb, "Setup failed");
        return Err(e);
    }
    output::spinner_success(&pb, "Services are up");

    let gateway = coordinator.gateway()?;
    let channel = ControlChannel::new(&gateway)?;
    let (calls, queue) = mpsc::channel(CONTROL_QUEUE);
    let serve = channel.spawn(calls, shutdown.clone());
    output::note("Serving gateway requests, press Ctrl-C to exit");

    dispatch_calls(coordinator, queue, shutdown).await;

    match serve.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(error = %e, "Control channel failed");
            output::warning(&format!("control channel: {e}"));
        }
        Err(e) => warn!(error = %e, "Control channel task panicked"),
    }
    Ok(())
}
