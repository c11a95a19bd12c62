//! Control-channel dispatch.
//!
//! Calls decoded by the inbound adapter arrive on an `mpsc` channel and are
//! handled one at a time by a single [`ControlHandler`], so handlers may
//! mutate launcher state without locking.

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::port::inbound::{ControlCall, ControlHandler};

/// Snapshot answered to `getinfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoSnapshot {
    pub wallets: WalletsInfo,
    pub backup: BackupInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletsInfo {
    pub default_password: bool,
    pub mnemonic_shown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub location: String,
    pub default_location: bool,
}

impl InfoSnapshot {
    /// The mnemonic counts as shown once the operator replaced the default
    /// password.
    #[must_use]
    pub fn new(default_password: bool, location: String, default_location: bool) -> Self {
        Self {
            wallets: WalletsInfo {
                default_password,
                mnemonic_shown: !default_password,
            },
            backup: BackupInfo {
                location,
                default_location,
            },
        }
    }
}

/// Handle calls until the sender side closes or shutdown is requested.
pub async fn dispatch_calls<H>(
    handler: &mut H,
    mut calls: mpsc::Receiver<ControlCall>,
    mut shutdown: watch::Receiver<bool>,
) where
    H: ControlHandler + ?Sized,
{
    loop {
        tokio::select! {
            call = calls.recv() => {
                let Some(call) = call else {
                    debug!("Control channel closed");
                    break;
                };
                debug!(id = call.request.id, method = %call.request.method, "Control call");
                let response = handler.handle(call.request).await;
                // The adapter may have gone away while we were handling.
                let _ = call.reply.send(response);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::inbound::{ControlRequest, ControlResponse};
    use async_trait::async_trait;
    use tokio::sync::oneshot;

    #[test]
    fn snapshot_uses_gateway_field_names() {
        let snapshot = InfoSnapshot::new(true, "/backup".into(), false);
        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            r#"{"wallets":{"defaultPassword":true,"mnemonicShown":false},"backup":{"location":"/backup","defaultLocation":false}}"#
        );
    }

    struct Echo {
        handled: Vec<u64>,
    }

    #[async_trait]
    impl ControlHandler for Echo {
        async fn handle(&mut self, request: ControlRequest) -> Option<ControlResponse> {
            self.handled.push(request.id);
            (request.method == "getinfo").then(|| ControlResponse::ok(request.id, "{}"))
        }
    }

    fn call(id: u64, method: &str) -> (ControlCall, oneshot::Receiver<Option<ControlResponse>>) {
        let (reply, rx) = oneshot::channel();
        let request = ControlRequest {
            id,
            method: method.into(),
            params: Vec::new(),
        };
        (ControlCall { request, reply }, rx)
    }

    #[tokio::test]
    async fn handles_calls_in_order_until_closed() {
        let (tx, rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (first, first_reply) = call(1, "getinfo");
        let (second, second_reply) = call(2, "backupto");
        tx.send(first).await.unwrap();
        tx.send(second).await.unwrap();
        drop(tx);

        let mut handler = Echo { handled: Vec::new() };
        dispatch_calls(&mut handler, rx, shutdown_rx).await;

        assert_eq!(handler.handled, [1, 2]);
        assert_eq!(first_reply.await.unwrap(), Some(ControlResponse::ok(1, "{}")));
        assert_eq!(second_reply.await.unwrap(), None);
    }
}
