//! Readiness poller.
//!
//! Repeatedly probes one service until an acceptance predicate holds, the
//! container turns terminal, the probe fails, or the shutdown signal fires.
//! A poll that is waiting out its interval observes shutdown immediately; a
//! probe in flight runs to completion first.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::adapter::service::base::Coarse;
use crate::adapter::service::Service;
use crate::domain::Status;
use crate::error::{Error, Result, ServiceError};

/// Default interval between probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Side effect run on every non-accepted status before the next probe.
#[async_trait]
pub trait StatusHook: Send + Sync {
    async fn on_status(&self, service: &str, status: &Status) -> Result<()>;
}

/// Acceptance predicates used during bring-up.
pub mod accept {
    use crate::domain::Status;

    pub fn ready(status: &Status) -> bool {
        status.is_ready()
    }

    /// Channel daemons may start serving before their last block is in, and a
    /// locked wallet is unlocked later by the order-matching daemon.
    pub fn channel_daemon(status: &Status) -> bool {
        match status {
            Status::Ready | Status::WalletLocked => true,
            Status::Syncing(progress) => progress.is_nearly_synced(),
            _ => false,
        }
    }

    /// The order-matching daemon is usable before it has channels.
    pub fn order_matching(status: &Status) -> bool {
        matches!(status, Status::Ready | Status::WaitingForChannels)
    }
}

#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Poller {
    #[must_use]
    pub fn new(interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self { interval, shutdown }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// True once shutdown has been requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Poll until `accept` holds, returning the accepted status.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::ContainerTerminal`] when the container is missing or
    ///   has exited.
    /// - Any error from the probe or the hook, unchanged.
    /// - [`Error::Interrupted`] on shutdown.
    pub async fn wait_for<F>(
        &self,
        service: &dyn Service,
        accept: F,
        hook: Option<&dyn StatusHook>,
    ) -> Result<Status>
    where
        F: Fn(&Status) -> bool + Send + Sync,
    {
        let mut shutdown = self.shutdown.clone();
        loop {
            if *shutdown.borrow() {
                return Err(Error::Interrupted);
            }

            let status = service.status().await?;
            debug!(service = %service.name(), status = %status, "Polled status");

            if status.is_container_terminal() {
                return Err(ServiceError::ContainerTerminal {
                    service: service.name().to_string(),
                    status: status.to_string(),
                }
                .into());
            }
            if accept(&status) {
                return Ok(status);
            }
            if let Some(hook) = hook {
                hook.on_status(service.name(), &status).await?;
            }

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Err(Error::Interrupted);
                    }
                }
            }
        }
    }

    /// Poll until the container has exited or disappeared.
    ///
    /// Only the coarse container state is consulted. Used by tear-down, which
    /// is not cancellable once started.
    pub async fn wait_stopped(&self, service: &dyn Service) -> Result<()> {
        loop {
            match service.base().coarse().await? {
                Coarse::Stopped(status) if status.is_container_terminal() => return Ok(()),
                Coarse::Stopped(status) => {
                    debug!(service = %service.name(), status = %status, "Waiting for stop");
                }
                Coarse::Running(_) => {
                    debug!(service = %service.name(), "Waiting for stop");
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Network, SyncProgress};
    use crate::testkit::runtime::FakeRuntime;
    use crate::testkit::service::ScriptedService;
    use std::sync::{Arc, Mutex};

    fn poller() -> (watch::Sender<bool>, Poller) {
        let (tx, rx) = watch::channel(false);
        (tx, Poller::new(Duration::from_millis(5), rx))
    }

    fn service(statuses: Vec<Status>) -> ScriptedService {
        ScriptedService::new("lndbtc", Network::Testnet, Arc::new(FakeRuntime::new()))
            .with_statuses(statuses)
    }

    #[test]
    fn channel_daemon_accepts_nearly_synced() {
        assert!(accept::channel_daemon(&Status::Syncing(SyncProgress::new(500, 500))));
        assert!(accept::channel_daemon(&Status::Syncing(SyncProgress::new(
            99_999, 100_000
        ))));
        assert!(!accept::channel_daemon(&Status::Syncing(SyncProgress::new(50, 100))));
        assert!(accept::channel_daemon(&Status::WalletLocked));
        assert!(!accept::channel_daemon(&Status::Starting));
    }

    #[tokio::test]
    async fn retries_until_accepted() {
        let (_tx, poller) = poller();
        let service = service(vec![Status::Starting, Status::Starting, Status::Ready]);

        let status = poller.wait_for(&service, accept::ready, None).await.unwrap();
        assert_eq!(status, Status::Ready);
        assert_eq!(service.status_calls(), 3);
    }

    #[tokio::test]
    async fn tolerates_regression() {
        let (_tx, poller) = poller();
        let service = service(vec![
            Status::Starting,
            Status::Syncing(SyncProgress::new(1, 2)),
            Status::Starting,
            Status::Ready,
        ]);
        assert!(poller.wait_for(&service, accept::ready, None).await.is_ok());
    }

    #[tokio::test]
    async fn exited_container_is_terminal() {
        let (_tx, poller) = poller();
        let service = service(vec![Status::Starting, Status::ContainerExited]);

        let err = poller
            .wait_for(&service, accept::ready, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "lndbtc: Container exited");
    }

    #[tokio::test]
    async fn probe_error_ends_the_poll() {
        let (_tx, poller) = poller();
        let service = service(vec![Status::Starting]).then_fail(Error::Connection("boom".into()));

        let err = poller
            .wait_for(&service, accept::ready, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection error: boom");
        assert_eq!(service.status_calls(), 2);
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_wait() {
        let (tx, rx) = watch::channel(false);
        let poller = Poller::new(Duration::from_secs(3600), rx);
        let service = service(vec![Status::Starting]);

        let poll = poller.wait_for(&service, accept::ready, None);
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(poll, cancel);
        assert!(result.unwrap_err().is_interrupted());
    }

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl StatusHook for Recorder {
        async fn on_status(&self, service: &str, status: &Status) -> Result<()> {
            self.0.lock().unwrap().push(format!("{service}: {status}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn hook_sees_rejected_statuses_only() {
        let (_tx, poller) = poller();
        let service = service(vec![Status::WalletMissing, Status::WalletLocked, Status::Ready]);
        let recorder = Recorder(Mutex::new(Vec::new()));

        poller
            .wait_for(&service, accept::ready, Some(&recorder))
            .await
            .unwrap();
        assert_eq!(
            *recorder.0.lock().unwrap(),
            [
                "lndbtc: Wallet missing. Create with xucli create/restore.",
                "lndbtc: Wallet locked. Unlock with xucli unlock."
            ]
        );
    }

    #[tokio::test]
    async fn wait_stopped_follows_container_state() {
        let (_tx, poller) = poller();
        let runtime = Arc::new(FakeRuntime::new());
        runtime.set_state("testnet_lndbtc_1", "running");
        let service = ScriptedService::new("lndbtc", Network::Testnet, runtime.clone());

        let wait = poller.wait_stopped(&service);
        let stop = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            runtime.set_state("testnet_lndbtc_1", "exited");
        };
        let (result, ()) = tokio::join!(wait, stop);
        result.unwrap();
        assert_eq!(service.status_calls(), 0);
    }
}
