//! Bring-up and tear-down against scripted services.

mod support;

use std::sync::Arc;
use std::time::Duration;

use support::stack::{ready_simnet, StackBuilder};
use xud_launcher::adapter::service::ServiceRegistry;
use xud_launcher::domain::{Network, Status, SyncProgress};
use xud_launcher::error::{Error, ServiceError};
use xud_launcher::testkit::runtime::FakeRuntime;

#[tokio::test]
async fn testnet_setup_starts_swap_helper_last() {
    let mut stack = StackBuilder::new(Network::Testnet)
        .service("proxy", vec![Status::Starting, Status::Ready])
        .service("bitcoind", vec![Status::Ready])
        .service("litecoind", vec![Status::Ready])
        .service("geth", vec![Status::Ready])
        .service(
            "lndbtc",
            vec![Status::Syncing(SyncProgress::new(99, 100)), Status::Ready],
        )
        .service("lndltc", vec![Status::WalletLocked])
        .service("connext", vec![Status::Ready])
        .service("xud", vec![Status::WalletLocked, Status::Ready])
        .service("boltz", vec![])
        .build();

    stack.coordinator.setup().await.unwrap();

    assert_eq!(
        stack.compose.calls(),
        [
            "pull",
            "up proxy",
            "up lndbtc",
            "up lndltc",
            "up connext",
            "up xud",
            "up boltz"
        ]
    );
    assert_eq!(stack.wallet.calls(), ["unlock OpenDEX!Rocks"]);
    assert!(!stack.coordinator.workspace().default_password_marker().exists());
}

#[tokio::test]
async fn first_layer2_failure_cancels_the_group() {
    let mut stack = StackBuilder::new(Network::Simnet)
        .service("proxy", vec![Status::Ready])
        .service("lndbtc", vec![Status::Starting])
        .service("lndltc", vec![Status::ContainerExited])
        .service("connext", vec![Status::Starting])
        .service("xud", vec![Status::Ready])
        .build();

    let err = stack.coordinator.setup().await.unwrap_err();

    assert!(
        matches!(
            &err,
            Error::Phase { source, .. }
                if matches!(**source, Error::Service(ServiceError::ContainerTerminal { .. }))
        ),
        "{err}"
    );
    assert!(err.to_string().starts_with("up layer2: lndltc"), "{err}");
    assert!(!stack.compose.calls().contains(&"up xud".to_string()));
}

#[tokio::test]
async fn interrupt_ends_a_pending_poll() {
    let mut stack = StackBuilder::new(Network::Simnet)
        .service("proxy", vec![Status::Starting])
        .service("lndbtc", vec![])
        .service("lndltc", vec![])
        .service("connext", vec![])
        .service("xud", vec![])
        .build();
    let shutdown = &stack.shutdown;
    let coordinator = &mut stack.coordinator;
    let interrupt = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown.send(true).unwrap();
    };

    let (result, ()) = tokio::time::timeout(
        Duration::from_secs(5),
        async { tokio::join!(coordinator.setup(), interrupt) },
    )
    .await
    .expect("setup should observe the interrupt");
    let err = result.unwrap_err();

    assert!(err.is_interrupted(), "{err}");
    assert_eq!(stack.compose.calls(), ["pull", "up proxy"]);
}

#[tokio::test]
async fn stop_tolerates_a_removed_container() {
    let mut stack = ready_simnet().build();
    stack.coordinator.setup().await.unwrap();
    stack.runtime.remove_state("simnet_connext_1");

    stack.coordinator.stop().await.unwrap();

    assert_eq!(stack.runtime.state_of("simnet_xud_1").as_deref(), Some("exited"));
    assert_eq!(stack.runtime.state_of("simnet_proxy_1").as_deref(), Some("exited"));
    assert!(stack
        .runtime
        .calls()
        .contains(&"stop simnet_connext_1".to_string()));
}

#[tokio::test]
async fn down_leaves_no_containers_or_network() {
    let mut stack = ready_simnet().build();
    stack.coordinator.setup().await.unwrap();

    stack.coordinator.down().await.unwrap();

    assert_eq!(stack.runtime.state_of("simnet_lndbtc_1"), None);
    assert_eq!(stack.compose.calls().last().map(String::as_str), Some("down"));
}

#[tokio::test]
async fn backup_relocation_restarts_the_order_matching_daemon() {
    let mut stack = ready_simnet().build();
    stack.coordinator.setup().await.unwrap();
    let target = stack.dir.path().join("usb");

    stack.coordinator.backup_to(&target).await.unwrap();

    assert_eq!(stack.coordinator.backup_dir(), target);
    assert_eq!(stack.compose.calls().last().map(String::as_str), Some("up xud"));
    let snapshot = stack.coordinator.info_snapshot().await.unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["backup"]["location"], target.display().to_string());
    assert_eq!(json["backup"]["defaultLocation"], false);
    assert_eq!(json["wallets"]["defaultPassword"], false);
}

#[tokio::test]
async fn status_of_real_testnet_adapters_without_containers() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(FakeRuntime::new());
    let registry = ServiceRegistry::for_network(Network::Testnet, runtime.clone()).unwrap();
    let (_tx, rx) = tokio::sync::watch::channel(false);
    let deps = xud_launcher::application::CoordinatorDeps {
        workspace: xud_launcher::domain::Workspace::under_home(
            Network::Testnet,
            dir.path().to_path_buf(),
        ),
        config: Default::default(),
        backup_dir: None,
        external_ip: None,
        runtime: runtime.clone(),
        compose: Arc::new(xud_launcher::testkit::runtime::RecordingCompose::new(
            Network::Testnet,
            runtime.clone(),
        )),
        wallet: Arc::new(xud_launcher::testkit::wallet::ScriptedWalletApi::new()),
        poller: xud_launcher::application::Poller::new(Duration::from_millis(5), rx),
    };
    let mut coordinator = xud_launcher::application::Coordinator::with_registry(deps, registry);

    let reports = coordinator.status_all().await.unwrap();

    assert_eq!(reports.len(), 11);
    assert!(matches!(reports[1].status, Ok(Status::Disabled)), "light-mode bitcoind");
    assert_eq!(reports.first().map(|r| r.name.as_str()), Some("proxy"));
    for report in &reports {
        let status = report.status.as_ref().unwrap();
        assert!(
            matches!(status, Status::ContainerMissing | Status::Disabled),
            "{}: {status}",
            report.name
        );
    }
}
