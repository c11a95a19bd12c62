//! Wallet bootstrap against a stand-in gateway HTTP API.

mod support;

use std::sync::Arc;

use support::http::respond_once;
use xud_launcher::adapter::outbound::HttpWalletApi;
use xud_launcher::application::bootstrap::{WalletBootstrap, DEFAULT_WALLET_PASSWORD};
use xud_launcher::domain::{GatewayRpc, Protocol};
use xud_launcher::error::{BootstrapError, Error};

fn gateway(port: u16) -> GatewayRpc {
    GatewayRpc {
        protocol: Protocol::Http,
        scheme: "http".into(),
        port,
    }
}

#[tokio::test]
async fn create_posts_default_password_and_writes_marker() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join(".default-password");
    let (port, request) = respond_once("200 OK", "{}").await;
    let bootstrap = WalletBootstrap::new(
        Arc::new(HttpWalletApi::new().unwrap()),
        gateway(port),
        marker.clone(),
    );

    bootstrap.create().await.unwrap();

    let request = request.await.unwrap();
    assert!(request.starts_with("POST /api/v1/xud/create HTTP/1.1"), "{request}");
    assert!(request.ends_with(&format!(r#"{{"password":"{DEFAULT_WALLET_PASSWORD}"}}"#)));
    assert!(marker.exists());
}

#[tokio::test]
async fn rejected_create_leaves_no_marker() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join(".default-password");
    let (port, _request) =
        respond_once("500 Internal Server Error", r#"{"message":"xud is starting"}"#).await;
    let bootstrap = WalletBootstrap::new(
        Arc::new(HttpWalletApi::new().unwrap()),
        gateway(port),
        marker.clone(),
    );

    let err = bootstrap.create().await.unwrap_err();

    assert_eq!(err.to_string(), "[http 500] xud is starting");
    assert!(!marker.exists());
}

#[tokio::test]
async fn unlock_failure_without_json_body() {
    let dir = tempfile::tempdir().unwrap();
    let (port, request) = respond_once("502 Bad Gateway", "upstream unavailable").await;
    let bootstrap = WalletBootstrap::new(
        Arc::new(HttpWalletApi::new().unwrap()),
        gateway(port),
        dir.path().join(".default-password"),
    );

    let err = bootstrap.unlock().await.unwrap_err();

    assert!(
        matches!(
            err,
            Error::Bootstrap(BootstrapError::Undecodable { status: 502, .. })
        ),
        "{err}"
    );
    assert!(request
        .await
        .unwrap()
        .starts_with("POST /api/v1/xud/unlock"));
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let api = HttpWalletApi::new().unwrap();

    let err = xud_launcher::port::WalletApi::create(&api, &gateway(port), "pw")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)), "{err}");
}
