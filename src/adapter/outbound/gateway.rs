//! Gateway management API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::GatewayRpc;
use crate::error::{BootstrapError, Result};
use crate::port::outbound::WalletApi;

/// Wallet creation can take a while on slow disks.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct PasswordRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
struct FailureBody {
    message: String,
}

/// [`WalletApi`] over the gateway's HTTP management endpoints.
#[derive(Debug, Clone)]
pub struct HttpWalletApi {
    client: Client,
}

impl HttpWalletApi {
    /// Build a client that accepts the gateway's self-signed certificate.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn post(&self, gateway: &GatewayRpc, action: &str, password: &str) -> Result<()> {
        let url = format!("{}/api/v1/xud/{action}", gateway.api_url());
        debug!(%url, "Calling gateway");

        let response = self
            .client
            .post(&url)
            .json(&PasswordRequest { password })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await?;
        Err(rejection(status.as_u16(), &body).into())
    }
}

fn rejection(status: u16, body: &str) -> BootstrapError {
    match serde_json::from_str::<FailureBody>(body) {
        Ok(failure) => BootstrapError::Rejected {
            status,
            message: failure.message,
        },
        Err(e) => BootstrapError::Undecodable {
            status,
            reason: e.to_string(),
        },
    }
}

#[async_trait]
impl WalletApi for HttpWalletApi {
    async fn create(&self, gateway: &GatewayRpc, password: &str) -> Result<()> {
        self.post(gateway, "create", password).await
    }

    async fn unlock(&self, gateway: &GatewayRpc, password: &str) -> Result<()> {
        self.post(gateway, "unlock", password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_body_message_is_kept() {
        let err = rejection(500, r#"{"message":"wallet already exists"}"#);
        assert_eq!(err.to_string(), "[http 500] wallet already exists");
    }

    #[test]
    fn undecodable_failure_body() {
        let err = rejection(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, BootstrapError::Undecodable { status: 502, .. }));
    }
}
