//! Control-channel port.
//!
//! The gateway drives runtime changes over a duplex connection. The inbound
//! adapter owns the connection and forwards each decoded request as a
//! [`ControlCall`]; a single [`ControlHandler`] processes calls one at a time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Request sent by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Vec<String>,
}

/// Response written back to the gateway. `None` fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlResponse {
    pub id: u64,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl ControlResponse {
    #[must_use]
    pub fn ok(id: u64, result: impl Into<String>) -> Self {
        Self {
            id,
            result: Some(result.into()),
            error: None,
        }
    }

    #[must_use]
    pub fn err(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// A decoded request plus the slot its response is written to.
///
/// A `None` reply means the method produces no response frame.
#[derive(Debug)]
pub struct ControlCall {
    pub request: ControlRequest,
    pub reply: oneshot::Sender<Option<ControlResponse>>,
}

/// Processes control requests. Calls are never handled concurrently.
#[async_trait]
pub trait ControlHandler: Send {
    async fn handle(&mut self, request: ControlRequest) -> Option<ControlResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_params_default_to_empty() {
        let request: ControlRequest =
            serde_json::from_str(r#"{"id": 7, "method": "getinfo"}"#).unwrap();
        assert_eq!(request.id, 7);
        assert!(request.params.is_empty());
    }

    #[test]
    fn response_serializes_null_error() {
        let response = ControlResponse::ok(3, "{}");
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"id":3,"result":"{}","error":null}"#
        );
    }
}
