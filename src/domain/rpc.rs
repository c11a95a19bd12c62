//! RPC descriptors published by services for their dependents.
//!
//! A descriptor is recomputed on every `apply` and serialized verbatim into the
//! JSON inventory, so field names follow the inventory format.

use serde::Serialize;

/// Wire protocol of an RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "gRPC")]
    Grpc,
    #[serde(rename = "JSON-RPC")]
    JsonRpc,
}

/// Gateway endpoint published on the loopback interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayRpc {
    #[serde(rename = "type")]
    pub protocol: Protocol,
    pub scheme: String,
    pub port: u16,
}

impl GatewayRpc {
    /// Base URL of the management API.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}://127.0.0.1:{}", self.scheme, self.port)
    }

    /// URL of the duplex control endpoint.
    #[must_use]
    pub fn control_url(&self) -> String {
        let scheme = if self.scheme == "https" { "wss" } else { "ws" };
        format!("{scheme}://127.0.0.1:{}/launcher", self.port)
    }
}

/// gRPC endpoint with TLS material paths as seen from inside the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrpcRpc {
    #[serde(rename = "type")]
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    #[serde(rename = "tlsCert")]
    pub tls_cert: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macaroon: Option<String>,
}

/// JSON-RPC endpoint of a UTXO chain-data daemon.
///
/// Every field is empty when the daemon runs without an RPC backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainRpc {
    #[serde(rename = "type")]
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub zmqpubrawblock: String,
    pub zmqpubrawtx: String,
}

impl ChainRpc {
    /// Descriptor with no backing endpoint.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            protocol: Protocol::JsonRpc,
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
            zmqpubrawblock: String::new(),
            zmqpubrawtx: String::new(),
        }
    }
}

/// JSON-RPC endpoint of an Ethereum provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthRpc {
    #[serde(rename = "type")]
    pub protocol: Protocol,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub port: u16,
}

impl EthRpc {
    /// Provider URI; the port is omitted when zero.
    #[must_use]
    pub fn uri(&self) -> String {
        if self.port == 0 {
            format!("{}://{}{}", self.scheme, self.host, self.path)
        } else {
            format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
        }
    }
}

/// Plain HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpRpc {
    #[serde(rename = "type")]
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
}

/// Per-chain endpoints of the swap helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRpc {
    pub bitcoin: GrpcRpc,
    pub litecoin: GrpcRpc,
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptyRpc {}

/// RPC descriptor of any service kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RpcDescriptor {
    Gateway(GatewayRpc),
    Grpc(GrpcRpc),
    Chain(ChainRpc),
    Eth(EthRpc),
    Http(HttpRpc),
    Swap(SwapRpc),
    Empty(EmptyRpc),
}

impl RpcDescriptor {
    #[must_use]
    pub const fn as_gateway(&self) -> Option<&GatewayRpc> {
        match self {
            Self::Gateway(rpc) => Some(rpc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_grpc(&self) -> Option<&GrpcRpc> {
        match self {
            Self::Grpc(rpc) => Some(rpc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_chain(&self) -> Option<&ChainRpc> {
        match self {
            Self::Chain(rpc) => Some(rpc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_eth(&self) -> Option<&EthRpc> {
        match self {
            Self::Eth(rpc) => Some(rpc),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gateway_urls_follow_scheme() {
        let rpc = GatewayRpc {
            protocol: Protocol::Http,
            scheme: "https".into(),
            port: 8889,
        };
        assert_eq!(rpc.api_url(), "https://127.0.0.1:8889");
        assert_eq!(rpc.control_url(), "wss://127.0.0.1:8889/launcher");

        let plain = GatewayRpc {
            scheme: "http".into(),
            ..rpc
        };
        assert_eq!(plain.control_url(), "ws://127.0.0.1:8889/launcher");
    }

    #[test]
    fn eth_uri_omits_zero_port() {
        let infura = EthRpc {
            protocol: Protocol::JsonRpc,
            scheme: "https".into(),
            host: "mainnet.infura.io".into(),
            path: "/v3/abc".into(),
            port: 0,
        };
        assert_eq!(infura.uri(), "https://mainnet.infura.io/v3/abc");

        let native = EthRpc {
            scheme: "http".into(),
            host: "geth".into(),
            path: String::new(),
            port: 8545,
            ..infura
        };
        assert_eq!(native.uri(), "http://geth:8545");
    }

    #[test]
    fn serializes_with_inventory_field_names() {
        let rpc = RpcDescriptor::Grpc(GrpcRpc {
            protocol: Protocol::Grpc,
            host: "xud".into(),
            port: 8886,
            tls_cert: "/root/network/data/xud/tls.cert".into(),
            macaroon: None,
        });
        assert_eq!(
            serde_json::to_value(&rpc).unwrap(),
            json!({
                "type": "gRPC",
                "host": "xud",
                "port": 8886,
                "tlsCert": "/root/network/data/xud/tls.cert",
            })
        );
        assert_eq!(
            serde_json::to_value(RpcDescriptor::Empty(EmptyRpc {})).unwrap(),
            json!({})
        );
    }
}
