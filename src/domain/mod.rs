//! Core domain types: network profiles, service descriptors, RPC descriptors,
//! the status ladder and the on-disk workspace layout.

pub mod descriptor;
pub mod network;
pub mod rpc;
pub mod status;
pub mod workspace;

pub use descriptor::{ServiceDescriptor, ServiceKind};
pub use network::Network;
pub use rpc::{
    ChainRpc, EmptyRpc, EthRpc, GatewayRpc, GrpcRpc, HttpRpc, Protocol, RpcDescriptor, SwapRpc,
};
pub use status::{Status, SyncProgress};
pub use workspace::Workspace;
