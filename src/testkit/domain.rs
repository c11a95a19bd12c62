//! Builders for apply-time inputs used across tests.

use std::path::{Path, PathBuf};

use crate::domain::{GrpcRpc, Network, Protocol, RpcDescriptor};
use crate::port::{ApplyContext, Resolved, ResolvedServices};

/// Network directory used by [`apply_context`].
pub fn network_dir(network: Network) -> &'static Path {
    Path::new(network.pick(
        "/home/op/.xud-docker/simnet",
        "/home/op/.xud-docker/testnet",
        "/home/op/.xud-docker/mainnet",
    ))
}

/// Backup directory used by [`apply_context`].
pub fn backup_dir(network: Network) -> &'static Path {
    Path::new(network.pick(
        "/home/op/.xud-docker/simnet/backup",
        "/home/op/.xud-docker/testnet/backup",
        "/home/op/.xud-docker/mainnet/backup",
    ))
}

/// Apply context rooted at `/home/op/.xud-docker/<network>`.
pub fn apply_context(network: Network, resolved: &ResolvedServices) -> ApplyContext<'_> {
    ApplyContext {
        network,
        network_dir: network_dir(network),
        backup_dir: backup_dir(network),
        external_ip: None,
        resolved,
    }
}

/// What an applied channel daemon publishes, with its data directory at
/// `data_dir`.
pub fn lnd_resolved(data_dir: &str) -> Resolved {
    let data_dir = PathBuf::from(data_dir);
    let name = data_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Resolved {
        rpc: RpcDescriptor::Grpc(GrpcRpc {
            protocol: Protocol::Grpc,
            host: name.clone(),
            port: 10009,
            tls_cert: format!("/root/network/data/{name}/tls.cert"),
            macaroon: None,
        }),
        data_dir,
        mode: None,
    }
}
