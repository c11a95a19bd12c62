//! Apply-time context shared between service adapters.
//!
//! Services are applied strictly in registry order. Each applied service
//! publishes its RPC descriptor, data directory and mode into
//! [`ResolvedServices`], which later services read to wire themselves to
//! their dependencies.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::{Network, RpcDescriptor};
use crate::error::{Result, ServiceError};

/// What an applied service publishes to its dependents.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub rpc: RpcDescriptor,
    pub data_dir: PathBuf,
    pub mode: Option<String>,
}

/// Outputs of every service applied so far.
#[derive(Debug, Clone, Default)]
pub struct ResolvedServices {
    entries: HashMap<String, Resolved>,
}

impl ResolvedServices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, resolved: Resolved) {
        self.entries.insert(name.into(), resolved);
    }

    /// Look up a dependency of `dependent`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DependencyUnresolved`] if `dependency` has not
    /// been applied yet.
    pub fn require(&self, dependent: &str, dependency: &'static str) -> Result<&Resolved> {
        self.entries.get(dependency).ok_or_else(|| {
            ServiceError::DependencyUnresolved {
                service: dependent.to_string(),
                dependency,
            }
            .into()
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only inputs to a service's `apply`.
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext<'a> {
    pub network: Network,
    /// Network-scoped working directory.
    pub network_dir: &'a Path,
    /// Current backup location of the order-matching daemon.
    pub backup_dir: &'a Path,
    /// Address advertised to channel peers, if any.
    pub external_ip: Option<&'a str>,
    pub resolved: &'a ResolvedServices,
}

impl ApplyContext<'_> {
    /// Default data directory of a service: `<network_dir>/data/<name>`.
    #[must_use]
    pub fn default_data_dir(&self, name: &str) -> PathBuf {
        self.network_dir.join("data").join(name)
    }
}
