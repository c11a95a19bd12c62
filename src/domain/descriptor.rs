//! Generic deployment description produced by every service adapter.

use std::collections::BTreeMap;
use std::fmt;

/// The kind of a service, selecting its adapter implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Reverse proxy and API gateway.
    Proxy,
    /// Lightning channel daemon for one chain.
    Lnd,
    /// Payment-channel hub.
    Connext,
    /// Order-matching daemon.
    Xud,
    /// Channel-swap helper.
    Boltz,
    /// UTXO chain-data daemon (bitcoind, litecoind).
    ChainData,
    /// Ethereum chain-data daemon.
    Geth,
    /// Arbitrage bot.
    Arby,
    /// Web front end.
    Webui,
}

impl ServiceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Lnd => "lnd",
            Self::Connext => "connext",
            Self::Xud => "xud",
            Self::Boltz => "boltz",
            Self::ChainData => "chain-data",
            Self::Geth => "geth",
            Self::Arby => "arby",
            Self::Webui => "webui",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment description of one service.
///
/// Owned by its adapter and overwritten on every `apply`. The environment is
/// kept sorted so that generated artifacts are byte-stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub kind: ServiceKind,
    pub image: String,
    pub hostname: Option<String>,
    pub command: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    pub disabled: bool,
}

impl ServiceDescriptor {
    /// Empty descriptor for `name`; populated by the adapter's `apply`.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ServiceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            image: String::new(),
            hostname: None,
            command: Vec::new(),
            environment: BTreeMap::new(),
            ports: Vec::new(),
            volumes: Vec::new(),
            disabled: false,
        }
    }

    /// Clear everything `apply` recomputes, keeping identity.
    pub fn reset(&mut self) {
        self.image.clear();
        self.hostname = None;
        self.command.clear();
        self.environment.clear();
        self.ports.clear();
        self.volumes.clear();
        self.disabled = false;
    }

    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.environment.insert(key.into(), value.into());
    }

    pub fn add_volume(&mut self, host: impl fmt::Display, container: &str) {
        self.volumes.push(format!("{host}:{container}"));
    }
}
