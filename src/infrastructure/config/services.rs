//! Per-service configuration schema.
//!
//! One explicit table per service under `[services.<name>]`. Every field has
//! a default, so an empty table (or none at all) yields the stock topology.

use std::path::PathBuf;

use serde::Deserialize;

/// Options shared by every service kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    /// Image override; the per-network default is used when unset.
    pub image: Option<String>,
    /// Host data directory override.
    pub dir: Option<PathBuf>,
    /// Extra ports published to the host.
    pub expose_ports: Vec<String>,
    /// Enable/disable override; each kind has its own default.
    pub disabled: Option<bool>,
}

/// Operating mode of a UTXO chain-data daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainDataMode {
    Native,
    External,
    Neutrino,
    #[default]
    Light,
}

impl ChainDataMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::External => "external",
            Self::Neutrino => "neutrino",
            Self::Light => "light",
        }
    }

    /// Channel daemons run their own light client in these modes.
    #[must_use]
    pub const fn is_light_client(self) -> bool {
        matches!(self, Self::Neutrino | Self::Light)
    }
}

/// Operating mode of the Ethereum provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GethMode {
    Native,
    External,
    Infura,
    #[default]
    Light,
}

impl GethMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::External => "external",
            Self::Infura => "infura",
            Self::Light => "light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Serve the API and control endpoint over TLS.
    pub tls: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            tls: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainDataConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub mode: ChainDataMode,
    pub rpchost: String,
    pub rpcport: u16,
    pub rpcuser: String,
    pub rpcpass: String,
    pub zmqpubrawblock: String,
    pub zmqpubrawtx: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GethConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub mode: GethMode,
    pub rpcscheme: String,
    pub rpchost: String,
    pub rpcport: u16,
    pub infura_project_id: String,
    pub infura_project_secret: String,
    /// Cache size handed to the daemon.
    pub cache: Option<String>,
    /// Host directory for ancient chain data, typically on a slower disk.
    pub ancient_chaindata_dir: Option<PathBuf>,
}

impl Default for GethConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            mode: GethMode::default(),
            rpcscheme: "http".into(),
            rpchost: String::new(),
            rpcport: 0,
            infura_project_id: String::new(),
            infura_project_secret: String::new(),
            cache: None,
            ancient_chaindata_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LndConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Keep the daemon's own config file across updates.
    pub preserve_config: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnextConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Admin token for vector images; generated when unset.
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct XudConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub preserve_config: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArbyConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Do not issue real orders on the centralized exchange.
    pub test_mode: bool,
    pub base_asset: String,
    pub quote_asset: String,
    pub cex_base_asset: String,
    pub cex_quote_asset: String,
    pub test_centralized_baseasset_balance: String,
    pub test_centralized_quoteasset_balance: String,
    pub cex: String,
    pub cex_api_key: String,
    pub cex_api_secret: String,
    pub margin: String,
}

impl Default for ArbyConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            test_mode: true,
            base_asset: String::new(),
            quote_asset: String::new(),
            cex_base_asset: String::new(),
            cex_quote_asset: String::new(),
            test_centralized_baseasset_balance: String::new(),
            test_centralized_quoteasset_balance: String::new(),
            cex: "binance".into(),
            cex_api_key: "123".into(),
            cex_api_secret: "abc".into(),
            margin: "0.04".into(),
        }
    }
}

/// Services without kind-specific options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlainConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
}

/// The `[services]` tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub proxy: ProxyConfig,
    pub bitcoind: ChainDataConfig,
    pub litecoind: ChainDataConfig,
    pub geth: GethConfig,
    pub lndbtc: LndConfig,
    pub lndltc: LndConfig,
    pub connext: ConnextConfig,
    pub xud: XudConfig,
    pub arby: ArbyConfig,
    pub boltz: PlainConfig,
    pub webui: PlainConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_uses_defaults() {
        let config: ServicesConfig = toml::from_str("").unwrap();
        assert!(config.proxy.tls);
        assert_eq!(config.bitcoind.mode, ChainDataMode::Light);
        assert_eq!(config.geth.mode, GethMode::Light);
        assert_eq!(config.arby.cex, "binance");
        assert!(config.xud.common.image.is_none());
    }

    #[test]
    fn common_fields_flatten_into_service_tables() {
        let config: ServicesConfig = toml::from_str(
            r#"
            [bitcoind]
            mode = "external"
            rpchost = "10.0.0.2"
            rpcport = 8332
            disabled = false

            [proxy]
            tls = false
            image = "exchangeunion/proxy:dev"
            "#,
        )
        .unwrap();

        assert_eq!(config.bitcoind.mode, ChainDataMode::External);
        assert_eq!(config.bitcoind.rpcport, 8332);
        assert_eq!(config.bitcoind.common.disabled, Some(false));
        assert!(!config.proxy.tls);
        assert_eq!(
            config.proxy.common.image.as_deref(),
            Some("exchangeunion/proxy:dev")
        );
    }

    #[test]
    fn light_client_modes() {
        assert!(ChainDataMode::Light.is_light_client());
        assert!(ChainDataMode::Neutrino.is_light_client());
        assert!(!ChainDataMode::External.is_light_client());
    }
}
