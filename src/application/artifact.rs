//! Deployment artifacts: the compose descriptor and the JSON inventory.
//!
//! Both renderings are pure functions of the registry order and each
//! service's current descriptor, so regenerating with unchanged inputs is
//! byte-identical.

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::adapter::service::{Service, ServiceRegistry};
use crate::domain::{Network, RpcDescriptor, ServiceDescriptor, ServiceKind, Workspace};
use crate::error::Result;

/// Compose file format version.
const COMPOSE_VERSION: &str = "2.4";

#[derive(Serialize)]
struct ComposeFile {
    version: &'static str,
    services: Mapping,
}

#[derive(Serialize)]
struct ComposeService<'a> {
    image: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    command: Vec<String>,
    /// `KEY=value` entries; multi-line values become block literals.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    environment: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
}

impl<'a> From<&'a ServiceDescriptor> for ComposeService<'a> {
    fn from(d: &'a ServiceDescriptor) -> Self {
        Self {
            image: &d.image,
            hostname: d.hostname.as_deref().filter(|h| !h.is_empty()),
            command: d.command.clone(),
            environment: d
                .environment
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect(),
            volumes: d.volumes.clone(),
            ports: d.ports.clone(),
        }
    }
}

/// Render the compose descriptor: one block per enabled service, in order.
pub fn render_compose<'a>(services: impl IntoIterator<Item = &'a dyn Service>) -> Result<String> {
    let mut blocks = Mapping::new();
    for service in services {
        let d = service.descriptor();
        if d.disabled {
            continue;
        }
        blocks.insert(
            Value::String(d.name.clone()),
            serde_yaml::to_value(ComposeService::from(d))?,
        );
    }
    let file = ComposeFile {
        version: COMPOSE_VERSION,
        services: blocks,
    };
    Ok(serde_yaml::to_string(&file)?)
}

#[derive(Serialize)]
struct Inventory<'a> {
    network: &'a str,
    services: Vec<InventoryEntry<'a>>,
}

#[derive(Serialize)]
struct InventoryEntry<'a> {
    name: &'a str,
    disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
    rpc: RpcDescriptor,
}

/// Render the JSON inventory read by the gateway. The gateway itself is not
/// listed.
pub fn render_inventory<'a>(
    network: Network,
    services: impl IntoIterator<Item = &'a dyn Service>,
) -> Result<String> {
    let inventory = Inventory {
        network: network.as_str(),
        services: services
            .into_iter()
            .filter(|s| s.kind() != ServiceKind::Proxy)
            .map(|s| InventoryEntry {
                name: s.name(),
                disabled: s.is_disabled(),
                mode: s.mode(),
                rpc: s.rpc_params(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&inventory)?)
}

/// Write both artifacts into the workspace, creating directories as needed.
pub async fn write_artifacts(workspace: &Workspace, registry: &ServiceRegistry) -> Result<()> {
    let compose = render_compose(registry.iter())?;
    let inventory = render_inventory(registry.network(), registry.iter())?;

    tokio::fs::create_dir_all(workspace.data_dir()).await?;
    let compose_file = workspace.compose_file();
    debug!(path = %compose_file.display(), "Writing compose descriptor");
    tokio::fs::write(&compose_file, compose).await?;

    let inventory_file = workspace.inventory_file();
    debug!(path = %inventory_file.display(), "Writing inventory");
    tokio::fs::write(&inventory_file, inventory).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::service::ApplyInputs;
    use crate::infrastructure::config::services::ServicesConfig;
    use crate::testkit::domain::{backup_dir, network_dir};
    use crate::testkit::runtime::FakeRuntime;
    use std::path::Path;
    use std::sync::Arc;

    fn applied(network: Network, config: &ServicesConfig) -> ServiceRegistry {
        let mut registry =
            ServiceRegistry::for_network(network, Arc::new(FakeRuntime::new())).unwrap();
        registry
            .apply_all(
                config,
                ApplyInputs {
                    network_dir: network_dir(network),
                    backup_dir: backup_dir(network),
                    external_ip: None,
                },
            )
            .unwrap();
        registry
    }

    /// Simnet defaults to the vector connext image, which needs a token.
    fn simnet_config() -> ServicesConfig {
        let mut config = ServicesConfig::default();
        config.connext.admin_token = Some("token".into());
        config
    }

    fn parse(compose: &str) -> serde_yaml::Value {
        serde_yaml::from_str(compose).unwrap()
    }

    fn blocks(compose: &str) -> Vec<String> {
        parse(compose)["services"]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect()
    }

    fn strings(value: &serde_yaml::Value) -> Vec<String> {
        value
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn one_block_per_enabled_service_in_order() {
        let registry = applied(Network::Testnet, &ServicesConfig::default());
        let compose = render_compose(registry.iter()).unwrap();

        assert_eq!(parse(&compose)["version"], "2.4");
        assert_eq!(
            blocks(&compose),
            ["proxy", "lndbtc", "lndltc", "connext", "xud", "boltz"]
        );
    }

    #[test]
    fn enabling_a_service_adds_its_block() {
        let mut config = simnet_config();
        config.arby.common.disabled = Some(false);
        let registry = applied(Network::Simnet, &config);

        assert_eq!(
            blocks(&render_compose(registry.iter()).unwrap()),
            ["proxy", "lndbtc", "lndltc", "connext", "xud", "arby"]
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let config = simnet_config();
        let first = applied(Network::Simnet, &config);
        let second = applied(Network::Simnet, &config);

        assert_eq!(
            render_compose(first.iter()).unwrap(),
            render_compose(second.iter()).unwrap()
        );
        assert_eq!(
            render_inventory(Network::Simnet, first.iter()).unwrap(),
            render_inventory(Network::Simnet, second.iter()).unwrap()
        );
    }

    #[test]
    fn multiline_env_survives_a_round_trip() {
        let registry = applied(Network::Simnet, &simnet_config());
        let expected = &registry.get("connext").unwrap().descriptor().environment["VECTOR_CONFIG"];

        let compose = render_compose(registry.iter()).unwrap();
        let env = strings(&parse(&compose)["services"]["connext"]["environment"]);
        let vector = env
            .iter()
            .find_map(|e| e.strip_prefix("VECTOR_CONFIG="))
            .unwrap();
        assert_eq!(vector, expected);
        assert!(vector.contains("\"adminToken\": \"token\""));
    }

    #[test]
    fn awkward_backup_path_is_kept_verbatim() {
        let mut registry =
            ServiceRegistry::for_network(Network::Simnet, Arc::new(FakeRuntime::new())).unwrap();
        registry
            .apply_all(
                &simnet_config(),
                ApplyInputs {
                    network_dir: network_dir(Network::Simnet),
                    backup_dir: Path::new("/mnt/usb #2: xud"),
                    external_ip: None,
                },
            )
            .unwrap();

        let compose = render_compose(registry.iter()).unwrap();
        let volumes = strings(&parse(&compose)["services"]["xud"]["volumes"]);
        assert!(volumes.contains(&"/mnt/usb #2: xud:/root/backup".to_string()));
    }

    #[test]
    fn command_and_ports_are_sequences() {
        let registry = applied(Network::Mainnet, &ServicesConfig::default());
        let compose = parse(&render_compose(registry.iter()).unwrap());
        assert_eq!(strings(&compose["services"]["proxy"]["command"]), ["--tls"]);
        assert_eq!(
            strings(&compose["services"]["proxy"]["ports"]),
            ["127.0.0.1:8889:8080"]
        );
        assert!(compose["services"]["xud"].get("command").is_none());
    }

    #[test]
    fn inventory_skips_gateway_and_keeps_modes() {
        let registry = applied(Network::Testnet, &ServicesConfig::default());
        let json: serde_json::Value =
            serde_json::from_str(&render_inventory(Network::Testnet, registry.iter()).unwrap())
                .unwrap();

        assert_eq!(json["network"], "testnet");
        let services = json["services"].as_array().unwrap();
        assert_eq!(services.len(), registry.len() - 1);
        assert_eq!(services[0]["name"], "bitcoind");
        assert_eq!(services[0]["mode"], "light");
        assert_eq!(services[0]["disabled"], true);
        let lndbtc = services.iter().find(|s| s["name"] == "lndbtc").unwrap();
        assert!(lndbtc.get("mode").is_none());
        assert_eq!(lndbtc["rpc"]["type"], "gRPC");
    }

    #[tokio::test]
    async fn writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(
            Network::Simnet,
            dir.path().to_path_buf(),
            dir.path().join("simnet"),
        );
        let registry = applied(Network::Simnet, &simnet_config());

        write_artifacts(&workspace, &registry).await.unwrap();

        assert!(workspace.compose_file().exists());
        assert!(workspace.inventory_file().exists());
    }
}
