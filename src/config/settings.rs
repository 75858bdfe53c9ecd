/*
* Swarm Flavor Configuration
* --------------------------
*
* Layered configuration, lowest to highest priority:
*
* 1. Hardcoded defaults (set_default below)
* 2. <CONFIG_PATH>/default.{toml,yaml,json}
* 3. <CONFIG_PATH>/local.{toml,yaml,json}
* 4. Environment variables, SWARM_FLAVOR_ prefix, `__` between sections
*    (SWARM_FLAVOR_DOCKER__CONNECTION=unix)
*
* Sections:
*
* - server: where the plugin endpoint listens
* - docker: how we reach the engine API (local defaults, unix socket, http)
* - script: paths and ports baked into the generated init script
*
* CONFIG_PATH defaults to ./config. Both files are optional; with neither
* present the defaults below are a working setup against the local engine.
*/

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub docker: DockerSettings,
    pub script: ScriptSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockerConnection {
    Local,
    Unix,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerSettings {
    pub connection: DockerConnection,
    /// Socket path for `unix`, URL for `http`. Ignored for `local`.
    pub address: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSettings {
    pub docker_pid_file: String,
    pub daemon_config: String,
    pub swarm_port: u16,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            docker_pid_file: "/var/run/docker.pid".to_string(),
            daemon_config: "/etc/docker/daemon.json".to_string(),
            swarm_port: 2377,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
        Self::new_from_dir(Path::new(&config_path))
    }

    pub fn new_from_dir(config_path: &Path) -> Result<Self, ConfigError> {
        let dir = config_path.display();
        info!("Loading configuration from path: {}", dir);

        let config = Self::defaults()?
            .add_source(File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(File::with_name(&format!("{}/local", dir)).required(false))
            .add_source(
                Environment::with_prefix("SWARM_FLAVOR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let script = ScriptSettings::default();
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 9090)?
            .set_default("docker.connection", "local")?
            .set_default("docker.address", "/var/run/docker.sock")?
            .set_default("docker.timeout_secs", 120)?
            .set_default("script.docker_pid_file", script.docker_pid_file)?
            .set_default("script.daemon_config", script.daemon_config)?
            .set_default("script.swarm_port", script.swarm_port as i64)
    }
}

pub fn generate_default_config() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 9090,
        },
        docker: DockerSettings {
            connection: DockerConnection::Local,
            address: "/var/run/docker.sock".to_string(),
            timeout_secs: 120,
        },
        script: ScriptSettings::default(),
    }
}
