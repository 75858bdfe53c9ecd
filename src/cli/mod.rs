/*
* Swarm Flavor CLI
* ----------------
*
* swarm-flavor
* ├── serve [--host] [--port]                     // run the plugin endpoint
* ├── validate <SPEC>                             // role + allocation of a group spec
* ├── prepare <SPEC> [--tag k=v]... [--logical-id] // print the prepared instance spec
* ├── healthy [--tag k=v]...                      // health of an instance by its tags
* └── init [--force]                              // write config/default.toml
*
* SPEC is inline JSON, or @path to read it from a file.
* Everything except `init` and `validate` talks to the Docker engine configured
* in the [docker] settings.
*/

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::{self, AppState};
use crate::config::Settings;
use crate::core::docker_manager::DockerSwarmClient;
use crate::core::instance::{InstanceDescription, InstanceSpec};
use crate::flavor::{allocation, Flavor, SwarmFlavor};

#[derive(Parser)]
#[command(name = "swarm-flavor")]
#[command(about = "Docker Swarm flavor plugin", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding default.toml / local.toml
    #[arg(short, long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the plugin endpoint
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate a group spec
    Validate {
        spec: String,
    },
    /// Prepare an instance spec for a group
    Prepare {
        spec: String,
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
        #[arg(short, long)]
        logical_id: Option<String>,
    },
    /// Check whether an instance with the given tags is in the swarm
    Healthy {
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
    /// Generate default configuration
    Init {
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(dir) => Settings::new_from_dir(dir)?,
        None => Settings::new()?,
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            info!("Starting flavor plugin on {}:{}", host, port);
            let state = Arc::new(AppState {
                flavor: Arc::new(build_flavor(&settings)?),
            });
            api::serve(state, &host, port).await?;
        }
        Commands::Validate { spec } => {
            let properties = read_spec(&spec)?;
            let (role, allocation) = allocation::validate(&properties)?;
            println!("{} {} group", "✓".green(), role.to_string().bold());
            println!("{}", serde_json::to_string_pretty(&allocation)?);
        }
        Commands::Prepare {
            spec,
            tags,
            logical_id,
        } => {
            let properties = read_spec(&spec)?;
            let instance = InstanceSpec {
                tags: tags.into_iter().collect::<BTreeMap<_, _>>(),
                logical_id,
                ..Default::default()
            };
            let prepared = build_flavor(&settings)?.prepare(&properties, instance).await?;
            println!("{}", serde_json::to_string_pretty(&prepared)?);
        }
        Commands::Healthy { tags } => {
            let description = InstanceDescription::with_tags(tags);
            if build_flavor(&settings)?.healthy(&description).await? {
                println!("{}", "healthy".green());
            } else {
                println!("{}", "unhealthy".red());
            }
        }
        Commands::Init { force } => handle_init_command(force)?,
    }

    Ok(())
}

fn build_flavor(settings: &Settings) -> anyhow::Result<SwarmFlavor> {
    let client = DockerSwarmClient::connect(&settings.docker)?;
    Ok(SwarmFlavor::with_script_settings(
        Arc::new(client),
        settings.script.clone(),
    ))
}

fn read_spec(arg: &str) -> anyhow::Result<Value> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading group spec from {}", path))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&raw).context("group spec is not valid JSON")
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {:?}", raw)),
    }
}

fn handle_init_command(force: bool) -> anyhow::Result<()> {
    let config_dir = PathBuf::from("config");
    let target = config_dir.join("default.toml");
    if target.exists() && !force {
        error!("{} already exists. Use --force to overwrite.", target.display());
        return Err(anyhow!("refusing to overwrite {}", target.display()));
    }

    std::fs::create_dir_all(&config_dir)?;
    let default_config = crate::config::generate_default_config();
    let config_str = toml::to_string_pretty(&default_config)?;
    std::fs::write(&target, config_str)?;

    println!("{} Default configuration generated", "✓".green());
    Ok(())
}
