/*
* Swarm Flavor
* ------------
*
* Customizes generic instances so they join a Docker Swarm, and tells the
* group controller whether an instance made it.
*
*   validate  -> role + allocation from the group properties (pure)
*   prepare   -> mint an association id, tag the instance, render the join script
*   healthy   -> is there a node whose engine carries our association label?
*
* The association id is the only link between an instance and its node. We
* never match on swarm node ids: nodes come and go on the cluster's schedule,
* instances on the provisioner's, and the label survives both.
*
* Nothing is cached. Every prepare/healthy call asks the control plane again,
* and every failure goes straight back to the caller; retry policy belongs to
* the group controller's reconcile loop.
*/

pub mod allocation;
pub mod init_script;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ScriptSettings;
use crate::core::docker_manager::{NodeFilter, SwarmClient};
use crate::core::errors::{FlavorResult, TopologyError};
use crate::core::instance::{AllocationMethod, InstanceDescription, InstanceSpec, Role};

use allocation::GroupSpec;
use init_script::{InitContext, JoinPlan};

/// Instance tag (and engine label) holding the association id. Reserved:
/// callers must not use this key for their own tags.
pub const ASSOCIATION_TAG: &str = "swarm-association-id";

#[async_trait]
pub trait Flavor: Send + Sync {
    /// Role and allocation implied by group properties
    fn validate_group(&self, properties: &Value) -> FlavorResult<(Role, AllocationMethod)>;

    /// Check group properties and report the allocation they imply
    fn validate(&self, properties: &Value) -> FlavorResult<AllocationMethod> {
        let (_, allocation) = self.validate_group(properties)?;
        Ok(allocation)
    }

    /// Add the tags and init script an instance needs before it is created
    async fn prepare(&self, properties: &Value, spec: InstanceSpec) -> FlavorResult<InstanceSpec>;

    /// Whether a live instance is a recognized member of the cluster
    async fn healthy(&self, instance: &InstanceDescription) -> FlavorResult<bool>;
}

#[derive(Clone)]
pub struct SwarmFlavor {
    client: Arc<dyn SwarmClient>,
    script: ScriptSettings,
}

impl SwarmFlavor {
    pub fn new(client: Arc<dyn SwarmClient>) -> Self {
        Self::with_script_settings(client, ScriptSettings::default())
    }

    pub fn with_script_settings(client: Arc<dyn SwarmClient>, script: ScriptSettings) -> Self {
        Self { client, script }
    }

    /// Address workers should join: the local node's manager address.
    async fn manager_address(&self) -> FlavorResult<String> {
        let me = self.client.self_info().await?;
        if me.node_id.is_empty() {
            return Err(TopologyError::NotInSwarm.into());
        }

        let node = self.client.node_inspect(&me.node_id).await?;
        match node.manager_addr {
            Some(addr) if !addr.is_empty() => Ok(addr),
            Some(_) => Err(TopologyError::NoManagerAddress {
                node_id: me.node_id,
            }
            .into()),
            None => Err(TopologyError::NotAManager {
                node_id: me.node_id,
            }
            .into()),
        }
    }
}

fn require_token(token: String, role: Role) -> FlavorResult<String> {
    if token.is_empty() {
        return Err(TopologyError::MissingJoinToken { role }.into());
    }
    Ok(token)
}

#[async_trait]
impl Flavor for SwarmFlavor {
    fn validate_group(&self, properties: &Value) -> FlavorResult<(Role, AllocationMethod)> {
        Ok(allocation::validate(properties)?)
    }

    async fn prepare(&self, properties: &Value, mut spec: InstanceSpec) -> FlavorResult<InstanceSpec> {
        let group = GroupSpec::parse(properties)?;
        let role = group.role()?;

        let swarm = self.client.cluster_inspect().await?;
        debug!(cluster_id = %swarm.cluster_id, %role, "preparing instance");

        let join = match role {
            Role::Worker => JoinPlan::Worker {
                token: require_token(swarm.worker_token, role)?,
                manager_addr: self.manager_address().await?,
            },
            Role::Manager => {
                let token = require_token(swarm.manager_token, role)?;
                let peers = group.peers(spec.logical_id.as_deref());
                if peers.is_empty() {
                    return Err(TopologyError::NoManagerPeers.into());
                }
                JoinPlan::Manager { token, peers }
            }
        };

        let association_id = Uuid::new_v4().to_string();
        if let Some(previous) = spec
            .tags
            .insert(ASSOCIATION_TAG.to_string(), association_id.clone())
        {
            warn!(%previous, "replacing caller-supplied value of reserved tag {}", ASSOCIATION_TAG);
        }

        let script = init_script::render(
            &InitContext {
                association_id: &association_id,
                cluster_id: &swarm.cluster_id,
                join: &join,
            },
            &self.script,
        );
        spec.init = if spec.init.trim().is_empty() {
            script
        } else {
            format!("{}\n{}", script, spec.init)
        };

        info!(%association_id, %role, "prepared swarm instance");
        Ok(spec)
    }

    async fn healthy(&self, instance: &InstanceDescription) -> FlavorResult<bool> {
        let association_id = match instance.tags.get(ASSOCIATION_TAG) {
            Some(id) if !id.is_empty() => id,
            _ => {
                debug!(instance = ?instance.id, "no association id yet, reporting unhealthy");
                return Ok(false);
            }
        };

        let nodes = self
            .client
            .node_list(NodeFilter::label(ASSOCIATION_TAG, association_id))
            .await?;
        debug!(%association_id, matches = nodes.len(), "checked node roster");
        Ok(!nodes.is_empty())
    }
}
