use async_trait::async_trait;
use bollard::query_parameters::ListNodesOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use crate::config::{DockerConnection, DockerSettings};
use crate::core::errors::{FlavorError, FlavorResult, QueryKind};

/// Identity and join credentials of the swarm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwarmSummary {
    pub cluster_id: String,
    pub worker_token: String,
    pub manager_token: String,
}

/// Who the local engine is within the swarm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfInfo {
    /// Empty when the engine is not part of a swarm.
    pub node_id: String,
}

/// The parts of a node inspection the flavor cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDetails {
    /// Set only when the node is a manager.
    pub manager_addr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSummary {
    pub id: Option<String>,
    pub hostname: Option<String>,
}

/// Node roster filter. Each predicate is an engine label `key=value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    labels: Vec<String>,
}

impl NodeFilter {
    pub fn label(key: &str, value: &str) -> Self {
        Self {
            labels: vec![format!("{}={}", key, value)],
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Filter map in the shape the engine's `/nodes` endpoint expects.
    pub fn to_query(&self) -> HashMap<String, Vec<String>> {
        let mut filters = HashMap::new();
        if !self.labels.is_empty() {
            filters.insert("label".to_string(), self.labels.clone());
        }
        filters
    }
}

/// Read-only view of the swarm control plane.
///
/// Implementations must be safe to share between concurrent callers and must
/// not cache responses; every call reflects the cluster as it is right now.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SwarmClient: Send + Sync {
    /// Cluster id plus the current worker and manager join tokens
    async fn cluster_inspect(&self) -> FlavorResult<SwarmSummary>;

    /// Identity of the node this process talks to
    async fn self_info(&self) -> FlavorResult<SelfInfo>;

    /// Inspect a single node by id
    async fn node_inspect(&self, node_id: &str) -> FlavorResult<NodeDetails>;

    /// List nodes matching the filter
    async fn node_list(&self, filter: NodeFilter) -> FlavorResult<Vec<NodeSummary>>;
}

/// [`SwarmClient`] backed by the Docker Engine API.
#[derive(Clone)]
pub struct DockerSwarmClient {
    docker: Docker,
}

impl DockerSwarmClient {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    pub fn connect(settings: &DockerSettings) -> FlavorResult<Self> {
        let connect_err = |e: bollard::errors::Error| FlavorError::Connect(e.into());
        let docker = match settings.connection {
            DockerConnection::Local => Docker::connect_with_local_defaults()
                .map_err(connect_err)?
                .with_timeout(Duration::from_secs(settings.timeout_secs)),
            DockerConnection::Unix => Docker::connect_with_unix(
                &settings.address,
                settings.timeout_secs,
                API_DEFAULT_VERSION,
            )
            .map_err(connect_err)?,
            DockerConnection::Http => Docker::connect_with_http(
                &settings.address,
                settings.timeout_secs,
                API_DEFAULT_VERSION,
            )
            .map_err(connect_err)?,
        };

        info!("🐳 Docker client configured ({:?})", settings.connection);
        Ok(Self { docker })
    }
}

#[async_trait]
impl SwarmClient for DockerSwarmClient {
    async fn cluster_inspect(&self) -> FlavorResult<SwarmSummary> {
        debug!("inspecting swarm");
        let swarm = self
            .docker
            .inspect_swarm()
            .await
            .map_err(|e| FlavorError::cluster_query(QueryKind::ClusterInspect, e))?;

        let tokens = swarm.join_tokens.unwrap_or_default();
        Ok(SwarmSummary {
            cluster_id: swarm.id.unwrap_or_default(),
            worker_token: tokens.worker.unwrap_or_default(),
            manager_token: tokens.manager.unwrap_or_default(),
        })
    }

    async fn self_info(&self) -> FlavorResult<SelfInfo> {
        debug!("fetching engine info");
        let info = self
            .docker
            .info()
            .await
            .map_err(|e| FlavorError::cluster_query(QueryKind::SelfInfo, e))?;

        Ok(SelfInfo {
            node_id: info.swarm.and_then(|s| s.node_id).unwrap_or_default(),
        })
    }

    async fn node_inspect(&self, node_id: &str) -> FlavorResult<NodeDetails> {
        debug!(node_id, "inspecting node");
        let node = self
            .docker
            .inspect_node(node_id)
            .await
            .map_err(|e| FlavorError::cluster_query(QueryKind::NodeInspect, e))?;

        Ok(NodeDetails {
            manager_addr: node.manager_status.and_then(|m| m.addr),
        })
    }

    async fn node_list(&self, filter: NodeFilter) -> FlavorResult<Vec<NodeSummary>> {
        debug!(labels = ?filter.labels(), "listing nodes");
        let options = ListNodesOptions {
            filters: Some(filter.to_query()),
        };
        let nodes = self
            .docker
            .list_nodes(Some(options))
            .await
            .map_err(|e| FlavorError::cluster_query(QueryKind::NodeList, e))?;

        Ok(nodes
            .into_iter()
            .map(|n| NodeSummary {
                id: n.id,
                hostname: n.description.and_then(|d| d.hostname),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_filter_builds_a_single_label_predicate() {
        let filter = NodeFilter::label("swarm-association-id", "abc");
        let query = filter.to_query();
        assert_eq!(query.len(), 1);
        assert_eq!(query["label"], vec!["swarm-association-id=abc".to_string()]);
    }

    #[test]
    fn empty_filter_has_no_predicates() {
        assert!(NodeFilter::default().to_query().is_empty());
    }

    #[test]
    fn missing_unix_socket_is_a_connection_error() {
        let settings = DockerSettings {
            connection: DockerConnection::Unix,
            address: "/nonexistent/swarm-flavor/docker.sock".to_string(),
            timeout_secs: 5,
        };
        let err = DockerSwarmClient::connect(&settings).err().unwrap();
        assert!(matches!(err, FlavorError::Connect(_)));
        assert!(!err.to_string().contains("cluster-inspect"));
    }
}
