// Canned swarm for tests - answers from fixed data, records what it was asked.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use swarm_flavor::core::docker_manager::{
    NodeDetails, NodeFilter, NodeSummary, SelfInfo, SwarmClient, SwarmSummary,
};
use swarm_flavor::core::errors::{FlavorError, FlavorResult, QueryKind};

#[derive(Default)]
pub struct CannedSwarm {
    pub summary: SwarmSummary,
    pub self_node: String,
    pub managers: HashMap<String, String>,
    /// Engine label `key=value` -> nodes carrying it
    pub labelled: HashMap<String, Vec<NodeSummary>>,
    pub fail_node_list: bool,
    pub calls: Mutex<Vec<&'static str>>,
    pub filters: Mutex<Vec<NodeFilter>>,
}

impl CannedSwarm {
    pub fn new() -> Self {
        Self {
            summary: SwarmSummary {
                cluster_id: "ClusterUUID".into(),
                worker_token: "WorkerToken".into(),
                manager_token: "ManagerToken".into(),
            },
            self_node: "my-node-id".into(),
            managers: HashMap::from([("my-node-id".to_string(), "1.2.3.4".to_string())]),
            ..Default::default()
        }
    }

    pub fn with_node_labelled(mut self, label: &str) -> Self {
        let node = NodeSummary {
            id: Some(format!("node-{}", self.labelled.len())),
            hostname: None,
        };
        self.labelled.entry(label.to_string()).or_default().push(node);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SwarmClient for CannedSwarm {
    async fn cluster_inspect(&self) -> FlavorResult<SwarmSummary> {
        self.record("cluster_inspect");
        Ok(self.summary.clone())
    }

    async fn self_info(&self) -> FlavorResult<SelfInfo> {
        self.record("self_info");
        Ok(SelfInfo {
            node_id: self.self_node.clone(),
        })
    }

    async fn node_inspect(&self, node_id: &str) -> FlavorResult<NodeDetails> {
        self.record("node_inspect");
        Ok(NodeDetails {
            manager_addr: self.managers.get(node_id).cloned(),
        })
    }

    async fn node_list(&self, filter: NodeFilter) -> FlavorResult<Vec<NodeSummary>> {
        self.record("node_list");
        self.filters.lock().unwrap().push(filter.clone());
        if self.fail_node_list {
            return Err(FlavorError::cluster_query(QueryKind::NodeList, "swarm unavailable"));
        }
        Ok(filter
            .labels()
            .iter()
            .flat_map(|label| self.labelled.get(label).cloned().unwrap_or_default())
            .collect())
    }
}
