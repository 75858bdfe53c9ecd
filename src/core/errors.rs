use std::fmt;
use thiserror::Error;

use crate::core::instance::Role;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum FlavorError {
    #[error("Validation Error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cluster query failed ({query}): {source}")]
    ClusterQuery {
        query: QueryKind,
        #[source]
        source: BoxError,
    },

    #[error("Docker connection failed: {0}")]
    Connect(#[source] BoxError),

    #[error("Topology Error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
}

impl FlavorError {
    pub fn cluster_query(query: QueryKind, source: impl Into<BoxError>) -> Self {
        FlavorError::ClusterQuery {
            query,
            source: source.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("unrecognized group type: {type_name:?} (expected \"worker\" or \"manager\")")]
    UnknownRole {
        type_name: String,
    },

    #[error("group spec sets both Size and IPs")]
    AmbiguousAllocation,

    #[error("group spec sets neither Size nor IPs")]
    MissingAllocation,

    #[error("malformed group spec: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("local engine is not part of a swarm")]
    NotInSwarm,

    #[error("node {node_id} is not a swarm manager")]
    NotAManager {
        node_id: String,
    },

    #[error("manager node {node_id} reports no reachable address")]
    NoManagerAddress {
        node_id: String,
    },

    #[error("swarm has no {role} join token")]
    MissingJoinToken {
        role: Role,
    },

    #[error("manager group lists no peer address to join through")]
    NoManagerPeers,
}

/// The control-plane read a [`FlavorError::ClusterQuery`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    ClusterInspect,
    SelfInfo,
    NodeInspect,
    NodeList,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::ClusterInspect => write!(f, "cluster-inspect"),
            QueryKind::SelfInfo => write!(f, "self-info"),
            QueryKind::NodeInspect => write!(f, "node-inspect"),
            QueryKind::NodeList => write!(f, "node-list"),
        }
    }
}

pub type FlavorResult<T> = Result<T, FlavorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_query_error_names_the_query() {
        let err = FlavorError::cluster_query(QueryKind::NodeInspect, "connection refused");
        let message = err.to_string();
        assert!(message.contains("node-inspect"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn unknown_role_names_the_offending_type() {
        let err: FlavorError = ValidationError::UnknownRole {
            type_name: "other".to_string(),
        }
        .into();
        assert!(err.to_string().contains("\"other\""));
    }
}
