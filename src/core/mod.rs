pub mod docker_manager;
pub mod errors;
pub mod instance;

// exports so callers don't need the full paths
pub use docker_manager::{DockerSwarmClient, NodeDetails, NodeFilter, NodeSummary, SelfInfo, SwarmClient, SwarmSummary};
pub use errors::{FlavorError, FlavorResult, QueryKind, TopologyError, ValidationError};
pub use instance::{AllocationMethod, InstanceDescription, InstanceSpec, LogicalId, Role};
