pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod flavor;

// Re-exports
pub use crate::core::{
    AllocationMethod, DockerSwarmClient, FlavorError, FlavorResult, InstanceDescription,
    InstanceSpec, Role, SwarmClient,
};
pub use api::{create_router, AppState};
pub use flavor::{Flavor, SwarmFlavor, ASSOCIATION_TAG};
