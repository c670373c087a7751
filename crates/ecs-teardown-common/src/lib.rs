//! ecs-teardown-common - Shared types for cluster teardown
//!
//! This crate holds the types that cross the boundary between the teardown
//! orchestrator and whatever consumes its progress (the CLI, or any other
//! subscriber), without pulling in the AWS SDK.
//!
//! ## Modules
//!
//! - [`defaults`]: Naming convention and timing constants
//! - [`error`]: Error payload carried by lifecycle events
//! - [`event`]: The lifecycle event enumeration
//! - [`model`]: Clusters, services, tasks, container instances and stacks
//! - [`resource_kind`]: Kinds of resources the teardown acts on

pub mod defaults;
pub mod error;
pub mod event;
pub mod model;
pub mod resource_kind;

// Re-export commonly used types
pub use error::TeardownError;
pub use event::TeardownEvent;
pub use model::{
    Cluster, ClusterStatus, ContainerInstance, LaunchType, Service, Stack, StackResourceEvent,
    Task,
};
pub use resource_kind::ResourceKind;

/// Name of the CloudFormation stack conventionally associated with a cluster.
///
/// The ECS console creates clusters backed by a stack called
/// `EC2ContainerService-<cluster>`; the prefix must match exactly.
pub fn stack_name_for(cluster: &str) -> String {
    format!("{}{}", defaults::STACK_NAME_PREFIX, cluster)
}
