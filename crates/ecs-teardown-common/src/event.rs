//! Lifecycle events emitted during a cluster teardown
//!
//! A teardown reports progress exclusively through these events. Subscribers
//! receive them in emission order; `Done` and `DoneWithError` are terminal
//! and nothing follows them.

use serde::Serialize;

use crate::{Cluster, ContainerInstance, Service, Stack, StackResourceEvent, Task, TeardownError};

/// Event emitted by a running teardown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum TeardownEvent {
    /// Teardown of the named cluster has begun
    Start(String),
    /// The cluster has an associated CloudFormation stack
    StackFound(Stack),
    ServicesFound(Vec<Service>),
    /// Services whose desired count was set to zero
    ServicesScaledDown(Vec<Service>),
    TasksFound(Vec<Task>),
    TasksStopped(Vec<Task>),
    InstancesFound(Vec<ContainerInstance>),
    InstancesDeregistered(Vec<ContainerInstance>),
    ServicesDeleted(Vec<Service>),
    /// Stack deletion was requested (payload is the stack id)
    StackDeletionStarted(String),
    /// The stack reached `DELETE_COMPLETE`
    StackDeletionDone(String),
    /// A stack resource finished deleting (at most once per logical id)
    ResourceDeleted(StackResourceEvent),
    ClusterDeleted(Cluster),
    /// Teardown finished successfully (terminal)
    Done(String),
    /// Teardown stopped on a fatal error (terminal)
    DoneWithError(TeardownError),
    /// A single call failed; the teardown carries on
    Error(TeardownError),
}

impl TeardownEvent {
    /// Stable snake_case name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            TeardownEvent::Start(_) => "start",
            TeardownEvent::StackFound(_) => "stack_found",
            TeardownEvent::ServicesFound(_) => "services_found",
            TeardownEvent::ServicesScaledDown(_) => "services_scaled_down",
            TeardownEvent::TasksFound(_) => "tasks_found",
            TeardownEvent::TasksStopped(_) => "tasks_stopped",
            TeardownEvent::InstancesFound(_) => "instances_found",
            TeardownEvent::InstancesDeregistered(_) => "instances_deregistered",
            TeardownEvent::ServicesDeleted(_) => "services_deleted",
            TeardownEvent::StackDeletionStarted(_) => "stack_deletion_started",
            TeardownEvent::StackDeletionDone(_) => "stack_deletion_done",
            TeardownEvent::ResourceDeleted(_) => "resource_deleted",
            TeardownEvent::ClusterDeleted(_) => "cluster_deleted",
            TeardownEvent::Done(_) => "done",
            TeardownEvent::DoneWithError(_) => "done_with_error",
            TeardownEvent::Error(_) => "error",
        }
    }

    /// True for the events after which nothing else is emitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, TeardownEvent::Done(_) | TeardownEvent::DoneWithError(_))
    }
}

impl std::fmt::Display for TeardownEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeardownEvent::Start(cluster) => write!(f, "Tearing down cluster {cluster}"),
            TeardownEvent::StackFound(stack) => {
                write!(f, "Found stack {} ({})", stack.stack_name, stack.status)
            }
            TeardownEvent::ServicesFound(services) => {
                write!(f, "Found {} service(s)", services.len())
            }
            TeardownEvent::ServicesScaledDown(services) => {
                write!(f, "Scaled {} service(s) down to 0", services.len())
            }
            TeardownEvent::TasksFound(tasks) => write!(f, "Found {} task(s)", tasks.len()),
            TeardownEvent::TasksStopped(tasks) => write!(f, "Stopped {} task(s)", tasks.len()),
            TeardownEvent::InstancesFound(instances) => {
                write!(f, "Found {} container instance(s)", instances.len())
            }
            TeardownEvent::InstancesDeregistered(instances) => {
                write!(f, "Deregistered {} container instance(s)", instances.len())
            }
            TeardownEvent::ServicesDeleted(services) => {
                write!(f, "Deleted {} service(s)", services.len())
            }
            TeardownEvent::StackDeletionStarted(stack_id) => {
                write!(f, "Deleting stack {stack_id}")
            }
            TeardownEvent::StackDeletionDone(stack_id) => write!(f, "Deleted stack {stack_id}"),
            TeardownEvent::ResourceDeleted(event) => match &event.resource_type {
                Some(resource_type) => write!(
                    f,
                    "  deleted {} ({resource_type})",
                    event.logical_resource_id
                ),
                None => write!(f, "  deleted {}", event.logical_resource_id),
            },
            TeardownEvent::ClusterDeleted(cluster) => write!(f, "Deleted cluster {}", cluster.name),
            TeardownEvent::Done(cluster) => write!(f, "Cluster {cluster} torn down"),
            TeardownEvent::DoneWithError(error) => write!(f, "Teardown failed: {error}"),
            TeardownEvent::Error(error) => write!(f, "Error: {error}"),
        }
    }
}
