//! Kinds of resources touched by a teardown

use serde::Serialize;

/// Resources the teardown discovers, mutates or deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// The ECS cluster itself
    Cluster,
    /// The CloudFormation stack named after the cluster
    Stack,
    /// An ECS service
    Service,
    /// An ECS task
    Task,
    /// An EC2 instance registered with the cluster
    ContainerInstance,
}

impl ResourceKind {
    /// Stable name used in logs and error payloads
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Cluster => "cluster",
            ResourceKind::Stack => "stack",
            ResourceKind::Service => "service",
            ResourceKind::Task => "task",
            ResourceKind::ContainerInstance => "container instance",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
