//! Resource model for cluster teardown
//!
//! These are SDK-independent snapshots of the remote objects the teardown
//! reads and deletes. Identifiers are ARNs as returned by ECS, except for
//! stacks which are tracked by their CloudFormation stack id.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Lifecycle status of an ECS cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterStatus {
    Active,
    Provisioning,
    Deprovisioning,
    Failed,
    Inactive,
    /// A status this crate does not know about
    Unknown(String),
}

impl ClusterStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ClusterStatus::Active => "ACTIVE",
            ClusterStatus::Provisioning => "PROVISIONING",
            ClusterStatus::Deprovisioning => "DEPROVISIONING",
            ClusterStatus::Failed => "FAILED",
            ClusterStatus::Inactive => "INACTIVE",
            ClusterStatus::Unknown(s) => s,
        }
    }
}

impl From<&str> for ClusterStatus {
    fn from(s: &str) -> Self {
        match s {
            "ACTIVE" => ClusterStatus::Active,
            "PROVISIONING" => ClusterStatus::Provisioning,
            "DEPROVISIONING" => ClusterStatus::Deprovisioning,
            "FAILED" => ClusterStatus::Failed,
            "INACTIVE" => ClusterStatus::Inactive,
            other => ClusterStatus::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ClusterStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An ECS cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub name: String,
    pub arn: String,
    pub status: ClusterStatus,
}

impl Cluster {
    /// Deleted clusters stay visible as `INACTIVE` for a while; only those
    /// count as gone. Every other status is treated as existing.
    pub fn is_active(&self) -> bool {
        self.status != ClusterStatus::Inactive
    }
}

/// Compute backing that services and tasks run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LaunchType {
    #[serde(rename = "EC2")]
    Ec2,
    #[serde(rename = "FARGATE")]
    Fargate,
}

impl LaunchType {
    pub fn as_str(self) -> &'static str {
        match self {
            LaunchType::Ec2 => "EC2",
            LaunchType::Fargate => "FARGATE",
        }
    }
}

impl std::fmt::Display for LaunchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ECS service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub arn: String,
    pub name: String,
    pub desired_count: i32,
    pub status: Option<String>,
    pub launch_type: Option<LaunchType>,
}

/// An ECS task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub arn: String,
    pub last_status: Option<String>,
    pub desired_status: Option<String>,
}

impl Task {
    /// A task known only by its ARN (as returned by ListTasks)
    pub fn from_arn(arn: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            last_status: None,
            desired_status: None,
        }
    }
}

/// An EC2 instance registered with a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInstance {
    pub arn: String,
    pub ec2_instance_id: Option<String>,
    pub status: Option<String>,
}

impl ContainerInstance {
    /// A container instance known only by its ARN
    pub fn from_arn(arn: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            ec2_instance_id: None,
            status: None,
        }
    }
}

/// A CloudFormation stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stack {
    pub stack_id: String,
    pub stack_name: String,
    pub status: String,
}

/// One entry of a stack's event history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackResourceEvent {
    pub event_id: String,
    pub logical_resource_id: String,
    pub physical_resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub status: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl StackResourceEvent {
    pub const DELETE_COMPLETE: &'static str = "DELETE_COMPLETE";
    pub const DELETE_IN_PROGRESS: &'static str = "DELETE_IN_PROGRESS";

    pub fn is_delete_complete(&self) -> bool {
        self.status == Self::DELETE_COMPLETE
    }

    pub fn is_delete_in_progress(&self) -> bool {
        self.status == Self::DELETE_IN_PROGRESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_status_round_trips_known_values() {
        for s in ["ACTIVE", "PROVISIONING", "DEPROVISIONING", "FAILED", "INACTIVE"] {
            assert_eq!(ClusterStatus::from(s).as_str(), s);
        }
        assert_eq!(
            ClusterStatus::from("SOMETHING_NEW"),
            ClusterStatus::Unknown("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn only_inactive_clusters_count_as_gone() {
        let mut cluster = Cluster {
            name: "prod".to_string(),
            arn: "arn:aws:ecs:us-east-1:123456789012:cluster/prod".to_string(),
            status: ClusterStatus::Active,
        };
        assert!(cluster.is_active());

        cluster.status = ClusterStatus::Provisioning;
        assert!(cluster.is_active());

        cluster.status = ClusterStatus::Inactive;
        assert!(!cluster.is_active());
    }

    #[test]
    fn launch_type_serializes_like_the_api() {
        assert_eq!(serde_json::to_string(&LaunchType::Ec2).unwrap(), "\"EC2\"");
        assert_eq!(
            serde_json::to_string(&LaunchType::Fargate).unwrap(),
            "\"FARGATE\""
        );
    }
}
