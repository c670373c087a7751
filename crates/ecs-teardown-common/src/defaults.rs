//! Default configuration values for the teardown
//!
//! The stack prefix and the two stack-deletion timings are compatibility
//! constants and must not change.

/// Prefix of the CloudFormation stack created alongside a cluster
pub const STACK_NAME_PREFIX: &str = "EC2ContainerService-";

/// Overall ceiling on waiting for a stack deletion, in seconds (10 minutes)
pub const STACK_DELETE_TIMEOUT_SECS: u64 = 600;

/// Interval between reads of the stack event history, in seconds
pub const RESOURCE_POLL_INTERVAL_SECS: u64 = 10;

/// Initial delay between stack status checks while waiting for deletion
pub const STACK_STATUS_MIN_DELAY_SECS: u64 = 5;

/// Cap on the delay between stack status checks
pub const STACK_STATUS_MAX_DELAY_SECS: u64 = 30;

/// Events buffered per subscriber before a slow subscriber starts lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// AWS region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Maximum number of services accepted by one ECS DescribeServices call
pub const DESCRIBE_SERVICES_BATCH_SIZE: usize = 10;

/// Reason attached to every StopTask call for the given cluster
pub fn stop_task_reason(cluster: &str) -> String {
    format!("Cluster {cluster} is being deleted")
}
