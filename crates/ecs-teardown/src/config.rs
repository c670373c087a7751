//! Configuration types for a teardown

use ecs_teardown_common::LaunchType;
use ecs_teardown_common::defaults::{
    DEFAULT_REGION, RESOURCE_POLL_INTERVAL_SECS, STACK_DELETE_TIMEOUT_SECS,
};
use std::time::Duration;

use crate::wait::WaitConfig;

/// Timing of the bounded wait for stack deletion
#[derive(Debug, Clone)]
pub struct StackWaitConfig {
    /// Ceiling on the whole wait
    pub timeout: Duration,
    /// How often the stack event history is re-read for deleted resources
    pub resource_poll_interval: Duration,
}

impl Default for StackWaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(STACK_DELETE_TIMEOUT_SECS),
            resource_poll_interval: Duration::from_secs(RESOURCE_POLL_INTERVAL_SECS),
        }
    }
}

/// Configuration fixed when a `Teardown` is constructed
#[derive(Debug, Clone)]
pub struct TeardownConfig {
    /// AWS region
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
    /// Also discover services and tasks running on Fargate
    pub include_fargate: bool,
    pub stack_wait: StackWaitConfig,
    /// Backoff used while polling the stack status during deletion
    pub status_poll: WaitConfig,
}

impl TeardownConfig {
    /// Create a configuration for the given region with default timings
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            aws_profile: None,
            include_fargate: false,
            stack_wait: StackWaitConfig::default(),
            status_poll: WaitConfig::default(),
        }
    }

    /// Set the AWS profile
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.aws_profile = Some(profile.into());
        self
    }

    /// Enable or disable the Fargate launch-type scope
    pub fn with_fargate(mut self, include_fargate: bool) -> Self {
        self.include_fargate = include_fargate;
        self
    }

    /// Launch-type scopes queried by every discovery step, in merge order
    pub fn launch_types(&self) -> Vec<LaunchType> {
        if self.include_fargate {
            vec![LaunchType::Ec2, LaunchType::Fargate]
        } else {
            vec![LaunchType::Ec2]
        }
    }
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

/// Per-run options passed to `Teardown::start`
#[derive(Debug, Clone, Copy, Default)]
pub struct TeardownOptions {
    /// Log the wall-clock duration of the run when it finishes
    pub verbose: bool,
}
