//! ecs-teardown - Tear down an ECS cluster and everything attached to it
//!
//! Services are scaled to zero and deleted, tasks stopped, container
//! instances deregistered, the cluster's CloudFormation stack deleted and
//! finally the cluster itself removed. Progress is reported as a stream of
//! [`TeardownEvent`](ecs_teardown_common::TeardownEvent)s.

pub mod aws;
pub mod config;
pub mod gateway;
pub mod orchestrator;
pub mod poller;
pub mod wait;

#[cfg(test)]
mod testing;

pub use config::{StackWaitConfig, TeardownConfig, TeardownOptions};
pub use orchestrator::{Teardown, TeardownHandle};
