//! AWS client modules for the teardown
//!
//! This module provides wrappers around AWS SDK clients for:
//! - ECS: Clusters, services, tasks and container instances
//! - CloudFormation: The stack created alongside a cluster
//! - STS: Account ID lookup
//!
//! The orchestrator only sees the traits in [`operations`], so it can be
//! driven against an in-memory fake in tests.

pub mod account;
pub mod cloudformation;
pub mod context;
pub mod ecs;
pub mod error;
pub mod operations;

pub use account::{AccountId, get_current_account_id};
pub use cloudformation::CloudFormationClient;
pub use context::AwsContext;
pub use ecs::EcsClient;
pub use error::{AwsError, classify_anyhow_error, classify_aws_error, classify_sdk_error};
pub use operations::{ClusterOperations, StackOperations};
