//! Cluster teardown orchestration
//!
//! [`Teardown::start`] spawns the pipeline for one cluster and hands back a
//! [`TeardownHandle`] straight away. Progress, partial failures and the final
//! outcome reach the caller only as [`TeardownEvent`]s:
//!
//! ```text
//! Start
//!   StackFound?
//!   ServicesFound ServicesScaledDown      (if any services)
//!   TasksFound TasksStopped               (if any tasks)
//!   InstancesFound InstancesDeregistered  (if any container instances)
//!   ServicesDeleted                       (if any services)
//!   StackDeletionStarted ResourceDeleted* StackDeletionDone   (if a stack)
//!   ClusterDeleted
//! Done | DoneWithError
//! ```
//!
//! `Error` events may appear anywhere between `Start` and the terminal event.
//!
//! [`TeardownEvent`]: ecs_teardown_common::TeardownEvent

mod events;
mod handle;
mod pipeline;

pub use events::EventSink;
pub use handle::TeardownHandle;

use std::sync::Arc;

use ecs_teardown_common::defaults::EVENT_CHANNEL_CAPACITY;
use tracing::debug;

use crate::aws::{AwsContext, CloudFormationClient, ClusterOperations, EcsClient, StackOperations};
use crate::config::{TeardownConfig, TeardownOptions};
use crate::gateway::ResourceGateway;
use pipeline::Pipeline;

/// Tears down ECS clusters through the given operations
pub struct Teardown<C, S> {
    cluster_ops: Arc<C>,
    stack_ops: Arc<S>,
    config: TeardownConfig,
}

impl Teardown<EcsClient, CloudFormationClient> {
    /// Create a teardown backed by real AWS clients
    pub fn from_context(ctx: &AwsContext, config: TeardownConfig) -> Self {
        let ecs = EcsClient::from_context(ctx);
        let cloudformation = CloudFormationClient::from_context(ctx, config.status_poll.clone());
        Self::new(Arc::new(ecs), Arc::new(cloudformation), config)
    }
}

impl<C, S> Teardown<C, S>
where
    C: ClusterOperations + 'static,
    S: StackOperations + 'static,
{
    pub fn new(cluster_ops: Arc<C>, stack_ops: Arc<S>, config: TeardownConfig) -> Self {
        Self {
            cluster_ops,
            stack_ops,
            config,
        }
    }

    pub fn config(&self) -> &TeardownConfig {
        &self.config
    }

    /// Start tearing down `cluster` in the background.
    ///
    /// Returns before any AWS call is made. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, cluster: impl Into<String>, options: TeardownOptions) -> TeardownHandle {
        let cluster = cluster.into();
        let (events, receiver) = EventSink::new(EVENT_CHANNEL_CAPACITY);

        let gateway = ResourceGateway::new(
            self.cluster_ops.clone(),
            self.stack_ops.clone(),
            cluster.clone(),
            self.config.launch_types(),
            events,
        );
        let pipeline = Pipeline {
            gateway,
            stack_wait: self.config.stack_wait.clone(),
            options,
        };

        debug!(cluster = %cluster, region = %self.config.region, "Spawning teardown");
        tokio::spawn(pipeline.run());

        TeardownHandle::new(receiver)
    }
}
