//! Fault-tolerant wrappers around the cluster and stack operations
//!
//! Every pipeline step goes through [`ResourceGateway`]. A failed call is
//! logged, reported as a non-terminal `Error` event and turned into an empty
//! result, so the pipeline always has something to continue with. Only the
//! stack-delete wait and the final cluster deletion hand their failure back
//! to the caller.

use std::collections::HashSet;
use std::sync::Arc;

use ecs_teardown_common::defaults::stop_task_reason;
use ecs_teardown_common::{
    Cluster, ContainerInstance, LaunchType, ResourceKind, Service, Stack, StackResourceEvent,
    Task, TeardownError, TeardownEvent, stack_name_for,
};
use tracing::{debug, info, warn};

use crate::aws::{ClusterOperations, StackOperations, classify_anyhow_error};
use crate::orchestrator::EventSink;

/// Per-run access to ECS and CloudFormation for a single cluster
pub struct ResourceGateway<C, S> {
    cluster_ops: Arc<C>,
    stack_ops: Arc<S>,
    cluster: String,
    launch_types: Vec<LaunchType>,
    events: EventSink,
}

impl<C, S> ResourceGateway<C, S>
where
    C: ClusterOperations,
    S: StackOperations,
{
    pub fn new(
        cluster_ops: Arc<C>,
        stack_ops: Arc<S>,
        cluster: impl Into<String>,
        launch_types: Vec<LaunchType>,
        events: EventSink,
    ) -> Self {
        Self {
            cluster_ops,
            stack_ops,
            cluster: cluster.into(),
            launch_types,
            events,
        }
    }

    /// Name (or ARN) of the cluster being torn down
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Log a failed call and report it on the event channel
    fn report(
        &self,
        operation: &'static str,
        resource: ResourceKind,
        id: &str,
        error: &anyhow::Error,
    ) {
        let message = format!("{error:#}");
        let classified = classify_anyhow_error(error);
        warn!(
            operation,
            resource = %resource,
            id,
            error = %message,
            retryable = classified.is_retryable(),
            "AWS call failed, continuing teardown"
        );
        if let Some(hint) = classified.suggestion() {
            warn!(operation, "{hint}");
        }
        self.events.emit(TeardownEvent::Error(TeardownError::operation(
            operation, resource, id, error,
        )));
    }

    /// Resolve the cluster. `Ok(None)` means it does not exist; a failed
    /// call is returned so the run can stop without claiming that.
    pub async fn describe_cluster(&self) -> Result<Option<Cluster>, TeardownError> {
        self.cluster_ops
            .describe_cluster(&self.cluster)
            .await
            .map_err(|e| self.fatal("DescribeClusters", &e))
    }

    /// Look up the stack conventionally created alongside `cluster`.
    ///
    /// The stack is named after the resolved cluster name, so callers that
    /// passed an ARN still find it.
    pub async fn describe_stack(&self, cluster: &Cluster) -> Option<Stack> {
        let stack_name = stack_name_for(&cluster.name);
        match self.stack_ops.describe_stack(&stack_name).await {
            Ok(stack) => {
                if stack.is_none() {
                    debug!(stack = %stack_name, "No stack associated with cluster");
                }
                stack
            }
            Err(e) => {
                self.report("DescribeStacks", ResourceKind::Stack, &stack_name, &e);
                None
            }
        }
    }

    /// Services across every enabled launch type, EC2 first, without duplicates
    pub async fn list_services(&self) -> Vec<Service> {
        let mut seen = HashSet::new();
        let mut services = Vec::new();
        for &launch_type in &self.launch_types {
            match self
                .cluster_ops
                .list_services(&self.cluster, launch_type)
                .await
            {
                Ok(found) => {
                    debug!(launch_type = %launch_type, count = found.len(), "Listed services");
                    services.extend(found.into_iter().filter(|s| seen.insert(s.arn.clone())));
                }
                Err(e) => self.report("ListServices", ResourceKind::Service, launch_type.as_str(), &e),
            }
        }
        services
    }

    pub async fn scale_service_to_zero(&self, service: &Service) -> Option<Service> {
        match self
            .cluster_ops
            .scale_service_to_zero(&self.cluster, &service.arn)
            .await
        {
            Ok(scaled) => {
                info!(service = %service.name, "Scaled service to 0");
                Some(scaled)
            }
            Err(e) => {
                self.report("UpdateService", ResourceKind::Service, &service.arn, &e);
                None
            }
        }
    }

    /// Tasks across every enabled launch type, EC2 first, without duplicates
    pub async fn list_tasks(&self) -> Vec<Task> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();
        for &launch_type in &self.launch_types {
            match self.cluster_ops.list_tasks(&self.cluster, launch_type).await {
                Ok(found) => {
                    debug!(launch_type = %launch_type, count = found.len(), "Listed tasks");
                    tasks.extend(found.into_iter().filter(|t| seen.insert(t.arn.clone())));
                }
                Err(e) => self.report("ListTasks", ResourceKind::Task, launch_type.as_str(), &e),
            }
        }
        tasks
    }

    pub async fn stop_task(&self, task: &Task) -> Option<Task> {
        let reason = stop_task_reason(&self.cluster);
        match self
            .cluster_ops
            .stop_task(&self.cluster, &task.arn, &reason)
            .await
        {
            Ok(stopped) => {
                debug!(task = %task.arn, "Stopped task");
                Some(stopped)
            }
            Err(e) => {
                self.report("StopTask", ResourceKind::Task, &task.arn, &e);
                None
            }
        }
    }

    pub async fn list_container_instances(&self) -> Vec<ContainerInstance> {
        match self.cluster_ops.list_container_instances(&self.cluster).await {
            Ok(instances) => instances,
            Err(e) => {
                self.report(
                    "ListContainerInstances",
                    ResourceKind::ContainerInstance,
                    &self.cluster,
                    &e,
                );
                Vec::new()
            }
        }
    }

    pub async fn deregister_container_instance(
        &self,
        instance: &ContainerInstance,
    ) -> Option<ContainerInstance> {
        match self
            .cluster_ops
            .deregister_container_instance(&self.cluster, &instance.arn)
            .await
        {
            Ok(deregistered) => {
                info!(
                    instance = %instance.arn,
                    ec2_instance_id = ?deregistered.ec2_instance_id,
                    "Deregistered container instance"
                );
                Some(deregistered)
            }
            Err(e) => {
                self.report(
                    "DeregisterContainerInstance",
                    ResourceKind::ContainerInstance,
                    &instance.arn,
                    &e,
                );
                None
            }
        }
    }

    pub async fn delete_service(&self, service: &Service) -> Option<Service> {
        match self
            .cluster_ops
            .delete_service(&self.cluster, &service.arn)
            .await
        {
            Ok(deleted) => {
                info!(service = %service.name, "Deleted service");
                Some(deleted)
            }
            Err(e) => {
                self.report("DeleteService", ResourceKind::Service, &service.arn, &e);
                None
            }
        }
    }

    /// Request stack deletion. A failed request is reported but not fatal:
    /// the stack may already be deleting, and the wait decides the outcome.
    pub async fn delete_stack(&self, stack: &Stack) {
        match self.stack_ops.delete_stack(&stack.stack_name).await {
            Ok(()) => info!(stack = %stack.stack_name, "Requested stack deletion"),
            Err(e) => self.report("DeleteStack", ResourceKind::Stack, &stack.stack_name, &e),
        }
    }

    /// The stack's event history, newest first
    pub async fn describe_stack_events(&self, stack: &Stack) -> Vec<StackResourceEvent> {
        match self.stack_ops.describe_stack_events(&stack.stack_id).await {
            Ok(events) => events,
            Err(e) => {
                self.report(
                    "DescribeStackEvents",
                    ResourceKind::Stack,
                    &stack.stack_id,
                    &e,
                );
                Vec::new()
            }
        }
    }

    /// Resolve once the stack is gone. Unbounded; the poller races it
    /// against a deadline.
    pub async fn wait_for_stack_delete(&self, stack: &Stack) -> Result<(), TeardownError> {
        self.stack_ops
            .wait_for_stack_delete(&stack.stack_id)
            .await
            .map_err(|e| {
                warn!(stack = %stack.stack_name, error = ?e, "Stack deletion did not complete");
                TeardownError::StackDeleteFailed {
                    stack: stack.stack_name.clone(),
                    message: format!("{e:#}"),
                }
            })
    }

    pub async fn delete_cluster(&self) -> Result<Cluster, TeardownError> {
        let cluster = self
            .cluster_ops
            .delete_cluster(&self.cluster)
            .await
            .map_err(|e| self.fatal("DeleteCluster", &e))?;
        info!(cluster = %self.cluster, "Deleted cluster");
        Ok(cluster)
    }

    /// Log a failed cluster call that ends the run
    fn fatal(&self, operation: &'static str, error: &anyhow::Error) -> TeardownError {
        let message = format!("{error:#}");
        warn!(operation, cluster = %self.cluster, error = %message, "Cluster call failed");
        if let Some(hint) = classify_anyhow_error(error).suggestion() {
            warn!(operation, "{hint}");
        }
        TeardownError::operation(operation, ResourceKind::Cluster, &self.cluster, error)
    }
}
