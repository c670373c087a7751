//! The ordered teardown steps for a single cluster

use ecs_teardown_common::{
    Cluster, ContainerInstance, Service, Task, TeardownError, TeardownEvent,
};
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::aws::{ClusterOperations, StackOperations};
use crate::config::{StackWaitConfig, TeardownOptions};
use crate::gateway::ResourceGateway;
use crate::poller::wait_for_stack_deletion;

/// One teardown run, consumed by [`Pipeline::run`]
pub(crate) struct Pipeline<C, S> {
    pub(crate) gateway: ResourceGateway<C, S>,
    pub(crate) stack_wait: StackWaitConfig,
    pub(crate) options: TeardownOptions,
}

impl<C, S> Pipeline<C, S>
where
    C: ClusterOperations,
    S: StackOperations,
{
    fn emit(&self, event: TeardownEvent) {
        self.gateway.events().emit(event);
    }

    /// Run every step and emit exactly one terminal event
    pub(crate) async fn run(self) {
        let started = Instant::now();
        let cluster = self.gateway.cluster().to_string();
        info!(cluster = %cluster, "Starting teardown");

        let outcome = self.execute().await;

        if self.options.verbose {
            info!(cluster = %cluster, elapsed = ?started.elapsed(), "Teardown finished");
        }
        match outcome {
            Ok(_) => self.emit(TeardownEvent::Done(cluster)),
            Err(error) => {
                warn!(cluster = %cluster, error = %error, "Teardown stopped");
                self.emit(TeardownEvent::DoneWithError(error));
            }
        }
    }

    async fn execute(&self) -> Result<Cluster, TeardownError> {
        let name = self.gateway.cluster().to_string();
        self.emit(TeardownEvent::Start(name.clone()));

        let cluster = match self.gateway.describe_cluster().await? {
            Some(cluster) if cluster.is_active() => cluster,
            Some(_) => return Err(TeardownError::ClusterInactive { cluster: name }),
            None => return Err(TeardownError::ClusterNotFound { cluster: name }),
        };

        let stack = self.gateway.describe_stack(&cluster).await;
        if let Some(stack) = &stack {
            self.emit(TeardownEvent::StackFound(stack.clone()));
        }

        let services = self.gateway.list_services().await;
        if !services.is_empty() {
            self.emit(TeardownEvent::ServicesFound(services.clone()));
            let scaled = self.scale_services_to_zero(&services).await;
            self.emit(TeardownEvent::ServicesScaledDown(scaled));
        }

        let tasks = self.gateway.list_tasks().await;
        if !tasks.is_empty() {
            self.emit(TeardownEvent::TasksFound(tasks.clone()));
            let stopped = self.stop_tasks(&tasks).await;
            self.emit(TeardownEvent::TasksStopped(stopped));
        }

        let instances = self.gateway.list_container_instances().await;
        if !instances.is_empty() {
            self.emit(TeardownEvent::InstancesFound(instances.clone()));
            let deregistered = self.deregister_instances(&instances).await;
            self.emit(TeardownEvent::InstancesDeregistered(deregistered));
        }

        if !services.is_empty() {
            let deleted = self.delete_services(&services).await;
            self.emit(TeardownEvent::ServicesDeleted(deleted));
        }

        if let Some(stack) = stack {
            self.gateway.delete_stack(&stack).await;
            self.emit(TeardownEvent::StackDeletionStarted(stack.stack_id.clone()));
            wait_for_stack_deletion(&self.gateway, &stack, &self.stack_wait).await?;
            self.emit(TeardownEvent::StackDeletionDone(stack.stack_id));
        }

        let deleted = self.gateway.delete_cluster().await?;
        self.emit(TeardownEvent::ClusterDeleted(deleted.clone()));
        Ok(deleted)
    }

    async fn scale_services_to_zero(&self, services: &[Service]) -> Vec<Service> {
        let mut calls = Vec::with_capacity(services.len());
        for service in services {
            calls.push(self.gateway.scale_service_to_zero(service));
        }
        join_all(calls).await.into_iter().flatten().collect()
    }

    async fn stop_tasks(&self, tasks: &[Task]) -> Vec<Task> {
        let mut calls = Vec::with_capacity(tasks.len());
        for task in tasks {
            calls.push(self.gateway.stop_task(task));
        }
        join_all(calls).await.into_iter().flatten().collect()
    }

    async fn deregister_instances(&self, instances: &[ContainerInstance]) -> Vec<ContainerInstance> {
        let mut calls = Vec::with_capacity(instances.len());
        for instance in instances {
            calls.push(self.gateway.deregister_container_instance(instance));
        }
        join_all(calls).await.into_iter().flatten().collect()
    }

    async fn delete_services(&self, services: &[Service]) -> Vec<Service> {
        let mut calls = Vec::with_capacity(services.len());
        for service in services {
            calls.push(self.gateway.delete_service(service));
        }
        join_all(calls).await.into_iter().flatten().collect()
    }
}
