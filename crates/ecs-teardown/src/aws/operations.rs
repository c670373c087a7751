//! Operations traits for the two control planes a teardown talks to
//!
//! These traits abstract the AWS clients so the orchestration logic can be
//! exercised without hitting real AWS. Futures are required to be `Send`
//! because the pipeline runs on a spawned task.

use anyhow::Result;
use ecs_teardown_common::{
    Cluster, ContainerInstance, LaunchType, Service, Stack, StackResourceEvent, Task,
};
use std::future::Future;

use super::cloudformation::CloudFormationClient;
use super::ecs::EcsClient;

/// ECS cluster operations used by the teardown
pub trait ClusterOperations: Send + Sync {
    /// Describe a cluster; `None` if ECS does not know it
    fn describe_cluster(
        &self,
        cluster: &str,
    ) -> impl Future<Output = Result<Option<Cluster>>> + Send;

    /// All services of one launch type
    fn list_services(
        &self,
        cluster: &str,
        launch_type: LaunchType,
    ) -> impl Future<Output = Result<Vec<Service>>> + Send;

    /// Set a service's desired count to zero
    fn scale_service_to_zero(
        &self,
        cluster: &str,
        service_arn: &str,
    ) -> impl Future<Output = Result<Service>> + Send;

    /// All tasks of one launch type
    fn list_tasks(
        &self,
        cluster: &str,
        launch_type: LaunchType,
    ) -> impl Future<Output = Result<Vec<Task>>> + Send;

    /// Stop a task, recording why
    fn stop_task(
        &self,
        cluster: &str,
        task_arn: &str,
        reason: &str,
    ) -> impl Future<Output = Result<Task>> + Send;

    /// All container instances registered with the cluster
    fn list_container_instances(
        &self,
        cluster: &str,
    ) -> impl Future<Output = Result<Vec<ContainerInstance>>> + Send;

    /// Force-deregister a container instance, even with tasks still on it
    fn deregister_container_instance(
        &self,
        cluster: &str,
        container_instance_arn: &str,
    ) -> impl Future<Output = Result<ContainerInstance>> + Send;

    fn delete_service(
        &self,
        cluster: &str,
        service_arn: &str,
    ) -> impl Future<Output = Result<Service>> + Send;

    fn delete_cluster(&self, cluster: &str) -> impl Future<Output = Result<Cluster>> + Send;
}

/// CloudFormation operations used by the teardown
pub trait StackOperations: Send + Sync {
    /// Describe a stack by name or id; `None` if it does not exist
    fn describe_stack(
        &self,
        stack_name: &str,
    ) -> impl Future<Output = Result<Option<Stack>>> + Send;

    /// Request deletion of a stack (returns once the request is accepted)
    fn delete_stack(&self, stack_name: &str) -> impl Future<Output = Result<()>> + Send;

    /// The stack's event history, newest first
    fn describe_stack_events(
        &self,
        stack_id: &str,
    ) -> impl Future<Output = Result<Vec<StackResourceEvent>>> + Send;

    /// Resolve once the stack reaches `DELETE_COMPLETE`; fail if deletion fails.
    ///
    /// Has no deadline of its own; callers bound it.
    fn wait_for_stack_delete(&self, stack_id: &str) -> impl Future<Output = Result<()>> + Send;
}

impl ClusterOperations for EcsClient {
    async fn describe_cluster(&self, cluster: &str) -> Result<Option<Cluster>> {
        EcsClient::describe_cluster(self, cluster).await
    }

    async fn list_services(&self, cluster: &str, launch_type: LaunchType) -> Result<Vec<Service>> {
        EcsClient::list_services(self, cluster, launch_type).await
    }

    async fn scale_service_to_zero(&self, cluster: &str, service_arn: &str) -> Result<Service> {
        EcsClient::update_desired_count(self, cluster, service_arn, 0).await
    }

    async fn list_tasks(&self, cluster: &str, launch_type: LaunchType) -> Result<Vec<Task>> {
        EcsClient::list_tasks(self, cluster, launch_type).await
    }

    async fn stop_task(&self, cluster: &str, task_arn: &str, reason: &str) -> Result<Task> {
        EcsClient::stop_task(self, cluster, task_arn, reason).await
    }

    async fn list_container_instances(&self, cluster: &str) -> Result<Vec<ContainerInstance>> {
        EcsClient::list_container_instances(self, cluster).await
    }

    async fn deregister_container_instance(
        &self,
        cluster: &str,
        container_instance_arn: &str,
    ) -> Result<ContainerInstance> {
        EcsClient::deregister_container_instance(self, cluster, container_instance_arn).await
    }

    async fn delete_service(&self, cluster: &str, service_arn: &str) -> Result<Service> {
        EcsClient::delete_service(self, cluster, service_arn).await
    }

    async fn delete_cluster(&self, cluster: &str) -> Result<Cluster> {
        EcsClient::delete_cluster(self, cluster).await
    }
}

impl StackOperations for CloudFormationClient {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<Stack>> {
        CloudFormationClient::describe_stack(self, stack_name).await
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        CloudFormationClient::delete_stack(self, stack_name).await
    }

    async fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackResourceEvent>> {
        CloudFormationClient::describe_stack_events(self, stack_id).await
    }

    async fn wait_for_stack_delete(&self, stack_id: &str) -> Result<()> {
        CloudFormationClient::wait_for_delete_complete(self, stack_id).await
    }
}
