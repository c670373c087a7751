//! ECS cluster management

use anyhow::{Context, Result};
use aws_sdk_ecs::Client;
use aws_sdk_ecs::types::LaunchType as SdkLaunchType;
use ecs_teardown_common::defaults::DESCRIBE_SERVICES_BATCH_SIZE;
use ecs_teardown_common::{Cluster, ContainerInstance, LaunchType, Service, Task};
use tracing::debug;

use super::context::AwsContext;
use super::error::classify_sdk_error;

/// ECS client for tearing down clusters
pub struct EcsClient {
    client: Client,
}

impl EcsClient {
    /// Create a new ECS client (loads AWS config from environment)
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create an ECS client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ecs_client(),
        }
    }

    /// Describe a cluster by name or ARN.
    ///
    /// DescribeClusters usually reports unknown clusters as a `MISSING`
    /// failure rather than an error; both map to `None`.
    pub async fn describe_cluster(&self, cluster: &str) -> Result<Option<Cluster>> {
        let response = match self.client.describe_clusters().clusters(cluster).send().await {
            Ok(response) => response,
            Err(e) if classify_sdk_error(&e).is_not_found() => {
                debug!(cluster = %cluster, "Cluster does not exist");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to describe cluster {cluster}"));
            }
        };

        if let Some(failure) = response.failures().first() {
            debug!(
                cluster = %cluster,
                reason = ?failure.reason(),
                "Cluster not returned by DescribeClusters"
            );
        }

        Ok(response.clusters().first().map(|c| Cluster {
            name: c.cluster_name().unwrap_or(cluster).to_string(),
            arn: c.cluster_arn().unwrap_or_default().to_string(),
            status: c.status().unwrap_or_default().into(),
        }))
    }

    /// List and describe every service of one launch type.
    pub async fn list_services(&self, cluster: &str, launch_type: LaunchType) -> Result<Vec<Service>> {
        let mut arns: Vec<String> = Vec::new();
        let mut next_token = None;
        loop {
            let response = self
                .client
                .list_services()
                .cluster(cluster)
                .launch_type(sdk_launch_type(launch_type))
                .set_next_token(next_token)
                .send()
                .await
                .with_context(|| format!("Failed to list {launch_type} services in {cluster}"))?;

            arns.extend(response.service_arns().iter().cloned());
            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        let mut services = Vec::with_capacity(arns.len());
        for batch in arns.chunks(DESCRIBE_SERVICES_BATCH_SIZE) {
            let response = self
                .client
                .describe_services()
                .cluster(cluster)
                .set_services(Some(batch.to_vec()))
                .send()
                .await
                .with_context(|| format!("Failed to describe services in {cluster}"))?;

            services.extend(response.services().iter().map(to_service));
        }

        Ok(services)
    }

    /// Set a service's desired count.
    pub async fn update_desired_count(
        &self,
        cluster: &str,
        service_arn: &str,
        desired_count: i32,
    ) -> Result<Service> {
        let response = self
            .client
            .update_service()
            .cluster(cluster)
            .service(service_arn)
            .desired_count(desired_count)
            .send()
            .await
            .with_context(|| format!("Failed to update service {service_arn}"))?;

        response
            .service()
            .map(to_service)
            .context("UpdateService returned no service")
    }

    /// List the ARNs of every task of one launch type.
    pub async fn list_tasks(&self, cluster: &str, launch_type: LaunchType) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        let mut next_token = None;
        loop {
            let response = self
                .client
                .list_tasks()
                .cluster(cluster)
                .launch_type(sdk_launch_type(launch_type))
                .set_next_token(next_token)
                .send()
                .await
                .with_context(|| format!("Failed to list {launch_type} tasks in {cluster}"))?;

            tasks.extend(response.task_arns().iter().map(Task::from_arn));
            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(tasks)
    }

    pub async fn stop_task(&self, cluster: &str, task_arn: &str, reason: &str) -> Result<Task> {
        let response = self
            .client
            .stop_task()
            .cluster(cluster)
            .task(task_arn)
            .reason(reason)
            .send()
            .await
            .with_context(|| format!("Failed to stop task {task_arn}"))?;

        let task = response.task().context("StopTask returned no task")?;
        Ok(Task {
            arn: task.task_arn().unwrap_or(task_arn).to_string(),
            last_status: task.last_status().map(str::to_string),
            desired_status: task.desired_status().map(str::to_string),
        })
    }

    /// List the ARNs of every container instance in the cluster.
    pub async fn list_container_instances(&self, cluster: &str) -> Result<Vec<ContainerInstance>> {
        let mut instances = Vec::new();
        let mut next_token = None;
        loop {
            let response = self
                .client
                .list_container_instances()
                .cluster(cluster)
                .set_next_token(next_token)
                .send()
                .await
                .with_context(|| format!("Failed to list container instances in {cluster}"))?;

            instances.extend(
                response
                    .container_instance_arns()
                    .iter()
                    .map(ContainerInstance::from_arn),
            );
            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(instances)
    }

    /// Deregister a container instance with `force`, so tasks still placed
    /// on it do not block the call.
    pub async fn deregister_container_instance(
        &self,
        cluster: &str,
        container_instance_arn: &str,
    ) -> Result<ContainerInstance> {
        let response = self
            .client
            .deregister_container_instance()
            .cluster(cluster)
            .container_instance(container_instance_arn)
            .force(true)
            .send()
            .await
            .with_context(|| {
                format!("Failed to deregister container instance {container_instance_arn}")
            })?;

        let instance = response
            .container_instance()
            .context("DeregisterContainerInstance returned no container instance")?;
        Ok(ContainerInstance {
            arn: instance
                .container_instance_arn()
                .unwrap_or(container_instance_arn)
                .to_string(),
            ec2_instance_id: instance.ec2_instance_id().map(str::to_string),
            status: instance.status().map(str::to_string),
        })
    }

    pub async fn delete_service(&self, cluster: &str, service_arn: &str) -> Result<Service> {
        let response = self
            .client
            .delete_service()
            .cluster(cluster)
            .service(service_arn)
            .send()
            .await
            .with_context(|| format!("Failed to delete service {service_arn}"))?;

        response
            .service()
            .map(to_service)
            .context("DeleteService returned no service")
    }

    pub async fn delete_cluster(&self, cluster: &str) -> Result<Cluster> {
        let response = self
            .client
            .delete_cluster()
            .cluster(cluster)
            .send()
            .await
            .with_context(|| format!("Failed to delete cluster {cluster}"))?;

        let deleted = response
            .cluster()
            .context("DeleteCluster returned no cluster")?;
        Ok(Cluster {
            name: deleted.cluster_name().unwrap_or(cluster).to_string(),
            arn: deleted.cluster_arn().unwrap_or_default().to_string(),
            status: deleted.status().unwrap_or_default().into(),
        })
    }
}

fn sdk_launch_type(launch_type: LaunchType) -> SdkLaunchType {
    match launch_type {
        LaunchType::Ec2 => SdkLaunchType::Ec2,
        LaunchType::Fargate => SdkLaunchType::Fargate,
    }
}

fn to_service(service: &aws_sdk_ecs::types::Service) -> Service {
    Service {
        arn: service.service_arn().unwrap_or_default().to_string(),
        name: service.service_name().unwrap_or_default().to_string(),
        desired_count: service.desired_count(),
        status: service.status().map(str::to_string),
        launch_type: match service.launch_type() {
            Some(SdkLaunchType::Ec2) => Some(LaunchType::Ec2),
            Some(SdkLaunchType::Fargate) => Some(LaunchType::Fargate),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_types_map_to_sdk_values() {
        assert_eq!(sdk_launch_type(LaunchType::Ec2).as_str(), LaunchType::Ec2.as_str());
        assert_eq!(
            sdk_launch_type(LaunchType::Fargate).as_str(),
            LaunchType::Fargate.as_str()
        );
    }
}
