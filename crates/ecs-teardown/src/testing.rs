//! In-memory ECS and CloudFormation for exercising the teardown without AWS
//!
//! Calls are recorded as `"<Operation>:<id>"` keys. The same keys are used to
//! inject failures and latency into individual calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use ecs_teardown_common::{
    Cluster, ClusterStatus, ContainerInstance, LaunchType, Service, Stack, StackResourceEvent,
    Task, stack_name_for,
};
use tokio::time::Instant;

use crate::aws::{ClusterOperations, StackOperations};

const ACCOUNT: &str = "123456789012";

pub fn service_arn(cluster: &str, name: &str) -> String {
    format!("arn:aws:ecs:us-east-1:{ACCOUNT}:service/{cluster}/{name}")
}

pub fn task_arn(cluster: &str, launch_type: LaunchType, index: usize) -> String {
    format!(
        "arn:aws:ecs:us-east-1:{ACCOUNT}:task/{cluster}/{}-{index}",
        launch_type.as_str().to_lowercase()
    )
}

pub fn instance_arn(cluster: &str, index: usize) -> String {
    format!("arn:aws:ecs:us-east-1:{ACCOUNT}:container-instance/{cluster}/{index}")
}

#[derive(Default)]
struct FakeState {
    cluster: Option<Cluster>,
    services: HashMap<LaunchType, Vec<Service>>,
    tasks: HashMap<LaunchType, Vec<Task>>,
    instances: Vec<ContainerInstance>,
    stack: Option<Stack>,
    /// Resource events, visible once this long has passed since DeleteStack
    stack_events: Vec<(Duration, String, String)>,
    /// Events from before the deletion, oldest first
    prior_stack_events: Vec<(String, String)>,
    stack_delete_after: Duration,
    stack_delete_failure: Option<String>,
    delete_requested_at: Option<Instant>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Vec<String>,
    completions: HashMap<String, Instant>,
    stop_reasons: Vec<String>,
}

/// Scriptable fake implementing both operations traits
#[derive(Default)]
pub struct FakeOperations {
    state: Mutex<FakeState>,
}

impl FakeOperations {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn cluster_name(&self) -> String {
        self.lock()
            .cluster
            .as_ref()
            .map(|c| c.name.clone())
            .expect("with_cluster must be called first")
    }

    pub fn with_cluster(self, name: &str) -> Self {
        self.lock().cluster = Some(Cluster {
            name: name.to_string(),
            arn: format!("arn:aws:ecs:us-east-1:{ACCOUNT}:cluster/{name}"),
            status: ClusterStatus::Active,
        });
        self
    }

    pub fn with_inactive_cluster(self, name: &str) -> Self {
        let this = self.with_cluster(name);
        if let Some(cluster) = this.lock().cluster.as_mut() {
            cluster.status = ClusterStatus::Inactive;
        }
        this
    }

    pub fn with_services(self, launch_type: LaunchType, names: &[&str]) -> Self {
        let cluster = self.cluster_name();
        let services = names.iter().map(|name| Service {
            arn: service_arn(&cluster, name),
            name: name.to_string(),
            desired_count: 2,
            status: Some("ACTIVE".to_string()),
            launch_type: Some(launch_type),
        });
        self.lock()
            .services
            .entry(launch_type)
            .or_default()
            .extend(services);
        self
    }

    pub fn with_tasks(self, launch_type: LaunchType, count: usize) -> Self {
        let cluster = self.cluster_name();
        let tasks = (0..count).map(|i| Task {
            arn: task_arn(&cluster, launch_type, i),
            last_status: Some("RUNNING".to_string()),
            desired_status: Some("RUNNING".to_string()),
        });
        self.lock()
            .tasks
            .entry(launch_type)
            .or_default()
            .extend(tasks);
        self
    }

    pub fn with_instances(self, count: usize) -> Self {
        let cluster = self.cluster_name();
        self.lock().instances = (0..count)
            .map(|i| ContainerInstance {
                arn: instance_arn(&cluster, i),
                ec2_instance_id: Some(format!("i-0{i:016x}")),
                status: Some("ACTIVE".to_string()),
            })
            .collect();
        self
    }

    /// Give the cluster its conventionally named stack
    pub fn with_stack(self) -> Self {
        let stack_name = stack_name_for(&self.cluster_name());
        self.lock().stack = Some(Stack {
            stack_id: format!(
                "arn:aws:cloudformation:us-east-1:{ACCOUNT}:stack/{stack_name}/0f1e2d3c"
            ),
            stack_name,
            status: "CREATE_COMPLETE".to_string(),
        });
        self
    }

    /// Add a resource event that shows up `after` the deletion request
    pub fn with_stack_event(self, after: Duration, logical_id: &str, status: &str) -> Self {
        self.lock()
            .stack_events
            .push((after, logical_id.to_string(), status.to_string()));
        self
    }

    /// Add an event from the stack's history before the deletion request
    pub fn with_prior_stack_event(self, logical_id: &str, status: &str) -> Self {
        self.lock()
            .prior_stack_events
            .push((logical_id.to_string(), status.to_string()));
        self
    }

    /// How long the stack takes to reach `DELETE_COMPLETE`
    pub fn stack_deletes_after(self, after: Duration) -> Self {
        self.lock().stack_delete_after = after;
        self
    }

    /// Make the stack end in `DELETE_FAILED`
    pub fn stack_delete_fails(self, message: &str) -> Self {
        self.lock().stack_delete_failure = Some(message.to_string());
        self
    }

    pub fn fail(self, operation: &str, id: &str) -> Self {
        self.lock().failures.insert(format!("{operation}:{id}"));
        self
    }

    pub fn delay(self, operation: &str, id: &str, latency: Duration) -> Self {
        self.lock()
            .delays
            .insert(format!("{operation}:{id}"), latency);
        self
    }

    /// Every call made so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    pub fn completed_at(&self, operation: &str, id: &str) -> Option<Instant> {
        self.lock()
            .completions
            .get(&format!("{operation}:{id}"))
            .copied()
    }

    pub fn stop_reasons(&self) -> Vec<String> {
        self.lock().stop_reasons.clone()
    }

    /// Record a call, apply its latency and injected failure
    async fn call(&self, operation: &str, id: &str) -> Result<()> {
        let key = format!("{operation}:{id}");
        let latency = {
            let mut state = self.lock();
            state.calls.push(key.clone());
            state.delays.get(&key).copied()
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        state.completions.insert(key.clone(), Instant::now());
        if state.failures.contains(&key) {
            anyhow::bail!("injected failure for {key}");
        }
        Ok(())
    }

    fn stack_events_visible_now(&self, stack: &Stack) -> Vec<StackResourceEvent> {
        let state = self.lock();
        let Some(requested_at) = state.delete_requested_at else {
            return Vec::new();
        };
        let elapsed = requested_at.elapsed();

        let mut timeline = vec![(
            Duration::ZERO,
            stack.stack_name.clone(),
            StackResourceEvent::DELETE_IN_PROGRESS.to_string(),
        )];
        timeline.extend(state.stack_events.iter().cloned());
        if state.stack_delete_failure.is_none() {
            timeline.push((
                state.stack_delete_after,
                stack.stack_name.clone(),
                StackResourceEvent::DELETE_COMPLETE.to_string(),
            ));
        }
        timeline.sort_by_key(|(after, _, _)| *after);

        let prior = state
            .prior_stack_events
            .iter()
            .enumerate()
            .map(|(i, (logical_id, status))| StackResourceEvent {
                event_id: format!("{logical_id}-{status}-prior-{i}"),
                logical_resource_id: logical_id.clone(),
                physical_resource_id: None,
                resource_type: None,
                status: status.clone(),
                timestamp: DateTime::<Utc>::from_timestamp(1_600_000_000 + i as i64, 0),
            });

        let deletion = timeline
            .into_iter()
            .enumerate()
            .filter(|(_, (after, _, _))| *after <= elapsed)
            .map(|(i, (after, logical_id, status))| {
                let is_stack = logical_id == stack.stack_name;
                StackResourceEvent {
                    event_id: format!("{logical_id}-{status}-{i}"),
                    physical_resource_id: Some(if is_stack {
                        stack.stack_id.clone()
                    } else {
                        format!("{}-{logical_id}", stack.stack_name)
                    }),
                    resource_type: Some(if is_stack {
                        "AWS::CloudFormation::Stack".to_string()
                    } else {
                        "AWS::EC2::Instance".to_string()
                    }),
                    logical_resource_id: logical_id,
                    status,
                    timestamp: DateTime::<Utc>::from_timestamp(
                        1_700_000_000 + after.as_secs() as i64,
                        0,
                    ),
                }
            });

        // newest first, as CloudFormation returns them
        let mut events: Vec<_> = prior.chain(deletion).collect();
        events.reverse();
        events
    }
}

impl ClusterOperations for FakeOperations {
    async fn describe_cluster(&self, cluster: &str) -> Result<Option<Cluster>> {
        self.call("DescribeClusters", cluster).await?;
        Ok(self
            .lock()
            .cluster
            .clone()
            .filter(|c| c.name == cluster || c.arn == cluster))
    }

    async fn list_services(&self, _cluster: &str, launch_type: LaunchType) -> Result<Vec<Service>> {
        self.call("ListServices", launch_type.as_str()).await?;
        Ok(self
            .lock()
            .services
            .get(&launch_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn scale_service_to_zero(&self, _cluster: &str, service_arn: &str) -> Result<Service> {
        self.call("UpdateService", service_arn).await?;
        let state = self.lock();
        let service = state
            .services
            .values()
            .flatten()
            .find(|s| s.arn == service_arn)
            .ok_or_else(|| anyhow::anyhow!("ServiceNotFoundException: {service_arn}"))?;
        Ok(Service {
            desired_count: 0,
            ..service.clone()
        })
    }

    async fn list_tasks(&self, _cluster: &str, launch_type: LaunchType) -> Result<Vec<Task>> {
        self.call("ListTasks", launch_type.as_str()).await?;
        Ok(self
            .lock()
            .tasks
            .get(&launch_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn stop_task(&self, _cluster: &str, task_arn: &str, reason: &str) -> Result<Task> {
        self.call("StopTask", task_arn).await?;
        self.lock().stop_reasons.push(reason.to_string());
        Ok(Task {
            arn: task_arn.to_string(),
            last_status: Some("RUNNING".to_string()),
            desired_status: Some("STOPPED".to_string()),
        })
    }

    async fn list_container_instances(&self, cluster: &str) -> Result<Vec<ContainerInstance>> {
        self.call("ListContainerInstances", cluster).await?;
        Ok(self.lock().instances.clone())
    }

    async fn deregister_container_instance(
        &self,
        _cluster: &str,
        container_instance_arn: &str,
    ) -> Result<ContainerInstance> {
        self.call("DeregisterContainerInstance", container_instance_arn)
            .await?;
        let state = self.lock();
        let instance = state
            .instances
            .iter()
            .find(|i| i.arn == container_instance_arn)
            .ok_or_else(|| anyhow::anyhow!("unknown container instance {container_instance_arn}"))?;
        Ok(ContainerInstance {
            status: Some("INACTIVE".to_string()),
            ..instance.clone()
        })
    }

    async fn delete_service(&self, _cluster: &str, service_arn: &str) -> Result<Service> {
        self.call("DeleteService", service_arn).await?;
        let state = self.lock();
        let service = state
            .services
            .values()
            .flatten()
            .find(|s| s.arn == service_arn)
            .ok_or_else(|| anyhow::anyhow!("ServiceNotFoundException: {service_arn}"))?;
        Ok(Service {
            desired_count: 0,
            status: Some("DRAINING".to_string()),
            ..service.clone()
        })
    }

    async fn delete_cluster(&self, cluster: &str) -> Result<Cluster> {
        self.call("DeleteCluster", cluster).await?;
        let mut state = self.lock();
        let deleted = state
            .cluster
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("ClusterNotFoundException: {cluster}"))?;
        deleted.status = ClusterStatus::Inactive;
        Ok(deleted.clone())
    }
}

impl StackOperations for FakeOperations {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<Stack>> {
        self.call("DescribeStacks", stack_name).await?;
        Ok(self
            .lock()
            .stack
            .clone()
            .filter(|s| s.stack_name == stack_name || s.stack_id == stack_name))
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.call("DeleteStack", stack_name).await?;
        self.lock().delete_requested_at = Some(Instant::now());
        Ok(())
    }

    async fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackResourceEvent>> {
        self.call("DescribeStackEvents", stack_id).await?;
        let stack = self
            .lock()
            .stack
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Stack with id {stack_id} does not exist"))?;
        Ok(self.stack_events_visible_now(&stack))
    }

    async fn wait_for_stack_delete(&self, stack_id: &str) -> Result<()> {
        self.call("WaitForStackDelete", stack_id).await?;
        let (deadline, failure) = {
            let state = self.lock();
            let requested_at = state.delete_requested_at.unwrap_or_else(Instant::now);
            (
                requested_at + state.stack_delete_after,
                state.stack_delete_failure.clone(),
            )
        };
        tokio::time::sleep_until(deadline).await;
        match failure {
            Some(message) => anyhow::bail!("stack {stack_id} reached DELETE_FAILED: {message}"),
            None => Ok(()),
        }
    }
}
