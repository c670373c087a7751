//! CloudFormation stack management

use anyhow::{Context, Result};
use aws_sdk_cloudformation::Client;
use chrono::DateTime;
use ecs_teardown_common::{Stack, StackResourceEvent};
use tracing::debug;

use super::context::AwsContext;
use super::error::classify_sdk_error;
use crate::wait::{WaitConfig, wait_for_resource};

const DELETE_COMPLETE: &str = "DELETE_COMPLETE";
const DELETE_FAILED: &str = "DELETE_FAILED";

/// CloudFormation client for deleting the stack behind a cluster
pub struct CloudFormationClient {
    client: Client,
    status_poll: WaitConfig,
}

impl CloudFormationClient {
    /// Create a new CloudFormation client (loads AWS config from environment)
    pub async fn new(region: &str, status_poll: WaitConfig) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx, status_poll)
    }

    /// Create a CloudFormation client from a pre-loaded AWS context.
    ///
    /// `status_poll` controls how often the stack status is checked while
    /// waiting for a deletion to finish.
    pub fn from_context(ctx: &AwsContext, status_poll: WaitConfig) -> Self {
        Self {
            client: ctx.cloudformation_client(),
            status_poll,
        }
    }

    /// Describe a stack by name or stack id.
    ///
    /// CloudFormation answers a missing stack with a `ValidationError`,
    /// which is reported here as `Ok(None)`.
    pub async fn describe_stack(&self, stack_name: &str) -> Result<Option<Stack>> {
        let response = match self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if classify_sdk_error(&e).is_not_found() => {
                debug!(stack = %stack_name, "Stack does not exist");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to describe stack {stack_name}"));
            }
        };

        Ok(response.stacks().first().map(|s| to_stack(s, stack_name)))
    }

    pub async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .with_context(|| format!("Failed to delete stack {stack_name}"))?;
        debug!(stack = %stack_name, "Stack deletion requested");
        Ok(())
    }

    /// Full event history of a stack, newest first.
    pub async fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackResourceEvent>> {
        let mut events = Vec::new();
        let mut next_token = None;
        loop {
            let response = self
                .client
                .describe_stack_events()
                .stack_name(stack_id)
                .set_next_token(next_token)
                .send()
                .await
                .with_context(|| format!("Failed to describe events of stack {stack_id}"))?;

            events.extend(response.stack_events().iter().map(to_resource_event));
            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(events)
    }

    /// Poll the stack status until it reaches `DELETE_COMPLETE`.
    ///
    /// Deleted stacks stay describable by stack id; a stack that vanished
    /// entirely also counts as deleted. `DELETE_FAILED` is an error.
    pub async fn wait_for_delete_complete(&self, stack_id: &str) -> Result<()> {
        wait_for_resource(
            self.status_poll.clone(),
            || async {
                match self.describe_stack(stack_id).await? {
                    None => Ok(true),
                    Some(stack) if stack.status == DELETE_COMPLETE => Ok(true),
                    Some(stack) if stack.status == DELETE_FAILED => {
                        anyhow::bail!("stack {} reached {}", stack.stack_name, DELETE_FAILED)
                    }
                    Some(_) => Ok(false),
                }
            },
            stack_id,
        )
        .await
    }
}

fn to_stack(stack: &aws_sdk_cloudformation::types::Stack, requested: &str) -> Stack {
    Stack {
        stack_id: stack.stack_id().unwrap_or(requested).to_string(),
        stack_name: stack.stack_name().unwrap_or(requested).to_string(),
        status: stack
            .stack_status()
            .map(|status| status.as_str().to_string())
            .unwrap_or_default(),
    }
}

fn to_resource_event(event: &aws_sdk_cloudformation::types::StackEvent) -> StackResourceEvent {
    StackResourceEvent {
        event_id: event.event_id().unwrap_or_default().to_string(),
        logical_resource_id: event.logical_resource_id().unwrap_or_default().to_string(),
        physical_resource_id: event.physical_resource_id().map(str::to_string),
        resource_type: event.resource_type().map(str::to_string),
        status: event
            .resource_status()
            .map(|status| status.as_str().to_string())
            .unwrap_or_default(),
        timestamp: event
            .timestamp()
            .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
    }
}
