//! Bounded wait for stack deletion
//!
//! The stack status wait has no deadline of its own, so it is raced against
//! a timer. While the race runs, a watcher re-reads the stack event history
//! and reports each resource the first time it shows up as deleted. Whichever
//! side of the race finishes first stops the watcher, so nothing outlives the
//! call.

use std::collections::HashSet;

use ecs_teardown_common::{Stack, StackResourceEvent, TeardownError, TeardownEvent};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aws::{ClusterOperations, StackOperations};
use crate::config::StackWaitConfig;
use crate::gateway::ResourceGateway;

/// Wait for `stack` to finish deleting, failing after `config.timeout`.
pub async fn wait_for_stack_deletion<C, S>(
    gateway: &ResourceGateway<C, S>,
    stack: &Stack,
    config: &StackWaitConfig,
) -> Result<(), TeardownError>
where
    C: ClusterOperations,
    S: StackOperations,
{
    let stop_watching = CancellationToken::new();

    let race = async {
        let outcome = tokio::select! {
            result = gateway.wait_for_stack_delete(stack) => result,
            _ = sleep(config.timeout) => {
                warn!(
                    stack = %stack.stack_name,
                    timeout = ?config.timeout,
                    "Gave up waiting for stack deletion"
                );
                Err(TeardownError::StackDeleteTimeout {
                    stack: stack.stack_name.clone(),
                    timeout_secs: config.timeout.as_secs(),
                })
            }
        };
        stop_watching.cancel();
        outcome
    };

    let watcher = watch_resource_deletions(
        gateway,
        stack,
        config.resource_poll_interval,
        &stop_watching,
    );

    let (outcome, ()) = tokio::join!(race, watcher);
    if outcome.is_ok() {
        info!(stack = %stack.stack_name, "Stack deleted");
    }
    outcome
}

/// Report newly deleted stack resources every `period` until cancelled
async fn watch_resource_deletions<C, S>(
    gateway: &ResourceGateway<C, S>,
    stack: &Stack,
    period: std::time::Duration,
    cancel: &CancellationToken,
) where
    C: ClusterOperations,
    S: StackOperations,
{
    let mut reported = HashSet::new();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let events = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            events = gateway.describe_stack_events(stack) => events,
        };

        for event in newly_deleted(&events, &stack.stack_name, &mut reported) {
            debug!(
                logical_id = %event.logical_resource_id,
                resource_type = ?event.resource_type,
                "Stack resource deleted"
            );
            gateway.events().emit(TeardownEvent::ResourceDeleted(event));
        }
    }
}

/// Resource deletions in `events` (newest first) not yet in `reported`,
/// oldest first.
///
/// Only events after the stack's latest `DELETE_IN_PROGRESS` belong to this
/// deletion; older history (replaced resources, earlier attempts) is ignored.
/// The stack's own entry is skipped.
fn newly_deleted(
    events: &[StackResourceEvent],
    stack_name: &str,
    reported: &mut HashSet<String>,
) -> Vec<StackResourceEvent> {
    let Some(started) = events
        .iter()
        .position(|e| e.logical_resource_id == stack_name && e.is_delete_in_progress())
    else {
        return Vec::new();
    };

    events[..started]
        .iter()
        .rev()
        .filter(|e| e.is_delete_complete() && e.logical_resource_id != stack_name)
        .filter(|e| reported.insert(e.logical_resource_id.clone()))
        .cloned()
        .collect()
}
