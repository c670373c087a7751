//! Resource waiting with exponential backoff.
//!
//! Provides a generic abstraction for waiting on AWS resources (or any async
//! condition) to reach a desired state, with configurable exponential backoff
//! and jitter.

use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use ecs_teardown_common::defaults::{STACK_STATUS_MAX_DELAY_SECS, STACK_STATUS_MIN_DELAY_SECS};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait; `None` waits until the future is dropped
    pub timeout: Option<Duration>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(STACK_STATUS_MIN_DELAY_SECS),
            max_delay: Duration::from_secs(STACK_STATUS_MAX_DELAY_SECS),
            timeout: None,
        }
    }
}

/// Wait for a resource to become ready with exponential backoff.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `check` - Async function that returns `Ok(true)` when ready, `Ok(false)` to retry
/// * `resource_name` - Name for logging
///
/// # Returns
/// * `Ok(())` - Resource is ready
/// * `Err` - Timeout, or check returned an error
///
/// # Example
/// ```ignore
/// wait_for_resource(
///     WaitConfig::default(),
///     || async {
///         let deleted = stack_is_gone().await?;
///         Ok(deleted)
///     },
///     "my-stack",
/// ).await?;
/// ```
pub async fn wait_for_resource<F, Fut>(config: WaitConfig, check: F, resource_name: &str) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = tokio::time::Instant::now();
    let mut attempts = 0u32;

    let mut delays = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build();

    loop {
        attempts += 1;

        if let Some(timeout) = config.timeout {
            if start.elapsed() >= timeout {
                anyhow::bail!(
                    "Timeout waiting for {} after {:?} ({} attempts)",
                    resource_name,
                    timeout,
                    attempts
                );
            }
        }

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(());
            }
            Ok(false) => {
                let delay = delays.next().unwrap_or(config.max_delay);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(e);
            }
        }
    }
}
