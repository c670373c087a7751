//! Error payloads reported through the event stream
//!
//! Errors never propagate out of a teardown; they travel to subscribers as
//! the payload of `Error` (non-terminal) or `DoneWithError` (terminal)
//! events, so they must be cheap to clone and serializable.

use serde::Serialize;
use thiserror::Error;

use crate::ResourceKind;

/// Failure observed while tearing down a cluster
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TeardownError {
    /// The cluster does not exist
    #[error("Cluster '{cluster}' does not exist")]
    ClusterNotFound { cluster: String },

    /// The cluster exists but has already been deleted
    #[error("Cluster '{cluster}' is inactive")]
    ClusterInactive { cluster: String },

    /// The stack did not finish deleting before the deadline
    #[error("Timed out after {timeout_secs}s waiting for stack '{stack}' to be deleted")]
    StackDeleteTimeout { stack: String, timeout_secs: u64 },

    /// The stack deletion failed or could not be observed
    #[error("Stack '{stack}' was not deleted: {message}")]
    StackDeleteFailed { stack: String, message: String },

    /// A single remote call failed
    #[error("{operation} failed for {resource} '{id}': {message}")]
    Operation {
        operation: &'static str,
        resource: ResourceKind,
        id: String,
        message: String,
    },
}

impl TeardownError {
    /// Build an `Operation` error from any displayable failure.
    ///
    /// Uses the alternate format so `anyhow` context chains are kept.
    pub fn operation(
        operation: &'static str,
        resource: ResourceKind,
        id: impl Into<String>,
        error: impl std::fmt::Display,
    ) -> Self {
        TeardownError::Operation {
            operation,
            resource,
            id: id.into(),
            message: format!("{error:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_error_message_names_call_and_resource() {
        let err = TeardownError::operation(
            "UpdateService",
            ResourceKind::Service,
            "arn:aws:ecs:us-east-1:123456789012:service/prod/web",
            "throttled",
        );
        assert_eq!(
            err.to_string(),
            "UpdateService failed for service 'arn:aws:ecs:us-east-1:123456789012:service/prod/web': throttled"
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = TeardownError::StackDeleteTimeout {
            stack: "EC2ContainerService-prod".to_string(),
            timeout_secs: 600,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "stack_delete_timeout");
        assert_eq!(json["timeout_secs"], 600);
    }
}
