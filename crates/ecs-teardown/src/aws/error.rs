//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_ecs::error::ProvideErrorMetadata;
use thiserror::Error;

/// AWS error categories used to tell "gone" apart from real failures
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Request was rejected as invalid
    #[error("Invalid request: {message}")]
    Invalid { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled)
    }

    /// Short hint for the operator, if one applies
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AwsError::Throttled => Some("AWS API rate limit hit. Re-run the teardown to retry."),
            AwsError::Sdk { code: Some(c), .. } => suggestion_for_code(c),
            _ => None,
        }
    }
}

/// Known ECS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "ClusterNotFoundException",
    "ServiceNotFoundException",
    "ServiceNotActiveException",
    "ResourceNotFoundException",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Codes for requests the service rejected as malformed or not applicable
const INVALID_CODES: &[&str] = &["InvalidParameterException", "ValidationError"];

/// Classify an AWS SDK error using the error code.
///
/// CloudFormation reports a missing stack as a `ValidationError` whose
/// message says the stack "does not exist"; that is folded into `NotFound`.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some("ValidationError") if message.contains("does not exist") => {
            AwsError::NotFound { message }
        }
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if INVALID_CODES.contains(&c) => AwsError::Invalid { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify a typed SDK error (any operation of any service).
pub fn classify_sdk_error(error: &impl ProvideErrorMetadata) -> AwsError {
    classify_aws_error(error.code(), error.message())
}

/// Classify an error from an anyhow::Error by extracting the AWS error code.
///
/// Walks the error chain looking for the operation error of any call the
/// teardown issues (an `SdkError` exposes it as its source). Falls back to
/// string matching on the Debug representation if no typed error is found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    use aws_sdk_cloudformation::operation as cfn;
    use aws_sdk_ecs::operation as ecs;

    for cause in error.chain() {
        let typed = classify_as::<ecs::describe_clusters::DescribeClustersError>(cause)
            .or_else(|| classify_as::<ecs::list_services::ListServicesError>(cause))
            .or_else(|| classify_as::<ecs::describe_services::DescribeServicesError>(cause))
            .or_else(|| classify_as::<ecs::update_service::UpdateServiceError>(cause))
            .or_else(|| classify_as::<ecs::list_tasks::ListTasksError>(cause))
            .or_else(|| classify_as::<ecs::stop_task::StopTaskError>(cause))
            .or_else(|| {
                classify_as::<ecs::list_container_instances::ListContainerInstancesError>(cause)
            })
            .or_else(|| {
                classify_as::<
                    ecs::deregister_container_instance::DeregisterContainerInstanceError,
                >(cause)
            })
            .or_else(|| classify_as::<ecs::delete_service::DeleteServiceError>(cause))
            .or_else(|| classify_as::<ecs::delete_cluster::DeleteClusterError>(cause))
            .or_else(|| classify_as::<cfn::describe_stacks::DescribeStacksError>(cause))
            .or_else(|| classify_as::<cfn::delete_stack::DeleteStackError>(cause))
            .or_else(|| classify_as::<cfn::describe_stack_events::DescribeStackEventsError>(cause));
        if let Some(classified) = typed {
            return classified;
        }
    }

    // Fallback: extract error code from debug string representation
    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&error.to_string()));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

fn classify_as<E>(cause: &(dyn std::error::Error + 'static)) -> Option<AwsError>
where
    E: std::error::Error + ProvideErrorMetadata + 'static,
{
    cause.downcast_ref::<E>().map(|e| classify_sdk_error(e))
}

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    let known = NOT_FOUND_CODES
        .iter()
        .chain(THROTTLING_CODES)
        .chain(INVALID_CODES)
        .chain(SUGGESTIONS.iter().map(|(code, _)| code));
    for code in known {
        if debug_str.contains(code) {
            return Some((*code).to_string());
        }
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "ClusterContainsServicesException",
        "Services are still draining. Re-run the teardown once they are gone.",
    ),
    (
        "ClusterContainsTasksException",
        "Tasks are still stopping. Re-run the teardown once they are gone.",
    ),
    (
        "ClusterContainsContainerInstancesException",
        "Container instances are still registered. Re-run the teardown to deregister them.",
    ),
    (
        "AccessDeniedException",
        "The credentials in use lack permission for this call.",
    ),
];

fn suggestion_for_code(code: &str) -> Option<&'static str> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
}
