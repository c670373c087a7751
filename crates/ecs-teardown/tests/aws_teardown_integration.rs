//! Teardown integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_teardown_integration -- --ignored
//! ```


use aws_test_helpers::*;
use ecs_teardown::aws::{AwsContext, CloudFormationClient, EcsClient, get_current_account_id};
use ecs_teardown::wait::WaitConfig;
use ecs_teardown::{Teardown, TeardownConfig, TeardownOptions};
use ecs_teardown_common::{TeardownError, TeardownEvent, stack_name_for};

#[tokio::test]
#[ignore]
async fn test_account_id_is_resolved() {
    let aws = AwsContext::new(&get_test_region()).await;
    let account = get_current_account_id(&aws)
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");

    assert_eq!(account.len(), 12, "Account ID should be 12 digits");
    assert!(account.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
#[ignore]
async fn test_missing_stack_is_none() {
    let aws = AwsContext::new(&get_test_region()).await;
    let cloudformation = CloudFormationClient::from_context(&aws, WaitConfig::default());

    let stack = cloudformation
        .describe_stack(&stack_name_for(&test_cluster_name()))
        .await
        .expect("DescribeStacks on a missing stack should not fail");
    assert!(stack.is_none());
}

#[tokio::test]
#[ignore]
async fn test_teardown_of_missing_cluster_fails_fast() {
    let region = get_test_region();
    let aws = AwsContext::new(&region).await;
    let teardown = Teardown::from_context(&aws, TeardownConfig::new(&region));

    let cluster = test_cluster_name();
    let events = teardown
        .start(cluster.clone(), TeardownOptions::default())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            TeardownEvent::Start(cluster.clone()),
            TeardownEvent::DoneWithError(TeardownError::ClusterNotFound { cluster }),
        ]
    );
}

/// Create an empty cluster, then tear it down
///
/// This test verifies:
/// 1. Discovery of an empty cluster emits no resource events
/// 2. The cluster is deleted without a stack
/// 3. The deleted cluster is reported as INACTIVE afterwards
#[tokio::test]
#[ignore]
async fn test_teardown_empty_cluster() {
    let region = get_test_region();
    let aws = AwsContext::new(&region).await;
    let cluster = test_cluster_name();

    aws.ecs_client()
        .create_cluster()
        .cluster_name(&cluster)
        .send()
        .await
        .expect("Should create test cluster");

    let teardown = Teardown::from_context(&aws, TeardownConfig::new(&region).with_fargate(true));
    let events = teardown
        .start(cluster.clone(), TeardownOptions { verbose: true })
        .collect()
        .await;

    let kinds: Vec<_> = events.iter().map(TeardownEvent::kind).collect();
    assert_eq!(kinds, vec!["start", "cluster_deleted", "done"], "events: {events:?}");

    let described = EcsClient::from_context(&aws)
        .describe_cluster(&cluster)
        .await
        .expect("Should describe deleted cluster");
    if let Some(described) = described {
        assert!(!described.is_active(), "Cluster should be INACTIVE after teardown");
    }
}
