//! ecs-teardown: delete an ECS cluster along with its services, tasks,
//! container instances and CloudFormation stack.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ecs_teardown::aws::{AwsContext, get_current_account_id};
use ecs_teardown::{Teardown, TeardownConfig, TeardownOptions};
use ecs_teardown_common::TeardownEvent;
use ecs_teardown_common::defaults::DEFAULT_REGION;
use tokio_stream::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ecs-teardown")]
#[command(about = "Tear down an ECS cluster and the resources attached to it")]
#[command(version)]
struct Args {
    /// Name or ARN of the cluster to delete
    cluster: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Also stop Fargate services and tasks
    #[arg(long)]
    fargate: bool,

    /// Log how long the teardown took
    #[arg(short, long)]
    verbose: bool,

    /// Output format for progress events
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// One human-readable line per event
    Text,
    /// One JSON object per line
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        // Reduce noise from AWS SDK (show only warnings and errors)
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?)
        .add_directive("aws_sdk_ecs=warn".parse()?)
        .add_directive("aws_sdk_cloudformation=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn render(event: &TeardownEvent, format: Format) -> Result<()> {
    match format {
        Format::Text => {
            // The failure is printed once, on exit
            if !matches!(event, TeardownEvent::DoneWithError(_)) {
                println!("{event}");
            }
        }
        Format::Json => {
            let line = serde_json::to_string(event).context("Failed to serialize event")?;
            println!("{line}");
        }
    }
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let mut config = TeardownConfig::new(&args.region).with_fargate(args.fargate);
    if let Some(profile) = &args.aws_profile {
        info!(profile = %profile, "Using AWS profile");
        config = config.with_profile(profile.clone());
    }

    let aws = AwsContext::with_profile(&config.region, config.aws_profile.as_deref()).await;
    let account = get_current_account_id(&aws).await?;
    info!(
        account_id = %account,
        region = %aws.region(),
        cluster = %args.cluster,
        fargate = args.fargate,
        "Starting teardown"
    );

    let teardown = Teardown::from_context(&aws, config);
    let options = TeardownOptions {
        verbose: args.verbose,
    };
    let mut events = teardown.start(args.cluster.clone(), options).into_stream();

    let mut failure = None;
    while let Some(event) = events.next().await {
        render(&event, args.format)?;
        if let TeardownEvent::DoneWithError(error) = event {
            failure = Some(error);
        }
    }

    match failure {
        Some(error) => Err(anyhow::Error::new(error)
            .context(format!("Teardown of cluster '{}' failed", args.cluster))),
        None => Ok(()),
    }
}
