//! Provisioning Entry Point
//!
//! Runs the governed streaming deployment against the simulated cloud and
//! prints the outcome as JSON on stdout. Uses `anyhow` at the top level;
//! provisioning failures carry a `kernel::error::AppError` whose kind
//! selects the process exit code.
//!
//! ```bash
//! provision deploy --grant-subscription
//! provision deploy --teardown --pretty
//! provision steps central producer consumer
//! provision config
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use governance::{GovernanceConfig, InMemoryDescriptorStore, Orchestrator, SimulatedCloud};
use kernel::error::app_error::{AppError, AppResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "provision")]
#[command(version = "0.1.0")]
#[command(about = "Governed cross-account streaming provisioning", long_about = None)]
struct Cli {
    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the central, producer and consumer steps
    Deploy {
        /// Grant consume access to the consumer account afterwards
        #[arg(long)]
        grant_subscription: bool,
        /// Remove everything the run created before exiting
        #[arg(long)]
        teardown: bool,
    },
    /// Run the listed steps in the given order
    Steps {
        #[arg(value_enum, required = true)]
        steps: Vec<Step>,
    },
    /// Print the resolved configuration
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Step {
    Central,
    Producer,
    Consumer,
    Grant,
}

type SimulatedOrchestrator = Orchestrator<SimulatedCloud, InMemoryDescriptorStore>;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr, stdout carries the JSON result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provision=info,governance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<AppError>().map_or(1, AppError::exit_code);
            eprintln!("error: {e:#}");
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GovernanceConfig::from_env().map_err(AppError::from)?;
    tracing::debug!(
        region = %config.region,
        domain_id = %config.domain_id,
        "Configuration loaded"
    );

    let output = match cli.command {
        Commands::Config => serde_json::to_value(&config)?,
        Commands::Deploy {
            grant_subscription,
            teardown,
        } => deploy(config, grant_subscription, teardown).await?,
        Commands::Steps { steps } => {
            let mut orchestrator = orchestrator(config);
            for step in steps {
                run_step(&mut orchestrator, step).await?;
            }
            serde_json::to_value(orchestrator.summary())?
        }
    };

    print(&output, cli.pretty)?;
    Ok(())
}

async fn deploy(
    config: GovernanceConfig,
    grant_subscription: bool,
    teardown: bool,
) -> anyhow::Result<serde_json::Value> {
    let mut orchestrator = orchestrator(config);
    orchestrator.run().await.map_err(AppError::from)?;

    if grant_subscription {
        orchestrator
            .grant_subscription()
            .await
            .map_err(AppError::from)?;
    }

    let mut output = serde_json::Map::new();
    output.insert(
        "summary".to_string(),
        serde_json::to_value(orchestrator.summary())?,
    );

    if teardown {
        let report = orchestrator.teardown().await.map_err(AppError::from)?;
        tracing::info!(
            deleted = report.deleted.len(),
            retained = report.retained.len(),
            "Teardown finished"
        );
        output.insert("teardown".to_string(), serde_json::to_value(report)?);
    }

    Ok(serde_json::Value::Object(output))
}

async fn run_step(orchestrator: &mut SimulatedOrchestrator, step: Step) -> anyhow::Result<()> {
    tracing::info!(step = ?step, "Running step");
    match step {
        Step::Central => {
            orchestrator
                .provision_central()
                .await
                .map_err(AppError::from)?;
        }
        Step::Producer => {
            orchestrator
                .provision_producer()
                .await
                .map_err(AppError::from)?;
        }
        Step::Consumer => {
            orchestrator
                .provision_consumer()
                .await
                .map_err(AppError::from)?;
        }
        Step::Grant => {
            orchestrator
                .grant_subscription()
                .await
                .map_err(AppError::from)?;
        }
    }
    Ok(())
}

fn orchestrator(config: GovernanceConfig) -> SimulatedOrchestrator {
    let cloud = SimulatedCloud::new(config.region.clone());
    Orchestrator::new(
        Arc::new(cloud),
        Arc::new(InMemoryDescriptorStore::new()),
        config,
    )
}

fn print(value: &serde_json::Value, pretty: bool) -> AppResult<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
