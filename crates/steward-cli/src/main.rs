use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use steward_core::actions;
use steward_core::app::{AgentContext, DispatchOutcome, Dispatcher, FleetScheduler, Report};
use steward_core::config::StewardConfig;

#[derive(Parser, Debug)]
#[command(name = "steward", about = "Fleet agent and director maintenance scheduler")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", default_value = "steward.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dispatch one agent message and print its report
    Dispatch {
        /// Message name, e.g. migrate_disk
        name: String,

        /// Arguments as a JSON array, e.g. '["vol-old", "vol-new"]'
        args: Option<String>,

        /// How long to wait for a long-running task
        #[arg(long, default_value_t = 3600)]
        wait_secs: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the fleet scheduler until interrupted
    Scheduler,
    /// Back up the director into PATH
    Backup { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_tracing(&config.log_level);
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let context = Arc::new(AgentContext::from_config(&config));
    let dispatcher = actions::build_dispatcher(&context).context("wire agent messages")?;

    match cli.command {
        Commands::Dispatch {
            name,
            args,
            wait_secs,
            json,
        } => {
            let arguments = parse_arguments(args.as_deref())?;
            let report =
                dispatch_and_wait(&dispatcher, &name, arguments, Duration::from_secs(wait_secs))
                    .await?;
            if json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("{}", report.render_line());
            }
            if !report.is_success() {
                bail!("{name} failed");
            }
        }
        Commands::Scheduler => {
            let scheduler = FleetScheduler::new(
                config.scheduler.schedule_entries(),
                dispatcher,
                Arc::clone(&context.clock),
                config.scheduler.tick_interval(),
            );
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = tokio::spawn(scheduler.run(shutdown_rx));

            tokio::signal::ctrl_c()
                .await
                .context("listen for ctrl-c")?;
            info!("shutdown requested");
            // ignore send error: the scheduler may already have stopped
            let _ = shutdown_tx.send(true);
            handle.await.context("scheduler task panicked")?;
        }
        Commands::Backup { path } => {
            let report = dispatch_and_wait(
                &dispatcher,
                "backup",
                vec![serde_json::json!(path)],
                Duration::ZERO,
            )
            .await?;
            if !report.is_success() {
                bail!("{}", report.render_line());
            }
            println!("{}", report.render_line());
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<StewardConfig> {
    if !path.exists() {
        return Ok(StewardConfig::default());
    }
    StewardConfig::load(path).with_context(|| format!("load {}", path.display()))
}

fn init_tracing(default_level: &str) {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&log_level))
        .with_target(false)
        .init();
}

fn parse_arguments(raw: Option<&str>) -> Result<Vec<serde_json::Value>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).context("arguments must be a JSON array"),
    }
}

async fn dispatch_and_wait(
    dispatcher: &Dispatcher,
    name: &str,
    arguments: Vec<serde_json::Value>,
    wait: Duration,
) -> Result<Report> {
    let outcome = match dispatcher.dispatch(name, arguments).await {
        Ok(outcome) => outcome,
        Err(err) => return Ok(Report::from_error(&err)),
    };

    match outcome {
        DispatchOutcome::Value(value) => Ok(Report::Value(value)),
        DispatchOutcome::Task(id) => {
            info!(task_id = %id, message = name, "waiting for task");
            match dispatcher.tracker().wait_terminal(id, wait).await {
                Some(record) => Ok(Report::from_record(&record)),
                None => bail!("task {id} did not finish within {}s", wait.as_secs()),
            }
        }
    }
}
