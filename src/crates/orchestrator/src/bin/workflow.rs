//! Command line entry point for the two-agent development workflow.

use anyhow::Context;
use clap::{Parser, Subcommand};
use orchestrator::config::OrchestratorConfig;
use orchestrator::db::{self, CheckpointRepository, TaskRepository};
use orchestrator::workflow::{InteractiveDriver, StdinPrompter, WorkflowMachine};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "workflow", about = "Two-agent development workflow engine", version)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root the agent's tools operate in.
    #[arg(long, global = true, env = "CODELEAD_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// SQLite connection string.
    #[arg(long, global = true, env = "CODELEAD_DATABASE")]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new workflow for a task request.
    ///
    /// By default this drives the task to its first approval gate and
    /// prints the pause payload; with --interactive it collects decisions
    /// on the terminal and runs to completion.
    Run {
        /// The task request, in plain language.
        request: String,

        /// Collect approval decisions interactively instead of stopping at
        /// the first gate.
        #[arg(long)]
        interactive: bool,
    },
    /// Resume an interrupted workflow and drive it interactively.
    Resume {
        task_id: String,
    },
    /// List tasks that can be resumed.
    ListResumable,
    /// Show a task's record and checkpoint log.
    Status {
        task_id: String,
    },
    /// Counts of tasks by workflow state.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;
    db::init_schema(&pool).await.context("initializing schema")?;

    match cli.command {
        Command::Run {
            request,
            interactive,
        } => {
            let machine = build_machine(pool, config)?;
            if interactive {
                let mut driver = InteractiveDriver::new(machine, StdinPrompter);
                driver.run(&request).await?;
            } else {
                let outcome = machine.start(&request).await?;
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
        }
        Command::Resume { task_id } => {
            let machine = build_machine(pool, config)?;
            let mut driver = InteractiveDriver::new(machine, StdinPrompter);
            driver.resume(&task_id).await?;
        }
        Command::ListResumable => {
            let machine = build_machine(pool, config)?;
            let tasks = machine.list_resumable().await?;
            if tasks.is_empty() {
                println!("No resumable tasks.");
            }
            for task in tasks {
                println!(
                    "{}  {:<32}  {}  {}",
                    task.task_id,
                    task.state.to_string(),
                    task.updated_at,
                    task.request
                );
            }
        }
        Command::Status { task_id } => {
            let task = TaskRepository::get_by_id(&pool, &task_id)
                .await?
                .with_context(|| format!("no task with id {}", task_id))?;
            println!("task:     {}", task.id);
            println!("request:  {}", task.request);
            println!("state:    {} ({})", task.workflow_state, task.status);
            println!("retries:  {}", task.retry_count);
            if let Some(details) = &task.error_details {
                println!("error:    {}", details);
            }
            println!("checkpoints:");
            for cp in CheckpointRepository::list_for_task(&pool, &task_id).await? {
                println!("  {}  {}", cp.created_at, cp.checkpoint_name);
            }
        }
        Command::Stats => {
            let stats = TaskRepository::statistics(&pool).await?;
            println!("{} task(s)", stats.total);
            for (state, count) in stats.by_workflow_state {
                println!("  {:<32} {}", state, count);
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<OrchestratorConfig> {
    let mut config = match &cli.config {
        Some(path) => OrchestratorConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let workspace = cli
                .workspace
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            OrchestratorConfig::new(workspace)
        }
    };
    if let Some(workspace) = &cli.workspace {
        config.workspace_root = workspace.clone();
    }
    if let Some(database) = &cli.database {
        config.database_url = database.clone();
    }
    Ok(config)
}

fn build_machine(
    pool: db::DatabasePool,
    config: OrchestratorConfig,
) -> anyhow::Result<WorkflowMachine> {
    let lead = config.lead.connect().context("connecting lead model")?;
    let member = config.member.connect().context("connecting member model")?;
    Ok(WorkflowMachine::new(pool, config, lead, member))
}
