use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use insightflow_client::InsightFlowClient;
use insightflow_common::Config;
use insightflow_workspace::Workspace;

mod cmd;

#[derive(Parser)]
#[command(name = "insightflow")]
#[command(about = "Turn research sources into decisions and tasks")]
#[command(version)]
struct Cli {
    /// API base URL (overrides INSIGHTFLOW_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Project to work in (overrides INSIGHTFLOW_PROJECT_ID)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List, create, or delete projects
    #[command(subcommand)]
    Projects(cmd::projects::ProjectsCmd),

    /// Manage research sources in the selected project
    #[command(subcommand)]
    Sources(cmd::sources::SourcesCmd),

    /// Insight runs and their themes
    #[command(subcommand)]
    Runs(cmd::runs::RunsCmd),

    /// Recorded decisions
    #[command(subcommand)]
    Decisions(cmd::decisions::DecisionsCmd),

    /// Build a decision from run claims and record it
    Decide(cmd::decide::DecideArgs),

    /// Show the decision × status task board
    Board,

    /// Add, move, relink, edit, or delete tasks
    #[command(subcommand)]
    Tasks(cmd::tasks::TasksCmd),

    /// Export the selected project as Markdown
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the daily digest for the selected project
    Digest {
        /// Day to summarise (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insightflow=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url);
    }
    let config = config.with_project(cli.project);

    let client = InsightFlowClient::from_config(&config).context("Failed to build API client")?;
    let mut ws = Workspace::new(client);
    ws.select_project(config.project_id.clone());

    match cli.command {
        Commands::Projects(cmd) => cmd::projects::run(&mut ws, cmd).await,
        Commands::Sources(cmd) => cmd::sources::run(&mut ws, cmd).await,
        Commands::Runs(cmd) => cmd::runs::run(&mut ws, cmd).await,
        Commands::Decisions(cmd) => cmd::decisions::run(&mut ws, cmd).await,
        Commands::Decide(args) => cmd::decide::run(&mut ws, args).await,
        Commands::Board => cmd::board::run(&mut ws).await,
        Commands::Tasks(cmd) => cmd::tasks::run(&mut ws, cmd).await,
        Commands::Export { output } => cmd::export::markdown(&ws, output).await,
        Commands::Digest { date } => cmd::export::digest(&ws, date).await,
    }
}
