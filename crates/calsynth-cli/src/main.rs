use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use calsynth_content::{ContentError, ContentProvider, OpenAiProvider, StubProvider};
use calsynth_core::SqlDialect;
use calsynth_pipeline::{Pipeline, PipelineConfig, PipelineError, Step};

#[derive(Debug, Error)]
enum CliError {
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{failures} data-quality check(s) failed")]
    ChecksFailed { failures: usize },
}

#[derive(Parser, Debug)]
#[command(name = "calsynth", version, about = "Synthetic calendar data generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the generation pipeline.
    Run(RunArgs),
    /// Run the advisory data-quality checks on checkpointed data.
    Check(CheckArgs),
    /// Re-emit the SQL script for one dialect from checkpoints.
    Emit(EmitArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Configuration file.
    #[arg(long, default_value = "calsynth.toml")]
    config: PathBuf,
    /// Steps to skip, reusing previously checkpointed output.
    #[arg(long, value_enum, value_name = "STEP")]
    skip: Vec<StepArg>,
    /// Steps to re-run even when a checkpoint exists.
    #[arg(long, value_enum, value_name = "STEP")]
    force: Vec<StepArg>,
    /// Override the checkpoint directory.
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,
    /// Override the content model (use `stub` for offline runs).
    #[arg(long)]
    model: Option<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Configuration file.
    #[arg(long, default_value = "calsynth.toml")]
    config: PathBuf,
    /// Exit non-zero when any check fails.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args, Debug)]
struct EmitArgs {
    /// Configuration file.
    #[arg(long, default_value = "calsynth.toml")]
    config: PathBuf,
    /// Target dialect.
    #[arg(long, value_enum, default_value = "sqlite")]
    dialect: DialectArg,
    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Step names as exposed on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StepArg {
    #[value(name = "profiles")]
    Profiles,
    #[value(name = "dataframes")]
    Dataframes,
    #[value(name = "work_events")]
    WorkEvents,
    #[value(name = "personal_events")]
    PersonalEvents,
    #[value(name = "attendees")]
    Attendees,
    #[value(name = "sql")]
    Sql,
    #[value(name = "execute_sql")]
    ExecuteSql,
}

impl From<StepArg> for Step {
    fn from(value: StepArg) -> Self {
        match value {
            StepArg::Profiles => Step::Profiles,
            StepArg::Dataframes => Step::Dataframes,
            StepArg::WorkEvents => Step::WorkEvents,
            StepArg::PersonalEvents => Step::PersonalEvents,
            StepArg::Attendees => Step::Attendees,
            StepArg::Sql => Step::Sql,
            StepArg::ExecuteSql => Step::ExecuteSql,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DialectArg {
    Sqlite,
    Mysql,
}

impl From<DialectArg> for SqlDialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Sqlite => SqlDialect::Sqlite,
            DialectArg::Mysql => SqlDialect::MySql,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run(args) => run(args).await,
        Command::Check(args) => check(args),
        Command::Emit(args) => emit(args),
    }
}

async fn run(args: RunArgs) -> Result<(), CliError> {
    let mut config = PipelineConfig::load_or_default(&args.config)?;
    if let Some(dir) = args.checkpoint_dir {
        config.checkpoint_dir = dir;
    }
    if let Some(model) = args.model {
        config.content.model = model;
    }

    let provider = provider_for(&config)?;
    let pipeline = Pipeline::new(config, provider)?;

    let skip: Vec<Step> = args.skip.into_iter().map(Step::from).collect();
    let force: Vec<Step> = args.force.into_iter().map(Step::from).collect();
    let summary = pipeline.run(&skip, &force).await?;

    println!("Pipeline completed (session {}):", summary.session_id);
    println!("  users:      {}", summary.counts.users);
    println!("  calendars:  {}", summary.counts.calendars);
    println!("  shares:     {}", summary.counts.shares);
    println!("  events:     {}", summary.counts.events);
    println!("  attendees:  {}", summary.counts.attendees);
    for path in &summary.sql_files {
        println!("  sql:        {}", path.display());
    }
    if let Some(execution) = summary.execution {
        println!(
            "  executed:   {} ddl + {} insert statements",
            execution.ddl_statements, execution.insert_statements
        );
    }
    Ok(())
}

fn check(args: CheckArgs) -> Result<(), CliError> {
    let config = PipelineConfig::load_or_default(&args.config)?;
    let report_path = config.output_dir.join("check_report.json");
    let pipeline = Pipeline::new(config, offline_provider_stub()?)?;

    let report = pipeline.quality_report()?;
    for result in &report.results {
        let marker = if result.passed { "PASS" } else { "FAIL" };
        println!("{marker} {:<22} {}", result.name, result.detail);
    }

    std::fs::create_dir_all(report_path.parent().unwrap_or(std::path::Path::new(".")))?;
    std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;
    println!("report written to {}", report_path.display());

    let failures = report.failures().count();
    if args.strict && failures > 0 {
        return Err(CliError::ChecksFailed { failures });
    }
    Ok(())
}

fn emit(args: EmitArgs) -> Result<(), CliError> {
    let config = PipelineConfig::load_or_default(&args.config)?;
    let pipeline = Pipeline::new(config, offline_provider_stub()?)?;
    let script = pipeline.emit_script(args.dialect.into())?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, script)?;
            println!("script written to {}", path.display());
        }
        None => print!("{script}"),
    }
    Ok(())
}

fn provider_for(config: &PipelineConfig) -> Result<Arc<dyn ContentProvider>, CliError> {
    if config.content.model == "stub" {
        return offline_provider(config);
    }
    let provider = OpenAiProvider::from_env(
        &config.content.model,
        config.content.max_retries,
        Duration::from_millis(config.content.backoff_ms),
    )?;
    Ok(Arc::new(provider))
}

fn offline_provider(config: &PipelineConfig) -> Result<Arc<dyn ContentProvider>, CliError> {
    let today = config.resolved_today();
    let generate = config.generate_config(today);
    Ok(Arc::new(StubProvider::new(
        config.seed,
        generate.window_start,
        generate.window_end,
    )))
}

/// Provider for subcommands that never generate content.
fn offline_provider_stub() -> Result<Arc<dyn ContentProvider>, CliError> {
    let config = PipelineConfig::default();
    offline_provider(&config)
}
