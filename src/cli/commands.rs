//! CLI command definitions for promptmaster.

use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::corpus::Corpus;
use crate::history::{HistoryRecorder, HistoryStore, SqliteHistoryStore};
use crate::llm::ChatClient;
use crate::pipeline::{OptimizeRequest, Pipeline};
use crate::specialists::catalog;

/// Prompt optimization pipeline for LLMs.
#[derive(Parser)]
#[command(name = "promptmaster")]
#[command(about = "Classify, score, and rewrite prompts with domain-specialized evaluators")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the full optimization pipeline on one prompt.
    Optimize(OptimizeArgs),

    /// Quick analysis: routing decision only, no evaluation.
    Analyze(AnalyzeArgs),

    /// List the specialist catalog.
    Specialists,
}

/// Arguments for `promptmaster optimize`.
#[derive(Parser, Debug)]
pub struct OptimizeArgs {
    /// The prompt to optimize.
    pub prompt: String,

    /// What the prompt should achieve.
    #[arg(short, long)]
    pub goal: String,

    /// Force a specific specialist instead of auto-routing.
    #[arg(short, long)]
    pub specialist: Option<String>,

    /// Caller identity; enables history recording when a database is
    /// configured.
    #[arg(short, long)]
    pub caller: Option<String>,
}

/// Arguments for `promptmaster analyze`.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// The prompt to analyze.
    pub prompt: String,

    /// What the prompt should achieve.
    #[arg(short, long)]
    pub goal: String,

    /// Force a specific specialist instead of auto-routing.
    #[arg(short, long)]
    pub specialist: Option<String>,
}

/// Parse command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Execute a parsed CLI invocation.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Optimize(args) => optimize(&settings, args).await,
        Commands::Analyze(args) => analyze(&settings, args).await,
        Commands::Specialists => list_specialists(),
    }
}

async fn optimize(settings: &Settings, args: OptimizeArgs) -> anyhow::Result<()> {
    settings.require_api_key()?;
    let pipeline = build_pipeline(settings).await?;

    let mut request = OptimizeRequest::new(args.prompt, args.goal)?;
    if let Some(specialist) = args.specialist {
        request = request.with_forced_specialist(specialist);
    }
    if let Some(caller) = args.caller {
        request = request.with_caller(caller);
    }

    let report = pipeline.optimize(request).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn analyze(settings: &Settings, args: AnalyzeArgs) -> anyhow::Result<()> {
    settings.require_api_key()?;
    let pipeline = build_pipeline(settings).await?;

    let report = pipeline
        .analyze(&args.prompt, &args.goal, args.specialist.as_deref())
        .await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn list_specialists() -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct SpecialistInfo {
        name: &'static str,
        description: &'static str,
    }

    let specialists: Vec<SpecialistInfo> = catalog()
        .map(|def| SpecialistInfo {
            name: def.kind.identifier(),
            description: def.routing_description,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&specialists)?);
    Ok(())
}

/// Wire the pipeline from settings: shared client, loaded corpus, and an
/// optional SQLite-backed history recorder.
async fn build_pipeline(settings: &Settings) -> anyhow::Result<Pipeline> {
    let client = Arc::new(ChatClient::from_settings(settings));
    let corpus = Arc::new(Corpus::load_or_builtin(settings.corpus_path.as_deref()));
    info!(fragments = corpus.len(), "knowledge corpus ready");

    let mut pipeline = Pipeline::with_provider(
        client,
        corpus,
        &settings.secondary_model,
        &settings.primary_model,
        settings.evaluation_temperature,
    );

    if let Some(url) = &settings.database_url {
        let store = Arc::new(SqliteHistoryStore::connect(url).await?);
        pipeline = pipeline.with_history(HistoryRecorder::new(
            store as Arc<dyn HistoryStore>,
            settings.history_cap,
        ));
    }

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_optimize_args() {
        let cli = Cli::try_parse_from([
            "promptmaster",
            "optimize",
            "write a sort function",
            "--goal",
            "sorting",
            "--specialist",
            "coding",
        ])
        .expect("parses");

        match cli.command {
            Commands::Optimize(args) => {
                assert_eq!(args.prompt, "write a sort function");
                assert_eq!(args.goal, "sorting");
                assert_eq!(args.specialist.as_deref(), Some("coding"));
                assert_eq!(args.caller, None);
            }
            _ => panic!("expected optimize subcommand"),
        }
    }

    #[test]
    fn test_parse_specialists_subcommand() {
        let cli = Cli::try_parse_from(["promptmaster", "specialists"]).expect("parses");
        assert!(matches!(cli.command, Commands::Specialists));
    }
}
