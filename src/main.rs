//! Answer Judge CLI
//!
//! Scores a candidate system's answers with an LLM judge and writes a report.

use answer_judge::{
    AccuracyEvaluator,
    config::Config,
    dataset::load_cases,
    judge::{HttpTransport, JudgeClient, JudgeReply},
    orchestrator::{BatchOrchestrator, EvalMode},
    report::{RunSummary, default_output_path, ensure_output_writable, save_summary},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Answer Judge - LLM-as-judge evaluation of question-answering output
#[derive(Parser)]
#[command(name = "answer-judge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every case of an input file and write a report
    Run {
        /// Input file (JSON array or JSONL); defaults to RESPONSES_FILE
        input: Option<PathBuf>,

        /// Report path; defaults to EVAL_OUTPUT_FILE or results/eval_report_responses_<time>.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cases scored per judge call
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// How cases are submitted to the judge
        #[arg(long, value_enum, default_value_t = ModeArg::Batch)]
        mode: ModeArg,

        /// Maximum number of cases to evaluate
        #[arg(long)]
        max_items: Option<usize>,

        /// Dataset id for records that do not carry one
        #[arg(long)]
        dataset_id: Option<String>,

        /// Judge calls allowed in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Send a test prompt through the judge fallback chain
    Test,

    /// Print the effective configuration
    ShowConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Batch,
    Single,
}

impl From<ModeArg> for EvalMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Batch => EvalMode::Batch,
            ModeArg::Single => EvalMode::Single,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            batch_size,
            mode,
            max_items,
            dataset_id,
            concurrency,
        } => {
            cmd_run(RunArgs {
                input,
                output,
                batch_size,
                mode: mode.into(),
                max_items,
                dataset_id,
                concurrency,
            })
            .await
        }
        Commands::Test => cmd_test().await,
        Commands::ShowConfig => cmd_show_config(),
    }
}

struct RunArgs {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    batch_size: Option<usize>,
    mode: EvalMode,
    max_items: Option<usize>,
    dataset_id: Option<String>,
    concurrency: Option<usize>,
}

fn build_client(config: &Config) -> Result<JudgeClient> {
    let transport = HttpTransport::new(&config.judge).context("Failed to create judge transport")?;
    Ok(JudgeClient::new(
        Arc::new(transport),
        config.judge.fallback_chain(),
    ))
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    println!("Loading configuration...");
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(batch_size) = args.batch_size {
        config.run.batch_size = batch_size;
    }
    if let Some(n) = args.concurrency {
        config.run.max_concurrent_batches = n;
    }
    config.validate().context("Invalid configuration")?;

    let Some(input) = args.input.or_else(|| config.run.responses_file.clone()) else {
        anyhow::bail!("No input file given. Pass a path or set RESPONSES_FILE.");
    };

    let started_at = chrono::Local::now();
    let output = args
        .output
        .or_else(|| config.run.output_file.clone())
        .unwrap_or_else(|| default_output_path(started_at));

    let mut cases = load_cases(&input, args.dataset_id.as_deref())
        .with_context(|| format!("Failed to load cases from '{}'", input.display()))?;
    if let Some(max) = args.max_items {
        cases.truncate(max);
        if cases.is_empty() {
            anyhow::bail!("--max-items 0 leaves no cases to evaluate");
        }
    }

    ensure_output_writable(&output).context("Cannot write report")?;

    println!("Evaluating {} cases from {}", cases.len(), input.display());
    println!("Judge models: {}", config.judge.fallback_chain().join(" -> "));
    println!("Mode: {:?}, batch size: {}", args.mode, config.run.batch_size);

    let client = build_client(&config)?;
    let orchestrator = BatchOrchestrator::new(AccuracyEvaluator::new(client))
        .with_batch_size(config.run.batch_size)
        .with_max_concurrent_batches(config.run.max_concurrent_batches)
        .with_mode(args.mode)
        .with_source_tag(config.run.source_tag.clone());

    let start = Instant::now();
    let outcome = orchestrator.run(cases).await;
    let duration = start.elapsed();

    let summary = RunSummary::from_outcome(outcome);
    save_summary(&summary, &output).context("Failed to save report")?;

    summary.print_summary();
    println!("Evaluation complete in {:.2?}", duration);
    println!("Report saved to: {}", output.display());

    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing judge connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.judge.api_base);
    println!("  Models:    {}", config.judge.fallback_chain().join(" -> "));
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = build_client(&config)?;

    println!("Sending test request...");
    let outcome = client.call("Reply with the number 1.0 and nothing else.").await;
    match &outcome.reply {
        JudgeReply::Text(text) => {
            println!("Connection successful!");
            println!("  Model:     {}", outcome.model_used);
            println!("  Fallback:  {}", outcome.used_fallback);
            println!("  Reply:     {}", text.trim());
        }
        JudgeReply::Failed { message, code } => {
            println!("Connection failed: {}", message);
            println!("  Model:     {}", outcome.model_used);
            if let Some(code) = code {
                println!("  Code:      {}", code);
            }
        }
    }

    Ok(())
}

fn cmd_show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let masked_key = if config.judge.api_key.is_empty() {
        "(not set)".to_string()
    } else {
        format!(
            "{}...",
            config.judge.api_key.chars().take(4).collect::<String>()
        )
    };

    println!("Effective Configuration");
    println!("{}", "─".repeat(40));
    println!("  API Base:       {}", config.judge.api_base);
    println!("  API Key:        {}", masked_key);
    println!("  Models:         {}", config.judge.fallback_chain().join(" -> "));
    println!("  Max tokens:     {}", config.judge.max_tokens);
    println!("  Batch size:     {}", config.run.batch_size);
    println!("  Concurrency:    {}", config.run.max_concurrent_batches);
    println!("  Source tag:     {}", config.run.source_tag);
    if let Some(path) = &config.run.responses_file {
        println!("  Input:          {}", path.display());
    }
    if let Some(path) = &config.run.output_file {
        println!("  Output:         {}", path.display());
    }
    if let Some(path) = Config::config_file_path() {
        println!("  Config file:    {}", path.display());
    }

    Ok(())
}
