//! Rescribe CLI — automated research reports from a topic.
//!
//! Thin shell over `rescribe-core`: parses arguments, initializes tracing,
//! loads configuration, builds the generation engine and search provider,
//! runs the workflow once, and prints the report.

use anyhow::Context;
use clap::Parser;
use rescribe_core::{
    load_config, GenerationEngine, MockGenerationEngine, OpenAiCompatibleEngine,
    provider_from_config, ResearchWorkflow,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Rescribe: automated research reports from a topic
#[derive(Parser, Debug)]
#[command(name = "rescribe", version, about, long_about = None)]
struct Cli {
    /// Research topic (prompts interactively if omitted)
    topic: Option<String>,

    /// Workspace directory (for .rescribe/config.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Maximum search iterations per section
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "rescribe", "rescribe")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "rescribe.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("."));

    let mut config =
        load_config(Some(&workspace), None).map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    if let Some(max) = cli.max_iterations {
        config.research.max_search_iterations = max;
    }

    let topic = match cli.topic {
        Some(topic) => topic,
        None => prompt_for_topic()?,
    };
    if topic.trim().is_empty() {
        anyhow::bail!("no research topic provided");
    }

    // Use the configured endpoint when its key is present; otherwise fall
    // back to the mock engine so the workflow stays runnable offline.
    let engine: Arc<dyn GenerationEngine> = match OpenAiCompatibleEngine::new(&config.generation) {
        Ok(engine) => {
            info!(model = %config.generation.model, "Using OpenAI-compatible generation engine");
            Arc::new(engine)
        }
        Err(e) => {
            warn!(error = %e, "No generation credentials; using scripted mock responses");
            Arc::new(demo_engine(&topic))
        }
    };

    let search = provider_from_config(&config.search)
        .map_err(|e| anyhow::anyhow!("search provider error: {e}"))?;

    let workflow = ResearchWorkflow::new(engine, search, config.research);
    let report = workflow
        .run(topic.trim())
        .await
        .context("research run failed")?;

    println!("{report}");
    Ok(())
}

/// Scripted mock engine for keyless runs: drives one full plan/research/
/// write/compile cycle so the workflow stays demonstrable offline.
fn demo_engine(topic: &str) -> MockGenerationEngine {
    MockGenerationEngine::with_responses([
        MockGenerationEngine::text_response(&format!(
            "1. Overview\n   What '{topic}' is and why it matters.\n   Research: false\n\n\
             2. Key Findings\n   The main insights about '{topic}'.\n"
        )),
        MockGenerationEngine::text_response(&format!(
            "1. {topic} overview\n2. {topic} recent developments"
        )),
        MockGenerationEngine::text_response("<no further queries>"),
        MockGenerationEngine::text_response(&format!(
            "Key findings about '{topic}', synthesized from the gathered results."
        )),
        MockGenerationEngine::text_response(&format!(
            "This report summarizes what is known about '{topic}'."
        )),
    ])
}

fn prompt_for_topic() -> anyhow::Result<String> {
    print!("Enter your research topic: ");
    std::io::stdout().flush()?;
    let mut topic = String::new();
    std::io::stdin().read_line(&mut topic)?;
    Ok(topic)
}
