//! Command-line front end: verify one claim and print the result.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use verifact_core::{Claim, VerificationOutcome, VerifierConfig};
use verifact_runtime::providers::chroma::ChromaStore;
use verifact_runtime::providers::openai::OpenAiProvider;
use verifact_runtime::{Embedder, LanguageModel, Pipeline, SearchProviderRegistry};

#[derive(Parser)]
#[command(
    name = "verifact",
    author,
    version,
    about = "Verify factual claims against web and knowledge-base evidence"
)]
struct Cli {
    /// YAML config file overlaying the built-in defaults
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a single claim
    Verify {
        /// The claim to verify
        claim: String,

        /// Print the full result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// `VERIFACT_LOG` overrides the verbosity flag when set.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("VERIFACT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = VerifierConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Verify { claim, json } => verify(&config, &claim, json).await,
    }
}

async fn verify(config: &VerifierConfig, claim: &str, json: bool) -> Result<()> {
    let openai = Arc::new(
        OpenAiProvider::from_config(&config.providers)
            .context("language model unavailable; set OPENAI_API_KEY")?,
    );

    let mut builder = Pipeline::builder(config.clone())
        .language_model(Arc::clone(&openai) as Arc<dyn LanguageModel>);

    // Retrieval sources degrade to warnings; the pipeline still answers
    // with Not Enough Evidence when nothing can be gathered.
    match SearchProviderRegistry::with_defaults()
        .create(&config.providers.search_provider, &config.providers)
    {
        Ok(provider) => builder = builder.search_provider(provider),
        Err(error) => {
            tracing::warn!(
                provider = %config.providers.search_provider,
                error = %error,
                "web search disabled"
            );
        }
    }
    builder = builder
        .knowledge_store(Arc::new(ChromaStore::from_config(&config.providers)))
        .embedder(Arc::clone(&openai) as Arc<dyn Embedder>);

    let pipeline = builder.build()?;
    let claim = Claim::new(claim)?;
    let outcome = pipeline.verify(&claim).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_text(&outcome);
    }

    let usage = pipeline.usage();
    tracing::info!(
        llm_calls = usage.llm_calls,
        estimated_tokens = usage.estimated_total_tokens(),
        estimated_cost_usd = usage.estimated_cost_usd(&config.providers.llm_model),
        search_calls = usage.search_calls,
        knowledge_queries = usage.knowledge_queries,
        "capability usage"
    );
    Ok(())
}

fn print_text(outcome: &VerificationOutcome) {
    println!("Verdict: {}", outcome.verdict());
    println!();
    println!("{}", outcome.reasoning());

    let citations = outcome.citations();
    if !citations.is_empty() {
        println!();
        println!("Citations:");
        for citation in citations {
            println!("  - {} ({})", citation.title, citation.url);
        }
    }

    if let VerificationOutcome::Aggregate(aggregate) = outcome {
        println!();
        println!("Sub-claims:");
        for (i, sub) in aggregate.sub_results.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, sub.verdict, sub.claim);
        }
    }
}
