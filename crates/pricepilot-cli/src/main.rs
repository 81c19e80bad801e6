mod check;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pricepilot_core::Country;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricepilot")]
#[command(about = "Cross-source product price search and reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every source for a product and print the reconciled results
    Search {
        /// Two-letter country code (e.g., US, IN, UK)
        #[arg(long, default_value = "US")]
        country: Country,
        /// Product to search for
        query: String,
    },
    /// Fetch every source and print the raw result map without processing it
    Fetch {
        /// Two-letter country code (e.g., US, IN, UK)
        #[arg(long, default_value = "US")]
        country: Country,
        /// Product to search for
        query: String,
    },
    /// Run the pipeline over a saved raw result map
    Reconcile {
        /// JSON file mapping source names to payloads or error markers
        #[arg(long)]
        input: PathBuf,
        /// Two-letter country code (e.g., US, IN, UK)
        #[arg(long, default_value = "US")]
        country: Country,
        /// Skip AI relevance validation
        #[arg(long)]
        no_ai: bool,
        /// Query the raw results were fetched for
        query: String,
    },
    /// List supported countries and their currencies
    Countries,
    /// Check connectivity to the search API and the AI model
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = pricepilot_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search { country, query } => search::run_search(&config, &query, country).await,
        Commands::Fetch { country, query } => search::run_fetch(&config, &query, country).await,
        Commands::Reconcile {
            input,
            country,
            no_ai,
            query,
        } => search::run_reconcile(&config, &input, &query, country, no_ai).await,
        Commands::Countries => {
            search::print_countries();
            Ok(())
        }
        Commands::Check => check::run_check(&config).await,
    }
}
