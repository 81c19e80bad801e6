//! Search and replay command handlers.
//!
//! `fetch` dumps what the live sources return before any processing, and
//! `reconcile` replays such a dump through the pipeline `search` uses, so
//! scoring and merging can be debugged offline.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use pricepilot_core::{AppConfig, Country, SearchOutcome};
use pricepilot_reconcile::{run_pipeline, OpenAiJudge, ValidationSettings};
use pricepilot_sources::{RawResultSet, SerpApiClient};

/// Builds the relevance judge, or `None` when no OpenAI key is configured.
pub(crate) fn build_judge(config: &AppConfig) -> anyhow::Result<Option<OpenAiJudge>> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        tracing::info!("OPENAI_API_KEY is not set; AI validation disabled");
        return Ok(None);
    };
    let judge = OpenAiJudge::new(api_key, &config.openai_model, config.ai_request_timeout_secs)
        .context("failed to build OpenAI client")?
        .with_base_url(&config.openai_base_url)?;
    tracing::info!(model = judge.model(), "AI validation enabled");
    Ok(Some(judge))
}

pub(crate) fn build_client(config: &AppConfig, api_key: &str) -> anyhow::Result<SerpApiClient> {
    SerpApiClient::new(api_key, config.source_timeout_secs, &config.user_agent)
        .context("failed to build SerpAPI client")
}

async fn fetch_raw(
    config: &AppConfig,
    client: &SerpApiClient,
    query: &str,
    country: Country,
) -> RawResultSet {
    client
        .search_all_sources(
            query,
            country,
            Duration::from_secs(config.source_timeout_secs),
            Duration::from_secs(config.search_timeout_secs),
        )
        .await
}

pub(crate) fn validation_settings(config: &AppConfig) -> ValidationSettings {
    ValidationSettings {
        batch_size: config.ai_batch_size,
        batch_delay: Duration::from_millis(config.ai_batch_delay_ms),
        overall_timeout: Duration::from_secs(config.ai_timeout_secs),
    }
}

fn print_outcome(outcome: &SearchOutcome) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

/// Fetch every source for `query` and print the reconciled outcome.
///
/// # Errors
///
/// Returns an error if `SERPAPI_KEY` is missing or a client cannot be built.
/// Source and validation failures are reported inside the outcome instead.
pub(crate) async fn run_search(
    config: &AppConfig,
    query: &str,
    country: Country,
) -> anyhow::Result<()> {
    let client = build_client(config, config.require_serpapi_key()?)?;
    let judge = build_judge(config)?;
    let raw = fetch_raw(config, &client, query, country).await;

    let outcome = run_pipeline(
        &raw,
        query,
        country,
        judge.as_ref(),
        &validation_settings(config),
    )
    .await;
    print_outcome(&outcome)
}

/// Fetch every source for `query` and print the raw result map unprocessed.
///
/// The output is the file format `reconcile --input` reads back.
///
/// # Errors
///
/// Returns an error if `SERPAPI_KEY` is missing or a client cannot be built.
pub(crate) async fn run_fetch(
    config: &AppConfig,
    query: &str,
    country: Country,
) -> anyhow::Result<()> {
    let client = build_client(config, config.require_serpapi_key()?)?;
    let raw = fetch_raw(config, &client, query, country).await;
    let sources: Vec<&str> = raw.iter().map(|(id, _)| id.as_str()).collect();
    tracing::info!(query, country = %country, ?sources, "raw results fetched");
    println!("{}", serde_json::to_string_pretty(&raw.to_json())?);
    Ok(())
}

/// Load a saved raw result map from `path`.
pub(crate) fn load_raw_results(path: &Path) -> anyhow::Result<RawResultSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    RawResultSet::from_json(&document)
        .ok_or_else(|| anyhow::anyhow!("{} must contain a JSON object", path.display()))
}

/// Replay a saved raw result map through the pipeline.
///
/// # Errors
///
/// Returns an error if the input file cannot be read or parsed.
pub(crate) async fn run_reconcile(
    config: &AppConfig,
    input: &Path,
    query: &str,
    country: Country,
    no_ai: bool,
) -> anyhow::Result<()> {
    let raw = load_raw_results(input)?;
    let judge = if no_ai { None } else { build_judge(config)? };

    let outcome = run_pipeline(
        &raw,
        query,
        country,
        judge.as_ref(),
        &validation_settings(config),
    )
    .await;
    print_outcome(&outcome)
}

pub(crate) fn print_countries() {
    for country in Country::ALL {
        println!("{:<4}{}", country.code(), country.default_currency().code());
    }
}
