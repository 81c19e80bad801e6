//! Reconciliation pipeline orchestration.

use std::time::Instant;

use chrono::Utc;
use pricepilot_core::{Country, PipelineStats, SearchOutcome, ValidationStatus};
use pricepilot_sources::{normalize_all, RawResultSet};

use crate::dedup::reconcile;
use crate::error::PipelineError;
use crate::judge::RelevanceJudge;
use crate::scorer::score;
use crate::validator::{validate, ValidationOutcome, ValidationSettings};

/// Longest query accepted, in characters.
pub const MAX_QUERY_CHARS: usize = 200;

fn check_query(query: &str) -> Result<&str, PipelineError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::EmptyQuery);
    }
    let len = trimmed.chars().count();
    if len > MAX_QUERY_CHARS {
        return Err(PipelineError::QueryTooLong {
            len,
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(trimmed)
}

/// Run the full reconciliation pipeline over one search's raw results.
///
/// 1. Normalize every source (failed and unreadable sources are recorded).
/// 2. Validate relevance with `judge`, if one is given.
/// 3. Merge duplicates.
/// 4. Score and sort by confidence.
///
/// # Errors
///
/// Returns [`PipelineError`] for an empty or over-long query, or when a
/// stage hands back a record count it must never produce.
pub async fn try_run_pipeline<J: RelevanceJudge + Sync>(
    raw: &RawResultSet,
    query: &str,
    country: Country,
    judge: Option<&J>,
    settings: &ValidationSettings,
) -> Result<SearchOutcome, PipelineError> {
    let started = Instant::now();
    let query = check_query(query)?;

    tracing::info!(query, country = %country, sources = raw.len(), "starting pipeline");

    // Step 1: Normalize.
    let normalized = normalize_all(raw, country);
    let raw_count = normalized.products.len();

    // Step 2: Validate.
    let (validated, validation) = match judge {
        Some(judge) => {
            let outcome = validate(&normalized.products, query, country, judge, settings).await;
            if let ValidationOutcome::Fallback { reason, .. } = &outcome {
                tracing::warn!(reason = %reason, "using records without AI validation");
            }
            let status = outcome.status();
            (outcome.into_products(), status)
        }
        None => {
            tracing::debug!("no relevance judge configured, skipping validation");
            (normalized.products.clone(), ValidationStatus::Skipped)
        }
    };
    let validated_count = validated.len();

    // Step 3: Deduplicate.
    let deduped = reconcile(&validated);
    if deduped.len() > validated.len() {
        return Err(PipelineError::StageInvariant {
            stage: "duplicate reconciler",
            input: validated.len(),
            output: deduped.len(),
        });
    }
    let deduped_count = deduped.len();

    // Step 4: Score and sort.
    let records = score(&deduped);
    if records.len() != deduped.len() {
        return Err(PipelineError::StageInvariant {
            stage: "confidence scorer",
            input: deduped.len(),
            output: records.len(),
        });
    }

    let final_count = records.len();
    let search_time_seconds = started.elapsed().as_secs_f64();
    tracing::info!(
        raw = raw_count,
        validated = validated_count,
        deduped = deduped_count,
        final_count,
        elapsed_secs = search_time_seconds,
        "pipeline complete"
    );

    Ok(SearchOutcome {
        success: true,
        message: format!("Found {final_count} products for '{query}' in {country}"),
        total_results: final_count,
        records,
        pipeline_stats: PipelineStats {
            raw_count,
            validated_count,
            deduped_count,
            final_count,
            sources_errored: normalized.sources_errored,
            source_failures: normalized.source_failures,
        },
        validation,
        query: query.to_string(),
        country,
        search_time_seconds,
        completed_at: Utc::now(),
    })
}

/// Like [`try_run_pipeline`], but reports failure inside the outcome
/// (`success = false`, no records) instead of as an error.
pub async fn run_pipeline<J: RelevanceJudge + Sync>(
    raw: &RawResultSet,
    query: &str,
    country: Country,
    judge: Option<&J>,
    settings: &ValidationSettings,
) -> SearchOutcome {
    let started = Instant::now();
    match try_run_pipeline(raw, query, country, judge, settings).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "pipeline failed");
            SearchOutcome::failed(
                query,
                country,
                e.to_string(),
                started.elapsed().as_secs_f64(),
            )
        }
    }
}
