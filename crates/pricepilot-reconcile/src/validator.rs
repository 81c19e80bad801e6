//! AI-assisted relevance filtering.
//!
//! Records are judged in fixed-size batches, one batch at a time with a
//! pause in between. Each batch succeeds or fails on its own: a failed batch
//! passes its records through untouched, and only when every batch fails (or
//! the overall deadline elapses) does the whole stage fall back to its input.

use std::time::Duration;

use pricepilot_core::{AiAnnotation, CanonicalProduct, Country, ValidationStatus};
use serde::Deserialize;
use serde_json::Value;

use crate::error::JudgeError;
use crate::judge::{CandidateProjection, RelevanceJudge};

/// Minimum AI relevance for a judged record to survive.
pub const RELEVANCE_THRESHOLD: f64 = 70.0;

/// A cleaned name replaces the display name only when longer than this.
const MIN_CLEAN_NAME_CHARS: usize = 5;

#[derive(Debug, Clone)]
pub struct ValidationSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub overall_timeout: Duration,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_millis(500),
            overall_timeout: Duration::from_secs(60),
        }
    }
}

/// How the validation stage ended, with the records it hands on.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every batch was judged and filtered.
    Validated { products: Vec<CanonicalProduct> },
    /// Some batches failed; their records passed through unannotated.
    Partial {
        products: Vec<CanonicalProduct>,
        failed_batches: Vec<usize>,
    },
    /// The stage failed as a whole; `products` is the unchanged input.
    Fallback {
        products: Vec<CanonicalProduct>,
        reason: String,
    },
}

impl ValidationOutcome {
    #[must_use]
    pub fn products(&self) -> &[CanonicalProduct] {
        match self {
            ValidationOutcome::Validated { products }
            | ValidationOutcome::Partial { products, .. }
            | ValidationOutcome::Fallback { products, .. } => products,
        }
    }

    #[must_use]
    pub fn into_products(self) -> Vec<CanonicalProduct> {
        match self {
            ValidationOutcome::Validated { products }
            | ValidationOutcome::Partial { products, .. }
            | ValidationOutcome::Fallback { products, .. } => products,
        }
    }

    #[must_use]
    pub fn status(&self) -> ValidationStatus {
        match self {
            ValidationOutcome::Validated { .. } => ValidationStatus::Validated,
            ValidationOutcome::Partial { .. } => ValidationStatus::Partial,
            ValidationOutcome::Fallback { .. } => ValidationStatus::Fallback,
        }
    }
}

/// One entry of the judge's JSON array. Every field is optional so a sloppy
/// entry costs only itself.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Judgment {
    #[serde(default)]
    pub original_index: Option<i64>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub clean_name: Option<String>,
    #[serde(default)]
    pub is_relevant: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Judgment {
    /// Batch-local index, if it addresses a record in a batch of `len`.
    fn index_within(&self, len: usize) -> Option<usize> {
        let index = usize::try_from(self.original_index?).ok()?;
        (index < len).then_some(index)
    }

    fn annotate(&self, product: &CanonicalProduct) -> CanonicalProduct {
        let clean_name = self.clean_name.as_deref().map(str::trim).unwrap_or_default();
        let mut annotated = product.clone();
        annotated.ai = AiAnnotation::validated(
            self.relevance_score.unwrap_or_default(),
            self.confidence_score.unwrap_or_default(),
            clean_name,
            self.is_relevant.unwrap_or_default(),
            self.reason.as_deref().unwrap_or_default(),
        );
        if clean_name.chars().count() > MIN_CLEAN_NAME_CHARS {
            annotated.product_name = clean_name.to_string();
        }
        annotated
    }
}

/// Removes markdown code fences and surrounding chatter from a model reply,
/// leaving the JSON array.
#[must_use]
pub fn strip_fences(response: &str) -> &str {
    let mut body = response.trim();

    if let Some(start) = body.find("```") {
        let after_marker = &body[start + 3..];
        if let Some(end) = after_marker.find("```") {
            body = after_marker[..end].trim();
        }
    }

    // Drops a language tag such as `json` and any prose around the array.
    if let (Some(start), Some(end)) = (body.find('['), body.rfind(']')) {
        if end > start {
            return &body[start..=end];
        }
    }

    body
}

/// Parses a judge reply into judgments. Entries that are not objects of the
/// expected shape are skipped.
///
/// # Errors
///
/// Returns [`JudgeError::Parse`] if the reply is not a JSON array.
pub fn parse_judgments(response: &str) -> Result<Vec<Judgment>, JudgeError> {
    let body = strip_fences(response);
    let entries: Vec<Value> = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        JudgeError::Parse(format!("{e} in response starting {preview:?}"))
    })?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| match Judgment::deserialize(&entry) {
            Ok(judgment) => Some(judgment),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed judgment");
                None
            }
        })
        .collect())
}

/// Copies judgments onto a batch and keeps the relevant records, in batch
/// order. Out-of-range and repeated indices are ignored.
fn merge_batch(batch: &[CanonicalProduct], judgments: &[Judgment]) -> Vec<CanonicalProduct> {
    let mut annotated: Vec<Option<CanonicalProduct>> = vec![None; batch.len()];

    for judgment in judgments {
        let Some(index) = judgment.index_within(batch.len()) else {
            tracing::debug!(index = ?judgment.original_index, "judgment index out of range");
            continue;
        };
        if annotated[index].is_none() {
            annotated[index] = Some(judgment.annotate(&batch[index]));
        }
    }

    annotated.into_iter().flatten().filter(is_relevant).collect()
}

fn is_relevant(product: &CanonicalProduct) -> bool {
    product.ai.is_relevant && product.ai.relevance_score >= RELEVANCE_THRESHOLD
}

async fn judge_batches<J: RelevanceJudge + Sync>(
    batches: &[&[CanonicalProduct]],
    query: &str,
    country: Country,
    judge: &J,
    batch_delay: Duration,
) -> Vec<Result<Vec<Judgment>, JudgeError>> {
    let mut results = Vec::with_capacity(batches.len());

    for (batch_index, batch) in batches.iter().enumerate() {
        if batch_index > 0 && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }

        let projections: Vec<CandidateProjection> = batch
            .iter()
            .enumerate()
            .map(|(i, p)| CandidateProjection::from_product(i, p))
            .collect();

        let result = judge
            .judge(&projections, query, country)
            .await
            .and_then(|text| parse_judgments(&text));

        match &result {
            Ok(judgments) => tracing::debug!(
                batch = batch_index,
                judged = judgments.len(),
                "batch judged"
            ),
            Err(e) => tracing::warn!(batch = batch_index, error = %e, "batch validation failed"),
        }
        results.push(result);
    }

    results
}

/// Judges `products` against `query` and filters to the relevant ones.
///
/// Never fails: judge errors degrade to [`ValidationOutcome::Partial`] or
/// [`ValidationOutcome::Fallback`].
pub async fn validate<J: RelevanceJudge + Sync>(
    products: &[CanonicalProduct],
    query: &str,
    country: Country,
    judge: &J,
    settings: &ValidationSettings,
) -> ValidationOutcome {
    if products.is_empty() {
        return ValidationOutcome::Validated {
            products: Vec::new(),
        };
    }

    let batches: Vec<&[CanonicalProduct]> = products.chunks(settings.batch_size.max(1)).collect();
    tracing::info!(count = products.len(), batches = batches.len(), "starting AI validation");

    let run = judge_batches(&batches, query, country, judge, settings.batch_delay);
    let Ok(results) = tokio::time::timeout(settings.overall_timeout, run).await else {
        let reason = format!(
            "AI validation exceeded {}ms deadline",
            settings.overall_timeout.as_millis()
        );
        tracing::warn!(reason = %reason, "falling back to unvalidated records");
        return ValidationOutcome::Fallback {
            products: products.to_vec(),
            reason,
        };
    };

    let mut kept = Vec::with_capacity(products.len());
    let mut failed_batches = Vec::new();
    for (batch_index, (batch, result)) in batches.iter().zip(results).enumerate() {
        match result {
            Ok(judgments) => kept.extend(merge_batch(batch, &judgments)),
            Err(_) => {
                failed_batches.push(batch_index);
                kept.extend_from_slice(batch);
            }
        }
    }

    if failed_batches.len() == batches.len() {
        let reason = format!("all {} validation batches failed", batches.len());
        tracing::warn!(reason = %reason, "falling back to unvalidated records");
        return ValidationOutcome::Fallback {
            products: products.to_vec(),
            reason,
        };
    }

    tracing::info!(
        kept = kept.len(),
        total = products.len(),
        failed_batches = failed_batches.len(),
        "AI validation complete"
    );

    if failed_batches.is_empty() {
        ValidationOutcome::Validated { products: kept }
    } else {
        ValidationOutcome::Partial {
            products: kept,
            failed_batches,
        }
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
