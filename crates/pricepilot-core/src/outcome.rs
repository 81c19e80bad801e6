//! Result envelope returned by one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CanonicalProduct, Country, SourceId};

/// How the relevance-validation stage ended for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Every batch was judged.
    Validated,
    /// Some batches failed and were passed through unannotated.
    Partial,
    /// The AI stage failed as a whole; pre-AI records were used.
    Fallback,
    /// No judge was configured for this run.
    Skipped,
}

/// A source that produced no records because it failed upstream or its
/// payload could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: SourceId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub raw_count: usize,
    pub validated_count: usize,
    pub deduped_count: usize,
    pub final_count: usize,
    pub sources_errored: Vec<SourceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_failures: Vec<SourceFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub success: bool,
    pub message: String,
    pub records: Vec<CanonicalProduct>,
    pub total_results: usize,
    pub pipeline_stats: PipelineStats,
    pub validation: ValidationStatus,
    pub query: String,
    pub country: Country,
    pub search_time_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

impl SearchOutcome {
    /// Envelope for a run that could not produce any result at all.
    #[must_use]
    pub fn failed(
        query: impl Into<String>,
        country: Country,
        message: impl Into<String>,
        search_time_seconds: f64,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            records: Vec::new(),
            total_results: 0,
            pipeline_stats: PipelineStats::default(),
            validation: ValidationStatus::Skipped,
            query: query.into(),
            country,
            search_time_seconds,
            completed_at: Utc::now(),
        }
    }
}
