//! Result reconciliation for PricePilot.
//!
//! Takes normalized listings from every source, filters them with an AI
//! relevance judge, merges cross-source duplicates and ranks the survivors
//! by a trust-weighted confidence score.

pub mod dedup;
pub mod error;
pub mod judge;
pub mod pipeline;
pub mod scorer;
pub mod validator;

pub use dedup::reconcile;
pub use error::{JudgeError, PipelineError};
pub use judge::{CandidateProjection, OpenAiJudge, RelevanceJudge};
pub use pipeline::{run_pipeline, try_run_pipeline, MAX_QUERY_CHARS};
pub use scorer::{score, score_breakdown, ScoreBreakdown};
pub use validator::{validate, ValidationOutcome, ValidationSettings};
