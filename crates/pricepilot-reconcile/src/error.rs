use thiserror::Error;

/// A relevance-judge call failed. Always non-fatal to a pipeline run.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("judge returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("judge response parse error: {0}")]
    Parse(String),

    #[error("judge returned no choices")]
    EmptyResponse,

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// A pipeline run could not produce a result.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("query is {len} characters; the limit is {max}")]
    QueryTooLong { len: usize, max: usize },

    #[error("{stage} returned {output} records for {input} inputs")]
    StageInvariant {
        stage: &'static str,
        input: usize,
        output: usize,
    },
}
