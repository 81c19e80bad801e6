use pricepilot_core::SourceId;
use thiserror::Error;

/// A search backend could not be queried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{source_id} returned an API error: {message}")]
    Api { source_id: SourceId, message: String },

    #[error("unexpected HTTP status {status} from {source_id}")]
    UnexpectedStatus { status: u16, source_id: SourceId },

    #[error("{source_id} timed out after {secs}s")]
    Timeout { source_id: SourceId, secs: u64 },

    #[error("{source_id} has no marketplace for country {country}")]
    UnsupportedCountry { source_id: SourceId, country: String },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// A source payload as a whole could not be read. The source contributes no
/// records.
#[derive(Debug, Error)]
pub enum SourceParseError {
    #[error("{source_id} payload is not a JSON object")]
    NotAnObject { source_id: SourceId },

    #[error("{source_id} result list under \"{key}\" is not an array")]
    ListNotArray { source_id: SourceId, key: &'static str },
}

/// One item inside an otherwise readable payload was malformed.
#[derive(Debug, Error)]
#[error("item {index} from {source_id} skipped: {reason}")]
pub struct ItemParseError {
    pub source_id: SourceId,
    pub index: usize,
    pub reason: String,
}
