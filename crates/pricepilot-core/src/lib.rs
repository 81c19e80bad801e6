//! Shared domain types and configuration for the PricePilot workspace.

pub mod app_config;
pub mod config;
pub mod locale;
pub mod outcome;
pub mod products;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use locale::{Country, Currency, SourceId};
pub use outcome::{PipelineStats, SearchOutcome, SourceFailure, ValidationStatus};
pub use products::{
    clamp_score, AiAnnotation, CanonicalProduct, ConfidenceLevel, DuplicateInfo, PriceRange,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Returned when a country, currency or source code does not name a supported value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind}: {value}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: String,
}
