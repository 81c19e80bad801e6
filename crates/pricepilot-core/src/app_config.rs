#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Required only by commands that query live sources.
    pub serpapi_key: Option<String>,
    /// AI validation is skipped when absent.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub user_agent: String,
    pub source_timeout_secs: u64,
    pub search_timeout_secs: u64,
    pub ai_request_timeout_secs: u64,
    pub ai_timeout_secs: u64,
    pub ai_batch_size: usize,
    pub ai_batch_delay_ms: u64,
}

impl AppConfig {
    /// Returns the SerpAPI key or the error naming the missing variable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::MissingEnvVar`] when `SERPAPI_KEY` was not set.
    pub fn require_serpapi_key(&self) -> Result<&str, crate::ConfigError> {
        self.serpapi_key
            .as_deref()
            .ok_or_else(|| crate::ConfigError::MissingEnvVar("SERPAPI_KEY".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("serpapi_key", &self.serpapi_key.as_ref().map(|_| "[redacted]"))
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("user_agent", &self.user_agent)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("ai_request_timeout_secs", &self.ai_request_timeout_secs)
            .field("ai_timeout_secs", &self.ai_timeout_secs)
            .field("ai_batch_size", &self.ai_batch_size)
            .field("ai_batch_delay_ms", &self.ai_batch_delay_ms)
            .finish()
    }
}
