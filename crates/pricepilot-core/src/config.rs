use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("PRICEPILOT_LOG_LEVEL", "info");

    let serpapi_key = optional("SERPAPI_KEY");
    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_model = or_default("PRICEPILOT_OPENAI_MODEL", "gpt-4o-mini");
    let openai_base_url = or_default("PRICEPILOT_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let user_agent = or_default("PRICEPILOT_USER_AGENT", "pricepilot/0.1 (price-comparison)");

    let source_timeout_secs = parse_u64("PRICEPILOT_SOURCE_TIMEOUT_SECS", "15")?;
    let search_timeout_secs = parse_u64("PRICEPILOT_SEARCH_TIMEOUT_SECS", "45")?;
    let ai_request_timeout_secs = parse_u64("PRICEPILOT_AI_REQUEST_TIMEOUT_SECS", "30")?;
    let ai_timeout_secs = parse_u64("PRICEPILOT_AI_TIMEOUT_SECS", "60")?;
    let ai_batch_size = parse_usize("PRICEPILOT_AI_BATCH_SIZE", "10")?;
    let ai_batch_delay_ms = parse_u64("PRICEPILOT_AI_BATCH_DELAY_MS", "500")?;

    if ai_batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PRICEPILOT_AI_BATCH_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        log_level,
        serpapi_key,
        openai_api_key,
        openai_model,
        openai_base_url,
        user_agent,
        source_timeout_secs,
        search_timeout_secs,
        ai_request_timeout_secs,
        ai_timeout_secs,
        ai_batch_size,
        ai_batch_delay_ms,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
