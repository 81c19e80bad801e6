//! Connectivity check for the two upstream services.

use pricepilot_core::AppConfig;
use pricepilot_reconcile::OpenAiJudge;
use pricepilot_sources::SerpApiClient;
use serde_json::{json, Value};

use crate::search::{build_client, build_judge};

/// Result of pinging one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServiceStatus {
    pub connected: bool,
    pub detail: String,
}

impl ServiceStatus {
    fn connected(detail: impl Into<String>) -> Self {
        Self {
            connected: true,
            detail: detail.into(),
        }
    }

    fn down(detail: impl Into<String>) -> Self {
        Self {
            connected: false,
            detail: detail.into(),
        }
    }
}

pub(crate) async fn check_serpapi(client: Option<&SerpApiClient>) -> ServiceStatus {
    let Some(client) = client else {
        return ServiceStatus::down("SERPAPI_KEY is not set");
    };
    match client.test_connection().await {
        Ok(()) => ServiceStatus::connected("search API reachable"),
        Err(e) => {
            tracing::warn!(error = %e, "SerpAPI connection check failed");
            ServiceStatus::down(e.to_string())
        }
    }
}

pub(crate) async fn check_openai(judge: Option<&OpenAiJudge>) -> ServiceStatus {
    let Some(judge) = judge else {
        return ServiceStatus::down("OPENAI_API_KEY is not set");
    };
    match judge.test_connection().await {
        Ok(_) => ServiceStatus::connected(format!("model {} reachable", judge.model())),
        Err(e) => {
            tracing::warn!(error = %e, model = judge.model(), "OpenAI connection check failed");
            ServiceStatus::down(e.to_string())
        }
    }
}

/// `"ok"` only when every service answered.
pub(crate) fn report(serpapi: &ServiceStatus, openai: &ServiceStatus) -> Value {
    let overall = if serpapi.connected && openai.connected {
        "ok"
    } else {
        "degraded"
    };
    let entry = |status: &ServiceStatus| {
        json!({
            "status": if status.connected { "connected" } else { "not connected" },
            "detail": status.detail,
        })
    };
    json!({
        "overall_status": overall,
        "services": {
            "serpapi": entry(serpapi),
            "openai": entry(openai),
        },
    })
}

/// Ping both services concurrently and print the report.
///
/// # Errors
///
/// Returns an error only if a configured client cannot be built. A service
/// that does not answer is reported as not connected.
pub(crate) async fn run_check(config: &AppConfig) -> anyhow::Result<()> {
    let client = config
        .serpapi_key
        .as_deref()
        .map(|key| build_client(config, key))
        .transpose()?;
    let judge = build_judge(config)?;

    let (serpapi, openai) =
        tokio::join!(check_serpapi(client.as_ref()), check_openai(judge.as_ref()));
    let report = report(&serpapi, &openai);
    tracing::info!(
        serpapi = serpapi.connected,
        openai = openai.connected,
        "service check complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
#[path = "check_test.rs"]
mod tests;
