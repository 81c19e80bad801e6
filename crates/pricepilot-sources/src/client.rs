use std::time::Duration;

use futures::future::join_all;
use pricepilot_core::{Country, SourceId};
use reqwest::Client;
use serde_json::Value;

use crate::error::FetchError;
use crate::types::{RawResultSet, RawSourceResult};

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// HTTP client for the SerpAPI search endpoint, one engine per [`SourceId`].
///
/// Built once at startup and shared by reference. Every engine call goes to
/// `{base_url}/search.json` with the API key as a query parameter.
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Amazon storefront domain for a country, if the marketplace operates there.
#[must_use]
pub fn amazon_domain(country: Country) -> Option<&'static str> {
    match country {
        Country::Us => Some("amazon.com"),
        Country::In => Some("amazon.in"),
        Country::Uk => Some("amazon.co.uk"),
        Country::Ca => Some("amazon.ca"),
        Country::Au => Some("amazon.com.au"),
        Country::De => Some("amazon.de"),
        Country::Fr => Some("amazon.fr"),
        Country::It => Some("amazon.it"),
        Country::Es => Some("amazon.es"),
        Country::Jp | Country::Br | Country::Mx => None,
    }
}

/// eBay site domain for a country, if eBay operates a local site there.
#[must_use]
pub fn ebay_domain(country: Country) -> Option<&'static str> {
    match country {
        Country::Us => Some("ebay.com"),
        Country::Uk => Some("ebay.co.uk"),
        Country::Ca => Some("ebay.ca"),
        Country::Au => Some("ebay.com.au"),
        Country::De => Some("ebay.de"),
        Country::Fr => Some("ebay.fr"),
        Country::It => Some("ebay.it"),
        Country::Es => Some("ebay.es"),
        Country::In | Country::Jp | Country::Br | Country::Mx => None,
    }
}

impl SerpApiClient {
    /// Creates a client against the public SerpAPI host.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different host, e.g. a local mock server.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBaseUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, FetchError> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| FetchError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Sources worth querying for `country`. Marketplaces without a local
    /// storefront are left out.
    #[must_use]
    pub fn sources_for(country: Country) -> Vec<SourceId> {
        SourceId::ALL
            .into_iter()
            .filter(|source| match source {
                SourceId::Amazon => amazon_domain(country).is_some(),
                SourceId::Ebay => ebay_domain(country).is_some(),
                SourceId::GoogleShopping | SourceId::GoogleGeneral => true,
            })
            .collect()
    }

    /// Engine-specific query parameters, without the API key.
    pub(crate) fn search_params(
        source_id: SourceId,
        query: &str,
        country: Country,
    ) -> Result<Vec<(&'static str, String)>, FetchError> {
        let unsupported = || FetchError::UnsupportedCountry {
            source_id,
            country: country.code().to_string(),
        };
        let params = match source_id {
            SourceId::GoogleShopping => vec![
                ("engine", "google_shopping".to_string()),
                ("q", query.to_string()),
                ("gl", country.code().to_ascii_lowercase()),
                ("hl", "en".to_string()),
                ("num", "20".to_string()),
            ],
            SourceId::Amazon => vec![
                ("engine", "amazon".to_string()),
                ("k", query.to_string()),
                (
                    "amazon_domain",
                    amazon_domain(country).ok_or_else(unsupported)?.to_string(),
                ),
            ],
            SourceId::GoogleGeneral => vec![
                ("engine", "google".to_string()),
                ("q", format!("{query} buy price online")),
                ("gl", country.code().to_ascii_lowercase()),
                ("num", "10".to_string()),
            ],
            SourceId::Ebay => vec![
                ("engine", "ebay".to_string()),
                ("_nkw", query.to_string()),
                (
                    "ebay_domain",
                    ebay_domain(country).ok_or_else(unsupported)?.to_string(),
                ),
            ],
        };
        Ok(params)
    }

    /// Runs one engine search and returns its raw JSON payload.
    ///
    /// # Errors
    ///
    /// - [`FetchError::UnsupportedCountry`] if the marketplace has no local site.
    /// - [`FetchError::UnexpectedStatus`] for any non-2xx status.
    /// - [`FetchError::Deserialize`] if the body is not JSON.
    /// - [`FetchError::Api`] if the body is an `{"error": ...}` object.
    /// - [`FetchError::Http`] on network or TLS failure.
    pub async fn search_source(
        &self,
        source_id: SourceId,
        query: &str,
        country: Country,
    ) -> Result<Value, FetchError> {
        let params = Self::search_params(source_id, query, country)?;
        self.get_search_json(source_id, params).await
    }

    /// Sends a one-result web search to confirm the API key and host work.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::search_source`], attributed to
    /// [`SourceId::GoogleGeneral`].
    pub async fn test_connection(&self) -> Result<(), FetchError> {
        let params = vec![
            ("engine", "google".to_string()),
            ("q", "test".to_string()),
            ("num", "1".to_string()),
        ];
        self.get_search_json(SourceId::GoogleGeneral, params)
            .await
            .map(|_| ())
    }

    async fn get_search_json(
        &self,
        source_id: SourceId,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<Value, FetchError> {
        params.push(("api_key", self.api_key.clone()));

        let url = format!("{}/search.json", self.base_url);
        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                source_id,
            });
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body).map_err(|e| FetchError::Deserialize {
            context: format!("{source_id} search response"),
            source: e,
        })?;

        if let Some(message) = payload.get("error") {
            let message = message
                .as_str()
                .map_or_else(|| message.to_string(), str::to_string);
            return Err(FetchError::Api { source_id, message });
        }

        Ok(payload)
    }

    /// Queries every source available in `country` concurrently.
    ///
    /// Each source gets `per_source_timeout`, capped by `overall_timeout`;
    /// all requests start together, so the cap bounds the whole fan-out.
    /// Failures of any kind become error markers in the returned set.
    pub async fn search_all_sources(
        &self,
        query: &str,
        country: Country,
        per_source_timeout: Duration,
        overall_timeout: Duration,
    ) -> RawResultSet {
        let limit = per_source_timeout.min(overall_timeout);
        let sources = Self::sources_for(country);

        let searches = sources.iter().map(|&source_id| async move {
            let result =
                match tokio::time::timeout(limit, self.search_source(source_id, query, country))
                    .await
                {
                    Ok(Ok(payload)) => RawSourceResult::Payload(payload),
                    Ok(Err(e)) => {
                        tracing::warn!(source = %source_id, error = %e, "source search failed");
                        RawSourceResult::failed(e.to_string())
                    }
                    Err(_) => {
                        let e = FetchError::Timeout {
                            source_id,
                            secs: limit.as_secs(),
                        };
                        tracing::warn!(source = %source_id, error = %e, "source search timed out");
                        RawSourceResult::failed(e.to_string())
                    }
                };
            (source_id, result)
        });

        let mut set = RawResultSet::new();
        for (source_id, result) in join_all(searches).await {
            set.insert(source_id, result);
        }

        tracing::info!(
            query,
            country = %country,
            sources = set.len(),
            failed = set.failed_sources().len(),
            "fetched raw results"
        );
        set
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
