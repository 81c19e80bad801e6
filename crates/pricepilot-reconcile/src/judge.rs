//! The relevance-judge capability and its OpenAI-compatible implementation.

use std::future::Future;
use std::time::Duration;

use pricepilot_core::{CanonicalProduct, Country};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::JudgeError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You are a product validation expert. Return only valid JSON arrays.";

const CONNECTION_TEST_PROMPT: &str =
    "Hello, this is a connection test. Please respond with 'Connection successful'.";

/// Longest link sent to the judge; product URLs carry long tracking tails.
const MAX_LINK_CHARS: usize = 100;

/// Compact view of a record sent to the judge. `index` is batch-local.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateProjection {
    pub index: usize,
    pub name: String,
    pub price: String,
    pub currency: String,
    pub website: String,
    pub link: String,
}

impl CandidateProjection {
    #[must_use]
    pub fn from_product(index: usize, product: &CanonicalProduct) -> Self {
        Self {
            index,
            name: product.product_name.clone(),
            price: product.price.clone(),
            currency: product.currency.code().to_string(),
            website: product.website.clone(),
            link: product.link.chars().take(MAX_LINK_CHARS).collect(),
        }
    }
}

/// Judges how well a batch of candidates matches a query.
///
/// Implementations return the model's raw text; parsing and merging are the
/// validator's job, so a judge only has to get the words back.
pub trait RelevanceJudge {
    fn judge(
        &self,
        batch: &[CandidateProjection],
        query: &str,
        country: Country,
    ) -> impl Future<Output = Result<String, JudgeError>> + Send;
}

/// Builds the user prompt for one batch.
///
/// # Errors
///
/// Returns [`JudgeError::Parse`] if the batch cannot be serialized.
pub fn build_prompt(
    batch: &[CandidateProjection],
    query: &str,
    country: Country,
) -> Result<String, JudgeError> {
    let products_json =
        serde_json::to_string_pretty(batch).map_err(|e| JudgeError::Parse(e.to_string()))?;
    Ok(format!(
        r#"You are a product validation expert. Analyze if these search results match the user's query.

USER QUERY: "{query}"
COUNTRY: {country}

PRODUCTS TO VALIDATE:
{products_json}

For each product, determine:
1. RELEVANCE: Does this product match the user's query? (0-100 score)
2. CLEAN_NAME: Extract a clean, standardized product name
3. CONFIDENCE: Overall confidence this is a good match (0-100)
4. REASON: Brief explanation of your decision

Return ONLY a JSON array with this exact format:
[
  {{
    "original_index": 0,
    "relevance_score": 85,
    "clean_name": "Apple iPhone 16 Pro 128GB",
    "confidence_score": 90,
    "is_relevant": true,
    "reason": "Exact match for iPhone 16 Pro"
  }}
]

Rules:
- original_index is the "index" of the product above
- is_relevant = true only if relevance_score >= 70
- Be strict about product matching
- Mark obvious spam or unrelated items as not relevant
"#
    ))
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Judge backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiJudge {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiJudge {
    /// # Errors
    ///
    /// Returns [`JudgeError::Http`] if the HTTP client cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, JudgeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns [`JudgeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, JudgeError> {
        reqwest::Url::parse(base_url).map_err(|e| JudgeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a tiny chat completion to confirm the key, model and host work.
    /// Returns the model's reply.
    ///
    /// # Errors
    ///
    /// Returns the same errors as a judge call.
    pub async fn test_connection(&self) -> Result<String, JudgeError> {
        let messages = [ChatMessage {
            role: "user",
            content: CONNECTION_TEST_PROMPT,
        }];
        self.complete(&messages, 0.0, 10).await
    }

    async fn complete(
        &self,
        messages: &[ChatMessage<'_>],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, JudgeError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::Parse(format!("chat completion body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or(JudgeError::EmptyResponse)
    }
}

impl RelevanceJudge for OpenAiJudge {
    async fn judge(
        &self,
        batch: &[CandidateProjection],
        query: &str,
        country: Country,
    ) -> Result<String, JudgeError> {
        let prompt = build_prompt(batch, query, country)?;
        let messages = [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: &prompt,
            },
        ];

        tracing::debug!(model = %self.model, batch = batch.len(), "sending judge request");
        self.complete(&messages, 0.1, 2000).await
    }
}

#[cfg(test)]
mod tests {
    use pricepilot_core::Currency;

    use super::*;

    #[test]
    fn projection_truncates_long_links() {
        let link = format!("https://www.amazon.com/dp/B0DHJ?{}", "x".repeat(300));
        let product = CanonicalProduct::new(link, "999.00", Currency::Usd, "iPhone 16 Pro", "Amazon");
        let projection = CandidateProjection::from_product(3, &product);
        assert_eq!(projection.index, 3);
        assert_eq!(projection.link.chars().count(), MAX_LINK_CHARS);
        assert_eq!(projection.currency, "USD");
    }

    #[test]
    fn prompt_embeds_query_country_and_batch() {
        let product = CanonicalProduct::new(
            "https://www.bestbuy.com/site/1",
            "999.00",
            Currency::Usd,
            "Apple iPhone 16 Pro",
            "Best Buy",
        );
        let batch = [CandidateProjection::from_product(0, &product)];
        let prompt = build_prompt(&batch, "iphone 16 pro", Country::Us).unwrap();
        assert!(prompt.contains("USER QUERY: \"iphone 16 pro\""));
        assert!(prompt.contains("COUNTRY: US"));
        assert!(prompt.contains("\"website\": \"Best Buy\""));
        assert!(prompt.contains("\"original_index\": 0"));
    }

    #[test]
    fn with_base_url_rejects_garbage() {
        let judge = OpenAiJudge::new("sk-test", "gpt-4o-mini", 5).unwrap();
        assert!(matches!(
            judge.with_base_url("not a url"),
            Err(JudgeError::InvalidBaseUrl { .. })
        ));
    }
}
