use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Currency;

/// A single listing normalized out of one source's raw payload.
///
/// Every stage after normalization consumes these by reference and emits new
/// values, so an earlier stage's output can always be inspected after a
/// later stage ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProduct {
    /// Absolute product URL. Always starts with `http`.
    pub link: String,
    /// Non-negative decimal string without thousands separators, e.g. `"1299.99"`.
    pub price: String,
    pub currency: Currency,
    pub product_name: String,
    /// Human-readable store label, e.g. `"Amazon"` or `"Bestbuy"`.
    pub website: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(flatten)]
    pub ai: AiAnnotation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_info: Option<DuplicateInfo>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub confidence_level: ConfidenceLevel,
}

impl CanonicalProduct {
    /// Builds an unannotated record. Optional display fields start empty.
    #[must_use]
    pub fn new(
        link: impl Into<String>,
        price: impl Into<String>,
        currency: Currency,
        product_name: impl Into<String>,
        website: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            price: price.into(),
            currency,
            product_name: product_name.into(),
            website: website.into(),
            rating: String::new(),
            availability: String::new(),
            image_url: String::new(),
            ai: AiAnnotation::default(),
            duplicate_info: None,
            confidence_score: 0.0,
            confidence_level: ConfidenceLevel::default(),
        }
    }

    /// Parses `price` as a decimal. Commas are tolerated for records built
    /// outside the normalizer.
    #[must_use]
    pub fn numeric_price(&self) -> Option<Decimal> {
        let cleaned = self.price.trim().replace(',', "");
        if cleaned.is_empty() {
            return None;
        }
        Decimal::from_str(&cleaned).ok()
    }

    /// Returns `true` when the link is an absolute http(s) URL.
    #[must_use]
    pub fn has_http_link(&self) -> bool {
        self.link.starts_with("http")
    }

    /// Returns a copy carrying the final confidence score (clamped to `[0, 100]`)
    /// and its categorical level.
    #[must_use]
    pub fn with_confidence(&self, score: f64) -> Self {
        let score = clamp_score(score);
        Self {
            confidence_score: score,
            confidence_level: ConfidenceLevel::from_score(score),
            ..self.clone()
        }
    }
}

/// Judgment attached by the relevance validator. All defaults mean
/// "not validated".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnnotation {
    #[serde(rename = "aiValidated", default)]
    pub validated: bool,
    #[serde(rename = "aiRelevanceScore", default)]
    pub relevance_score: f64,
    #[serde(rename = "aiConfidenceScore", default)]
    pub confidence_score: f64,
    #[serde(rename = "aiCleanName", default)]
    pub clean_name: String,
    #[serde(rename = "aiIsRelevant", default)]
    pub is_relevant: bool,
    #[serde(rename = "aiReason", default)]
    pub reason: String,
}

impl AiAnnotation {
    /// Builds a validated annotation, clamping both scores into `[0, 100]`.
    #[must_use]
    pub fn validated(
        relevance_score: f64,
        confidence_score: f64,
        clean_name: impl Into<String>,
        is_relevant: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            validated: true,
            relevance_score: clamp_score(relevance_score),
            confidence_score: clamp_score(confidence_score),
            clean_name: clean_name.into(),
            is_relevant,
            reason: reason.into(),
        }
    }
}

/// Summary of the group a reconciled record represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateInfo {
    pub total_duplicates_found: usize,
    /// Distinct website labels in first-seen order.
    pub sources_merged: Vec<String>,
    /// Lowest and highest parseable price in the group. `None` when no
    /// member had a parseable price.
    pub price_range: Option<PriceRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// Categorical bucket for the final confidence score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "Very High")]
    VeryHigh,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Low")]
    Low,
    #[default]
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl ConfidenceLevel {
    /// Maps a score to its level using inclusive lower bounds 80/65/50/35.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceLevel::VeryHigh
        } else if score >= 65.0 {
            ConfidenceLevel::High
        } else if score >= 50.0 {
            ConfidenceLevel::Medium
        } else if score >= 35.0 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "Very High",
            ConfidenceLevel::High => "High",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::VeryLow => "Very Low",
        }
    }
}

/// Clamps a 0-100 score. `NaN` collapses to `0.0`.
#[must_use]
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}
