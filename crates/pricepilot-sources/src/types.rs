//! Raw result shapes handed over by the fetch layer.
//!
//! ## Observed shapes (SerpAPI engines)
//!
//! ### Result lists
//! Engines disagree on where the list lives. Google Shopping uses
//! `shopping_results` (sometimes `inline_shopping_results`), Amazon has
//! returned both `organic_results` and `products`, eBay uses
//! `organic_results`. Each adapter in [`crate::normalize`] checks its aliases
//! in order and takes the first non-empty array.
//!
//! ### Prices
//! A price may arrive as display text (`"$999.00"`), a bare number
//! (`999.0`), an object with display and numeric parts
//! (`{"raw": "$999.00", "extracted": 999.0}`), a symbol/value pair
//! (`{"symbol": "$", "value": 999.0}`) or a range
//! (`{"from": {...}, "to": {...}}`). [`PriceField`] accepts all of them.
//!
//! ### Links
//! Shopping results may carry `link`, `product_link`, or both. Both are kept
//! as separate fields rather than serde aliases, because an alias pair that
//! co-occurs is a duplicate-field error and would drop the whole item.
//!
//! ### Errors
//! A failed engine call is reported as an object with an `error` key. Any
//! payload carrying that key is treated as an error marker.

use std::collections::BTreeMap;
use std::str::FromStr;

use pricepilot_core::SourceId;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// One source's contribution to a search: its payload or the reason it has none.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSourceResult {
    Payload(Value),
    Failed { error: String },
}

impl RawSourceResult {
    /// Wraps a payload, turning `{"error": ...}` bodies into error markers.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value.get("error") {
            Some(Value::String(message)) => RawSourceResult::Failed {
                error: message.clone(),
            },
            Some(other) => RawSourceResult::Failed {
                error: other.to_string(),
            },
            None => RawSourceResult::Payload(value),
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        RawSourceResult::Failed {
            error: error.into(),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, RawSourceResult::Failed { .. })
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            RawSourceResult::Payload(value) => value.clone(),
            RawSourceResult::Failed { error } => serde_json::json!({ "error": error }),
        }
    }
}

/// Raw results of one search keyed by source, iterated in canonical
/// [`SourceId`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    entries: BTreeMap<SourceId, RawSourceResult>,
}

impl RawResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a `{"<source>": payload-or-error}` map. Unknown source keys are
    /// logged and skipped; a non-object document yields `None`.
    #[must_use]
    pub fn from_json(document: &Value) -> Option<Self> {
        let map = document.as_object()?;
        let mut set = Self::new();
        for (key, value) in map {
            match key.parse::<SourceId>() {
                Ok(source_id) => set.insert(source_id, RawSourceResult::from_value(value.clone())),
                Err(e) => tracing::warn!(source = %key, error = %e, "ignoring unknown source"),
            }
        }
        Some(set)
    }

    pub fn insert(&mut self, source_id: SourceId, result: RawSourceResult) {
        self.entries.insert(source_id, result);
    }

    #[must_use]
    pub fn get(&self, source_id: SourceId) -> Option<&RawSourceResult> {
        self.entries.get(&source_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &RawSourceResult)> {
        self.entries.iter().map(|(id, result)| (*id, result))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sources that came back as error markers.
    #[must_use]
    pub fn failed_sources(&self) -> Vec<SourceId> {
        self.iter()
            .filter(|(_, result)| result.is_failed())
            .map(|(id, _)| id)
            .collect()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let map = self
            .iter()
            .map(|(id, result)| (id.as_str().to_string(), result.to_value()))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}

/// Every price representation observed across engines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Text(String),
    Number(f64),
    Symbol {
        symbol: String,
        value: f64,
    },
    Range {
        from: Box<PriceField>,
        #[serde(default)]
        to: Option<Box<PriceField>>,
    },
    Detailed {
        #[serde(default)]
        raw: Option<String>,
        #[serde(default)]
        extracted: Option<f64>,
    },
}

impl PriceField {
    /// Renders the field as text the price extractor can read. Ranges use
    /// their lower bound.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            PriceField::Text(text) => non_empty(text),
            PriceField::Number(value) => Some(format!("{value}")),
            PriceField::Symbol { symbol, value } => Some(format!("{}{value}", symbol.trim())),
            PriceField::Range { from, .. } => from.to_text(),
            PriceField::Detailed { raw, extracted } => raw
                .as_deref()
                .and_then(non_empty)
                .or_else(|| extracted.map(|v| format!("{v}"))),
        }
    }

    /// The engine's own numeric reading, when it gave one and it is at
    /// least 1. Ranges use their lower bound.
    #[must_use]
    pub fn numeric_amount(&self) -> Option<Decimal> {
        let value = match self {
            PriceField::Number(value)
            | PriceField::Symbol { value, .. }
            | PriceField::Detailed {
                extracted: Some(value),
                ..
            } => *value,
            PriceField::Range { from, .. } => return from.numeric_amount(),
            PriceField::Text(_) | PriceField::Detailed { extracted: None, .. } => return None,
        };
        // f64 Display is the shortest round-trip form, so 249.99 stays 249.99.
        let amount = Decimal::from_str(&value.to_string()).ok()?;
        (amount >= Decimal::ONE).then(|| amount.normalize())
    }
}

/// Item from the shopping aggregator (`google_shopping`).
#[derive(Debug, Deserialize)]
pub struct ShoppingItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub price: Option<PriceField>,
    #[serde(default)]
    pub extracted_price: Option<PriceField>,
    #[serde(default)]
    pub alternative_price: Option<PriceField>,
    /// Store name, e.g. `"Best Buy"`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub delivery: Option<Value>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Item from the Amazon marketplace engine.
#[derive(Debug, Deserialize)]
pub struct AmazonItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub link_clean: Option<String>,
    #[serde(default)]
    pub price: Option<PriceField>,
    #[serde(default)]
    pub price_string: Option<PriceField>,
    #[serde(default)]
    pub price_upper: Option<PriceField>,
    #[serde(default)]
    pub extracted_price: Option<PriceField>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub is_prime_eligible: Option<bool>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Item from the eBay marketplace engine.
#[derive(Debug, Deserialize)]
pub struct EbayItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub price: Option<PriceField>,
    #[serde(default)]
    pub extracted_price: Option<PriceField>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Organic result from general web search.
#[derive(Debug, Deserialize)]
pub struct WebItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Renders a loosely-typed scalar (rating fields are numbers on some engines
/// and strings on others) as trimmed text.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
