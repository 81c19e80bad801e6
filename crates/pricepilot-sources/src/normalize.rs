//! Normalization from per-source raw payloads to [`CanonicalProduct`].
//!
//! Price text is delegated to [`crate::price`] and display labels to
//! [`crate::labels`]; this module handles the structural differences between
//! engines. Items are decoded one at a time so a single odd listing never
//! costs the rest of its source.

use pricepilot_core::{CanonicalProduct, Country, SourceFailure, SourceId};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ItemParseError, SourceParseError};
use crate::labels::{clean_product_name, website_label};
use crate::price::{extract_price, ExtractedPrice};
use crate::types::{
    scalar_text, AmazonItem, EbayItem, PriceField, RawResultSet, RawSourceResult, ShoppingItem,
    WebItem,
};

/// Everything the normalizer produced for one search.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub products: Vec<CanonicalProduct>,
    /// Sources that contributed nothing because they failed upstream or
    /// their payload was unreadable.
    pub sources_errored: Vec<SourceId>,
    pub source_failures: Vec<SourceFailure>,
}

/// Normalizes every source in canonical order.
///
/// Error markers and unreadable payloads are recorded, never fatal.
#[must_use]
pub fn normalize_all(raw: &RawResultSet, country: Country) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (source_id, result) in raw.iter() {
        match result {
            RawSourceResult::Failed { error } => {
                tracing::warn!(source = %source_id, error = %error, "source failed upstream");
                batch.record_failure(source_id, error.clone());
            }
            RawSourceResult::Payload(payload) => {
                match normalize_source(source_id, payload, country) {
                    Ok(products) => {
                        tracing::debug!(
                            source = %source_id,
                            count = products.len(),
                            "normalized source"
                        );
                        batch.products.extend(products);
                    }
                    Err(e) => {
                        tracing::warn!(source = %source_id, error = %e, "unreadable source payload");
                        batch.record_failure(source_id, e.to_string());
                    }
                }
            }
        }
    }

    batch
}

impl NormalizedBatch {
    fn record_failure(&mut self, source: SourceId, message: String) {
        self.sources_errored.push(source);
        self.source_failures.push(SourceFailure { source, message });
    }
}

/// Normalizes one source's payload.
///
/// A payload without a result list yields no records.
///
/// # Errors
///
/// Returns [`SourceParseError`] if the payload is not a JSON object or the
/// result list is not an array.
pub fn normalize_source(
    source_id: SourceId,
    payload: &Value,
    country: Country,
) -> Result<Vec<CanonicalProduct>, SourceParseError> {
    let items = result_list(source_id, payload)?;

    let products = match source_id {
        SourceId::GoogleShopping => decode_items::<ShoppingItem>(source_id, items)
            .filter_map(|item| shopping_product(item, country))
            .collect(),
        SourceId::Amazon => decode_items::<AmazonItem>(source_id, items)
            .filter_map(|item| amazon_product(item, country))
            .collect(),
        SourceId::Ebay => decode_items::<EbayItem>(source_id, items)
            .filter_map(|item| ebay_product(item, country))
            .collect(),
        SourceId::GoogleGeneral => decode_items::<WebItem>(source_id, items)
            .filter_map(|item| web_product(item, country))
            .collect(),
    };

    Ok(products)
}

/// Keys under which each engine has been seen to put its result list.
fn list_aliases(source_id: SourceId) -> &'static [&'static str] {
    match source_id {
        SourceId::GoogleShopping => &["shopping_results", "inline_shopping_results", "products"],
        SourceId::Amazon => &["organic_results", "products", "search_results"],
        SourceId::Ebay => &["organic_results", "results", "items"],
        SourceId::GoogleGeneral => &["organic_results", "results"],
    }
}

/// First non-empty array under the source's aliases.
fn result_list(source_id: SourceId, payload: &Value) -> Result<&[Value], SourceParseError> {
    let object = payload
        .as_object()
        .ok_or(SourceParseError::NotAnObject { source_id })?;

    let mut malformed = None;
    for &key in list_aliases(source_id) {
        match object.get(key) {
            Some(Value::Array(items)) if !items.is_empty() => return Ok(items),
            Some(Value::Array(_) | Value::Null) | None => {}
            Some(_) => {
                malformed.get_or_insert(key);
            }
        }
    }

    match malformed {
        Some(key) => Err(SourceParseError::ListNotArray { source_id, key }),
        None => Ok(&[]),
    }
}

fn decode_items<T: DeserializeOwned>(
    source_id: SourceId,
    items: &[Value],
) -> impl Iterator<Item = T> + '_ {
    items
        .iter()
        .enumerate()
        .filter_map(move |(index, raw)| match T::deserialize(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                let err = ItemParseError {
                    source_id,
                    index,
                    reason: e.to_string(),
                };
                tracing::debug!(error = %err, "dropping malformed item");
                None
            }
        })
}

fn shopping_product(item: ShoppingItem, country: Country) -> Option<CanonicalProduct> {
    let link = first_text([item.link.as_deref(), item.product_link.as_deref()])?;
    let name = clean_product_name(item.title.as_deref().unwrap_or_default());
    let price = resolve_price(
        [
            item.price.as_ref(),
            item.extracted_price.as_ref(),
            item.alternative_price.as_ref(),
        ],
        &name,
        item.snippet.as_deref(),
        country,
    )?;
    let website = first_text([item.source.as_deref()]).unwrap_or_else(|| website_label(&link));

    let mut product = build(link, price, name, website)?;
    product.rating = item.rating.as_ref().and_then(scalar_text).unwrap_or_default();
    product.image_url = item.thumbnail.unwrap_or_default();
    if item.delivery.as_ref().is_some_and(|d| !d.is_null()) {
        product.availability = "In Stock".to_string();
    }
    Some(product)
}

fn amazon_product(item: AmazonItem, country: Country) -> Option<CanonicalProduct> {
    let link = first_text([item.link.as_deref(), item.link_clean.as_deref()])?;
    let name = clean_product_name(item.title.as_deref().unwrap_or_default());
    let price = resolve_price(
        [
            item.price.as_ref(),
            item.extracted_price.as_ref(),
            item.price_string.as_ref(),
            item.price_upper.as_ref(),
        ],
        &name,
        item.snippet.as_deref(),
        country,
    )?;

    let mut product = build(link, price, name, "Amazon".to_string())?;
    product.rating = item.rating.as_ref().and_then(scalar_text).unwrap_or_default();
    product.image_url = item.thumbnail.or(item.image).unwrap_or_default();
    product.availability = if item.is_prime_eligible == Some(false) {
        "Check Availability"
    } else {
        "In Stock"
    }
    .to_string();
    Some(product)
}

fn ebay_product(item: EbayItem, country: Country) -> Option<CanonicalProduct> {
    let link = first_text([item.link.as_deref()])?;
    let name = clean_product_name(item.title.as_deref().unwrap_or_default());
    let price = resolve_price(
        [item.price.as_ref(), item.extracted_price.as_ref()],
        &name,
        item.snippet.as_deref(),
        country,
    )?;

    let mut product = build(link, price, name, "eBay".to_string())?;
    product.image_url = item.thumbnail.unwrap_or_default();
    product.availability = "Auction/Buy Now".to_string();
    Some(product)
}

fn web_product(item: WebItem, country: Country) -> Option<CanonicalProduct> {
    let link = first_text([item.link.as_deref()])?;
    let name = clean_product_name(item.title.as_deref().unwrap_or_default());
    let price = resolve_price([], &name, item.snippet.as_deref(), country)?;
    let website = website_label(&link);

    let mut product = build(link, price, name, website)?;
    product.availability = "Check Website".to_string();
    Some(product)
}

/// Structured price fields first, then free text from the title and snippet.
///
/// The engine's numeric reading is the amount of record; display text keeps
/// its own formatting when it agrees with it, and supplies the currency
/// either way.
fn resolve_price<const N: usize>(
    fields: [Option<&PriceField>; N],
    title: &str,
    snippet: Option<&str>,
    country: Country,
) -> Option<ExtractedPrice> {
    let fields: Vec<&PriceField> = fields.into_iter().flatten().collect();
    let display = fields
        .iter()
        .filter_map(|field| field.to_text())
        .find_map(|text| extract_price(&text, country));
    let numeric = fields.iter().find_map(|field| field.numeric_amount());

    match (display, numeric) {
        (Some(display), Some(amount)) if display.amount() == Some(amount) => Some(display),
        (display, Some(amount)) => Some(ExtractedPrice {
            price: amount.to_string(),
            currency: display.map_or_else(|| country.default_currency(), |d| d.currency),
        }),
        (Some(display), None) => Some(display),
        (None, None) => {
            let text = format!("{title} {}", snippet.unwrap_or_default());
            extract_price(&text, country)
        }
    }
}

/// Applies the record validity rules shared by every adapter.
fn build(
    link: String,
    price: ExtractedPrice,
    name: String,
    website: String,
) -> Option<CanonicalProduct> {
    if !link.starts_with("http") || name.trim().chars().count() <= 3 || price.price.is_empty() {
        return None;
    }
    Some(CanonicalProduct::new(
        link,
        price.price,
        price.currency,
        name,
        website,
    ))
}

fn first_text<const N: usize>(candidates: [Option<&str>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
