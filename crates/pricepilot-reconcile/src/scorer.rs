//! Multi-factor confidence scoring.
//!
//! The final score is the sum of five capped components, clamped to
//! `[0, 100]`:
//!
//! | Component           | Cap |
//! |---------------------|-----|
//! | AI judgment         | 40  |
//! | Source trust        | 20  |
//! | Data quality        | 25  |
//! | Price plausibility  | 15  |
//! | Bonuses             | 10  |

use pricepilot_core::{clamp_score, CanonicalProduct};
use pricepilot_sources::labels::host_of;
use rust_decimal::Decimal;
use serde::Serialize;

/// Host trust on a 0-10 scale. Subdomains inherit their parent's entry.
const TRUSTED_DOMAINS: &[(&str, f64)] = &[
    ("apple.com", 10.0),
    ("amazon.com", 9.0),
    ("amazon.in", 9.0),
    ("amazon.co.uk", 9.0),
    ("bestbuy.com", 8.0),
    ("walmart.com", 8.0),
    ("flipkart.com", 8.0),
    ("target.com", 7.0),
    ("myntra.com", 7.0),
    ("argos.co.uk", 7.0),
    ("currys.co.uk", 6.0),
    ("ebay.com", 5.0),
    ("ebay.co.uk", 5.0),
];

const UNKNOWN_HOST_TRUST: f64 = 3.0;

/// Store labels that earn the recognition bonus, compared alphanumerics-only.
const MAJOR_RETAILERS: [&str; 5] = ["amazon", "apple", "bestbuy", "walmart", "flipkart"];

/// Name fragments that cost a record its name-hygiene points.
const LOW_QUALITY_MARKERS: [&str; 3] = ["click", "buy now", "limited"];

/// Per-component view of a record's confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub ai: f64,
    pub source_trust: f64,
    pub data_quality: f64,
    pub price_plausibility: f64,
    pub bonus: f64,
    pub total: f64,
}

/// Trust for the record's link host, before doubling.
fn host_trust(link: &str) -> f64 {
    let Some(host) = host_of(link) else {
        return 0.0;
    };
    TRUSTED_DOMAINS
        .iter()
        .find(|(domain, _)| {
            host == *domain
                || host
                    .strip_suffix(*domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
        .map_or(UNKNOWN_HOST_TRUST, |(_, trust)| *trust)
}

fn ai_component(product: &CanonicalProduct) -> f64 {
    if !product.ai.validated {
        return 0.0;
    }
    (0.25 * product.ai.confidence_score + 0.15 * product.ai.relevance_score).min(40.0)
}

fn data_quality(product: &CanonicalProduct) -> f64 {
    let mut score: f64 = 0.0;

    let name = &product.product_name;
    if !name.is_empty() {
        let len = name.chars().count();
        if len >= 10 {
            score += 4.0;
        }
        if len >= 20 {
            score += 2.0;
        }
        let lower = name.to_lowercase();
        if !LOW_QUALITY_MARKERS.iter().any(|m| lower.contains(m)) {
            score += 2.0;
        }
    }

    if !product.price.is_empty() {
        score += 3.0;
        if product.numeric_price().is_some_and(|p| p > Decimal::ZERO) {
            score += 2.0;
        }
    }

    // Currency is always set on a canonical record.
    score += 3.0;

    if product.has_http_link() {
        score += 2.0;
        if product.link.len() > 20 {
            score += 2.0;
        }
    }

    if !product.rating.is_empty() {
        score += 2.0;
    }
    if !product.image_url.is_empty() {
        score += 1.0;
    }
    if !product.availability.is_empty() {
        score += 2.0;
    }

    score.min(25.0)
}

fn price_plausibility(product: &CanonicalProduct) -> f64 {
    let Some(price) = product.numeric_price() else {
        return 0.0;
    };

    let mut score: f64 = 0.0;
    if price > Decimal::ZERO {
        score += 5.0;
    }
    if price >= Decimal::ONE && price <= Decimal::from(100_000) {
        score += 3.0;
    }
    if price >= Decimal::from(5) && price <= Decimal::from(50_000) {
        score += 2.0;
    }
    score + 5.0
}

/// Leading number of a rating such as `"4.5"` or `"4.5 out of 5"`.
fn parse_rating(rating: &str) -> Option<f64> {
    rating.split_whitespace().next()?.parse().ok()
}

fn bonus(product: &CanonicalProduct) -> f64 {
    let mut score: f64 = 0.0;

    if product.duplicate_info.is_some() {
        score += 3.0;
    }

    let website: String = product
        .website
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    if MAJOR_RETAILERS.contains(&website.as_str()) {
        score += 2.0;
    }

    match parse_rating(&product.rating) {
        Some(r) if r >= 4.0 => score += 3.0,
        Some(r) if r >= 3.0 => score += 1.0,
        _ => {}
    }

    if !product.image_url.is_empty() {
        score += 2.0;
    }

    score.min(10.0)
}

/// Explains how a record's confidence score is made up.
#[must_use]
pub fn score_breakdown(product: &CanonicalProduct) -> ScoreBreakdown {
    let ai = ai_component(product);
    let source_trust = host_trust(&product.link) * 2.0;
    let data_quality = data_quality(product);
    let price_plausibility = price_plausibility(product);
    let bonus = bonus(product);
    ScoreBreakdown {
        ai,
        source_trust,
        data_quality,
        price_plausibility,
        bonus,
        total: clamp_score(ai + source_trust + data_quality + price_plausibility + bonus),
    }
}

/// Scores every record and sorts by confidence, highest first. Equal scores
/// keep their input order.
#[must_use]
pub fn score(products: &[CanonicalProduct]) -> Vec<CanonicalProduct> {
    let mut scored: Vec<CanonicalProduct> = products
        .iter()
        .map(|p| p.with_confidence(score_breakdown(p).total))
        .collect();
    scored.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));

    tracing::info!(
        count = scored.len(),
        top_level = scored.first().map(|p| p.confidence_level.label()),
        "confidence scoring complete"
    );
    scored
}

#[cfg(test)]
mod tests {
    use pricepilot_core::{AiAnnotation, ConfidenceLevel, Currency, DuplicateInfo};

    use super::*;

    fn bare(link: &str, price: &str, website: &str) -> CanonicalProduct {
        CanonicalProduct::new(link, price, Currency::Usd, "Apple iPhone 16 Pro 128GB", website)
    }

    fn rich() -> CanonicalProduct {
        let mut product = bare(
            "https://www.amazon.com/Apple-iPhone-16-Pro/dp/B0DHJ",
            "999.00",
            "Amazon",
        );
        product.rating = "4.6".to_string();
        product.image_url = "https://m.media-amazon.com/i.jpg".to_string();
        product.availability = "In Stock".to_string();
        product.ai = AiAnnotation::validated(95.0, 92.0, "Apple iPhone 16 Pro 128GB", true, "exact");
        product.duplicate_info = Some(DuplicateInfo {
            total_duplicates_found: 2,
            sources_merged: vec!["Amazon".to_string(), "Best Buy".to_string()],
            price_range: None,
        });
        product
    }

    #[test]
    fn host_trust_matches_exact_and_subdomains() {
        assert!((host_trust("https://www.apple.com/iphone") - 10.0).abs() < f64::EPSILON);
        assert!((host_trust("https://smile.amazon.co.uk/dp/1") - 9.0).abs() < f64::EPSILON);
        assert!((host_trust("https://notamazon.com/dp/1") - UNKNOWN_HOST_TRUST).abs() < f64::EPSILON);
        assert!(host_trust("").abs() < f64::EPSILON);
        assert!(host_trust("/relative").abs() < f64::EPSILON);
    }

    #[test]
    fn rich_record_total_is_clamped_to_hundred() {
        let breakdown = score_breakdown(&rich());
        assert!((breakdown.ai - 37.25).abs() < 1e-9);
        assert!((breakdown.source_trust - 18.0).abs() < f64::EPSILON);
        assert!((breakdown.data_quality - 25.0).abs() < f64::EPSILON);
        assert!((breakdown.price_plausibility - 15.0).abs() < f64::EPSILON);
        assert!((breakdown.bonus - 10.0).abs() < f64::EPSILON);
        assert!((breakdown.total - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unvalidated_record_gets_no_ai_points() {
        let product = bare("https://www.example.com/item/123456", "45.00", "Example");
        let breakdown = score_breakdown(&product);
        assert!(breakdown.ai.abs() < f64::EPSILON);
        assert!((breakdown.source_trust - 6.0).abs() < f64::EPSILON);
        // name 4+2+2, price 3+2, currency 3, link 2+2
        assert!((breakdown.data_quality - 20.0).abs() < f64::EPSILON);
        assert!((breakdown.price_plausibility - 15.0).abs() < f64::EPSILON);
        assert!(breakdown.bonus.abs() < f64::EPSILON);
        assert!((breakdown.total - 41.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_plausibility_reflects_range() {
        let cheap = bare("https://www.example.com/item/1", "2.50", "Example");
        assert!((price_plausibility(&cheap) - 13.0).abs() < f64::EPSILON);
        let huge = bare("https://www.example.com/item/1", "250000", "Example");
        assert!((price_plausibility(&huge) - 10.0).abs() < f64::EPSILON);
        let garbage = bare("https://www.example.com/item/1", "call us", "Example");
        assert!(price_plausibility(&garbage).abs() < f64::EPSILON);
    }

    #[test]
    fn low_quality_markers_cost_name_points() {
        let mut product = bare("https://www.example.com/item/1", "45.00", "Example");
        let clean = data_quality(&product);
        product.product_name = "Limited offer iPhone 16 Pro".to_string();
        assert!((clean - data_quality(&product) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rating_bonus_tiers() {
        let mut product = bare("https://www.example.com/item/1", "45.00", "Example");
        product.rating = "4.0".to_string();
        assert!((bonus(&product) - 3.0).abs() < f64::EPSILON);
        product.rating = "3.2 out of 5 stars".to_string();
        assert!((bonus(&product) - 1.0).abs() < f64::EPSILON);
        product.rating = "unrated".to_string();
        assert!(bonus(&product).abs() < f64::EPSILON);
    }

    #[test]
    fn major_retailer_bonus_ignores_spacing() {
        let product = bare("https://www.bestbuy.com/site/1", "45.00", "Best Buy");
        assert!((bonus(&product) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn score_is_monotonic_in_ai_confidence() {
        let mut previous = f64::MIN;
        for confidence in [0.0, 10.0, 35.5, 60.0, 90.0, 100.0] {
            let mut product = bare("https://www.example.com/item/1", "45.00", "Example");
            product.ai = AiAnnotation::validated(80.0, confidence, "", true, "");
            let total = score_breakdown(&product).total;
            assert!(total >= previous, "score dropped at confidence {confidence}");
            previous = total;
        }
    }

    #[test]
    fn score_sorts_descending_and_keeps_ties_stable() {
        let first_tie = bare("https://www.example.com/item/aaaaaaa", "45.00", "Example");
        let mut second_tie = first_tie.clone();
        second_tie.link = "https://www.example.com/item/bbbbbbb".to_string();
        let best = rich();

        let scored = score(&[first_tie, second_tie, best]);

        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].website, "Amazon");
        assert_eq!(scored[0].confidence_level, ConfidenceLevel::VeryHigh);
        assert!(scored[1].link.ends_with("aaaaaaa"));
        assert!(scored[2].link.ends_with("bbbbbbb"));
        assert_eq!(scored[1].confidence_level, ConfidenceLevel::Low);
    }
}
