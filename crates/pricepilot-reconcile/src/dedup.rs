//! Fuzzy duplicate reconciliation across sources.
//!
//! Two records are duplicates when their normalized names are close and
//! their prices agree. Duplicates are grouped transitively (union-find), so
//! any two records left in the output are never duplicates of each other and
//! running the reconciler on its own output changes nothing.

use std::sync::LazyLock;

use pricepilot_core::{CanonicalProduct, DuplicateInfo, PriceRange};
use regex::Regex;
use rust_decimal::Decimal;

/// Minimum name similarity for two records to be considered at all.
const NAME_THRESHOLD: f64 = 0.8;

/// Name similarity required when neither record has a usable price.
const NAME_ONLY_THRESHOLD: f64 = 0.9;

/// Largest relative price difference still counted as the same offer (15%).
const PRICE_TOLERANCE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

const NOISE_WORDS: [&str; 13] = [
    "buy", "online", "shop", "store", "official", "genuine", "original", "sale", "offer", "deal",
    "discount", "new", "latest",
];

static NOISE_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:free shipping|fast delivery|best price)\b").expect("valid regex")
});

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:19|20)\d{2}$").expect("valid regex"));

/// Store preference when choosing a group representative.
const WEBSITE_PRIORITY: &[(&str, f64)] = &[
    ("apple", 10.0),
    ("amazon", 9.0),
    ("bestbuy", 8.0),
    ("flipkart", 8.0),
    ("walmart", 7.0),
    ("myntra", 7.0),
    ("argos", 7.0),
    ("target", 6.0),
    ("snapdeal", 6.0),
    ("currys", 6.0),
    ("ebay", 5.0),
    ("very", 5.0),
];

const DEFAULT_WEBSITE_PRIORITY: f64 = 3.0;

const SPAM_PHRASES: [&str; 3] = ["click here", "buy now", "limited time"];

/// Lowercases, drops marketing noise and year tokens, and returns the
/// remaining tokens sorted so word order does not affect similarity.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let without_phrases = NOISE_PHRASES.replace_all(&lower, " ");
    let mut tokens: Vec<&str> = without_phrases
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .filter(|t| !NOISE_WORDS.contains(t) && !YEAR.is_match(t))
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity of two display names in `[0, 1]`.
#[must_use]
pub fn name_similarity(a: &str, b: &str) -> f64 {
    normalized_similarity(&normalize_name(a), &normalize_name(b))
}

fn normalized_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// The duplicate predicate.
#[must_use]
pub fn are_duplicates(a: &CanonicalProduct, b: &CanonicalProduct) -> bool {
    matches_offer(
        name_similarity(&a.product_name, &b.product_name),
        a.numeric_price(),
        b.numeric_price(),
    )
}

fn matches_offer(similarity: f64, pa: Option<Decimal>, pb: Option<Decimal>) -> bool {
    if similarity < NAME_THRESHOLD {
        return false;
    }

    match (pa, pb) {
        (Some(pa), Some(pb)) => {
            let max = pa.max(pb);
            if max <= Decimal::ZERO {
                return pa == pb;
            }
            (pa - pb).abs() / max <= PRICE_TOLERANCE
        }
        (None, None) => similarity >= NAME_ONLY_THRESHOLD,
        _ => false,
    }
}

/// Normalized name and parsed price, computed once per record.
struct MatchKey {
    name: String,
    price: Option<Decimal>,
}

impl MatchKey {
    fn of(product: &CanonicalProduct) -> Self {
        Self {
            name: normalize_name(&product.product_name),
            price: product.numeric_price(),
        }
    }

    fn matches(&self, other: &MatchKey) -> bool {
        matches_offer(
            normalized_similarity(&self.name, &other.name),
            self.price,
            other.price,
        )
    }
}

/// Disjoint-set forest over record indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Keeps the smaller index as root so a group's root is its first member.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

/// Groups of indices, ordered by first member, members in input order.
fn group_indices(products: &[CanonicalProduct]) -> Vec<Vec<usize>> {
    let keys: Vec<MatchKey> = products.iter().map(MatchKey::of).collect();
    let mut sets = UnionFind::new(products.len());
    for i in 0..keys.len() {
        for j in (i + 1)..keys.len() {
            if keys[i].matches(&keys[j]) {
                sets.union(i, j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot_of_root: Vec<Option<usize>> = vec![None; products.len()];
    for i in 0..products.len() {
        let root = sets.find(i);
        match slot_of_root[root] {
            Some(slot) => groups[slot].push(i),
            None => {
                slot_of_root[root] = Some(groups.len());
                groups.push(vec![i]);
            }
        }
    }
    groups
}

fn website_priority(website: &str) -> f64 {
    let key: String = website
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    WEBSITE_PRIORITY
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(DEFAULT_WEBSITE_PRIORITY, |(_, priority)| *priority)
}

fn has_spam_phrase(name: &str) -> bool {
    let lower = name.to_lowercase();
    SPAM_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// How good a record is as the face of its group.
#[must_use]
pub fn representative_score(product: &CanonicalProduct) -> f64 {
    let mut score = website_priority(&product.website);

    if product.ai.validated {
        score += product.ai.confidence_score / 10.0;
    }

    let completeness = [
        !product.product_name.is_empty(),
        !product.price.is_empty(),
        product.has_http_link(),
        !product.image_url.is_empty(),
        !product.rating.is_empty(),
    ];
    score += completeness.iter().map(|&present| f64::from(u8::from(present))).sum::<f64>();

    if product.numeric_price().is_some() {
        score += 2.0;
    }
    if has_spam_phrase(&product.product_name) {
        score -= 5.0;
    }
    score
}

fn duplicate_info(group: &[&CanonicalProduct]) -> DuplicateInfo {
    let mut sources_merged: Vec<String> = Vec::new();
    for product in group {
        let label = if product.website.is_empty() {
            "Unknown"
        } else {
            product.website.as_str()
        };
        if !sources_merged.iter().any(|s| s == label) {
            sources_merged.push(label.to_string());
        }
    }

    let prices: Vec<Decimal> = group.iter().filter_map(|p| p.numeric_price()).collect();
    let price_range = match (prices.iter().min(), prices.iter().max()) {
        (Some(&min), Some(&max)) => Some(PriceRange { min, max }),
        _ => None,
    };

    DuplicateInfo {
        total_duplicates_found: group.len(),
        sources_merged,
        price_range,
    }
}

/// Collapses duplicates to one representative per group.
///
/// Singletons pass through unchanged; a merged representative carries
/// [`DuplicateInfo`] for its group.
#[must_use]
pub fn reconcile(products: &[CanonicalProduct]) -> Vec<CanonicalProduct> {
    let groups = group_indices(products);

    let reconciled: Vec<CanonicalProduct> = groups
        .iter()
        .map(|indices| {
            let members: Vec<&CanonicalProduct> = indices.iter().map(|&i| &products[i]).collect();
            if members.len() == 1 {
                return members[0].clone();
            }

            // Strict comparison keeps the first-seen member on ties.
            let mut best = members[0];
            let mut best_score = representative_score(best);
            for &candidate in &members[1..] {
                let score = representative_score(candidate);
                if score > best_score {
                    best = candidate;
                    best_score = score;
                }
            }

            tracing::debug!(
                name = %best.product_name,
                group = members.len(),
                "merged duplicate group"
            );
            let mut representative = best.clone();
            representative.duplicate_info = Some(duplicate_info(&members));
            representative
        })
        .collect();

    tracing::info!(
        before = products.len(),
        after = reconciled.len(),
        "duplicate reconciliation complete"
    );
    reconciled
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
