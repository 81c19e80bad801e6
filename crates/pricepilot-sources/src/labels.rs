//! Display-name cleanup and store labels derived from listing URLs.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Trailing marketing suffixes appended by storefronts and search snippets.
static TITLE_SUFFIXES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\s*-\s*(?:buy online|shop now|best price|free shipping).*$")
            .expect("valid regex"),
        Regex::new(r"\s*\|.*$").expect("valid regex"),
        Regex::new(r"(?i)\s*-\s*amazon.*$").expect("valid regex"),
        Regex::new(r"(?i)\s*-\s*ebay.*$").expect("valid regex"),
    ]
});

/// Second-level labels that sit between the registrable name and a ccTLD,
/// as in `amazon.co.uk` or `flipkart.com.au`.
const SECOND_LEVEL_SUFFIXES: [&str; 6] = ["co", "com", "org", "net", "ac", "gov"];

/// Collapses whitespace and strips trailing storefront boilerplate.
#[must_use]
pub fn clean_product_name(raw: &str) -> String {
    let mut name = WHITESPACE.replace_all(raw.trim(), " ").into_owned();
    for suffix in TITLE_SUFFIXES.iter() {
        name = suffix.replace(&name, "").into_owned();
    }
    name.trim().to_string()
}

/// Lowercased host of `url` without a leading `www.` or `m.`.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host.as_str())
        .to_string();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Human-readable store label for a listing URL, e.g. `"Bestbuy"` for
/// `https://www.bestbuy.com/site/...`. Unparseable input yields `"Unknown"`.
#[must_use]
pub fn website_label(url: &str) -> String {
    host_of(url)
        .and_then(|host| registrable_name(&host).map(title_case))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// The label just left of the public suffix.
fn registrable_name(host: &str) -> Option<&str> {
    let parts: Vec<&str> = host.split('.').filter(|p| !p.is_empty()).collect();
    match parts.len() {
        0 => None,
        1 => Some(parts[0]),
        n => {
            let second_last = parts[n - 2];
            if n >= 3 && SECOND_LEVEL_SUFFIXES.contains(&second_last) && parts[n - 1].len() == 2 {
                Some(parts[n - 3])
            } else {
                Some(second_last)
            }
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
