//! Price and currency extraction from free-form listing text.
//!
//! Listing prices arrive as display strings mixed with marketing copy
//! (`"From $1,299.99 - Free Shipping"`, `"Rs. 45,999"`, `"1299 INR"`). The
//! extractor strips known noise, then tries a fixed sequence of patterns from
//! most to least specific. Within a pattern every match is considered in
//! order, so `"$0.99 or 2 for $5"` yields `5` rather than giving up on the
//! sub-unit first hit.
//!
//! Amounts accept either separator convention: `"1,299.99"` and
//! `"1.299,99"` both read as 1299.99. A trailing group of exactly three
//! digits is taken as thousands, so `"R$ 4.299"` is 4299.
//!
//! Currency comes from the winning match first (`"$1,299 - was €1,400"` is
//! dollars), then from anywhere in the untouched input, then from the country.

use std::str::FromStr;
use std::sync::LazyLock;

use pricepilot_core::{Country, Currency};
use regex::Regex;
use rust_decimal::Decimal;

/// Unsigned number with optional separators; it always ends on a digit.
const NUMBER: &str = r"(\d(?:[\d.,]*\d)?)";

/// Currency symbols as they appear after lowercasing. Letter-prefixed
/// symbols need a word boundary so `"hours 5"` is not read as rupees.
const SYMBOL: &str = r"(?:\b(?:ca|au|mx|us|r|c|a)\$|\brs\.?|[£€₹¥$])";

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:as low as|free shipping|starting|from|up to|save|off)\b")
        .expect("valid regex")
});

/// Ordered extraction patterns; capture group 1 is always the number.
static PATTERNS: LazyLock<[Regex; 6]> = LazyLock::new(|| {
    [
        // symbol before the number
        Regex::new(&format!(r"{SYMBOL}\s*{NUMBER}")).expect("valid regex"),
        // symbol after the number
        Regex::new(&format!(r"{NUMBER}\s*{SYMBOL}")).expect("valid regex"),
        // ISO code after the number
        Regex::new(&format!(r"{NUMBER}\s*(?:usd|eur|gbp|inr|jpy|cad|aud|brl|mxn)\b"))
            .expect("valid regex"),
        Regex::new(&format!(r"price\s*:?\s*{SYMBOL}?\s*{NUMBER}")).expect("valid regex"),
        Regex::new(&format!(
            r"{NUMBER}\s*(?:dollars?|rupees?|euros?|pounds?|yen|reais|real|pesos?)\b"
        ))
        .expect("valid regex"),
        Regex::new(NUMBER).expect("valid regex"),
    ]
});

static RUPEE_ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brs\.?\s*\d").expect("valid regex"));

static CURRENCY_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(usd|eur|gbp|inr|jpy|cad|aud|brl|mxn)\b").expect("valid regex")
});

static CURRENCY_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(dollars?|rupees?|euros?|pounds?|yen|reais|real|pesos?)\b")
        .expect("valid regex")
});

/// Symbols checked by substring, longest first so `CA$` wins over `A$`.
const SYMBOL_TABLE: [(&str, Currency); 11] = [
    ("ca$", Currency::Cad),
    ("au$", Currency::Aud),
    ("mx$", Currency::Mxn),
    ("us$", Currency::Usd),
    ("r$", Currency::Brl),
    ("c$", Currency::Cad),
    ("a$", Currency::Aud),
    ("£", Currency::Gbp),
    ("€", Currency::Eur),
    ("₹", Currency::Inr),
    ("¥", Currency::Jpy),
];

/// A price read out of listing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPrice {
    /// Canonical decimal string (`.` decimal point, no grouping), always `>= 1`.
    pub price: String,
    pub currency: Currency,
}

impl ExtractedPrice {
    /// Numeric value of [`Self::price`].
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        Decimal::from_str(&self.price).ok()
    }
}

/// Extracts the first plausible price from `text`.
///
/// Returns `None` when no pattern yields a value of at least 1.
#[must_use]
pub fn extract_price(text: &str, country: Country) -> Option<ExtractedPrice> {
    if text.trim().is_empty() {
        return None;
    }

    let lower = text.to_lowercase();
    let cleaned = NOISE.replace_all(&lower, " ");

    let (price, matched) = PATTERNS.iter().find_map(|pattern| {
        pattern.captures_iter(&cleaned).find_map(|caps| {
            let price = acceptable_amount(caps.get(1)?.as_str())?;
            Some((price, caps.get(0)?.as_str()))
        })
    })?;

    let fallback = country.default_currency();
    let currency = currency_named_in(matched, fallback)
        .or_else(|| currency_named_in(&lower, fallback))
        .unwrap_or(fallback);

    Some(ExtractedPrice { price, currency })
}

/// Reads a matched number in either separator convention.
///
/// The last separator is the decimal point when it is a `,` followed by one
/// or two digits, or the only `.` in the number and not followed by exactly
/// three digits (unless a `,` grouping precedes it). Every other separator
/// is grouping.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let decimal_at = raw.rfind([',', '.']).filter(|&pos| {
        let tail = raw.len() - pos - 1;
        if raw[pos..].starts_with(',') {
            tail <= 2
        } else {
            raw.matches('.').count() == 1 && (tail != 3 || raw.contains(','))
        }
    });

    let canonical: String = raw
        .char_indices()
        .filter_map(|(i, c)| match c {
            ',' | '.' if Some(i) == decimal_at => Some('.'),
            ',' | '.' => None,
            c => Some(c),
        })
        .collect();
    Decimal::from_str(&canonical).ok()
}

/// Canonical text of the amount when it parses and is at least 1.
fn acceptable_amount(raw: &str) -> Option<String> {
    parse_amount(raw)
        .filter(|value| *value >= Decimal::ONE)
        .map(|value| value.to_string())
}

/// The currency `lower` names, checked in order: symbol, rupee abbreviation,
/// ISO code, currency word, bare `$`.
fn currency_named_in(lower: &str, fallback: Currency) -> Option<Currency> {
    if let Some((_, currency)) = SYMBOL_TABLE.iter().find(|(sym, _)| lower.contains(sym)) {
        return Some(*currency);
    }
    if RUPEE_ABBREVIATION.is_match(lower) {
        return Some(Currency::Inr);
    }
    if let Some(code) = CURRENCY_CODE.captures(lower).and_then(|c| c.get(1)) {
        if let Ok(currency) = code.as_str().parse::<Currency>() {
            return Some(currency);
        }
    }
    if let Some(word) = CURRENCY_WORD.captures(lower).and_then(|c| c.get(1)) {
        return Some(currency_for_word(word.as_str(), fallback));
    }
    if lower.contains('$') {
        return Some(dollar_currency(fallback));
    }
    None
}

fn currency_for_word(word: &str, fallback: Currency) -> Currency {
    match word.trim_end_matches('s') {
        "dollar" => dollar_currency(fallback),
        "rupee" => Currency::Inr,
        "euro" => Currency::Eur,
        "pound" => Currency::Gbp,
        "yen" => Currency::Jpy,
        "reai" | "real" => Currency::Brl,
        "peso" => Currency::Mxn,
        _ => fallback,
    }
}

/// A bare `$` means the local dollar (or peso) where there is one, else USD.
fn dollar_currency(fallback: Currency) -> Currency {
    if fallback.uses_dollar_sign() {
        fallback
    } else {
        Currency::Usd
    }
}
