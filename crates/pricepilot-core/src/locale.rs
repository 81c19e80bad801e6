//! Countries, currencies and search sources known to the pipeline.
//!
//! All three are closed sets: the country -> currency table is static
//! configuration, and sources are the four upstream backends the fetch layer
//! knows how to query.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownCode;

/// ISO 4217 codes the pipeline can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Inr,
    Jpy,
    Cad,
    Aud,
    Brl,
    Mxn,
}

impl Currency {
    pub const ALL: [Currency; 9] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Inr,
        Currency::Jpy,
        Currency::Cad,
        Currency::Aud,
        Currency::Brl,
        Currency::Mxn,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Brl => "BRL",
            Currency::Mxn => "MXN",
        }
    }

    /// `true` for currencies whose local symbol is a bare `$`.
    #[must_use]
    pub fn uses_dollar_sign(self) -> bool {
        matches!(
            self,
            Currency::Usd | Currency::Cad | Currency::Aud | Currency::Mxn
        )
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or(UnknownCode {
                kind: "currency",
                value: s.to_string(),
            })
    }
}

/// Countries a search can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "UK", alias = "GB")]
    Uk,
    #[serde(rename = "CA")]
    Ca,
    #[serde(rename = "AU")]
    Au,
    #[serde(rename = "DE")]
    De,
    #[serde(rename = "FR")]
    Fr,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "ES")]
    Es,
    #[serde(rename = "JP")]
    Jp,
    #[serde(rename = "BR")]
    Br,
    #[serde(rename = "MX")]
    Mx,
}

impl Country {
    pub const ALL: [Country; 12] = [
        Country::Us,
        Country::In,
        Country::Uk,
        Country::Ca,
        Country::Au,
        Country::De,
        Country::Fr,
        Country::It,
        Country::Es,
        Country::Jp,
        Country::Br,
        Country::Mx,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::In => "IN",
            Country::Uk => "UK",
            Country::Ca => "CA",
            Country::Au => "AU",
            Country::De => "DE",
            Country::Fr => "FR",
            Country::It => "IT",
            Country::Es => "ES",
            Country::Jp => "JP",
            Country::Br => "BR",
            Country::Mx => "MX",
        }
    }

    /// The currency a regional catalog quotes prices in when the listing
    /// itself does not say.
    #[must_use]
    pub fn default_currency(self) -> Currency {
        match self {
            Country::Us => Currency::Usd,
            Country::In => Currency::Inr,
            Country::Uk => Currency::Gbp,
            Country::Ca => Currency::Cad,
            Country::Au => Currency::Aud,
            Country::De | Country::Fr | Country::It | Country::Es => Currency::Eur,
            Country::Jp => Currency::Jpy,
            Country::Br => Currency::Brl,
            Country::Mx => Currency::Mxn,
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "GB" {
            return Ok(Country::Uk);
        }
        Country::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or(UnknownCode {
                kind: "country",
                value: s.to_string(),
            })
    }
}

/// Upstream search backends.
///
/// Declaration order is the canonical processing order: the shopping
/// aggregator first, then the marketplaces and general web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    GoogleShopping,
    Amazon,
    GoogleGeneral,
    Ebay,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::GoogleShopping,
        SourceId::Amazon,
        SourceId::GoogleGeneral,
        SourceId::Ebay,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::GoogleShopping => "google_shopping",
            SourceId::Amazon => "amazon",
            SourceId::GoogleGeneral => "google_general",
            SourceId::Ebay => "ebay",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or(UnknownCode {
                kind: "source",
                value: s.to_string(),
            })
    }
}
