//! Requested rate identifiers

use chrono::NaiveDate;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Length of a raw key such as `USDKRW20221202`.
const RAW_KEY_LEN: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Invalid input: {0} (expected 14 characters like USDKRW20221202)")]
    InvalidLength(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid date in key {key}: {date}")]
    InvalidDate { key: String, date: String },

    #[error("No keys requested")]
    Empty,
}

fn normalize_code(code: &str) -> Result<String, KeyError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(KeyError::InvalidCurrency(code.to_string()))
    }
}

/// A base/quote currency pair, e.g. `USD/KRW`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyPair {
    base: String,
    quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Result<Self, KeyError> {
        Ok(Self {
            base: normalize_code(base)?,
            quote: normalize_code(quote)?,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// One requested exchange rate: a currency pair on a calendar date.
///
/// Keys order by pair first, then by date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pair: CurrencyPair,
    date: NaiveDate,
}

impl Key {
    pub fn new(base: &str, quote: &str, date: NaiveDate) -> Result<Self, KeyError> {
        Ok(Self::from_pair(CurrencyPair::new(base, quote)?, date))
    }

    pub fn from_pair(pair: CurrencyPair, date: NaiveDate) -> Self {
        Self { pair, date }
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn base(&self) -> &str {
        self.pair.base()
    }

    pub fn quote(&self) -> &str {
        self.pair.quote()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.pair, self.date.format("%Y-%m-%d"))
    }
}

impl FromStr for Key {
    type Err = KeyError;

    /// Parses a raw key in the `BBBQQQYYYYMMDD` form, e.g. `usdkrw20221202`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.chars().count() != RAW_KEY_LEN {
            return Err(KeyError::InvalidLength(raw.to_string()));
        }

        // Split on char boundaries so non-ASCII input reaches the field checks
        let offset = |n: usize| raw.char_indices().nth(n).map_or(raw.len(), |(i, _)| i);
        let (base, quote, date) = (
            &raw[..offset(3)],
            &raw[offset(3)..offset(6)],
            &raw[offset(6)..],
        );
        let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| KeyError::InvalidDate {
            key: raw.to_string(),
            date: date.to_string(),
        })?;

        Key::new(base, quote, date)
    }
}

/// Parses a comma-delimited list of raw keys, preserving the requested order.
pub fn parse_keys(raw: &str) -> Result<Vec<Key>, KeyError> {
    if raw.trim().is_empty() {
        return Err(KeyError::Empty);
    }
    raw.split(',').map(|k| k.trim().parse()).collect()
}
