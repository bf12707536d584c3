//! Upstream rate fetching abstractions

use crate::core::key::CurrencyPair;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// One (date, rate) observation reported by the upstream provider.
///
/// The rate is kept exactly as the provider formatted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSample {
    pub date: NaiveDate,
    pub rate: String,
}

impl RateSample {
    pub fn new(date: NaiveDate, rate: impl Into<String>) -> Self {
        Self {
            date,
            rate: rate.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Upstream unavailable for {pair}: {reason}")]
    Unavailable { pair: CurrencyPair, reason: String },

    #[error("Upstream rejected request for {pair} with status {status}: {reason}")]
    Rejected {
        pair: CurrencyPair,
        status: u16,
        reason: String,
    },

    #[error("Upstream server error for {pair}: status {status}")]
    ServerError { pair: CurrencyPair, status: u16 },

    #[error("Malformed upstream response for {pair}: {reason}")]
    Malformed { pair: CurrencyPair, reason: String },
}

#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Fetches every sample the provider has for `pair` between `start` and `end`, inclusive.
    async fn fetch(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateSample>, FetchError>;
}
