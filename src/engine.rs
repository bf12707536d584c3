//! Coalesces per-date rate requests into one upstream fetch per currency pair.

use crate::core::{CurrencyPair, FetchError, Interval, Key, RateFetcher, RateSample};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Upstream(#[from] FetchError),

    #[error("Resolving rates timed out after {0:?}")]
    Timeout(Duration),
}

/// Groups keys by currency pair, widening each pair's interval over its requested dates.
pub fn coalesce<'a>(keys: impl IntoIterator<Item = &'a Key>) -> BTreeMap<CurrencyPair, Interval> {
    let mut intervals: BTreeMap<CurrencyPair, Interval> = BTreeMap::new();
    for key in keys {
        intervals
            .entry(key.pair().clone())
            .or_default()
            .widen(key.date());
    }
    intervals
}

pub struct Coalescer {
    fetcher: Arc<dyn RateFetcher>,
    timeout: Option<Duration>,
}

impl Coalescer {
    pub fn new(fetcher: Arc<dyn RateFetcher>) -> Self {
        Self {
            fetcher,
            timeout: None,
        }
    }

    /// Bounds the whole `resolve` call; in-flight fetches are dropped on expiry.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolves one rate per key, in the order the keys were given.
    ///
    /// Keys without an upstream sample for their exact date resolve to an empty string.
    /// Any failed fetch fails the whole batch.
    pub async fn resolve(&self, keys: &[Key]) -> Result<Vec<String>, ResolveError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.resolve_all(keys))
                .await
                .map_err(|_| ResolveError::Timeout(limit))?,
            None => self.resolve_all(keys).await,
        }
    }

    async fn resolve_all(&self, keys: &[Key]) -> Result<Vec<String>, ResolveError> {
        let intervals = coalesce(keys);
        info!(
            keys = keys.len(),
            pairs = intervals.len(),
            "Resolving exchange rates"
        );

        let mut rates: HashMap<Key, String> =
            keys.iter().map(|k| (k.clone(), String::new())).collect();

        let fetches = intervals
            .iter()
            .map(|(pair, interval)| self.fetch_pair(pair, *interval));
        let fetched = try_join_all(fetches).await?;

        for (pair, samples) in fetched {
            for sample in samples {
                let key = Key::from_pair(pair.clone(), sample.date);
                match rates.get_mut(&key) {
                    Some(rate) => *rate = sample.rate,
                    None => debug!(%key, "Discarding sample for unrequested date"),
                }
            }
        }

        Ok(keys
            .iter()
            .map(|k| rates.get(k).cloned().unwrap_or_default())
            .collect())
    }

    #[instrument(name = "PairFetch", skip(self, interval), fields(pair = %pair))]
    async fn fetch_pair<'a>(
        &self,
        pair: &'a CurrencyPair,
        interval: Interval,
    ) -> Result<(&'a CurrencyPair, Vec<RateSample>), FetchError> {
        let Some((start, end)) = interval.bounds() else {
            return Ok((pair, Vec::new()));
        };

        debug!(%start, %end, "Fetching rates");
        let samples = self.fetcher.fetch(pair, start, end).await?;
        debug!(samples = samples.len(), "Fetched rates");
        Ok((pair, samples))
    }
}
