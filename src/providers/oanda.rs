use super::util::with_retry;
use crate::core::config::OandaProviderConfig;
use crate::core::{CurrencyPair, FetchError, RateFetcher, RateSample};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, instrument};

const HISTORICAL_RATES_PATH: &str = "/fx-for-business/historical-rates/api/data/update/";

/// Timestamps at or above this are in milliseconds.
const MILLIS_THRESHOLD: u64 = 10_000_000_000;

#[derive(Debug, Deserialize)]
struct OandaResponse {
    #[serde(default)]
    widget: Vec<OandaWidget>,
}

#[derive(Debug, Deserialize)]
struct OandaWidget {
    #[serde(default)]
    data: Vec<(i64, RawRate)>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRate {
    Text(String),
    Number(serde_json::Number),
}

impl RawRate {
    fn into_text(self) -> String {
        match self {
            RawRate::Text(text) => text,
            RawRate::Number(number) => number.to_string(),
        }
    }
}

fn timestamp_to_date(timestamp: i64) -> Option<NaiveDate> {
    let mut secs = timestamp;
    while secs.unsigned_abs() >= MILLIS_THRESHOLD {
        secs /= 1000;
    }
    Utc.timestamp_opt(secs, 0).single().map(|dt| dt.date_naive())
}

/// Fetches daily bid rates from OANDA's historical rates widget API.
pub struct OandaProvider {
    base_url: String,
    retries: usize,
    retry_delay_ms: u64,
}

impl OandaProvider {
    pub fn new(base_url: &str) -> Self {
        OandaProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            retries: 0,
            retry_delay_ms: 0,
        }
    }

    pub fn from_config(config: &OandaProviderConfig) -> Self {
        Self::new(&config.base_url).with_retry_policy(config.retries, config.retry_delay_ms)
    }

    /// Retries transport failures; HTTP error responses are never retried.
    pub fn with_retry_policy(mut self, retries: usize, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    fn parse_samples(pair: &CurrencyPair, body: &str) -> Result<Vec<RateSample>, FetchError> {
        let response: OandaResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Malformed {
                pair: pair.clone(),
                reason: e.to_string(),
            })?;

        let Some(widget) = response.widget.into_iter().next() else {
            debug!("No widget data in response");
            return Ok(Vec::new());
        };

        widget
            .data
            .into_iter()
            .map(|(timestamp, rate)| {
                let date = timestamp_to_date(timestamp).ok_or_else(|| FetchError::Malformed {
                    pair: pair.clone(),
                    reason: format!("invalid timestamp {timestamp}"),
                })?;
                Ok(RateSample::new(date, rate.into_text()))
            })
            .collect()
    }
}

#[async_trait]
impl RateFetcher for OandaProvider {
    #[instrument(
        name = "OandaRateFetch",
        skip(self),
        fields(pair = %pair, start = %start, end = %end)
    )]
    async fn fetch(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateSample>, FetchError> {
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();
        let params = [
            ("widget", "1"),
            ("source", "OANDA"),
            ("display", "absolute"),
            ("adjustment", "0"),
            ("data_range", "c"),
            ("period", "daily"),
            ("price", "bid"),
            ("view", "graph"),
            ("base_currency", pair.base()),
            ("quote_currency_0", pair.quote()),
            ("start_date", start_date.as_str()),
            ("end_date", end_date.as_str()),
        ];
        let unavailable = |e: reqwest::Error| FetchError::Unavailable {
            pair: pair.clone(),
            reason: e.to_string(),
        };

        let url = reqwest::Url::parse_with_params(
            &format!("{}{}", self.base_url, HISTORICAL_RATES_PATH),
            &params,
        )
        .map_err(|e| FetchError::Unavailable {
            pair: pair.clone(),
            reason: format!("invalid provider url {}: {e}", self.base_url),
        })?;
        debug!("Requesting historical rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("ratebatch/1.0")
            .build()
            .map_err(unavailable)?;
        let response = with_retry(
            || client.get(url.clone()).send(),
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(unavailable)?;

        let status = response.status();
        debug!(%status, "Received OANDA response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Unavailable {
                pair: pair.clone(),
                reason: format!("throttled by provider ({status})"),
            });
        }
        if status.is_client_error() {
            let reason = response.text().await.unwrap_or_default();
            return Err(FetchError::Rejected {
                pair: pair.clone(),
                status: status.as_u16(),
                reason,
            });
        }
        if !status.is_success() {
            return Err(FetchError::ServerError {
                pair: pair.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(unavailable)?;
        Self::parse_samples(pair, &body).inspect_err(|e| {
            error!(error = %e, response = %body, "Failed to parse OANDA response");
        })
    }
}
