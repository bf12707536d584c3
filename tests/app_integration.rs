use ratebatch::core::config::AppConfig;
use ratebatch::core::parse_keys;
use std::fs;
use tracing::{error, info};

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate, Times};

    pub const RATES_PATH: &str = "/fx-for-business/historical-rates/api/data/update/";

    pub async fn mount_pair(
        mock_server: &MockServer,
        base: &str,
        quote: &str,
        status: u16,
        mock_response: &str,
        expected_calls: impl Into<Times>,
    ) {
        Mock::given(method("GET"))
            .and(path(RATES_PATH))
            .and(query_param("base_currency", base))
            .and(query_param("quote_currency_0", quote))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .expect(expected_calls)
            .mount(mock_server)
            .await;
    }

    pub fn config_for(mock_server: &MockServer) -> String {
        format!(
            r#"
        providers:
          oanda:
            base_url: {}
            retries: 0
        timeout_secs: 10
    "#,
            mock_server.uri()
        )
    }
}

const USD_KRW_RESPONSE: &str = r#"{
    "widget": [{
        "data": [
            [1670112000000, "1294.872107"],
            [1670198400000, "1299.220955"]
        ]
    }]
}"#;

const EUR_JPY_RESPONSE: &str = r#"{"widget": [{"data": [[1670112000000, "140.553"]]}]}"#;

#[test_log::test(tokio::test)]
async fn test_resolve_batch_with_mock() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_pair(&mock_server, "USD", "KRW", 200, USD_KRW_RESPONSE, 1).await;
    test_utils::mount_pair(&mock_server, "EUR", "JPY", 200, EUR_JPY_RESPONSE, 1).await;

    let config: AppConfig = serde_yaml::from_str(&test_utils::config_for(&mock_server)).unwrap();
    let keys = parse_keys("USDKRW20221204,usdkrw20221205,EURJPY20221204,USDKRW20221204").unwrap();

    let rates = ratebatch::cli::rates::resolve_rates(&keys, &config)
        .await
        .expect("Failed to resolve rates");

    assert_eq!(
        rates,
        vec!["1294.872107", "1299.220955", "140.553", "1294.872107"]
    );
}

#[test_log::test(tokio::test)]
async fn test_weekend_key_resolves_to_empty_rate() {
    let mock_server = wiremock::MockServer::start().await;
    // 2022-12-03 is a Saturday; only Friday and Monday have bids
    let response = r#"{"widget": [{"data": [
        [1669939200000, "1299.000000"],
        [1670198400000, "1302.100000"]
    ]}]}"#;
    test_utils::mount_pair(&mock_server, "USD", "KRW", 200, response, 1).await;

    let config: AppConfig = serde_yaml::from_str(&test_utils::config_for(&mock_server)).unwrap();
    let keys = parse_keys("USDKRW20221203,USDKRW20221205,USDKRW20221203").unwrap();

    let rates = ratebatch::cli::rates::resolve_rates(&keys, &config)
        .await
        .unwrap();
    assert_eq!(rates, vec!["", "1302.100000", ""]);
}

#[test_log::test(tokio::test)]
async fn test_rejected_pair_fails_whole_batch() {
    let mock_server = wiremock::MockServer::start().await;
    // The failure may cancel the other pair's request before it is sent
    test_utils::mount_pair(&mock_server, "USD", "KRW", 200, USD_KRW_RESPONSE, 0..=1).await;
    test_utils::mount_pair(&mock_server, "XXX", "JPY", 400, "invalid base currency", 1).await;

    let config: AppConfig = serde_yaml::from_str(&test_utils::config_for(&mock_server)).unwrap();
    let keys = parse_keys("USDKRW20221204,XXXJPY20221204").unwrap();

    let err = ratebatch::cli::rates::resolve_rates(&keys, &config)
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    info!(%message, "Batch failed as expected");
    assert!(message.starts_with("Failed to resolve exchange rates"));
    assert!(message.contains("Upstream rejected request for XXX/JPY with status 400"));
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_pair(&mock_server, "USD", "KRW", 200, USD_KRW_RESPONSE, 2).await;

    // Setup config file
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    fs::write(config_path, test_utils::config_for(&mock_server))
        .expect("Failed to write config file");

    for json in [false, true] {
        let result = ratebatch::run_command(
            ratebatch::AppCommand::Rates {
                keys: "USDKRW20221204".to_string(),
                json,
            },
            Some(config_path.to_str().unwrap()),
        )
        .await;
        assert!(
            result.is_ok(),
            "Main function failed with: {:?}",
            result.err()
        );
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_rejects_invalid_keys() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(config_file.path(), "timeout_secs: 1").expect("Failed to write config file");

    let result = ratebatch::run_command(
        ratebatch::AppCommand::Rates {
            keys: "USDKRW20221204,USDKRW".to_string(),
            json: true,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert_eq!(
        result.unwrap_err().to_string(),
        "Invalid input: USDKRW (expected 14 characters like USDKRW20221202)"
    );
}

#[test_log::test(tokio::test)]
#[ignore = "calls the live OANDA endpoint"]
async fn test_real_oanda_api() {
    use ratebatch::core::{CurrencyPair, RateFetcher};
    use ratebatch::providers::oanda::OandaProvider;

    let provider = OandaProvider::new("https://www.oanda.com");
    let pair = CurrencyPair::new("USD", "KRW").unwrap();
    let start = chrono::NaiveDate::from_ymd_opt(2022, 12, 1).unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2022, 12, 5).unwrap();
    info!(%pair, %start, %end, "Fetching rates from OANDA");

    match provider.fetch(&pair, start, end).await {
        Ok(samples) => {
            info!(?samples, "Received successful OANDA response");
            assert!(!samples.is_empty(), "Expected at least one sample");
            assert!(samples.iter().all(|s| start <= s.date && s.date <= end));
        }
        Err(e) => {
            error!("OANDA API request failed: {e}\n{e:?}");
            panic!("OANDA API request failed: {e}");
        }
    }
}
