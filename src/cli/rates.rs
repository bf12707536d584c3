use crate::cli::ui;
use crate::core::config::AppConfig;
use crate::core::{Key, parse_keys};
use crate::engine::Coalescer;
use crate::providers::oanda::OandaProvider;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::sync::Arc;
use tracing::debug;

/// Resolves a comma-delimited list of raw keys and prints the rates in request order.
pub async fn run(raw_keys: &str, json: bool, config: &AppConfig) -> Result<()> {
    let keys = parse_keys(raw_keys)?;
    debug!(keys = keys.len(), "Parsed keys");

    let rates = resolve_rates(&keys, config).await?;

    if json {
        println!("{}", serde_json::to_string(&rates)?);
    } else {
        println!("{}", render_table(&keys, &rates));
    }
    Ok(())
}

pub async fn resolve_rates(keys: &[Key], config: &AppConfig) -> Result<Vec<String>> {
    let provider = OandaProvider::from_config(&config.providers.oanda);
    let mut coalescer = Coalescer::new(Arc::new(provider));
    if let Some(timeout) = config.timeout() {
        coalescer = coalescer.with_timeout(timeout);
    }

    let pb = ui::new_spinner("Fetching exchange rates...");
    let rates = coalescer.resolve(keys).await;
    pb.finish_and_clear();

    rates.context("Failed to resolve exchange rates")
}

pub fn render_table(keys: &[Key], rates: &[String]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Base"),
        ui::header_cell("Quote"),
        ui::header_cell("Date"),
        ui::header_cell("Rate"),
    ]);

    for (key, rate) in keys.iter().zip(rates) {
        table.add_row(vec![
            Cell::new(key.base()),
            Cell::new(key.quote()),
            Cell::new(key.date().format("%Y-%m-%d")),
            ui::rate_cell(rate),
        ]);
    }

    format!(
        "{}\n\n{}\n{}",
        ui::style_text("Historical Rates", ui::StyleType::Title),
        table,
        ui::style_text("Daily bid rates from OANDA", ui::StyleType::Subtle)
    )
}
