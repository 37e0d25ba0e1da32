use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MarketConfig;
use crate::models::{MarketDataError, MarketSnapshot, PriceBar};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl ChartResult {
    /// Zips the column arrays into bars, skipping rows with a missing price.
    fn bars(&self) -> Vec<PriceBar> {
        let Some(quote) = self.indicators.quote.first() else {
            return Vec::new();
        };
        let at = |column: &Vec<Option<f64>>, i: usize| column.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                Some(PriceBar {
                    timestamp: Utc.timestamp_opt(*ts, 0).single()?,
                    open: at(&quote.open, i)?,
                    high: at(&quote.high, i)?,
                    low: at(&quote.low, i)?,
                    close: at(&quote.close, i)?,
                    volume: quote.volume.get(i).copied().flatten().unwrap_or_default(),
                })
            })
            .collect()
    }
}

pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    range: String,
    interval: String,
}

impl YahooFinanceClient {
    pub fn new(config: &MarketConfig) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketDataError::Api { symbol: String::new(), reason: e.to_string() })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            range: config.range.clone(),
            interval: config.interval.clone(),
        })
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        let api_error = |reason: String| MarketDataError::Api { symbol: symbol.to_string(), reason };
        let url = format!("{}/{}", self.base_url, symbol);

        info!("📈 Loading market data for {}...", symbol);
        let response = self.client
            .get(&url)
            .query(&[("range", self.range.as_str()), ("interval", self.interval.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| api_error(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| api_error(e.to_string()))?;

        let body: ChartResponse = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                api_error(format!("invalid chart response: {e}"))
            } else {
                api_error(format!("HTTP {status}"))
            }
        })?;

        if let Some(error) = body.chart.error {
            return Err(api_error(format!(
                "{}: {}",
                error.code.unwrap_or_else(|| status.to_string()),
                error.description.unwrap_or_default()
            )));
        }
        if !status.is_success() {
            return Err(api_error(format!("HTTP {status}")));
        }

        let result = body.chart.result
            .and_then(|mut results| if results.is_empty() { None } else { Some(results.swap_remove(0)) })
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))?;

        let bars = result.bars();
        debug!(symbol, bars = bars.len(), "parsed price history");

        MarketSnapshot::from_history(symbol, bars, result.meta.market_cap)
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))
    }
}
