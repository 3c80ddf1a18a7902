//! Yahoo Finance data provider.
//!
//! Daily closes come from the v8 chart API, expirations and chains from the
//! v7 options API. Requests share one blocking client, retry with
//! exponential backoff, and go through the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; parse failures surface as `DataError::ResponseFormatChanged`.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, MarketDataProvider};
use crate::domain::{OptionChain, OptionQuote, PriceBar};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://query2.finance.yahoo.com";

// ── Chart API (daily bars) ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

// ── Options API ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: OptionsResult,
}

#[derive(Debug, Deserialize)]
struct OptionsResult {
    result: Option<Vec<OptionsData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsData {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsExpiry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsExpiry {
    expiration_date: i64,
    #[serde(default)]
    calls: Vec<ContractData>,
    #[serde(default)]
    puts: Vec<ContractData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractData {
    strike: f64,
    last_price: Option<f64>,
}

fn api_error(symbol: &str, err: Option<ApiError>, what: &str) -> DataError {
    match err {
        Some(e) if e.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(e) => DataError::ResponseFormatChanged(format!("{}: {}", e.code, e.description)),
        None => DataError::ResponseFormatChanged(format!("empty {what} result with no error")),
    }
}

fn timestamp_date(ts: i64) -> Result<NaiveDate, DataError> {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.naive_utc().date())
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))
}

fn first_result<T>(
    symbol: &str,
    result: Option<Vec<T>>,
    err: Option<ApiError>,
    what: &str,
) -> Result<T, DataError> {
    result
        .ok_or_else(|| api_error(symbol, err, what))?
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("{what} result array is empty")))
}

/// Parse the chart API response into bars.
///
/// Sessions with a null close are kept with a NaN close so indicator windows
/// see the gap; timestamps with no close array entry at all are dropped.
fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, DataError> {
    let data = first_result(symbol, resp.chart.result, resp.chart.error, "chart")?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = timestamp_date(ts)?;
        match quote.close.get(i) {
            Some(close) => bars.push(PriceBar::new(date, close.unwrap_or(f64::NAN))),
            None => debug!(%date, "timestamp without close entry"),
        }
    }

    if bars.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    Ok(bars)
}

fn parse_expirations(symbol: &str, resp: OptionsResponse) -> Result<Vec<NaiveDate>, DataError> {
    let data = first_result(symbol, resp.option_chain.result, resp.option_chain.error, "options")?;
    let mut dates = data
        .expiration_dates
        .into_iter()
        .map(timestamp_date)
        .collect::<Result<Vec<_>, _>>()?;
    dates.sort();
    dates.dedup();
    Ok(dates)
}

fn parse_chain(
    symbol: &str,
    expiration: NaiveDate,
    resp: OptionsResponse,
) -> Result<OptionChain, DataError> {
    let data = first_result(symbol, resp.option_chain.result, resp.option_chain.error, "options")?;
    let expiry = data
        .options
        .into_iter()
        .next()
        .ok_or_else(|| DataError::NoOptionChain {
            symbol: symbol.to_string(),
            expiration,
        })?;

    let listed = timestamp_date(expiry.expiration_date)?;
    if listed != expiration {
        warn!(%expiration, %listed, "options API returned a different expiration");
    }

    let quotes = |contracts: Vec<ContractData>| -> Vec<OptionQuote> {
        contracts
            .into_iter()
            .filter_map(|c| {
                c.last_price.map(|last_price| OptionQuote {
                    strike: c.strike,
                    last_price,
                })
            })
            .collect()
    };

    Ok(OptionChain {
        expiration: listed,
        calls: quotes(expiry.calls),
        puts: quotes(expiry.puts),
    })
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp()
            - 1;
        format!(
            "{BASE_URL}/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn options_url(symbol: &str, expiration: Option<NaiveDate>) -> String {
        match expiration {
            Some(exp) => {
                let ts = exp.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
                format!("{BASE_URL}/v7/finance/options/{symbol}?date={ts}")
            }
            None => format!("{BASE_URL}/v7/finance/options/{symbol}"),
        }
    }

    /// GET `url` and decode JSON, with retry and circuit breaker logic.
    fn get_json<T: DeserializeOwned>(&self, symbol: &str, url: &str) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, ?delay, symbol, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                warn!(symbol, "Yahoo returned 403, tripping circuit breaker");
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let body: T = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;
            self.circuit_breaker.record_success();
            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let resp: ChartResponse = self.get_json(symbol, &url)?;
        let bars = parse_chart(symbol, resp)?;
        debug!(symbol, %start, %end, bars = bars.len(), "fetched daily bars");
        Ok(bars)
    }

    fn option_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, DataError> {
        let resp: OptionsResponse = self.get_json(symbol, &Self::options_url(symbol, None))?;
        parse_expirations(symbol, resp)
    }

    fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain, DataError> {
        let url = Self::options_url(symbol, Some(expiration));
        let resp: OptionsResponse = self.get_json(symbol, &url)?;
        parse_chain(symbol, expiration, resp)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
