use crate::api::{PriceQuery, PriceSource};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tikr_table::{Cell, RawTable};
use tracing::{debug, error, trace, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Daily prices from Yahoo Finance, per ticker
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const INTERVAL: &str = "1d";

/// Column layout of every table this source produces.
pub const COLUMNS: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];

pub struct YahooFinance {
    http_client: HttpClient,
    base_url: String,
}

impl YahooFinance {
    pub fn new(http_client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, query: &PriceQuery) -> String {
        let tckr = &query.ticker;
        format!(
            "{}/v8/finance/chart/{tckr}?symbol={tckr}&period1={}&period2={}&interval={INTERVAL}&events=div|split|capitalGains",
            self.base_url,
            query.period1(),
            query.period2(),
        )
    }
}

#[async_trait]
impl PriceSource for YahooFinance {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<RawTable> {
        let time = std::time::Instant::now();
        let url = self.url(query);
        let ticker = &query.ticker;

        trace!("Fetching price data for [{ticker}] from Yahoo Finance");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                error!("[{ticker}] price fetching error: {e}\nURL: {url}");
                e
            })?
            .bytes()
            .await
            .map_err(|e| {
                error!("[{ticker}] byte transformation error: {e}\nURL: {url}");
                e
            })?;

        // error check the deserialization
        trace!("Deserializing price data for [{ticker}] from Yahoo Finance");
        let de = match serde_json::from_slice::<PriceHistory>(&response) {
            Ok(data) => data,
            Err(e) => {
                error!("[{ticker}] deserialization error: {e}\nURL: {url}");
                return Err(e.into());
            }
        };

        let table = to_table(de, ticker);
        debug!(
            "[{ticker}] {} price rows fetched. Elapsed time: {} ms",
            table.len(),
            time.elapsed().as_millis()
        );
        Ok(table)
    }
}

/// Reshape Yahoo's column-oriented chart response into a row-oriented [`RawTable`].
///
/// A response without a `chart.result` becomes an empty table with the usual columns.
pub fn to_table(history: PriceHistory, ticker: &str) -> RawTable {
    let mut table = RawTable::with_columns(&COLUMNS);

    let Some(base) = history.chart.result.and_then(|data| data.into_iter().next()) else {
        match history.chart.error {
            Some(e) => warn!("[{ticker}] contained no \"chart.result\" object: {}", e.description),
            None => warn!("[{ticker}] contained no \"chart.result\" object"),
        }
        return table;
    };

    let quote = base.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = base
        .indicators
        .adjclose
        .into_iter()
        .next()
        .unwrap_or_default()
        .adjclose;

    // sessions are stamped in UTC; shift them to the exchange's wall clock so that an early
    // open east of Greenwich still lands on its own trading day
    let offset = base.meta.gmtoffset;

    // Yahoo pads missing sessions with `null`; read past the end of a column as a gap too
    let at = |column: &Vec<Option<f64>>, i: usize| Cell::from(column.get(i).copied().flatten());

    for (i, timestamp) in base.timestamp.iter().enumerate() {
        table.push_row(vec![
            Cell::Timestamp(timestamp + offset),
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
            at(&adjclose, i),
            quote
                .volume
                .get(i)
                .copied()
                .flatten()
                .map_or(Cell::Empty, |volume| Cell::Number(volume as f64)),
        ]);
    }
    trace!("[{ticker}] transformed {} price rows", table.len());

    table
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub struct PriceHistory {
    pub chart: PriceResponse,
}

#[derive(Deserialize, Debug)]
pub struct PriceResponse {
    pub result: Option<Vec<PriceCategories>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct PriceCategories {
    #[serde(default)]
    pub meta: ChartMeta,
    // absent when the range holds no trading sessions
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChartMeta {
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<i64>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}
