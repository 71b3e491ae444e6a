use crate::source::yahoo::DEFAULT_BASE_URL;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::trace;

/// Stocks offered when the user does not name one.
pub const STOCKS: [&str; 10] = [
    "RELIANCE.NS",
    "TATAMOTORS.NS",
    "HDFCBANK.NS",
    "ICICIBANK.NS",
    "INFY.NS",
    "TCS.NS",
    "HINDUNILVR.NS",
    "LT.NS",
    "HDFC.NS",
    "SBIN.NS",
];

/// Default first day of the price history.
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default()
}

/// Settings read from the environment (and `.env`).
///
/// | variable         | default                              |
/// |------------------|--------------------------------------|
/// | `USER_AGENT`     | `tikr/<version>`                     |
/// | `YAHOO_BASE_URL` | `https://query1.finance.yahoo.com`   |
/// | `TIKR_CSV_DIR`   | unset; fetch from Yahoo Finance      |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub user_agent: String,
    pub yahoo_base_url: String,
    pub csv_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            user_agent: non_empty("USER_AGENT")
                .unwrap_or_else(|| format!("tikr/{}", env!("CARGO_PKG_VERSION"))),
            yahoo_base_url: non_empty("YAHOO_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            csv_dir: non_empty("TIKR_CSV_DIR").map(PathBuf::from),
        };
        trace!("configuration loaded: {config:?}");
        config
    }

    pub fn http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}
