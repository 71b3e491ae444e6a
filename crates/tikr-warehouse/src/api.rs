use anyhow::{ensure, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use tikr_table::RawTable;

/// What to fetch: one ticker over `[start, end)`.
///
/// Also serves as the key of the [`PriceCache`].
///
/// [`PriceCache`]: crate::cache::PriceCache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceQuery {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PriceQuery {
    pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        ensure!(!ticker.is_empty(), "ticker symbol is empty");
        ensure!(
            start < end,
            "start date {start} must come before end date {end}"
        );
        Ok(Self { ticker, start, end })
    }

    /// Unix seconds at midnight UTC of `start`.
    pub fn period1(&self) -> i64 {
        self.start.and_hms_opt(0, 0, 0).map_or(0, |t| t.and_utc().timestamp())
    }

    /// Unix seconds at midnight UTC of `end`.
    pub fn period2(&self) -> i64 {
        self.end.and_hms_opt(0, 0, 0).map_or(0, |t| t.and_utc().timestamp())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl fmt::Display for PriceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} .. {}", self.ticker, self.start, self.end)
    }
}

/// Market-data collaborator; how is a [`RawTable`] of prices **extracted**?
///
/// No retries happen here or anywhere above; a failed fetch surfaces to the caller.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch the price history described by `query`.
    async fn fetch(&self, query: &PriceQuery) -> Result<RawTable>;
}

/// Lets the source be picked at runtime (`Box<dyn PriceSource>`).
#[async_trait]
impl<T: PriceSource + ?Sized> PriceSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<RawTable> {
        (**self).fetch(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_ticker_is_uppercased() {
        let query = PriceQuery::new(" infy.ns ", date(2015, 1, 1), date(2016, 1, 1)).unwrap();
        assert_eq!(query.ticker, "INFY.NS");
    }

    #[test]
    fn test_start_must_precede_end() {
        assert!(PriceQuery::new("TCS.NS", date(2016, 1, 1), date(2016, 1, 1)).is_err());
        assert!(PriceQuery::new("TCS.NS", date(2016, 1, 2), date(2016, 1, 1)).is_err());
        assert!(PriceQuery::new("", date(2015, 1, 1), date(2016, 1, 1)).is_err());
    }

    #[test]
    fn test_periods_are_unix_seconds() {
        let query = PriceQuery::new("SBIN.NS", date(2024, 1, 2), date(2024, 1, 3)).unwrap();
        assert_eq!(query.period1(), 1_704_153_600);
        assert_eq!(query.period2(), 1_704_240_000);
    }

    #[test]
    fn test_end_is_exclusive() {
        let query = PriceQuery::new("LT.NS", date(2024, 1, 1), date(2024, 1, 3)).unwrap();
        assert!(query.contains(date(2024, 1, 1)));
        assert!(query.contains(date(2024, 1, 2)));
        assert!(!query.contains(date(2024, 1, 3)));
    }
}
