use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tikr_warehouse::config::{default_start, Config, STOCKS};
use tikr_warehouse::{CsvFile, PriceQuery, PriceSource, YahooFinance};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, default_value = "INFO", ignore_case = true)]
    pub trace: TraceLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the stocks on offer.
    Tickers,

    /// Show the most recent prices of a stock.
    Show {
        #[command(flatten)]
        range: RangeArgs,

        /// Number of trailing rows to print.
        #[arg(long, default_value_t = 5)]
        rows: usize,

        /// Column to use as the value series (substring of its label).
        #[arg(long, default_value = "Close")]
        column: String,
    },

    /// Fit a trend model and project future prices.
    Forecast {
        #[command(flatten)]
        range: RangeArgs,

        /// Years of prediction.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=4))]
        years: u32,

        /// Number of trailing forecast rows to print.
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Ticker symbol, e.g. INFY.NS; defaults to the first of `tikr tickers`.
    pub ticker: Option<String>,

    /// First day of the history (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Day after the last day of the history (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Read `<TICKER>.csv` files from this directory instead of Yahoo Finance.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Header lines at the top of each CSV file.
    #[arg(long, default_value_t = 1)]
    pub header_rows: usize,
}

impl RangeArgs {
    pub fn query(&self) -> Result<PriceQuery> {
        let ticker = self.ticker.as_deref().unwrap_or(STOCKS[0]);
        let start = self.start.unwrap_or_else(default_start);
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        PriceQuery::new(ticker, start, end)
    }

    /// `--csv` wins over `TIKR_CSV_DIR`, which wins over Yahoo Finance.
    pub fn source(&self, config: &Config) -> Result<Box<dyn PriceSource>> {
        let source: Box<dyn PriceSource> = match self.csv.as_ref().or(config.csv_dir.as_ref()) {
            Some(dir) => Box::new(CsvFile::new(dir).with_header_rows(self.header_rows)),
            None => Box::new(YahooFinance::new(
                config.http_client()?,
                &config.yahoo_base_url,
            )),
        };
        Ok(source)
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[value(rename_all = "verbatim")]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}
