pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod forecast;
pub mod source;

pub use crate::api::{PriceQuery, PriceSource};
pub use crate::cache::PriceCache;
pub use crate::config::Config;
pub use crate::dashboard::{Action, Dashboard, DashboardError, View};
pub use crate::forecast::{Forecast, ForecastError, ForecastPoint, Forecaster, LinearTrend};
pub use crate::source::{CsvFile, YahooFinance};
