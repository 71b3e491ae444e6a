use crate::api::{PriceQuery, PriceSource};
use crate::cache::PriceCache;
use crate::forecast::{Forecast, ForecastError, Forecaster};
use std::sync::Arc;
use thiserror::Error;
use tikr_table::{NormalizationError, NormalizedSeries, Normalizer, RawTable};
use tracing::{debug, info, warn};

/// Slider range of the forecast horizon, in years.
pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 4;

/// Everything a user action can go wrong with; all of it is meant to be shown, none retried.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no price data for {ticker}; try different dates or another stock")]
    EmptyInput { ticker: String },

    #[error("could not read the price table: {0}")]
    Normalize(#[from] NormalizationError),

    #[error("could not fetch price data: {0:#}")]
    Fetch(#[from] anyhow::Error),

    #[error("forecast failed: {0}")]
    Forecast(#[from] ForecastError),

    #[error("years of prediction must be between 1 and 4, got {0}")]
    InvalidHorizon(u32),
}

/// A user interaction.
#[derive(Debug, Clone)]
pub enum Action {
    /// Show the price history of a stock.
    Load(PriceQuery),
    /// Project `years` years past the end of the price history.
    Forecast { query: PriceQuery, years: u32 },
    /// Drop the cached table, then load it again.
    Refresh(PriceQuery),
}

/// What the front end should render in response to an [`Action`].
#[derive(Debug, Clone)]
pub enum View {
    Prices {
        query: PriceQuery,
        raw: Arc<RawTable>,
        series: NormalizedSeries,
    },
    Forecast {
        query: PriceQuery,
        series: NormalizedSeries,
        forecast: Forecast,
    },
}

/// Request/response handler behind the CLI; one [`handle`] call per user action.
///
/// [`handle`]: Dashboard::handle
pub struct Dashboard<S, F> {
    source: S,
    forecaster: F,
    normalizer: Normalizer,
    cache: PriceCache,
}

impl<S, F> Dashboard<S, F>
where
    S: PriceSource,
    F: Forecaster,
{
    pub fn new(source: S, forecaster: F) -> Self {
        Self {
            source,
            forecaster,
            normalizer: Normalizer::default(),
            cache: PriceCache::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub async fn handle(&mut self, action: Action) -> Result<View, DashboardError> {
        debug!("handling {action:?}");
        match action {
            Action::Load(query) => self.load(query).await,

            Action::Refresh(query) => {
                self.cache.invalidate(&query);
                self.load(query).await
            }

            Action::Forecast { query, years } => {
                if !(MIN_YEARS..=MAX_YEARS).contains(&years) {
                    return Err(DashboardError::InvalidHorizon(years));
                }
                let (_, series) = self.prices(&query).await?;
                let horizon = years * 365;

                info!(
                    "forecasting {} {horizon} days ahead with {}",
                    query.ticker,
                    self.forecaster.name()
                );
                let forecast = self.forecaster.forecast(&series, horizon)?;
                Ok(View::Forecast {
                    query,
                    series,
                    forecast,
                })
            }
        }
    }

    async fn load(&mut self, query: PriceQuery) -> Result<View, DashboardError> {
        let (raw, series) = self.prices(&query).await?;
        Ok(View::Prices { query, raw, series })
    }

    async fn prices(
        &mut self,
        query: &PriceQuery,
    ) -> Result<(Arc<RawTable>, NormalizedSeries), DashboardError> {
        let raw = self.cache.get_or_fetch(&self.source, query).await?;
        if raw.is_empty() {
            warn!("{query} returned no rows");
            return Err(DashboardError::EmptyInput {
                ticker: query.ticker.clone(),
            });
        }

        let series = self.normalizer.normalize(&raw)?;
        debug!("{query}: {} raw rows, {} normalized", raw.len(), series.len());
        Ok((raw, series))
    }
}
