use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tikr_table::NormalizedSeries;
use tracing::debug;

/// z-score of an 80% two-sided interval.
const Z_80: f64 = 1.2816;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("at least {required} observations are needed to fit a model, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("forecast horizon must be at least one day")]
    ZeroHorizon,
}

/// One projected day.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn tail(&self, n: usize) -> &[ForecastPoint] {
        let skip = self.points.len().saturating_sub(n);
        &self.points[skip..]
    }
}

/// Forecasting collaborator: fit on a [`NormalizedSeries`], project `horizon_days` calendar days
/// past its last observation.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &str;

    fn forecast(
        &self,
        series: &NormalizedSeries,
        horizon_days: u32,
    ) -> Result<Forecast, ForecastError>;
}

// -------------------------------------------------------------------------------------------------

/// Least-squares linear trend with an additive day-of-week term.
#[derive(Debug, Clone)]
pub struct LinearTrend {
    /// Fit the day-of-week term.
    pub weekly: bool,
    /// Width multiplier of the uncertainty interval (residual standard deviations).
    pub z: f64,
}

impl Default for LinearTrend {
    fn default() -> Self {
        Self {
            weekly: true,
            z: Z_80,
        }
    }
}

struct Fit {
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    weekday: [f64; 7],
    sigma: f64,
}

impl Fit {
    fn predict(&self, timestamp: NaiveDate) -> f64 {
        let x = (timestamp - self.origin).num_days() as f64;
        let season = self.weekday[timestamp.weekday().num_days_from_monday() as usize];
        self.intercept + self.slope * x + season
    }
}

impl LinearTrend {
    fn fit(&self, series: &NormalizedSeries) -> Result<Fit, ForecastError> {
        let n = series.len();
        let origin = match series.first() {
            Some(first) if n >= 2 => first.timestamp,
            _ => {
                return Err(ForecastError::InsufficientData {
                    required: 2,
                    actual: n,
                })
            }
        };

        let xs: Vec<f64> = series
            .timestamps()
            .map(|t| (t - origin).num_days() as f64)
            .collect();
        let ys: Vec<f64> = series.values().collect();

        let x_mean = xs.iter().sum::<f64>() / n as f64;
        let y_mean = ys.iter().sum::<f64>() / n as f64;
        let (sxy, sxx) = xs
            .iter()
            .zip(&ys)
            .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
                (sxy + (x - x_mean) * (y - y_mean), sxx + (x - x_mean).powi(2))
            });

        // all observations on one day: flat line through the mean
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = y_mean - slope * x_mean;

        let mut fit = Fit {
            origin,
            intercept,
            slope,
            weekday: [0.0; 7],
            sigma: 0.0,
        };

        if self.weekly {
            let mut sums = [0.0; 7];
            let mut counts = [0usize; 7];
            for point in series {
                let day = point.timestamp.weekday().num_days_from_monday() as usize;
                sums[day] += point.value - fit.predict(point.timestamp);
                counts[day] += 1;
            }
            for day in 0..7 {
                if counts[day] > 0 {
                    fit.weekday[day] = sums[day] / counts[day] as f64;
                }
            }
        }

        if n > 2 {
            let sse: f64 = series
                .into_iter()
                .map(|point| (point.value - fit.predict(point.timestamp)).powi(2))
                .sum();
            fit.sigma = (sse / (n - 2) as f64).sqrt();
        }

        debug!(
            "linear trend fit on {n} points: intercept {:.4}, slope {:.6}/day, sigma {:.4}",
            fit.intercept, fit.slope, fit.sigma
        );
        Ok(fit)
    }
}

impl Forecaster for LinearTrend {
    fn name(&self) -> &str {
        "linear-trend"
    }

    fn forecast(
        &self,
        series: &NormalizedSeries,
        horizon_days: u32,
    ) -> Result<Forecast, ForecastError> {
        if horizon_days == 0 {
            return Err(ForecastError::ZeroHorizon);
        }
        let fit = self.fit(series)?;
        let last = series
            .last()
            .map(|point| point.timestamp)
            .unwrap_or(fit.origin);

        let band = self.z * fit.sigma;
        let points = (1..=i64::from(horizon_days))
            .map(|day| {
                let timestamp = last + Duration::days(day);
                let yhat = fit.predict(timestamp);
                ForecastPoint {
                    timestamp,
                    yhat,
                    yhat_lower: yhat - band,
                    yhat_upper: yhat + band,
                }
            })
            .collect();

        Ok(Forecast { points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tikr_table::Point;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn series(values: impl IntoIterator<Item = (i64, f64)>) -> NormalizedSeries {
        NormalizedSeries::from_points(values.into_iter().map(|(offset, value)| Point {
            timestamp: day(offset),
            value,
        }))
    }

    #[test]
    fn test_exact_line_is_reproduced() {
        let line = series((0..30).map(|x| (x, 100.0 + 2.0 * x as f64)));
        let forecast = LinearTrend::default().forecast(&line, 5).unwrap();

        assert_eq!(forecast.len(), 5);
        for (i, point) in forecast.points.iter().enumerate() {
            let x = 30.0 + i as f64;
            assert_eq!(point.timestamp, day(30 + i as i64));
            assert!((point.yhat - (100.0 + 2.0 * x)).abs() < 1e-6);
            assert!((point.yhat_upper - point.yhat_lower).abs() < 1e-6);
        }
    }

    #[test]
    fn test_interval_widens_with_noise() {
        let noisy = series((0..60).map(|x| (x, 50.0 + if x % 2 == 0 { 3.0 } else { -3.0 })));
        let forecast = LinearTrend {
            weekly: false,
            ..Default::default()
        }
        .forecast(&noisy, 10)
        .unwrap();

        for point in &forecast.points {
            assert!(point.yhat_lower < point.yhat && point.yhat < point.yhat_upper);
            assert!((point.yhat - 50.0).abs() < 1.0);
        }
    }

    #[test]
    fn test_weekly_term_picks_up_weekday_offsets() {
        // Mondays sit 10 above the flat level
        let values = series((0..70).map(|x| {
            let bump = if day(x).weekday() == chrono::Weekday::Mon { 10.0 } else { 0.0 };
            (x, 20.0 + bump)
        }));
        let forecast = LinearTrend::default().forecast(&values, 7).unwrap();
        let monday = forecast
            .points
            .iter()
            .find(|p| p.timestamp.weekday() == chrono::Weekday::Mon)
            .unwrap();
        let tuesday = forecast
            .points
            .iter()
            .find(|p| p.timestamp.weekday() == chrono::Weekday::Tue)
            .unwrap();
        assert!(monday.yhat - tuesday.yhat > 9.0);
    }

    #[test]
    fn test_insufficient_data() {
        let single = series([(0, 1.0)]);
        assert_eq!(
            LinearTrend::default().forecast(&single, 5),
            Err(ForecastError::InsufficientData {
                required: 2,
                actual: 1,
            })
        );
        assert_eq!(
            LinearTrend::default().forecast(&NormalizedSeries::default(), 5),
            Err(ForecastError::InsufficientData {
                required: 2,
                actual: 0,
            })
        );
    }

    #[test]
    fn test_zero_horizon() {
        let line = series([(0, 1.0), (1, 2.0)]);
        assert_eq!(
            LinearTrend::default().forecast(&line, 0),
            Err(ForecastError::ZeroHorizon)
        );
    }
}
