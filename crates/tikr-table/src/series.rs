use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation of a [`NormalizedSeries`].
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub timestamp: NaiveDate,
    pub value: f64,
}

/// Cleaned `(timestamp, value)` pairs, ready for a forecasting routine.
///
/// Every value is finite; there are no gaps in either field. An empty series is valid.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct NormalizedSeries {
    points: Vec<Point>,
}

impl NormalizedSeries {
    /// Build a series from arbitrary points, dropping any non-finite value.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            points: points
                .into_iter()
                .filter(|point| point.value.is_finite())
                .collect(),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|point| point.timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|point| point.value)
    }

    pub fn tail(&self, n: usize) -> &[Point] {
        let skip = self.points.len().saturating_sub(n);
        &self.points[skip..]
    }
}

impl<'a> IntoIterator for &'a NormalizedSeries {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
