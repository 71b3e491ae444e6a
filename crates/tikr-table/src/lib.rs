pub mod error;
pub mod normalize;
pub mod raw;
pub mod series;

pub use crate::error::NormalizationError;
pub use crate::normalize::{normalize, Normalizer};
pub use crate::raw::{Cell, ColumnLabel, RawTable};
pub use crate::series::{NormalizedSeries, Point};
