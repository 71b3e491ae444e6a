use thiserror::Error;

/// Reasons a [`RawTable`] cannot be turned into a [`NormalizedSeries`].
///
/// Malformed cells are never an error; those rows are dropped instead.
///
/// [`RawTable`]: crate::RawTable
/// [`NormalizedSeries`]: crate::NormalizedSeries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    /// No column label contains the required substring, e.g. "Close".
    #[error("no column label contains \"{0}\"")]
    MissingColumn(String),
}
