use serde::{Deserialize, Serialize};
use std::fmt;

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Raw, unvalidated price tables as they come back from a fetch
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

/// A column label; either a single string or one string per header level.
///
/// ```json
/// "Close"                  // Flat
/// ["Price", "Close"]       // Nested
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ColumnLabel {
    Flat(String),
    Nested(Vec<String>),
}

impl ColumnLabel {
    pub fn is_nested(&self) -> bool {
        matches!(self, ColumnLabel::Nested(_))
    }

    /// Joins the non-empty, trimmed parts of the label with an underscore.
    pub fn flatten(&self) -> String {
        match self {
            ColumnLabel::Flat(label) => label.trim().to_string(),
            ColumnLabel::Nested(parts) => parts
                .iter()
                .map(|part| part.trim())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

impl From<&str> for ColumnLabel {
    fn from(label: &str) -> Self {
        ColumnLabel::Flat(label.to_string())
    }
}

impl From<String> for ColumnLabel {
    fn from(label: String) -> Self {
        ColumnLabel::Flat(label)
    }
}

impl<S: Into<String>> From<Vec<S>> for ColumnLabel {
    fn from(parts: Vec<S>) -> Self {
        ColumnLabel::Nested(parts.into_iter().map(Into::into).collect())
    }
}

// -------------------------------------------------------------------------------------------------

/// A single value of a [`RawTable`].
///
/// Serialized externally tagged, so a timestamp never reads back as a number.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    /// Unix seconds.
    Timestamp(i64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form of the cell, used when a row is promoted to column labels.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(number) => write!(f, "{number}"),
            Cell::Timestamp(ts) => match chrono::DateTime::from_timestamp(*ts, 0) {
                Some(time) => write!(f, "{}", time.date_naive()),
                None => write!(f, "{ts}"),
            },
            Cell::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(number: f64) -> Self {
        Cell::Number(number)
    }
}

impl From<Option<f64>> for Cell {
    fn from(number: Option<f64>) -> Self {
        number.map_or(Cell::Empty, Cell::Number)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

// -------------------------------------------------------------------------------------------------

/// Unprocessed tabular price data; column names and shape are not guaranteed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub columns: Vec<ColumnLabel>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(columns: Vec<ColumnLabel>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// A table with flat labels and no rows.
    pub fn with_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|label| ColumnLabel::Flat(label.as_ref().to_string()))
                .collect(),
            rows: vec![],
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Any label spanning more than one header level?
    pub fn is_hierarchical(&self) -> bool {
        self.columns.iter().any(ColumnLabel::is_nested)
    }

    /// A row's cell; short rows read as [`Cell::Empty`].
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY)
    }

    /// The last `n` rows, for display.
    pub fn tail(&self, n: usize) -> &[Vec<Cell>] {
        let skip = self.rows.len().saturating_sub(n);
        &self.rows[skip..]
    }
}
