use crate::error::NormalizationError;
use crate::raw::{Cell, ColumnLabel, RawTable};
use crate::series::{NormalizedSeries, Point};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, trace};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// RawTable -> NormalizedSeries
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Normalize with the default `"Date"` / `"Close"` column roles.
///
/// ```rust
/// use tikr_table::{normalize, Cell, RawTable};
///
/// let mut table = RawTable::with_columns(&["Date", "Open", "Close"]);
/// table.push_row(vec!["2024-01-02".into(), Cell::Number(101.0), Cell::Number(102.5)]);
/// table.push_row(vec!["not-a-date".into(), Cell::Number(99.0), Cell::Number(100.0)]);
///
/// let series = normalize(&table).unwrap();
/// assert_eq!(series.len(), 1);
/// ```
pub fn normalize(raw: &RawTable) -> Result<NormalizedSeries, NormalizationError> {
    Normalizer::default().normalize(raw)
}

/// Picks a timestamp column and a value column out of a [`RawTable`] by substring match on the
/// column labels, and parses them into a [`NormalizedSeries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    /// Substring the timestamp column's label must contain.
    pub date_pattern: String,
    /// Substring the value column's label must contain.
    pub value_pattern: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            date_pattern: "Date".to_string(),
            value_pattern: "Close".to_string(),
        }
    }
}

impl Normalizer {
    pub fn new(date_pattern: impl Into<String>, value_pattern: impl Into<String>) -> Self {
        Self {
            date_pattern: date_pattern.into(),
            value_pattern: value_pattern.into(),
        }
    }

    /// Same date column, different value column (e.g. `"Open"`).
    pub fn with_value_pattern(mut self, value_pattern: impl Into<String>) -> Self {
        self.value_pattern = value_pattern.into();
        self
    }

    pub fn normalize(&self, raw: &RawTable) -> Result<NormalizedSeries, NormalizationError> {
        let mut labels = flat_labels(&raw.columns, raw.is_hierarchical());
        let mut body: &[Vec<Cell>] = &raw.rows;

        // promote the first row if the labels look like a half-read multi-line header
        // and the row itself holds labels rather than data
        let first_is_header = body.first().is_some_and(|row| is_header_row(row));
        if has_header_remnant(&labels) && first_is_header {
            trace!("promoting first row to column labels, replacing {labels:?}");
            labels = (0..labels.len())
                .map(|i| raw.cell(0, i).to_text())
                .collect();
            body = &body[1..];
        }

        let date_col = find_column(&labels, &self.date_pattern)?;
        let value_col = find_column(&labels, &self.value_pattern)?;
        trace!(
            "timestamp <- \"{}\", value <- \"{}\"",
            labels[date_col],
            labels[value_col]
        );

        let points = body
            .iter()
            .filter_map(|row| {
                let timestamp = parse_date(row.get(date_col)?)?;
                let value = parse_value(row.get(value_col)?)?;
                Some(Point { timestamp, value })
            })
            .collect::<Vec<_>>();

        let dropped = body.len() - points.len();
        if dropped > 0 {
            debug!("dropped {dropped} of {} rows with a missing timestamp or value", body.len());
        }

        Ok(NormalizedSeries::from_points(points))
    }
}

// -------------------------------------------------------------------------------------------------

fn flat_labels(columns: &[ColumnLabel], hierarchical: bool) -> Vec<String> {
    if hierarchical {
        columns.iter().map(ColumnLabel::flatten).collect()
    } else {
        columns
            .iter()
            .map(|label| match label {
                ColumnLabel::Flat(text) => text.trim().to_string(),
                nested => nested.flatten(),
            })
            .collect()
    }
}

/// pandas leaves these behind when a header spans more than one line
fn is_placeholder(label: &str) -> bool {
    label.is_empty() || label.starts_with("Unnamed") || label == "index" || label == "level_0"
}

fn has_header_remnant(labels: &[String]) -> bool {
    match labels.first() {
        Some(first) => is_placeholder(first) || labels.iter().any(|label| label.is_empty()),
        None => false,
    }
}

/// A header line carries no dates and no numbers.
fn is_header_row(row: &[Cell]) -> bool {
    row.iter()
        .all(|cell| parse_date(cell).is_none() && parse_value(cell).is_none())
}

fn find_column(labels: &[String], pattern: &str) -> Result<usize, NormalizationError> {
    labels
        .iter()
        .position(|label| label.contains(pattern))
        .ok_or_else(|| NormalizationError::MissingColumn(pattern.to_string()))
}

fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Timestamp(ts) => DateTime::from_timestamp(*ts, 0).map(|time| time.date_naive()),
        Cell::Text(text) => parse_date_text(text.trim()),
        Cell::Empty | Cell::Number(_) => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|time| time.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|time| time.date_naive()))
        .or_else(|| {
            DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%:z")
                .ok()
                .map(|time| time.date_naive())
        })
}

fn parse_value(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(number) => *number,
        Cell::Text(text) => text.trim().replace(',', "").parse::<f64>().ok()?,
        Cell::Empty | Cell::Timestamp(_) => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn text_table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut table = RawTable::with_columns(columns);
        for row in rows {
            table.push_row(row.iter().map(|cell| Cell::from(*cell)).collect());
        }
        table
    }

    #[test]
    fn test_date_and_close_columns() {
        let table = text_table(
            &["Date", "Open", "Close"],
            &[
                &["2024-01-02", "10", "11"],
                &["2024-01-03", "11", "12.5"],
            ],
        );
        let series = normalize(&table).unwrap();
        assert_eq!(
            series.points(),
            &[
                Point {
                    timestamp: date(2024, 1, 2),
                    value: 11.0,
                },
                Point {
                    timestamp: date(2024, 1, 3),
                    value: 12.5,
                },
            ]
        );
    }

    #[test]
    fn test_flatten_two_level_labels() {
        let columns = vec![
            ColumnLabel::from(vec!["Price", "Close"]),
            ColumnLabel::from(vec!["Price", "Date"]),
        ];
        assert_eq!(flat_labels(&columns, true), vec!["Price_Close", "Price_Date"]);

        let mut table = RawTable::new(columns, vec![]);
        table.push_row(vec![Cell::Number(42.0), Cell::from("2024-02-01")]);
        let series = normalize(&table).unwrap();
        assert_eq!(
            series.points(),
            &[Point {
                timestamp: date(2024, 2, 1),
                value: 42.0,
            }]
        );
    }

    #[test]
    fn test_missing_close_column() {
        let table = text_table(&["Date", "Open"], &[&["2024-01-02", "10"]]);
        assert_eq!(
            normalize(&table),
            Err(NormalizationError::MissingColumn("Close".to_string()))
        );
    }

    #[test]
    fn test_missing_date_column_is_reported_first() {
        let table = text_table(&["Open", "High"], &[]);
        assert_eq!(
            normalize(&table),
            Err(NormalizationError::MissingColumn("Date".to_string()))
        );
    }

    #[test]
    fn test_zero_rows_is_an_empty_series() {
        let table = text_table(&["Date", "Close"], &[]);
        let series = normalize(&table).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_unparseable_date_is_dropped() {
        let table = text_table(
            &["Date", "Close"],
            &[&["not-a-date", "100"], &["2024-01-02", "101"]],
        );
        let series = normalize(&table).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].value, 101.0);
    }

    #[test]
    fn test_unparseable_and_non_finite_values_are_dropped() {
        let table = text_table(
            &["Date", "Close"],
            &[
                &["2024-01-02", "n/a"],
                &["2024-01-03", ""],
                &["2024-01-04", "NaN"],
                &["2024-01-05", "inf"],
                &["2024-01-06", "1,234.5"],
            ],
        );
        let series = normalize(&table).unwrap();
        assert_eq!(
            series.points(),
            &[Point {
                timestamp: date(2024, 1, 6),
                value: 1234.5,
            }]
        );
    }

    #[test]
    fn test_labels_are_trimmed() {
        let table = text_table(&[" Date ", "  Close"], &[&["2024-01-02", "5"]]);
        assert_eq!(normalize(&table).unwrap().len(), 1);
    }

    #[test]
    fn test_header_remnant_is_promoted() {
        // first header line read as labels, second still in the body
        let table = text_table(
            &["Unnamed: 0", "Price", "Price"],
            &[
                &["Date", "Close", "Open"],
                &["2024-01-02", "11", "10"],
                &["2024-01-03", "12", "11"],
            ],
        );
        let series = normalize(&table).unwrap();
        assert_eq!(series.values().collect::<Vec<_>>(), vec![11.0, 12.0]);
    }

    #[test]
    fn test_empty_label_anywhere_triggers_promotion() {
        let table = text_table(
            &["Price", ""],
            &[&["Date", "Close"], &["2024-01-02", "7"]],
        );
        let series = normalize(&table).unwrap();
        assert_eq!(
            series.points(),
            &[Point {
                timestamp: date(2024, 1, 2),
                value: 7.0,
            }]
        );
    }

    #[test]
    fn test_unnamed_index_column_keeps_labels() {
        // `,Date,Close` with a numeric index in front of every row
        let mut table = RawTable::with_columns(&["", "Date", "Close"]);
        table.push_row(vec![Cell::Number(0.0), "2024-01-02".into(), Cell::Number(100.0)]);
        table.push_row(vec![Cell::Number(1.0), "2024-01-03".into(), Cell::Number(101.0)]);

        let series = normalize(&table).unwrap();
        assert_eq!(
            series.timestamps().collect::<Vec<_>>(),
            vec![date(2024, 1, 2), date(2024, 1, 3)]
        );
        assert_eq!(series.values().collect::<Vec<_>>(), vec![100.0, 101.0]);

        // same shape read from text
        let table = text_table(
            &["Unnamed: 0", "Date", "Close"],
            &[&["0", "2024-01-02", "100"], &["1", "2024-01-03", "101"]],
        );
        assert_eq!(normalize(&table).unwrap().len(), 2);
    }

    #[test]
    fn test_header_row_detection() {
        assert!(is_header_row(&[Cell::from("Date"), Cell::from("Close"), Cell::Empty]));
        assert!(!is_header_row(&[Cell::from("Ticker"), Cell::from("1.5")]));
        assert!(!is_header_row(&[Cell::from("Date"), Cell::from("2024-01-02")]));
        assert!(!is_header_row(&[Cell::Timestamp(1_704_153_600)]));
    }

    #[test]
    fn test_header_remnant_without_rows_is_not_promoted() {
        let table = text_table(&["", "Date", "Close"], &[]);
        assert!(normalize(&table).unwrap().is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        // "Close" is found before "Adj Close"
        let table = text_table(
            &["Date", "Close", "Adj Close"],
            &[&["2024-01-02", "10", "9.5"]],
        );
        assert_eq!(normalize(&table).unwrap().points()[0].value, 10.0);

        // ... and "Adj Close" before "Close"
        let table = text_table(
            &["Date", "Adj Close", "Close"],
            &[&["2024-01-02", "9.5", "10"]],
        );
        assert_eq!(normalize(&table).unwrap().points()[0].value, 9.5);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let table = text_table(&["date", "close"], &[&["2024-01-02", "1"]]);
        assert_eq!(
            normalize(&table),
            Err(NormalizationError::MissingColumn("Date".to_string()))
        );
    }

    #[test]
    fn test_timestamp_and_datetime_cells() {
        let mut table = RawTable::with_columns(&["Date", "Close"]);
        table.push_row(vec![Cell::Timestamp(1_704_187_800), Cell::Number(1.0)]);
        table.push_row(vec!["2024-01-03 00:00:00".into(), Cell::Number(2.0)]);
        table.push_row(vec!["2024-01-04T09:15:00+05:30".into(), Cell::Number(3.0)]);
        table.push_row(vec!["2024-01-05 00:00:00+05:30".into(), Cell::Number(4.0)]);
        table.push_row(vec![Cell::Number(20240106.0), Cell::Number(5.0)]);
        table.push_row(vec!["2024-01-07".into()]);

        let series = normalize(&table).unwrap();
        assert_eq!(
            series.timestamps().collect::<Vec<_>>(),
            vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5)]
        );
    }

    #[test]
    fn test_custom_value_pattern() {
        let table = text_table(
            &["Date", "Open", "Close"],
            &[&["2024-01-02", "10", "11"]],
        );
        let normalizer = Normalizer::default().with_value_pattern("Open");
        assert_eq!(normalizer.normalize(&table).unwrap().points()[0].value, 10.0);
    }

    proptest! {
        #[test]
        fn prop_row_count_is_preserved_minus_malformed(
            rows in prop::collection::vec((0i64..20_000, -1e9f64..1e9, any::<bool>()), 0..200)
        ) {
            let base = date(2000, 1, 1);
            let mut table = RawTable::with_columns(&["Date", "Open", "Close"]);
            let mut expected = 0;
            for (offset, value, malformed) in &rows {
                let day = base + chrono::Duration::days(*offset);
                let date_cell = if *malformed {
                    Cell::from("not-a-date")
                } else {
                    expected += 1;
                    Cell::Text(day.format("%Y-%m-%d").to_string())
                };
                table.push_row(vec![date_cell, Cell::Number(0.0), Cell::Number(*value)]);
            }

            let series = normalize(&table).unwrap();
            prop_assert_eq!(series.len(), expected);
            prop_assert!(series.values().all(f64::is_finite));
        }
    }
}
