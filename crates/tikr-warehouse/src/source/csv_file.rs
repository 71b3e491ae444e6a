use crate::api::{PriceQuery, PriceSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tikr_table::{Cell, ColumnLabel, RawTable};
use tracing::{debug, error, trace};

/// Label (or part of a label) of the column the range filter reads.
const DATE_LABEL: &str = "Date";

/// Price tables saved as `{dir}/{TICKER}.csv`, e.g. by `DataFrame.to_csv`.
///
/// Exports of multi-ticker downloads carry more than one header line; set `header_rows`
/// accordingly and the labels come out [`ColumnLabel::Nested`].
pub struct CsvFile {
    dir: PathBuf,
    header_rows: usize,
}

impl CsvFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            header_rows: 1,
        }
    }

    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    pub fn path(&self, query: &PriceQuery) -> PathBuf {
        self.dir.join(format!("{}.csv", query.ticker))
    }
}

#[async_trait]
impl PriceSource for CsvFile {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<RawTable> {
        let path = self.path(query);
        trace!("reading file at path: {}", path.display());
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            error!("[{}] failed to read {}: {e}", query.ticker, path.display());
            e
        })?;

        let table = read_table(&bytes, self.header_rows, query)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!("[{}] {} rows read from {}", query.ticker, table.len(), path.display());
        Ok(table)
    }
}

/// Parse CSV bytes into a [`RawTable`], keeping only rows inside the query's range.
///
/// The range is checked against the first column whose header mentions `Date`, or the first
/// column if none does. Rows where that field is not a date at all are kept as they are; they are
/// usually leftover header lines and are dealt with during normalization.
pub fn read_table(bytes: &[u8], header_rows: usize, query: &PriceQuery) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut header_lines: Vec<Vec<String>> = Vec::with_capacity(header_rows);
    let mut date_col = 0;
    let mut rows = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if line < header_rows {
            header_lines.push(record.iter().map(str::to_string).collect());
            if line + 1 == header_rows {
                date_col = date_column(&header_lines);
            }
            continue;
        }

        let row: Vec<Cell> = record.iter().map(to_cell).collect();
        match row.get(date_col).and_then(leading_date) {
            Some(date) if !query.contains(date) => continue,
            _ => rows.push(row),
        }
    }

    Ok(RawTable::new(labels(&header_lines), rows))
}

fn labels(header_lines: &[Vec<String>]) -> Vec<ColumnLabel> {
    let width = header_lines.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|i| {
            let mut parts = header_lines
                .iter()
                .map(|line| line.get(i).cloned().unwrap_or_default());
            if header_lines.len() == 1 {
                ColumnLabel::Flat(parts.next().unwrap_or_default())
            } else {
                ColumnLabel::Nested(parts.collect())
            }
        })
        .collect()
}

fn date_column(header_lines: &[Vec<String>]) -> usize {
    let width = header_lines.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .find(|&i| {
            header_lines
                .iter()
                .any(|line| line.get(i).is_some_and(|part| part.contains(DATE_LABEL)))
        })
        .unwrap_or(0)
}

fn to_cell(field: &str) -> Cell {
    let field = field.trim();
    if field.is_empty() {
        Cell::Empty
    } else if let Ok(number) = field.parse::<f64>() {
        Cell::Number(number)
    } else {
        Cell::Text(field.to_string())
    }
}

fn leading_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        // "2024-01-02" or "2024-01-02 00:00:00+05:30"
        Cell::Text(text) => text
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()),
        _ => None,
    }
}
