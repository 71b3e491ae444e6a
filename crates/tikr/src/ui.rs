use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tabled::{builder::Builder, Table, Tabled};
use tikr_table::{Cell, ColumnLabel, NormalizedSeries, RawTable};
use tikr_warehouse::{Forecast, PriceQuery};

#[derive(Tabled)]
struct SeriesRow {
    timestamp: String,
    value: String,
}

#[derive(Tabled)]
struct ForecastRow {
    ds: String,
    yhat: String,
    yhat_lower: String,
    yhat_upper: String,
}

pub fn loading_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("#|-/ "),
    );
    pb.set_message("Loading data...");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn tickers(stocks: &[&str]) {
    println!("{}", "Select a stock for prediction:".bold());
    for (i, stock) in stocks.iter().enumerate() {
        println!("{:>3}  {stock}", i + 1);
    }
}

pub fn prices(query: &PriceQuery, raw: &RawTable, series: &NormalizedSeries, rows: usize) {
    println!("\n{}", format!("Recent stock data: {query}").bold().underline());
    println!("{}", raw_table(raw, rows));

    println!(
        "\n{} ({} of {} rows kept)",
        "Normalized series".bold().underline(),
        series.len(),
        raw.len()
    );
    println!("{}", series_table(series, rows));
}

pub fn forecast(query: &PriceQuery, series: &NormalizedSeries, forecast: &Forecast, rows: usize) {
    let (first, last) = match (forecast.points.first(), forecast.points.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => {
            println!("{}", "Empty forecast".yellow());
            return;
        }
    };
    println!(
        "\n{}",
        format!("Forecast for {}: {first} .. {last}", query.ticker)
            .bold()
            .underline()
    );
    if let Some(point) = series.last() {
        println!("last observed: {} @ {:.2}", point.timestamp, point.value);
    }
    println!("{}", forecast_table(forecast, rows));
}

pub fn error(message: &str) {
    eprintln!("{} {message}", "error:".red().bold());
}

/// The last `rows` rows of the raw table, under its flattened labels.
fn raw_table(raw: &RawTable, rows: usize) -> String {
    let headers: Vec<String> = raw.columns.iter().map(ColumnLabel::flatten).collect();
    let width = headers.len();

    let mut builder = Builder::default();
    builder.push_record(headers);
    for row in raw.tail(rows) {
        builder.push_record((0..width).map(|i| format_cell(row.get(i))));
    }
    builder.build().to_string()
}

fn series_table(series: &NormalizedSeries, rows: usize) -> String {
    let rows = series.tail(rows).iter().map(|point| SeriesRow {
        timestamp: point.timestamp.to_string(),
        value: format!("{:.2}", point.value),
    });
    Table::new(rows).to_string()
}

fn forecast_table(forecast: &Forecast, rows: usize) -> String {
    let rows = forecast.tail(rows).iter().map(|point| ForecastRow {
        ds: point.timestamp.to_string(),
        yhat: format!("{:.2}", point.yhat),
        yhat_lower: format!("{:.2}", point.yhat_lower),
        yhat_upper: format!("{:.2}", point.yhat_upper),
    });
    Table::new(rows).to_string()
}

fn format_cell(cell: Option<&Cell>) -> String {
    match cell {
        Some(Cell::Number(number)) if number.fract() == 0.0 => format!("{number:.0}"),
        Some(Cell::Number(number)) => format!("{number:.2}"),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
