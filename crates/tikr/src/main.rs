use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*, TraceLevel};
use std::process::ExitCode;
use tikr_table::Normalizer;
use tikr_warehouse::config::{Config, STOCKS};
use tikr_warehouse::{Action, Dashboard, LinearTrend, PriceSource, View};
use tracing::{debug, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod ui;

fn preprocess(trace_level: Level) {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level);
    trace!("Command line input recorded: {cli:#?}");
    let config = Config::from_env();

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> tikr <COMMAND>"
    let (source, action, normalizer, rows) = match cli.command {
        // "> tikr tickers"
        Tickers => {
            ui::tickers(&STOCKS);
            return Ok(ExitCode::SUCCESS);
        }

        // "> tikr show [TICKER] [--start] [--end] [--rows] [--column]"
        Show {
            range,
            rows,
            column,
        } => (
            range.source(&config)?,
            Action::Load(range.query()?),
            Normalizer::default().with_value_pattern(column),
            rows,
        ),

        // "> tikr forecast [TICKER] [--years]"
        Forecast { range, years, rows } => (
            range.source(&config)?,
            Action::Forecast {
                query: range.query()?,
                years,
            },
            Normalizer::default(),
            rows,
        ),
    };

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    debug!("fetching through the {} source", source.name());
    let mut dashboard =
        Dashboard::new(source, LinearTrend::default()).with_normalizer(normalizer);

    let pb = ui::loading_spinner();
    let view = dashboard.handle(action).await;
    match view {
        Ok(View::Prices { query, raw, series }) => {
            pb.finish_with_message("Loading data... done!");
            ui::prices(&query, &raw, &series, rows);
        }
        Ok(View::Forecast {
            query,
            series,
            forecast,
        }) => {
            pb.finish_with_message("Loading data... done!");
            ui::forecast(&query, &series, &forecast, rows);
        }
        Err(e) => {
            pb.finish_and_clear();
            ui::error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}
