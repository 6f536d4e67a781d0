//! Candle trend is a small analysis tool that
//! * fetches the price history of a symbol
//! * computes indicators on the candles (EMA, VWAP, linear regression trendline)
//! * exports a candlestick chart with the indicators drawn on top
//!
//! ## Indicators
//!
//! Indicators are pure functions over a borrowed [`technical_analysis::CandleSeries`],
//! each returning new overlays aligned bar for bar with the candles. A failing
//! indicator leaves the overlays computed so far untouched.
//!
//! ## Configuration
//!
//! The api endpoint, the api key and the chart exporter are read from an
//! optional yaml or json file, see [`config::AppConfig`].

#[macro_use]
extern crate lazy_static;
extern crate log;

mod chart;
mod config;
mod error;
mod history;
mod technical_analysis;
mod utils;

use chart::{Chart, ChartExporter};
use chrono::{DateTime, Local, Utc};
use config::AppConfig;
use enum_dispatch::enum_dispatch;
use env_logger::Builder;
use error::Error;
use history::{
    FileHistoryClient, FrequencyType, HttpHistoryClient, PeriodType, PriceHistoryClient,
    PriceHistoryRequest,
};
use log::LevelFilter;
use std::{io::Write, path::PathBuf};
use structopt::StructOpt;
use technical_analysis::{CandleSeries, OverlayLabel, Overlays, Schedule};
use utils::serde::parse_utc_datetime;

const API_KEY: &str = "PRICE_HISTORY_API_KEY";
const LOG_LEVEL: &str = "LOG_LEVEL";
const PKG_NAME: &str = env!("CARGO_PKG_NAME");
const DEFAULT_EMA_SPANS: [usize; 3] = [9, 15, 200];

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "candle-trend", about = "Candle indicators cli.")]
struct MainCommand {
    #[structopt(
        long = "log-level",
        help = "Log level.",
        env = LOG_LEVEL,
        default_value = "info"
    )]
    pub log_level: LevelFilter,
    #[structopt(subcommand)]
    command: Command,
}

#[enum_dispatch]
trait Execute {
    fn execute(&self) -> Result<(), Error>;
}

#[derive(Clone, Debug, StructOpt)]
#[enum_dispatch(Execute)]
enum Command {
    Ema(EmaCommand),
    Trend(TrendCommand),
    Vwap(VwapCommand),
    Validate(ValidateCommand),
}

/// Options shared by every command drawing a chart.
#[derive(Clone, Debug, StructOpt)]
struct ChartArgs {
    #[structopt(short = "s", long = "symbol", help = "Symbol to fetch, e.g. MSFT.")]
    pub symbol: String,
    #[structopt(
        long = "period-type",
        help = "One of day, month, year, ytd.",
        default_value = "day"
    )]
    pub period_type: PeriodType,
    #[structopt(long = "period", help = "Number of periods, ignored with --start and --end.")]
    pub period: Option<u32>,
    #[structopt(
        long = "frequency-type",
        help = "One of minute, daily, weekly, monthly.",
        default_value = "minute"
    )]
    pub frequency_type: FrequencyType,
    #[structopt(long = "frequency", help = "Candle frequency.", default_value = "5")]
    pub frequency: u32,
    #[structopt(
        long = "start",
        help = "Start of the range, \"%Y%m%d %H:%M:%S\" in UTC.",
        parse(try_from_str = parse_utc_datetime)
    )]
    pub start: Option<DateTime<Utc>>,
    #[structopt(
        long = "end",
        help = "End of the range, \"%Y%m%d %H:%M:%S\" in UTC.",
        parse(try_from_str = parse_utc_datetime)
    )]
    pub end: Option<DateTime<Utc>>,
    #[structopt(long = "extended-hours", help = "Include extended hours candles.")]
    pub need_extended_hours_data: bool,
    #[structopt(
        short = "i",
        long = "input",
        help = "Read a saved price history instead of calling the api."
    )]
    pub input: Option<PathBuf>,
    #[structopt(short = "c", long = "config", help = "Configuration path.")]
    pub configuration_path: Option<PathBuf>,
    #[structopt(
        long = "api-key",
        env = API_KEY,
        hide_env_values = true,
        help = "Api key, overrides the configuration."
    )]
    pub api_key: Option<String>,
    #[structopt(short = "o", long = "output", help = "Chart path, overrides the configuration.")]
    pub output: Option<PathBuf>,
}

impl ChartArgs {
    fn request(&self) -> PriceHistoryRequest {
        PriceHistoryRequest {
            symbol: self.symbol.clone(),
            period_type: self.period_type,
            period: self.period,
            frequency_type: self.frequency_type,
            frequency: self.frequency,
            start: self.start,
            end: self.end,
            need_extended_hours_data: self.need_extended_hours_data,
        }
    }

    fn config(&self) -> Result<AppConfig, Error> {
        let mut config = AppConfig::load(self.configuration_path.clone())?;
        if let Some(api_key) = &self.api_key {
            config.api.api_key = Some(api_key.clone());
        }
        if let Some(output) = &self.output {
            config.chart = config.chart.with_path(output.clone());
        }
        Ok(config)
    }

    fn fetch(&self, config: &AppConfig) -> Result<CandleSeries, Error> {
        let request = self.request();
        let client: Box<dyn PriceHistoryClient> = match &self.input {
            Some(path) => Box::new(FileHistoryClient::new(path.clone())),
            None => Box::new(HttpHistoryClient::new(
                config.api.endpoint.clone(),
                config.api.api_key.clone(),
            )),
        };
        client.fetch(&request)
    }

    /// Fetch the candles, add the overlays built by `compute` and export the chart.
    fn run<F>(&self, compute: F) -> Result<(), Error>
    where
        F: FnOnce(&CandleSeries) -> Result<Overlays, Error>,
    {
        let config = self.config()?;
        let candles = self.fetch(&config)?;

        let mut overlays = Overlays::new();
        overlays.try_extend(compute(&candles)?, candles.len())?;

        let path = config.chart.export(&Chart {
            symbol: &self.symbol,
            candles: &candles,
            overlays: &overlays,
        })?;
        log::info!("Chart written to {}", path.display());
        Ok(())
    }
}

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "ema", about = "Draw exponential moving averages of the close.")]
struct EmaCommand {
    #[structopt(flatten)]
    pub chart: ChartArgs,
    #[structopt(long = "span", help = "EMA span, repeat for several (default 9 15 200).")]
    pub spans: Vec<usize>,
}

impl Execute for EmaCommand {
    fn execute(&self) -> Result<(), Error> {
        let spans = if self.spans.is_empty() {
            DEFAULT_EMA_SPANS.to_vec()
        } else {
            self.spans.clone()
        };

        self.chart
            .run(|candles| technical_analysis::compute_ema(candles, &spans))
    }
}

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "trend", about = "Draw a linear regression trendline of the close.")]
struct TrendCommand {
    #[structopt(flatten)]
    pub chart: ChartArgs,
    #[structopt(
        long = "learning-rate",
        help = "Gradient descent learning rate, picked from the series length if missing."
    )]
    pub learning_rate: Option<f64>,
    #[structopt(
        long = "iterations",
        help = "Gradient descent iterations, picked from the series length if missing."
    )]
    pub iterations: Option<u64>,
    #[structopt(
        long = "progress-every",
        help = "Log progress every n iterations.",
        default_value = "100000"
    )]
    pub progress_every: u64,
    #[structopt(long = "no-progress", help = "Do not log the gradient descent progress.")]
    pub no_progress: bool,
}

impl Execute for TrendCommand {
    fn execute(&self) -> Result<(), Error> {
        self.chart.run(|candles| {
            let schedule = Schedule::for_len(candles.len());
            let learning_rate = self.learning_rate.unwrap_or(schedule.learning_rate);
            let iterations = self.iterations.unwrap_or(schedule.iterations);
            log::info!(
                "Fit trendline on {} candles, learning rate {}, {} iterations",
                candles.len(),
                learning_rate,
                iterations
            );

            let trendline = if self.no_progress {
                technical_analysis::fit_linear_regression(candles, learning_rate, iterations)?
            } else {
                technical_analysis::fit_linear_regression_with_progress(
                    candles,
                    learning_rate,
                    iterations,
                    self.progress_every,
                    |progress| {
                        log::info!(
                            "Iteration {}, {} remaining",
                            progress.iteration,
                            progress.remaining
                        )
                    },
                )?
            };
            log::info!(
                "Trendline slope {} intercept {}",
                trendline.slope,
                trendline.intercept
            );

            let mut overlays = Overlays::new();
            overlays.insert(OverlayLabel::Trend, trendline.fitted);
            Ok(overlays)
        })
    }
}

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "vwap", about = "Draw the volume weighted average price.")]
struct VwapCommand {
    #[structopt(flatten)]
    pub chart: ChartArgs,
}

impl Execute for VwapCommand {
    fn execute(&self) -> Result<(), Error> {
        self.chart
            .run(|candles| Ok(technical_analysis::compute_vwap(candles)?.into_overlays()))
    }
}

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "validate", about = "Validate a configuration.")]
struct ValidateCommand {
    #[structopt(
        long = "config",
        short = "c",
        help = "Path to the configuration to validate."
    )]
    pub configuration_path: PathBuf,
    #[structopt(long = "show", help = "Print the parsed configuration.")]
    pub show: bool,
}

impl Execute for ValidateCommand {
    fn execute(&self) -> Result<(), Error> {
        let config = AppConfig::try_from(self.configuration_path.clone())?;
        if self.show {
            log::info!("{:#?}", config);
        };
        Ok(())
    }
}

fn run_app() -> Result<(), Error> {
    let opt = MainCommand::from_args();
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .filter(None, opt.log_level)
        .init();
    log::debug!("Start {}", PKG_NAME);
    opt.command.execute()
}

fn main() {
    std::process::exit(match run_app() {
        Ok(_) => 0,
        Err(err) => {
            log::error!("error: {:?}", err);
            1
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    const BODY: &str = r#"
    {
        "candles": [
            {"open": 10.0, "high": 12.0, "low": 8.0, "close": 10.0, "volume": 100, "datetime": 1672756200000},
            {"open": 20.0, "high": 21.0, "low": 19.0, "close": 20.0, "volume": 300, "datetime": 1672756500000},
            {"open": 30.0, "high": 31.0, "low": 29.0, "close": 30.0, "volume": 200, "datetime": 1672756800000}
        ],
        "symbol": "MSFT",
        "empty": false
    }
    "#;

    fn parse(args: &[&str]) -> Command {
        MainCommand::from_iter_safe(args).unwrap().command
    }

    fn input() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(BODY.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_ema() {
        match parse(&["candle-trend", "ema", "-s", "MSFT", "--span", "9", "--span", "21"]) {
            Command::Ema(command) => {
                assert_eq!(command.spans, vec![9, 21]);
                assert_eq!(command.chart.period_type, PeriodType::Day);
                assert_eq!(command.chart.frequency_type, FrequencyType::Minute);
                assert_eq!(command.chart.frequency, 5);
            }
            command => panic!("unexpected command: {:?}", command),
        }
    }

    #[rstest]
    #[case::default(vec![], false)]
    #[case::quiet(vec!["--no-progress"], true)]
    fn test_parse_trend(#[case] extra: Vec<&'static str>, #[case] no_progress: bool) {
        let mut args = vec!["candle-trend", "trend", "-s", "MSFT"];
        args.extend(extra);
        match parse(&args) {
            Command::Trend(command) => {
                assert_eq!(command.no_progress, no_progress);
                assert_eq!(command.progress_every, 100_000);
                assert!(command.learning_rate.is_none());
            }
            command => panic!("unexpected command: {:?}", command),
        }
    }

    #[test]
    fn test_parse_range() {
        match parse(&[
            "candle-trend",
            "vwap",
            "-s",
            "MSFT",
            "--period",
            "10",
            "--start",
            "20230103 14:30:00",
            "--end",
            "20230104 14:30:00",
        ]) {
            Command::Vwap(command) => {
                let request = command.chart.request();
                assert!(request.query().iter().all(|(key, _)| *key != "period"));
            }
            command => panic!("unexpected command: {:?}", command),
        }
    }

    #[rstest]
    #[case::ema(vec!["ema", "--span", "3"], "3 EMA")]
    #[case::vwap(vec!["vwap"], "VWAP")]
    #[case::trend(vec!["trend", "--learning-rate", "0.001", "--iterations", "1000"], "trend")]
    #[case::trend_quiet(
        vec!["trend", "--learning-rate", "0.001", "--iterations", "1000", "--no-progress"],
        "trend"
    )]
    fn test_execute_from_file(#[case] command: Vec<&'static str>, #[case] label: &'static str) {
        let input = input();
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "chart:\n  type: json\n").unwrap();
        let output = dir.path().join("chart.json");

        let mut args = vec!["candle-trend".to_string()];
        args.extend(command.iter().map(|arg| arg.to_string()));
        args.extend(
            [
                "-s",
                "MSFT",
                "-i",
                input.path().to_str().unwrap(),
                "-c",
                config.to_str().unwrap(),
                "-o",
                output.to_str().unwrap(),
            ]
            .iter()
            .map(|arg| arg.to_string()),
        );

        MainCommand::from_iter_safe(args)
            .unwrap()
            .command
            .execute()
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(value["overlays"][label].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_failing_indicator_writes_nothing() {
        let input = input();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chart.html");

        let result = parse(&[
            "candle-trend",
            "trend",
            "-s",
            "MSFT",
            "-i",
            input.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--learning-rate",
            "10",
            "--iterations",
            "10000",
        ])
        .execute();

        assert!(matches!(result, Err(Error::NumericOverflow { .. })));
        assert!(!output.exists());
    }
}
