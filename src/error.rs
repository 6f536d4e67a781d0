#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error returned when a calculator or request parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Error returned when the series is too short for the computation
    #[error("Insufficient data: {required} bars required, {found} found")]
    InsufficientData { required: usize, found: usize },
    /// Error returned when the cumulative volume is zero at a bar
    #[error("Division by zero: cumulative volume is zero at bar {index}")]
    DivisionByZero { index: usize },
    /// Error returned when gradient descent diverges
    #[error("Numeric overflow: regression diverged at iteration {iteration}")]
    NumericOverflow { iteration: u64 },
    #[error("Candle timestamps are not strictly ascending at bar {index}")]
    UnorderedSeries { index: usize },
    #[error("Serde failed: {}", .source)]
    SerdeJson {
        #[from]
        source: serde_json::Error,
    },
    #[error("Deserilaze failed: {}", .source)]
    SerdeYaml {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Failed to parse url: {}", .source)]
    Url {
        #[from]
        source: url::ParseError,
    },
    #[error("Returned http status is failure: {0}")]
    Http(String),
    #[error("Http request failed: {}", .source)]
    Request {
        #[from]
        source: reqwest::Error,
    },
    /// Error returned when building the configuration
    #[error("Failed to build config: {0}")]
    Config(String),
    #[error("IO failure: {}", .source)]
    IO {
        #[from]
        source: std::io::Error,
    },
}
