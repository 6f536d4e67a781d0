//! Chart exporters
//!
//! An exporter receives the candles and the overlays computed on them and
//! writes them somewhere a human can look at. The exporter is picked from the
//! `chart` section of the configuration.

mod html;
mod json;

pub use html::HtmlChartConfig;
pub use json::JsonChartConfig;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{
    error::Error,
    technical_analysis::{CandleSeries, Overlays},
};

/// Everything drawn on one chart.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Chart<'a> {
    pub symbol: &'a str,
    pub candles: &'a CandleSeries,
    pub overlays: &'a Overlays,
}

#[enum_dispatch]
pub trait ChartExporter {
    /// Write the chart and return where it was written.
    fn export(&self, chart: &Chart) -> Result<PathBuf, Error>;
}

#[enum_dispatch(ChartExporter)]
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ChartConfig {
    #[serde(rename = "html")]
    Html(HtmlChartConfig),
    #[serde(rename = "json")]
    Json(JsonChartConfig),
}

impl ChartConfig {
    pub fn with_path(self, path: PathBuf) -> Self {
        match self {
            Self::Html(config) => Self::Html(HtmlChartConfig { path, ..config }),
            Self::Json(config) => Self::Json(JsonChartConfig { path, ..config }),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig::Html(HtmlChartConfig::default())
    }
}
