//! Interactive candlestick page rendered by plotly.js in the browser.

use chrono::TimeZone;
use chrono_tz::Tz;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{fs, path::PathBuf};
use yata::core::OHLCV;

use super::{Chart, ChartExporter};
use crate::error::Error;

const DEFAULT_PATH: &str = "chart.html";
const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;
const PLOTLY_SCRIPT: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";
const X_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_PATH)
}

fn default_timezone() -> Tz {
    DEFAULT_TIMEZONE
}

fn default_rangebreaks() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct HtmlChartConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Exchange timezone the x axis is drawn in, daylight saving included
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    /// Hide the overnight and weekend gaps
    #[serde(default = "default_rangebreaks")]
    pub rangebreaks: bool,
}

impl Default for HtmlChartConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            timezone: default_timezone(),
            rangebreaks: default_rangebreaks(),
        }
    }
}

impl HtmlChartConfig {
    fn x_axis(&self, chart: &Chart) -> Result<Vec<String>, Error> {
        chart
            .candles
            .iter()
            .map(|candle| {
                self.timezone
                    .timestamp_millis_opt(candle.timestamp)
                    .single()
                    .map(|datetime| datetime.format(X_FORMAT).to_string())
                    .ok_or_else(|| {
                        Error::InvalidParameter(format!(
                            "timestamp out of range: {}",
                            candle.timestamp
                        ))
                    })
            })
            .collect()
    }

    fn traces(&self, chart: &Chart, x: &[String]) -> Vec<Value> {
        let mut traces = vec![json!({
            "type": "candlestick",
            "name": chart.symbol,
            "x": x,
            "open": chart.candles.iter().map(|c| c.open()).collect::<Vec<f64>>(),
            "high": chart.candles.iter().map(|c| c.high()).collect::<Vec<f64>>(),
            "low": chart.candles.iter().map(|c| c.low()).collect::<Vec<f64>>(),
            "close": chart.candles.iter().map(|c| c.close()).collect::<Vec<f64>>()
        })];

        traces.extend(
            chart
                .overlays
                .iter()
                .filter(|overlay| !overlay.label.is_auxiliary())
                .map(|overlay| {
                    json!({
                        "type": "scatter",
                        "mode": "lines",
                        "name": overlay.label.to_string(),
                        "x": x,
                        "y": overlay.values
                    })
                }),
        );
        traces
    }

    fn layout(&self, chart: &Chart) -> Value {
        let mut layout = json!({
            "title": chart.symbol,
            "xaxis": { "rangeslider": { "visible": false } }
        });

        if self.rangebreaks {
            layout["xaxis"]["rangebreaks"] = json!([
                { "bounds": [16, 9.5], "pattern": "hour" },
                { "bounds": ["sat", "mon"] }
            ]);
        }
        layout
    }

    fn render(&self, chart: &Chart) -> Result<String, Error> {
        let x = self.x_axis(chart)?;
        let traces = serde_json::to_string(&self.traces(chart, &x))?;
        let layout = serde_json::to_string(&self.layout(chart))?;

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{script}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:95vh;"></div>
<script>
Plotly.newPlot("chart", {traces}, {layout});
</script>
</body>
</html>
"#,
            title = escape(chart.symbol),
            script = PLOTLY_SCRIPT,
            traces = escape_script(&traces),
            layout = escape_script(&layout),
        ))
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// keeps "</script>" out of inline json
fn escape_script(s: &str) -> String {
    s.replace("</", "<\\/")
}

impl ChartExporter for HtmlChartConfig {
    fn export(&self, chart: &Chart) -> Result<PathBuf, Error> {
        log::info!(
            "Export {} candles with overlays [{}] to {}",
            chart.candles.len(),
            chart.overlays.labels().join(", "),
            self.path.display()
        );

        fs::write(&self.path, self.render(chart)?)?;
        Ok(self.path.clone())
    }
}
