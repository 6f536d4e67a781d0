use serde::Deserialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use super::{Chart, ChartExporter};
use crate::error::Error;

const DEFAULT_PATH: &str = "chart.json";

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_PATH)
}

/// Dump the candles and every overlay, auxiliary ones included.
#[derive(Clone, Debug, Deserialize)]
pub struct JsonChartConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub pretty: bool,
}

impl Default for JsonChartConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            pretty: false,
        }
    }
}

impl ChartExporter for JsonChartConfig {
    fn export(&self, chart: &Chart) -> Result<PathBuf, Error> {
        log::info!(
            "Export {} candles and {} overlays to {}",
            chart.candles.len(),
            chart.overlays.len(),
            self.path.display()
        );

        let mut writer = BufWriter::new(File::create(&self.path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, chart)?;
        } else {
            serde_json::to_writer(&mut writer, chart)?;
        }
        writer.flush()?;

        Ok(self.path.clone())
    }
}
