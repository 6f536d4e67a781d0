use serde::Deserialize;
use std::{fs::File, io::BufReader, path::PathBuf};
use url::Url;

use crate::{chart::ChartConfig, error::Error};

const DEFAULT_ENDPOINT: &str = "https://api.tdameritrade.com/v1/marketdata";

fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url")
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

impl AppConfig {
    pub fn try_from(path: PathBuf) -> Result<Self, Error> {
        log::info!("use path {}", path.display());

        let reader = BufReader::new(File::open(&path)?);

        let config: AppConfig = match path.extension() {
            None => Err(Error::Config(
                path.to_str().unwrap_or("Invalid path.").to_string(),
            )),
            Some(os_str) => match os_str.to_str() {
                Some("json") => serde_json::from_reader(reader).map_err(Error::from),
                Some("yaml") | Some("yml") => serde_yaml::from_reader(reader).map_err(Error::from),
                _ => Err(Error::Config("Invalid extension.".to_string())),
            },
        }?;

        Ok(config)
    }

    /// Configuration file when given, defaults otherwise.
    pub fn load(path: Option<PathBuf>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::try_from(path),
            None => Ok(Self::default()),
        }
    }
}
