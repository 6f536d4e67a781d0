use reqwest::blocking::Client;
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::PathBuf};
use url::Url;

use super::request::PriceHistoryRequest;
use crate::{
    error::Error,
    technical_analysis::{Candle, CandleSeries},
};

/// Source of candles for a request.
pub trait PriceHistoryClient {
    fn fetch(&self, request: &PriceHistoryRequest) -> Result<CandleSeries, Error>;
}

/// Body returned by the price history endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct PriceHistoryResponse {
    #[serde(default)]
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub empty: bool,
}

impl TryFrom<PriceHistoryResponse> for CandleSeries {
    type Error = Error;

    fn try_from(response: PriceHistoryResponse) -> Result<Self, Self::Error> {
        if response.empty {
            log::warn!(
                "Empty price history for {}",
                response.symbol.as_deref().unwrap_or("unknown symbol")
            );
        }
        CandleSeries::try_new(response.candles)
    }
}

pub struct HttpHistoryClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpHistoryClient {
    pub fn new(endpoint: Url, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }

    pub fn url(&self, symbol: &str) -> Result<Url, Error> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}/pricehistory", base, symbol))?)
    }

    fn query(&self, request: &PriceHistoryRequest) -> Vec<(&'static str, String)> {
        let mut query = request.query();
        if let Some(api_key) = &self.api_key {
            query.insert(0, ("apikey", api_key.clone()));
        }
        query
    }
}

impl PriceHistoryClient for HttpHistoryClient {
    fn fetch(&self, request: &PriceHistoryRequest) -> Result<CandleSeries, Error> {
        request.validate()?;

        let url = self.url(&request.symbol)?;
        log::info!("Fetch price history from {}", url);

        let response = self.client.get(url).query(&self.query(request)).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(status.to_string()));
        }

        let series: CandleSeries = response.json::<PriceHistoryResponse>()?.try_into()?;
        log::info!("Received {} candles for {}", series.len(), request.symbol);
        Ok(series)
    }
}

/// Reads a saved price history body instead of calling the endpoint.
pub struct FileHistoryClient {
    path: PathBuf,
}

impl FileHistoryClient {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PriceHistoryClient for FileHistoryClient {
    fn fetch(&self, request: &PriceHistoryRequest) -> Result<CandleSeries, Error> {
        log::info!(
            "Read price history for {} from {}",
            request.symbol,
            self.path.display()
        );

        let reader = BufReader::new(File::open(&self.path)?);
        serde_json::from_reader::<_, PriceHistoryResponse>(reader)?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::request::{FrequencyType, PeriodType};
    use rstest::*;
    use std::io::Write;
    use yata::core::OHLCV;

    const BODY: &str = r#"
    {
        "candles": [
            {"open": 239.5, "high": 240.1, "low": 238.9, "close": 239.8, "volume": 1520340, "datetime": 1672756200000},
            {"open": 239.8, "high": 241.0, "low": 239.6, "close": 240.7, "volume": 830112, "datetime": 1672756500000}
        ],
        "symbol": "MSFT",
        "empty": false
    }
    "#;

    #[fixture]
    fn request() -> PriceHistoryRequest {
        PriceHistoryRequest {
            symbol: "MSFT".to_string(),
            period_type: PeriodType::Day,
            period: Some(10),
            frequency_type: FrequencyType::Minute,
            frequency: 5,
            start: None,
            end: None,
            need_extended_hours_data: false,
        }
    }

    #[test]
    fn test_response() {
        let response = serde_json::from_str::<PriceHistoryResponse>(BODY).unwrap();
        let series = CandleSeries::try_from(response).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[1].close(), 240.7);
        assert_eq!(series[1].timestamp, 1672756500000);
    }

    #[test]
    fn test_empty_response() {
        let response =
            serde_json::from_str::<PriceHistoryResponse>(r#"{"candles": [], "empty": true}"#)
                .unwrap();
        assert!(CandleSeries::try_from(response).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_response() {
        assert!(serde_json::from_str::<PriceHistoryResponse>(r#"{"candles": [{"open": 1}]}"#)
            .is_err());
    }

    #[rstest]
    #[case::no_slash("https://api.tdameritrade.com/v1/marketdata")]
    #[case::slash("https://api.tdameritrade.com/v1/marketdata/")]
    fn test_url(#[case] endpoint: &'static str) {
        let client = HttpHistoryClient::new(Url::parse(endpoint).unwrap(), None);
        assert_eq!(
            client.url("MSFT").unwrap().as_str(),
            "https://api.tdameritrade.com/v1/marketdata/MSFT/pricehistory"
        );
    }

    #[rstest]
    fn test_query_with_api_key(request: PriceHistoryRequest) {
        let client = HttpHistoryClient::new(
            Url::parse("https://api.tdameritrade.com/v1/marketdata").unwrap(),
            Some("KEY".to_string()),
        );
        let query = client.query(&request);
        assert_eq!(query[0], ("apikey", "KEY".to_string()));
        assert_eq!(query.len(), request.query().len() + 1);
    }

    #[rstest]
    fn test_invalid_request_is_not_sent(mut request: PriceHistoryRequest) {
        request.frequency = 7;
        let client = HttpHistoryClient::new(Url::parse("http://127.0.0.1:9").unwrap(), None);
        assert!(matches!(
            client.fetch(&request),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[rstest]
    fn test_file_client(request: PriceHistoryRequest) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BODY.as_bytes()).unwrap();

        let series = FileHistoryClient::new(file.path().to_path_buf())
            .fetch(&request)
            .unwrap();
        assert_eq!(series.len(), 2);
    }

    #[rstest]
    fn test_file_client_missing_file(request: PriceHistoryRequest) {
        let client = FileHistoryClient::new(PathBuf::from("/nonexistent/pricehistory.json"));
        assert!(matches!(client.fetch(&request), Err(Error::IO { .. })));
    }
}
