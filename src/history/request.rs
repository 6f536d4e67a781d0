use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::Error;

lazy_static! {
    static ref SYMBOL: Regex = Regex::new(r"^[A-Za-z0-9$./^-]+$").unwrap();
}

#[derive(Clone, Copy, Debug, Display, Deserialize, EnumString, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PeriodType {
    Day,
    Month,
    Year,
    Ytd,
}

impl PeriodType {
    fn periods(&self) -> &'static [u32] {
        match self {
            Self::Day => &[1, 2, 3, 4, 5, 10],
            Self::Month => &[1, 2, 3, 6],
            Self::Year => &[1, 2, 3, 5, 10, 15, 20],
            Self::Ytd => &[1],
        }
    }

    fn frequency_types(&self) -> &'static [FrequencyType] {
        match self {
            Self::Day => &[FrequencyType::Minute],
            Self::Month => &[FrequencyType::Daily, FrequencyType::Weekly],
            Self::Year => &[
                FrequencyType::Daily,
                FrequencyType::Weekly,
                FrequencyType::Monthly,
            ],
            Self::Ytd => &[FrequencyType::Daily, FrequencyType::Weekly],
        }
    }
}

#[derive(Clone, Copy, Debug, Display, Deserialize, EnumString, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FrequencyType {
    Minute,
    Daily,
    Weekly,
    Monthly,
}

impl FrequencyType {
    fn frequencies(&self) -> &'static [u32] {
        match self {
            Self::Minute => &[1, 5, 10, 15, 30],
            _ => &[1],
        }
    }
}

/// Query for the candles of one symbol.
///
/// When both `start` and `end` are set the date range replaces `period`,
/// which is then left out of the query.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceHistoryRequest {
    pub symbol: String,
    pub period_type: PeriodType,
    pub period: Option<u32>,
    pub frequency_type: FrequencyType,
    pub frequency: u32,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub need_extended_hours_data: bool,
}

impl PriceHistoryRequest {
    fn has_range(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Check the parameter combinations accepted upstream.
    pub fn validate(&self) -> Result<(), Error> {
        if !SYMBOL.is_match(&self.symbol) {
            return Err(Error::InvalidParameter(format!(
                "invalid symbol {:?}",
                self.symbol
            )));
        }

        if !self
            .period_type
            .frequency_types()
            .contains(&self.frequency_type)
        {
            return Err(Error::InvalidParameter(format!(
                "frequency type {} is not available for period type {}",
                self.frequency_type, self.period_type
            )));
        }

        if !self.frequency_type.frequencies().contains(&self.frequency) {
            return Err(Error::InvalidParameter(format!(
                "frequency {} is not available for frequency type {}",
                self.frequency, self.frequency_type
            )));
        }

        if let (Some(period), false) = (self.period, self.has_range()) {
            if !self.period_type.periods().contains(&period) {
                return Err(Error::InvalidParameter(format!(
                    "period {} is not available for period type {}",
                    period, self.period_type
                )));
            }
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start >= end {
                return Err(Error::InvalidParameter(format!(
                    "start {} is not before end {}",
                    start, end
                )));
            }
        }

        Ok(())
    }

    /// Query parameters, without credentials.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("periodType", self.period_type.to_string())];

        if let (Some(period), false) = (self.period, self.has_range()) {
            query.push(("period", period.to_string()));
        }

        query.push(("frequencyType", self.frequency_type.to_string()));
        query.push(("frequency", self.frequency.to_string()));

        if let Some(start) = self.start {
            query.push(("startDate", start.timestamp_millis().to_string()));
        }
        if let Some(end) = self.end {
            query.push(("endDate", end.timestamp_millis().to_string()));
        }

        query.push((
            "needExtendedHoursData",
            self.need_extended_hours_data.to_string(),
        ));
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::serde::parse_utc_datetime;
    use rstest::*;
    use std::str::FromStr;

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

    #[rstest]
    #[case::day("day", PeriodType::Day)]
    #[case::ytd("ytd", PeriodType::Ytd)]
    #[case::upper("YEAR", PeriodType::Year)]
    fn test_period_type_from_str(#[case] input: &'static str, #[case] expected: PeriodType) {
        assert_eq!(PeriodType::from_str(input).unwrap(), expected);
    }

    #[rstest]
    fn test_query_with_period(request: PriceHistoryRequest) {
        assert_eq!(
            request.query(),
            vec![
                ("periodType", "day".to_string()),
                ("period", "10".to_string()),
                ("frequencyType", "minute".to_string()),
                ("frequency", "5".to_string()),
                ("needExtendedHoursData", "false".to_string()),
            ]
        );
    }

    #[rstest]
    fn test_query_with_range_drops_period(mut request: PriceHistoryRequest) {
        request.start = Some(parse_utc_datetime("20230103 14:30:00").unwrap());
        request.end = Some(parse_utc_datetime("20230104 14:30:00").unwrap());

        let query = request.query();
        assert!(query.iter().all(|(key, _)| *key != "period"));
        assert!(query.contains(&("startDate", "1672756200000".to_string())));
        assert!(query.contains(&("endDate", "1672842600000".to_string())));
        assert!(request.validate().is_ok());
    }

    #[rstest]
    fn test_query_with_start_only_keeps_period(mut request: PriceHistoryRequest) {
        request.start = Some(parse_utc_datetime("20230103 14:30:00").unwrap());
        assert!(request.query().contains(&("period", "10".to_string())));
    }

    #[rstest]
    fn test_valid(request: PriceHistoryRequest) {
        assert!(request.validate().is_ok());
    }

    #[rstest]
    #[case::symbol(|r: &mut PriceHistoryRequest| r.symbol = "MS FT".to_string())]
    #[case::frequency_type(|r: &mut PriceHistoryRequest| r.frequency_type = FrequencyType::Daily)]
    #[case::frequency(|r: &mut PriceHistoryRequest| r.frequency = 7)]
    #[case::period(|r: &mut PriceHistoryRequest| r.period = Some(6))]
    #[case::range(|r: &mut PriceHistoryRequest| {
        r.start = Some(parse_utc_datetime("20230104 14:30:00").unwrap());
        r.end = Some(parse_utc_datetime("20230103 14:30:00").unwrap());
    })]
    fn test_invalid(mut request: PriceHistoryRequest, #[case] update: fn(&mut PriceHistoryRequest)) {
        update(&mut request);
        assert!(matches!(
            request.validate(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[rstest]
    #[case::index("$SPX.X")]
    #[case::class("BRK.B")]
    fn test_symbols(mut request: PriceHistoryRequest, #[case] symbol: &'static str) {
        request.symbol = symbol.to_string();
        assert!(request.validate().is_ok());
    }
}
