use serde::{Deserialize, Serialize};
use std::ops::Index;
use yata::core::{ValueType, OHLCV};

use crate::{
    error::Error,
    utils::serde::{f64_from_string, i64_from_string},
};

/// One trading bar. Prices are not checked against each other, malformed
/// bars are carried through unchanged.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Candle {
    /// Milliseconds since Unix epoch, UTC
    #[serde(rename = "datetime", deserialize_with = "i64_from_string")]
    pub timestamp: i64,
    #[serde(deserialize_with = "f64_from_string")]
    open: f64,
    #[serde(deserialize_with = "f64_from_string")]
    high: f64,
    #[serde(deserialize_with = "f64_from_string")]
    low: f64,
    #[serde(deserialize_with = "f64_from_string")]
    close: f64,
    #[serde(deserialize_with = "f64_from_string")]
    volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Candle {
    #[inline]
    fn open(&self) -> ValueType {
        self.open
    }

    #[inline]
    fn high(&self) -> ValueType {
        self.high
    }

    #[inline]
    fn low(&self) -> ValueType {
        self.low
    }

    #[inline]
    fn close(&self) -> ValueType {
        self.close
    }

    #[inline]
    fn volume(&self) -> ValueType {
        self.volume
    }
}

impl PartialEq for Candle {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.open.to_bits() == other.open().to_bits()
            && self.high.to_bits() == other.high().to_bits()
            && self.low.to_bits() == other.low().to_bits()
            && self.close.to_bits() == other.close().to_bits()
            && self.volume.to_bits() == other.volume().to_bits()
    }
}

impl Eq for Candle {}

/// Candles ordered by strictly ascending timestamp.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn try_new(candles: Vec<Candle>) -> Result<Self, Error> {
        if let Some(index) = candles
            .windows(2)
            .position(|pair| pair[0].timestamp >= pair[1].timestamp)
        {
            return Err(Error::UnorderedSeries { index: index + 1 });
        }

        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.candles.iter().map(|candle| candle.close())
    }
}

impl Index<usize> for CandleSeries {
    type Output = Candle;

    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

impl TryFrom<Vec<Candle>> for CandleSeries {
    type Error = Error;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::try_new(candles)
    }
}
