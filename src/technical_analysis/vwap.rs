//! Volume weighted average price, cumulated from the first bar of the series.

use yata::core::OHLCV;

use super::{
    candle::CandleSeries,
    overlay::{OverlayLabel, Overlays},
};
use crate::error::Error;

/// VWAP and the running sums it is derived from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vwap {
    pub vwap: Vec<f64>,
    /// Running sum of typical price times volume
    pub cum_sum_pv: Vec<f64>,
    pub cum_sum_vol: Vec<f64>,
}

impl Vwap {
    pub fn into_overlays(self) -> Overlays {
        let mut overlays = Overlays::new();
        overlays.insert(OverlayLabel::Vwap, self.vwap);
        overlays.insert(OverlayLabel::CumSumPv, self.cum_sum_pv);
        overlays.insert(OverlayLabel::CumSumVol, self.cum_sum_vol);
        overlays
    }
}

/// Fails on the first bar where the cumulative volume is exactly zero.
pub fn compute_vwap(series: &CandleSeries) -> Result<Vwap, Error> {
    log::debug!("Compute VWAP over {} candles", series.len());

    let mut result = Vwap {
        vwap: Vec::with_capacity(series.len()),
        cum_sum_pv: Vec::with_capacity(series.len()),
        cum_sum_vol: Vec::with_capacity(series.len()),
    };

    let (mut cum_sum_pv, mut cum_sum_vol) = (0.0, 0.0);
    for (index, candle) in series.iter().enumerate() {
        cum_sum_pv += candle.tp() * candle.volume();
        cum_sum_vol += candle.volume();

        if cum_sum_vol == 0.0 {
            return Err(Error::DivisionByZero { index });
        }

        result.cum_sum_pv.push(cum_sum_pv);
        result.cum_sum_vol.push(cum_sum_vol);
        result.vwap.push(cum_sum_pv / cum_sum_vol);
    }

    Ok(result)
}
