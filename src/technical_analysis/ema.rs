//! Exponential moving average over the close prices.
//!
//! The recurrence is seeded with the first close (no warm-up window):
//! `ema[0] = close[0]`, `ema[i] = alpha * close[i] + (1 - alpha) * ema[i - 1]`
//! with `alpha = 2 / (span + 1)`. The update is evaluated as
//! `ema[i - 1] + alpha * (close[i] - ema[i - 1])` so a flat series stays
//! exactly flat.

use super::{
    candle::CandleSeries,
    overlay::{OverlayLabel, Overlays},
};
use crate::error::Error;

/// Compute one EMA series per span, in the order given.
pub fn compute_ema(series: &CandleSeries, spans: &[usize]) -> Result<Overlays, Error> {
    if let Some(span) = spans.iter().find(|span| **span == 0) {
        return Err(Error::InvalidParameter(format!(
            "EMA span must be positive, got {}",
            span
        )));
    }

    let mut overlays = Overlays::new();
    for span in spans {
        log::debug!("Compute {} EMA over {} candles", span, series.len());
        overlays.insert(OverlayLabel::Ema(*span), ema(series.closes(), *span));
    }

    Ok(overlays)
}

fn ema(closes: impl Iterator<Item = f64>, span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);

    closes
        .scan(None, |previous: &mut Option<f64>, close| {
            let value = match *previous {
                Some(previous) => previous + alpha * (close - previous),
                None => close,
            };
            previous.replace(value);
            Some(value)
        })
        .collect()
}
