mod candle;
mod ema;
mod overlay;
mod regression;
mod vwap;

pub use candle::{Candle, CandleSeries};
pub use ema::compute_ema;
pub use overlay::{OverlayLabel, Overlays};
pub use regression::{fit_linear_regression, fit_linear_regression_with_progress, Schedule};
pub use vwap::compute_vwap;

#[cfg(test)]
pub(crate) use candle::fixtures;
