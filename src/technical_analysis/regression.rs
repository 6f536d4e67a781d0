//! Trendline fitted on the close prices by full-batch gradient descent.
//!
//! The model is `close = slope * index + intercept` where `index` is the
//! zero-based bar position, not the timestamp. Each step uses the exact mean
//! squared error gradient over every bar. There is no convergence check, the
//! requested number of iterations is always run unless the parameters stop
//! being finite.

use super::candle::CandleSeries;
use crate::error::Error;

pub const DEFAULT_PROGRESS_CADENCE: u64 = 100_000;

/// Five-minute bars in a regular trading session.
pub const BARS_PER_SESSION: usize = 78;

/// Learning rate and iteration count for a fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Schedule {
    pub learning_rate: f64,
    pub iterations: u64,
}

impl Schedule {
    /// Rule of thumb for five-minute bars: longer series need a smaller rate
    /// and more iterations to converge without diverging.
    pub fn for_len(len: usize) -> Self {
        let (learning_rate, iterations) = if len <= 2 * BARS_PER_SESSION {
            (1e-4, 500_000)
        } else if len <= 5 * BARS_PER_SESSION {
            (1e-5, 1_000_000)
        } else {
            (1e-6, 10_000_000)
        };

        Self {
            learning_rate,
            iterations,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub iteration: u64,
    pub remaining: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trendline {
    pub intercept: f64,
    pub slope: f64,
    /// One value per candle
    pub fitted: Vec<f64>,
}

pub fn fit_linear_regression(
    series: &CandleSeries,
    learning_rate: f64,
    iterations: u64,
) -> Result<Trendline, Error> {
    fit_linear_regression_with_progress(
        series,
        learning_rate,
        iterations,
        DEFAULT_PROGRESS_CADENCE,
        |_| {},
    )
}

/// Same as [`fit_linear_regression`], calling `on_progress` every `cadence`
/// iterations starting with the first one.
pub fn fit_linear_regression_with_progress<F>(
    series: &CandleSeries,
    learning_rate: f64,
    iterations: u64,
    cadence: u64,
    mut on_progress: F,
) -> Result<Trendline, Error>
where
    F: FnMut(Progress),
{
    if !learning_rate.is_finite() || learning_rate <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "learning rate must be a positive number, got {}",
            learning_rate
        )));
    }
    if cadence == 0 {
        return Err(Error::InvalidParameter(
            "progress cadence must be positive".to_string(),
        ));
    }
    if series.len() < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            found: series.len(),
        });
    }

    let closes = series.closes().collect::<Vec<f64>>();
    let n = closes.len() as f64;

    let (mut intercept, mut slope) = (0.0_f64, 0.0_f64);
    for iteration in 0..iterations {
        if iteration % cadence == 0 {
            on_progress(Progress {
                iteration,
                remaining: iterations - iteration,
            });
        }

        let (mut residual_sum, mut weighted_sum) = (0.0, 0.0);
        for (x, y) in closes.iter().enumerate() {
            let x = x as f64;
            let residual = y - (slope * x + intercept);
            residual_sum += residual;
            weighted_sum += x * residual;
        }

        let gradient_intercept = -(2.0 / n) * residual_sum;
        let gradient_slope = -(2.0 / n) * weighted_sum;
        intercept -= learning_rate * gradient_intercept;
        slope -= learning_rate * gradient_slope;

        if !intercept.is_finite() || !slope.is_finite() {
            log::debug!(
                "Regression diverged at iteration {}: intercept {}, slope {}",
                iteration,
                intercept,
                slope
            );
            return Err(Error::NumericOverflow { iteration });
        }
    }

    let fitted = (0..closes.len())
        .map(|x| slope * x as f64 + intercept)
        .collect::<Vec<f64>>();

    if fitted.iter().any(|value| !value.is_finite()) {
        return Err(Error::NumericOverflow {
            iteration: iterations,
        });
    }

    Ok(Trendline {
        intercept,
        slope,
        fitted,
    })
}
