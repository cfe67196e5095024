//! Performance metrics: pure functions over return and equity series.
//!
//! No dependencies on the portfolio, queue or orchestrator.

use serde::{Deserialize, Deserializer, Serialize};

/// Annualized Sharpe ratio of a return series.
///
/// Sharpe = sqrt(periods_per_year) * mean(returns) / std(returns), using the
/// population standard deviation. `returns` are taken as excess returns; no
/// benchmark is subtracted here. The result is NaN or infinite when the
/// series is empty or has zero dispersion; callers decide how to treat that.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: u32) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    (periods_per_year as f64).sqrt() * mean(returns) / population_std(returns)
}

/// Drawdown series of an equity curve plus its extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawdowns {
    /// High-water mark minus equity, per step. Never negative.
    pub drawdown: Vec<f64>,
    /// Consecutive bars spent below the high-water mark, per step.
    pub duration: Vec<usize>,
    pub max_drawdown: f64,
    pub max_duration: usize,
}

/// Peak-to-trough drawdowns of an equity series.
///
/// The high-water mark is seeded with the first value, so the first step
/// always has zero drawdown. Durations are counted in bars.
pub fn drawdowns(equity: &[f64]) -> Drawdowns {
    let mut drawdown = Vec::with_capacity(equity.len());
    let mut duration = Vec::with_capacity(equity.len());
    let mut hwm = match equity.first() {
        Some(&first) => first,
        None => {
            return Drawdowns {
                drawdown,
                duration,
                max_drawdown: 0.0,
                max_duration: 0,
            }
        }
    };

    let mut max_drawdown = 0.0_f64;
    let mut max_duration = 0;
    let mut run = 0;
    for &value in equity {
        hwm = hwm.max(value);
        let dd = hwm - value;
        run = if dd == 0.0 { 0 } else { run + 1 };
        max_drawdown = max_drawdown.max(dd);
        max_duration = max_duration.max(run);
        drawdown.push(dd);
        duration.push(run);
    }

    Drawdowns {
        drawdown,
        duration,
        max_drawdown,
        max_duration,
    }
}

/// Headline statistics of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Final equity index minus one, as a fraction.
    pub total_return: f64,
    /// Non-finite values serialize as JSON `null` and read back as NaN.
    #[serde(deserialize_with = "nan_when_null")]
    pub sharpe_ratio: f64,
    /// Largest drop from the high-water mark of the equity index.
    pub max_drawdown: f64,
    /// Longest stretch below the high-water mark, in bars.
    pub drawdown_duration: usize,
}

impl SummaryStats {
    /// The report mapping handed to reporting sinks.
    pub fn report(&self) -> StatsReport {
        StatsReport {
            total_return: format!("{:.2}%", self.total_return * 100.0),
            sharpe_ratio: self.sharpe_ratio.is_finite().then_some(self.sharpe_ratio),
            max_drawdown: format!("{:.2}%", self.max_drawdown * 100.0),
            drawdown_duration: self.drawdown_duration,
        }
    }
}

/// Display form of [`SummaryStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    #[serde(rename = "Total Return")]
    pub total_return: String,
    /// `None` when the ratio is undefined (flat or empty return series).
    #[serde(rename = "Sharpe Ratio")]
    pub sharpe_ratio: Option<f64>,
    #[serde(rename = "Max Drawdown")]
    pub max_drawdown: String,
    #[serde(rename = "Drawdown Duration")]
    pub drawdown_duration: usize,
}

// ─── Helpers ────────────────────────────────────────────────────────

fn nan_when_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
