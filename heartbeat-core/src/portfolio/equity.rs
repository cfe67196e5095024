//! Equity curve built from the holdings time series.

use serde::{Deserialize, Serialize};

use super::snapshot::HoldingsSnapshot;
use crate::event::Timestamp;
use crate::performance::{drawdowns, sharpe_ratio, SummaryStats};

/// One row of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: Timestamp,
    pub market_values: Vec<f64>,
    pub cash: f64,
    pub commission: f64,
    pub total: f64,
    /// Fractional change of `total` since the previous row (0.0 on the first).
    pub returns: f64,
    /// Cumulative product of `1 + returns`; 1.0 on the first row.
    pub equity_curve: f64,
    pub drawdown: f64,
}

/// Read-only equity curve of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    symbols: Vec<String>,
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    /// Derive returns, the normalized equity index and drawdowns.
    pub fn from_holdings(symbols: &[String], history: &[HoldingsSnapshot]) -> Self {
        let mut points: Vec<EquityPoint> = Vec::with_capacity(history.len());
        let mut previous_total: Option<f64> = None;
        let mut equity = 1.0;

        for snapshot in history {
            let total = snapshot.holdings.total;
            // Returns off a zero total are undefined. The step that wiped the
            // account already recorded -100% and pinned the index at 0, so
            // later rows record 0.0 and the index stays at 0.
            let returns = match previous_total {
                Some(prev) if prev != 0.0 => (total - prev) / prev,
                _ => 0.0,
            };
            equity *= 1.0 + returns;
            previous_total = Some(total);

            points.push(EquityPoint {
                timestamp: snapshot.timestamp,
                market_values: snapshot.holdings.market_values.clone(),
                cash: snapshot.holdings.cash,
                commission: snapshot.holdings.commission,
                total,
                returns,
                equity_curve: equity,
                drawdown: 0.0,
            });
        }

        let equity_series: Vec<f64> = points.iter().map(|p| p.equity_curve).collect();
        let dd = drawdowns(&equity_series);
        for (point, drawdown) in points.iter_mut().zip(dd.drawdown) {
            point.drawdown = drawdown;
        }

        Self {
            symbols: symbols.to_vec(),
            points,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> &[EquityPoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Period returns, excluding the seed row.
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().skip(1).map(|p| p.returns).collect()
    }

    /// Normalized equity index per row.
    pub fn equity(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity_curve).collect()
    }

    /// Total return, Sharpe ratio and drawdown statistics.
    pub fn summary_stats(&self, periods_per_year: u32) -> SummaryStats {
        let equity = self.equity();
        let dd = drawdowns(&equity);
        let final_equity = equity.last().copied().unwrap_or(1.0);
        SummaryStats {
            total_return: final_equity - 1.0,
            sharpe_ratio: sharpe_ratio(&self.returns(), periods_per_year),
            max_drawdown: dd.max_drawdown,
            drawdown_duration: dd.max_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::snapshot::Holdings;
    use chrono::{Duration, TimeZone, Utc};

    fn history(totals: &[f64]) -> Vec<HoldingsSnapshot> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        totals
            .iter()
            .enumerate()
            .map(|(i, &total)| HoldingsSnapshot {
                timestamp: start + Duration::days(i as i64),
                holdings: Holdings {
                    market_values: vec![0.0],
                    cash: total,
                    commission: 0.0,
                    total,
                },
            })
            .collect()
    }

    #[test]
    fn equity_index_starts_at_one() {
        let curve = EquityCurve::from_holdings(&["X".into()], &history(&[100.0, 110.0, 99.0]));
        let eq = curve.equity();
        assert_eq!(eq[0], 1.0);
        assert!((eq[1] - 1.1).abs() < 1e-12);
        assert!((eq[2] - 0.99).abs() < 1e-12);
        assert_eq!(curve.points()[0].returns, 0.0);
        assert!((curve.points()[2].returns + 0.1).abs() < 1e-12);
    }

    #[test]
    fn drawdown_column_matches_equity() {
        let curve = EquityCurve::from_holdings(&["X".into()], &history(&[100.0, 120.0, 90.0]));
        assert_eq!(curve.points()[1].drawdown, 0.0);
        assert!((curve.points()[2].drawdown - 0.3).abs() < 1e-12);
    }

    #[test]
    fn returns_skip_seed_row() {
        let curve = EquityCurve::from_holdings(&["X".into()], &history(&[100.0, 101.0, 102.0]));
        assert_eq!(curve.returns().len(), 2);
    }

    #[test]
    fn summary_stats_total_return() {
        let curve = EquityCurve::from_holdings(&["X".into()], &history(&[100.0, 105.0, 110.0]));
        let stats = curve.summary_stats(252);
        assert!((stats.total_return - 0.1).abs() < 1e-12);
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.drawdown_duration, 0);
    }

    #[test]
    fn wiped_out_account_stays_at_zero() {
        let curve =
            EquityCurve::from_holdings(&["X".into()], &history(&[100.0, 0.0, 50.0, 60.0]));
        let returns: Vec<f64> = curve.points().iter().map(|p| p.returns).collect();
        assert_eq!(returns[..3], [0.0, -1.0, 0.0]);
        assert!((returns[3] - 0.2).abs() < 1e-12);
        assert_eq!(curve.equity()[1..], [0.0, 0.0, 0.0]);

        let stats = curve.summary_stats(252);
        assert_eq!(stats.total_return, -1.0);
        assert_eq!(stats.max_drawdown, 1.0);
        assert!(stats.sharpe_ratio.is_finite());
    }

    #[test]
    fn tail_is_bounded() {
        let curve = EquityCurve::from_holdings(&["X".into()], &history(&[1.0, 2.0, 3.0]));
        assert_eq!(curve.tail(2).len(), 2);
        assert_eq!(curve.tail(10).len(), 3);
    }
}
