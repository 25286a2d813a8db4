//! Event-driven backtest — single pass over aligned closes and position intents.
//!
//! Per bar `i >= 1`, the position held over `(i-1, i]` earns
//! `pos * (close[i] - close[i-1]) / close[i-1]`. A requested change charges the
//! per-leg rate `(fee_bps + slippage_bps) / 1e4` once for closing a non-flat
//! position and once more for the change itself, so a flip or a flatten costs
//! two legs and an entry from flat costs one.
//!
//! Bar 0 only seeds the equity curve at 1.0.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Position, PriceSeries, SignalSeries, Trade, TradeSide};
use crate::error::{ConfigError, DataError, EngineError};
use crate::metrics::max_drawdown;

/// Outcome of one backtest call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Cumulative fractional return (not currency).
    pub total_pnl: f64,
    /// Peak-to-trough decline on the equity curve, >= 0.
    pub max_drawdown: f64,
    pub n_trades: usize,
    pub trades: Vec<Trade>,
    /// `1.0 + cumulative pnl` per bar; same length as the price series.
    pub equity_curve: Vec<f64>,
}

impl BacktestResult {
    fn empty(n_bars: usize) -> Self {
        Self {
            total_pnl: 0.0,
            max_drawdown: 0.0,
            n_trades: 0,
            trades: Vec::new(),
            equity_curve: if n_bars == 0 { Vec::new() } else { vec![1.0] },
        }
    }
}

/// Per-leg cost rate in return units.
pub fn cost_rate(fee_bps: f64, slippage_bps: f64) -> Result<f64, ConfigError> {
    check_cost("fee_bps", fee_bps)?;
    check_cost("slippage_bps", slippage_bps)?;
    Ok((fee_bps + slippage_bps) / 1e4)
}

fn check_cost(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCost { name, value })
    }
}

/// Run the backtest over `prices` with one position intent per bar.
pub fn run_backtest(
    prices: &PriceSeries,
    signals: &[Position],
    fee_bps: f64,
    slippage_bps: f64,
) -> Result<BacktestResult, EngineError> {
    let rate = cost_rate(fee_bps, slippage_bps)?;
    if signals.len() != prices.len() {
        return Err(DataError::LengthMismatch {
            prices: prices.len(),
            signals: signals.len(),
        }
        .into());
    }

    let bars = prices.bars();
    if bars.len() < 2 {
        return Ok(BacktestResult::empty(bars.len()));
    }

    let mut position = Position::Flat;
    let mut pnl = 0.0_f64;
    let mut equity_curve = Vec::with_capacity(bars.len());
    equity_curve.push(1.0);
    let mut trades = Vec::new();

    for i in 1..bars.len() {
        let prev = &bars[i - 1];
        let curr = &bars[i];
        if !prev.close.is_finite() || prev.close <= 0.0 {
            return Err(DataError::NonPositivePrice {
                index: i - 1,
                timestamp: prev.timestamp,
                close: prev.close,
            }
            .into());
        }
        if !curr.close.is_finite() {
            return Err(DataError::NonPositivePrice {
                index: i,
                timestamp: curr.timestamp,
                close: curr.close,
            }
            .into());
        }

        let holding = if position.is_flat() {
            0.0
        } else {
            position.as_f64() * (curr.close - prev.close) / prev.close
        };

        let desired = signals[i];
        if desired != position {
            let exit_cost = if position.is_flat() { 0.0 } else { rate };
            pnl += holding - exit_cost;
            position = desired;
            if let Some(side) = TradeSide::opening(desired) {
                trades.push(Trade {
                    timestamp: curr.timestamp,
                    side,
                    price: curr.close,
                    size: 1.0,
                });
            }
            pnl -= rate;
        } else {
            pnl += holding;
        }
        equity_curve.push(1.0 + pnl);
    }

    let max_drawdown = max_drawdown(&equity_curve);
    debug!(
        bars = bars.len(),
        trades = trades.len(),
        total_pnl = pnl,
        max_drawdown,
        "backtest complete"
    );

    Ok(BacktestResult {
        total_pnl: pnl,
        max_drawdown,
        n_trades: trades.len(),
        trades,
        equity_curve,
    })
}

/// Backtest a sparse signal series: missing bars are flat.
pub fn run_backtest_sparse(
    prices: &PriceSeries,
    signals: &SignalSeries,
    fee_bps: f64,
    slippage_bps: f64,
) -> Result<BacktestResult, EngineError> {
    let aligned = signals.align_to(prices);
    run_backtest(prices, &aligned, fee_bps, slippage_bps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, SignalPoint};

    fn series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: i as i64 * 60_000,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn pos(raw: &[i64]) -> Vec<Position> {
        raw.iter().map(|&v| Position::try_from(v).unwrap()).collect()
    }

    #[test]
    fn empty_and_single_bar() {
        let r = run_backtest(&series(&[]), &[], 10.0, 5.0).unwrap();
        assert!(r.equity_curve.is_empty());
        assert_eq!(r.total_pnl, 0.0);

        let r = run_backtest(&series(&[100.0]), &pos(&[1]), 10.0, 5.0).unwrap();
        assert_eq!(r.equity_curve, vec![1.0]);
        assert!(r.trades.is_empty());
        assert_eq!(r.max_drawdown, 0.0);
    }

    #[test]
    fn entry_from_flat_charges_one_leg() {
        let r = run_backtest(&series(&[100.0, 100.0]), &pos(&[0, 1]), 10.0, 5.0).unwrap();
        assert!((r.total_pnl + 0.0015).abs() < 1e-15);
        assert_eq!(r.trades.len(), 1);
        assert_eq!(r.trades[0].side, TradeSide::Buy);
    }

    #[test]
    fn flip_charges_two_legs() {
        let r = run_backtest(&series(&[100.0, 100.0, 100.0]), &pos(&[0, 1, -1]), 10.0, 0.0)
            .unwrap();
        // entry: 1 leg, flip: 2 legs
        assert!((r.total_pnl + 0.003).abs() < 1e-15);
        assert_eq!(r.n_trades, 2);
        assert_eq!(r.trades[1].side, TradeSide::Sell);
    }

    #[test]
    fn flatten_charges_two_legs_and_emits_nothing() {
        let r = run_backtest(&series(&[100.0, 100.0, 100.0]), &pos(&[0, 1, 0]), 0.0, 10.0)
            .unwrap();
        assert!((r.total_pnl + 0.003).abs() < 1e-15);
        assert_eq!(r.trades.len(), 1);
    }

    #[test]
    fn holding_return_accrues_for_short() {
        let r = run_backtest(&series(&[100.0, 100.0, 90.0]), &pos(&[0, -1, -1]), 0.0, 0.0)
            .unwrap();
        assert!((r.total_pnl - 0.1).abs() < 1e-12);
        assert_eq!(r.equity_curve.len(), 3);
    }

    #[test]
    fn first_bar_signal_is_ignored() {
        let r = run_backtest(&series(&[100.0, 110.0]), &pos(&[1, 0]), 0.0, 0.0).unwrap();
        assert_eq!(r.total_pnl, 0.0);
        assert!(r.trades.is_empty());
    }

    #[test]
    fn length_mismatch_is_data_error() {
        let err = run_backtest(&series(&[1.0, 2.0]), &pos(&[0]), 0.0, 0.0).unwrap_err();
        assert_eq!(
            err,
            EngineError::Data(DataError::LengthMismatch { prices: 2, signals: 1 })
        );
    }

    #[test]
    fn negative_cost_is_config_error() {
        let err = run_backtest(&series(&[1.0, 2.0]), &pos(&[0, 0]), -1.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::InvalidCost { name: "fee_bps", .. })
        ));
    }

    #[test]
    fn sparse_signals_align_to_prices() {
        let px = series(&[100.0, 110.0, 121.0]);
        let sig = SignalSeries::new(vec![SignalPoint::new(60_000, Position::Long)]).unwrap();
        // long at bar 1, flattened at bar 2 (missing point = flat)
        let r = run_backtest_sparse(&px, &sig, 0.0, 0.0).unwrap();
        assert!((r.total_pnl - 0.1).abs() < 1e-12);
        assert_eq!(r.trades.len(), 1);
    }
}
