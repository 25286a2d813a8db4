//! Equity-curve statistics.

/// Largest peak-to-trough decline, as an absolute equity difference.
///
/// `max_i(running_max(eq[0..=i]) - eq[i])`. Always >= 0; 0.0 for curves
/// shorter than two points.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        let dd = peak - eq;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}
