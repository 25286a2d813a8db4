//! Integration tests for the accuracy scorer.

use siglab_core::{
    compute_accuracy, AccuracyResult, Bar, ConfigError, EngineError, Position, PriceSeries,
    SignalPoint, SignalSeries,
};

fn prices(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: i as i64 * 3_600_000,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

#[test]
fn rising_prices_all_long_is_perfect() {
    let px = prices(&[100.0, 101.0, 102.5, 103.0, 110.0, 111.0]);
    let sig = SignalSeries::from_dense(&px, vec![Position::Long; px.len()]).unwrap();
    let result = compute_accuracy(&px, &sig, 1).unwrap();
    assert_eq!(result.accuracy, 1.0);
    assert_eq!(result.samples, sig.len() - 1);
    assert_eq!(result.hits, result.samples);
    assert_eq!(result.by_side.long.n, result.samples);
    assert_eq!(result.by_side.short.n, 0);
}

#[test]
fn empty_signal_series_is_all_zero() {
    let px = prices(&[100.0, 101.0, 102.0]);
    let result = compute_accuracy(&px, &SignalSeries::default(), 24).unwrap();
    assert_eq!(result, AccuracyResult::default());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "samples": 0,
            "hits": 0,
            "accuracy": 0.0,
            "by_side": {"long": {"n": 0, "hits": 0}, "short": {"n": 0, "hits": 0}}
        })
    );
}

#[test]
fn empty_price_series_is_all_zero() {
    let sig = SignalSeries::new(vec![SignalPoint::new(0, Position::Long)]).unwrap();
    let result = compute_accuracy(&PriceSeries::default(), &sig, 1).unwrap();
    assert_eq!(result.samples, 0);
    assert_eq!(result.accuracy, 0.0);
}

#[test]
fn horizon_longer_than_series_drops_everything() {
    let px = prices(&[1.0, 2.0, 3.0]);
    let sig = SignalSeries::from_dense(&px, vec![Position::Long; 3]).unwrap();
    let result = compute_accuracy(&px, &sig, 3).unwrap();
    assert_eq!(result.samples, 0);
}

#[test]
fn horizon_two_uses_close_two_bars_ahead() {
    // bar 0 -> bar 2 falls even though bar 1 rises
    let px = prices(&[10.0, 12.0, 9.0]);
    let sig = SignalSeries::new(vec![SignalPoint::new(0, Position::Short)]).unwrap();
    let result = compute_accuracy(&px, &sig, 2).unwrap();
    assert_eq!(result.samples, 1);
    assert_eq!(result.hits, 1);
    assert_eq!(result.by_side.short.hits, 1);
}

#[test]
fn zero_horizon_rejected_before_data_checks() {
    let err = compute_accuracy(&PriceSeries::default(), &SignalSeries::default(), 0).unwrap_err();
    assert_eq!(err, EngineError::Config(ConfigError::NonPositiveHorizon));
}

#[test]
fn zero_base_close_fails() {
    let decoded = serde_json::from_str::<PriceSeries>(
        r#"{"bars":[
            {"ts":0,"open":1.0,"high":1.0,"low":1.0,"close":0.0,"volume":0.0},
            {"ts":1,"open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":0.0}
        ]}"#,
    );
    let err = decoded.unwrap_err();
    assert!(err.to_string().contains("invalid bar at ts 0"), "{err}");
}
