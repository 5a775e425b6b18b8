// Adaptive interval hysteresis tests

use netspeed::rate::{DEFAULT_FAST_INTERVAL, DEFAULT_SLOW_INTERVAL, IntervalController, MIB};
use std::time::Duration;

#[test]
fn oscillation_inside_band_never_switches() {
    let mut c = IntervalController::default();
    for i in 0..50 {
        let rate = if i % 2 == 0 { 1.0 * MIB } else { 1.05 * MIB };
        assert_eq!(c.observe(rate, 0.0), None);
    }
    assert!(!c.is_fast());

    // same band entered from the fast side
    assert!(c.observe(1.2 * MIB, 0.0).is_some());
    for i in 0..50 {
        let rate = if i % 2 == 0 { 1.0 * MIB } else { 1.05 * MIB };
        assert_eq!(c.observe(0.0, rate), None);
    }
    assert!(c.is_fast());
}

#[test]
fn high_then_low_switches_once_each_way() {
    let mut c = IntervalController::default();
    let rates = [0.2, 1.2, 1.3, 1.2, 1.0, 0.95, 0.8, 0.7, 0.85, 0.5];
    let switches: Vec<Duration> = rates
        .iter()
        .filter_map(|r| c.observe(r * MIB, 0.0))
        .collect();
    assert_eq!(switches, vec![DEFAULT_FAST_INTERVAL, DEFAULT_SLOW_INTERVAL]);
    assert!(!c.is_fast());
}

#[test]
fn custom_thresholds_and_intervals() {
    let mut c = IntervalController::new(
        Duration::from_millis(100),
        Duration::from_millis(2000),
        1000.0,
        500.0,
    );
    assert_eq!(c.current(), Duration::from_millis(2000));
    assert_eq!(c.observe(999.0, 0.0), None);
    assert_eq!(c.observe(1000.0, 0.0), Some(Duration::from_millis(100)));
    assert_eq!(c.current(), Duration::from_millis(100));
    assert_eq!(c.observe(501.0, 0.0), None);
    assert_eq!(c.observe(500.0, 0.0), Some(Duration::from_millis(2000)));
}
