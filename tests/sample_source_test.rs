//! Sensor buffer, drain and configuration behavior.

use sensor_daq::config::SensorConfig;
use sensor_daq::sensor::{CollectPolicy, LimitMode, ValueMode};
use sensor_daq::{DaqError, SampleSource};
use std::time::Duration;

fn source(capacity: usize) -> SampleSource {
    SampleSource::new(SensorConfig {
        buffer_capacity: capacity,
        value_mode: ValueMode::Deterministic,
        period_ms: 2,
        seed: Some(7),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn buffer_never_exceeds_capacity() {
    let s = source(4);
    for _ in 0..50 {
        s.tick();
        assert!(s.len() <= 4);
    }
    assert_eq!(s.len(), 4);
}

#[test]
fn shrinking_keeps_most_recent_samples() {
    let s = source(10);
    let produced: Vec<f64> = (0..10).map(|_| s.tick()).collect();
    s.set_buffer_capacity(3).unwrap();
    assert_eq!(s.buffer(), produced[7..].to_vec());

    s.set_buffer_capacity(8).unwrap();
    assert_eq!(s.buffer(), produced[7..].to_vec());
}

#[test]
fn decoupled_collect_is_empty_or_recent_copy() {
    let s = source(6);
    assert!(s.collect_data(2).is_empty());

    let produced: Vec<f64> = (0..5).map(|_| s.tick()).collect();
    assert!(s.collect_data(6).is_empty());
    assert_eq!(s.collect_data(2), produced[3..].to_vec());
    assert!(s.collect_data(0).is_empty());

    // Reads never consume or resize.
    assert_eq!(s.len(), 5);
    assert_eq!(s.settings().buffer_capacity, 6);
}

#[test]
fn coupled_collect_resizes_first() {
    let s = source(6);
    s.set_collect_policy(CollectPolicy::Coupled);
    let produced: Vec<f64> = (0..6).map(|_| s.tick()).collect();

    let batch = s.collect_data(4);
    assert_eq!(batch, produced[2..].to_vec());
    assert_eq!(s.settings().buffer_capacity, 4);
    assert_eq!(s.len(), 4);
}

#[test]
fn deterministic_values_are_a_repeatable_sawtooth() {
    let a = source(64);
    let b = source(64);
    let first: Vec<f64> = (0..40).map(|_| a.tick()).collect();
    let second: Vec<f64> = (0..40).map(|_| b.tick()).collect();
    assert_eq!(first, second);

    assert_eq!(first[0], 0.0);
    assert_eq!(first[19], 100.0);
    assert_eq!(first[20], 0.0);
    assert!(first[..20].windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn random_values_stay_within_bounds() {
    let s = SampleSource::new(SensorConfig {
        lower_bound: -5.0,
        upper_bound: 5.0,
        buffer_capacity: 200,
        seed: Some(42),
        ..Default::default()
    })
    .unwrap();
    for _ in 0..200 {
        let v = s.tick();
        assert!((-5.0..=5.0).contains(&v), "{v} out of range");
    }

    s.set_limit_mode(LimitMode::Unbounded);
    let wide = (0..200).map(|_| s.tick()).any(|v| v.abs() > 5.0);
    assert!(wide);
}

#[test]
fn rejected_settings_leave_state_untouched() {
    let s = source(5);
    let before = s.settings();

    assert!(s.configure("lowerbound", "100").is_err());
    assert!(s.configure("upperbound", "-1").is_err());
    assert!(s.configure("period", "0").is_err());
    assert!(s.configure("minperiod", "5000").is_err());
    assert!(s.configure("maxperiod", "50").is_err());
    assert!(s.configure("databuffersize", "0").is_err());
    assert!(s.configure("timing", "7").is_err());
    assert!(matches!(
        s.configure("gain", "1"),
        Err(DaqError::UnknownOption { .. })
    ));

    assert_eq!(s.settings(), before);
}

#[test]
fn extreme_bounds_are_declined_and_values_stay_finite() {
    let s = SampleSource::new(SensorConfig {
        seed: Some(3),
        ..Default::default()
    })
    .unwrap();
    s.configure("lowerbound", "-1e308").unwrap();
    let err = s.configure("upperbound", "1e308").unwrap_err();
    assert!(err.is_rejection());
    assert!(s.set_bounds(-1e308, 1e308).is_err());

    s.set_bounds(-2.0, 2.0).unwrap();
    for mode in ["0", "1"] {
        s.configure("valuetype", mode).unwrap();
        for _ in 0..20 {
            let v = s.tick();
            assert!((-2.0..=2.0).contains(&v), "{v} out of range");
        }
    }
}

#[test]
fn configure_accepts_codes_and_names() {
    let s = source(5);
    s.configure("timing", "0").unwrap();
    s.configure("valuetype", "random").unwrap();
    s.configure("limit", "1").unwrap();
    s.configure("lowerbound", "-10").unwrap();
    s.configure("maxperiod", "3000").unwrap();

    let settings = s.settings();
    assert_eq!(settings.value_mode, ValueMode::Random);
    assert_eq!(settings.limit, LimitMode::Unbounded);
    assert_eq!(settings.lower_bound, -10.0);
    assert_eq!(settings.max_period_ms, 3000);
}

#[tokio::test]
async fn generation_fills_buffer_and_stops() {
    let s = source(8);
    s.start_generation().unwrap();
    assert!(matches!(
        s.start_generation(),
        Err(DaqError::GenerationAlreadyRunning)
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(s.is_ready());
    assert!(!s.is_empty());

    s.stop_generation().await.unwrap();
    assert!(!s.is_generating());

    let len = s.len();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(s.len(), len);

    assert!(matches!(
        s.stop_generation().await,
        Err(DaqError::GenerationNotRunning)
    ));
}

#[tokio::test]
async fn generation_can_restart() {
    let s = source(8);
    s.start_generation().unwrap();
    s.stop_generation().await.unwrap();
    s.start_generation().unwrap();
    assert!(s.is_generating());
    s.stop_generation().await.unwrap();
}
