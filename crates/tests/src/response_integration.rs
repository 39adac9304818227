//! Integration tests for the response engine
//!
//! These tests drive the full path from parameter values through chain
//! construction, snapshot publication and curve sampling, including the
//! cross-thread hand-off between parameter writers and the redraw poller.

use simpleeq_core::domain::{
    aggregate_magnitude, AtomicParameterStore, BiquadCoeffs, ChainSettings, ChainSnapshot,
    ChangeGate, CurveSampler, EditorConfig, FilterChain, FrequencyAxis, ParameterId,
    ParameterStore, PlotArea, ProcessingChain, ResponseCurveEditor, SharedSampleRate, Slope,
};
use simpleeq_tests::{amplitude_to_db, argmax, fixed_cut_chain};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const SAMPLE_RATE: f64 = 44100.0;

fn peak_only_chain(freq: f64, gain_db: f64, q: f64) -> ProcessingChain {
    ProcessingChain::new(
        FilterChain::cut(),
        FilterChain::single(Arc::new(BiquadCoeffs::peaking(SAMPLE_RATE, freq, gain_db, q))),
        FilterChain::cut(),
    )
}

// ============================================================================
// CURVE SAMPLING
// ============================================================================

#[test]
fn test_peak_scenario_end_to_end() {
    let chain = peak_only_chain(1000.0, 6.0, 1.0);
    let area = PlotArea::new(0, 0, 100, 200);
    let curve = CurveSampler::default().sample(&chain.chains(), SAMPLE_RATE, area);

    assert_eq!(curve.len(), 100);

    let gains: Vec<f64> = curve.points().iter().map(|p| p.gain_db).collect();
    let expected = FrequencyAxis::default()
        .pixel_for_frequency(1000.0, 100)
        .round() as usize;
    assert_eq!(argmax(&gains), Some(expected));
    assert!((gains[expected] - 6.0).abs() < 0.1, "peak {}", gains[expected]);

    assert!(gains[0].abs() < 0.1, "20 Hz end at {}", gains[0]);
    assert!(gains[99].abs() < 0.2, "20 kHz end at {}", gains[99]);

    // Highest gain is the smallest screen y
    let min_y = curve
        .points()
        .iter()
        .map(|p| p.y)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(curve.points()[expected].y, min_y);
}

#[test]
fn test_sampling_is_deterministic() {
    let settings = ChainSettings {
        peak_freq: 3150.0,
        peak_gain_db: -9.0,
        peak_quality: 4.0,
        low_cut_freq: 120.0,
        high_cut_freq: 9000.0,
        low_cut_slope: Slope::Db36,
        high_cut_slope: Slope::Db24,
    };
    let chain = ProcessingChain::from_settings(&settings, SAMPLE_RATE);
    let sampler = CurveSampler::default();
    let area = PlotArea::new(12, 34, 321, 123);

    let first = sampler.sample(&chain.chains(), SAMPLE_RATE, area);
    let second = sampler.sample(&chain.chains(), SAMPLE_RATE, area);
    assert_eq!(first, second);
    for (a, b) in first.points().iter().zip(second.points()) {
        assert_eq!(a.y.to_bits(), b.y.to_bits());
    }
}

#[test]
fn test_fully_bypassed_chains_are_flat() {
    let chain = ProcessingChain::new(FilterChain::cut(), FilterChain::cut(), FilterChain::cut());
    let area = PlotArea::new(0, 100, 256, 50);
    let curve = CurveSampler::default().sample(&chain.chains(), SAMPLE_RATE, area);

    for p in curve.points() {
        assert_eq!(aggregate_magnitude(&chain.chains(), p.frequency_hz, SAMPLE_RATE), 1.0);
        assert_eq!(p.gain_db, 0.0);
        assert_eq!(p.y, 125.0);
    }
}

#[test]
fn test_deep_cut_stays_finite() {
    let silent = fixed_cut_chain(&[0.0, 1.0]);
    let peak = fixed_cut_chain(&[2.0]);
    let area = PlotArea::new(0, 0, 16, 100);
    let curve = CurveSampler::default().sample(&[&silent, &peak], SAMPLE_RATE, area);

    assert!(curve.points().iter().all(|p| p.y.is_finite() && p.gain_db.is_finite()));
}

#[test]
fn test_cut_slopes_steepen_curve() {
    let axis = FrequencyAxis::default();
    let width = 300;
    let pixel_100hz = axis.pixel_for_frequency(100.0, width as usize).round() as usize;

    let mut previous = f64::INFINITY;
    for slope in Slope::ALL {
        let settings = ChainSettings {
            low_cut_freq: 400.0,
            low_cut_slope: slope,
            ..ChainSettings::default()
        };
        let chain = ProcessingChain::from_settings(&settings, SAMPLE_RATE);
        let area = PlotArea::new(0, 0, width, 100);
        let curve = CurveSampler::default().sample(&chain.chains(), SAMPLE_RATE, area);
        let gain = curve.points()[pixel_100hz].gain_db;
        assert!(gain < previous, "{slope:?}: {gain} !< {previous}");
        previous = gain;
    }
}

#[test]
fn test_chain_order_is_irrelevant_for_magnitude() {
    let low = fixed_cut_chain(&[0.9, 0.8, 0.7]);
    let peak = fixed_cut_chain(&[1.9953]);
    let high = fixed_cut_chain(&[0.5]);

    let a = aggregate_magnitude(&[&low, &peak, &high], 1000.0, SAMPLE_RATE);
    let b = aggregate_magnitude(&[&high, &low, &peak], 1000.0, SAMPLE_RATE);
    assert!((a - b).abs() < 1e-12);
    assert!((amplitude_to_db(a) - amplitude_to_db(0.9 * 0.8 * 0.7 * 1.9953 * 0.5)).abs() < 1e-9);
}

// ============================================================================
// EDITOR REFRESH CYCLE
// ============================================================================

#[test]
fn test_editor_tracks_latest_parameter_values() {
    let store = Arc::new(AtomicParameterStore::default());
    let config = EditorConfig {
        plot_width: 200,
        plot_height: 100,
        ..EditorConfig::default()
    };
    let sample_rate = Arc::new(SharedSampleRate::new(SAMPLE_RATE));
    let mut editor = ResponseCurveEditor::new(store.clone(), sample_rate, &config);
    assert!(editor.tick().is_some());

    for freq in [200.0, 800.0, 5000.0] {
        store.set(ParameterId::PeakFreq, freq);
    }
    store.set(ParameterId::PeakGain, 9.0);
    store.set(ParameterId::PeakQuality, 3.0);

    let curve = editor.tick().unwrap();
    let peak = curve.peak().unwrap();
    let ratio = peak.frequency_hz / 5000.0;
    assert!(ratio > 0.95 && ratio < 1.05, "peak at {} Hz", peak.frequency_hz);
    assert!(editor.tick().is_none());
}

#[test]
fn test_concurrent_writers_never_lose_final_change() {
    let store = Arc::new(AtomicParameterStore::default());
    let config = EditorConfig {
        plot_width: 64,
        plot_height: 64,
        ..EditorConfig::default()
    };
    let sample_rate = Arc::new(SharedSampleRate::new(SAMPLE_RATE));
    let mut editor = ResponseCurveEditor::new(store.clone(), sample_rate, &config);
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..2000 {
                store.set(ParameterId::PeakGain, f64::from(i % 48) - 24.0);
            }
            store.set(ParameterId::PeakGain, 18.0);
            store.set(ParameterId::PeakFreq, 1000.0);
            done.store(true, Ordering::Release);
        })
    };

    let mut redraws = 0;
    while !done.load(Ordering::Acquire) {
        if editor.tick().is_some() {
            redraws += 1;
        }
    }
    writer.join().unwrap();

    // The last writes happened before `done`, so a change is still pending
    // unless a tick after them already consumed it.
    if editor.tick().is_some() {
        redraws += 1;
    }
    assert!(redraws >= 1);

    let peak = editor.curve().peak().unwrap();
    assert!((peak.gain_db - 18.0).abs() < 1.0, "peak {}", peak.gain_db);
}

#[test]
fn test_snapshot_readers_see_whole_chains() {
    let snapshot = Arc::new(ChainSnapshot::new(peak_only_chain(1000.0, 0.0, 1.0)));
    let gains = [-12.0, -6.0, 0.0, 6.0, 12.0];

    let reader = {
        let snapshot = Arc::clone(&snapshot);
        thread::spawn(move || {
            for _ in 0..5000 {
                let chain = snapshot.load();
                let db = amplitude_to_db(chain.magnitude_at(1000.0, SAMPLE_RATE));
                assert!(
                    gains.iter().any(|g| (db - g).abs() < 1e-6),
                    "torn read: {db} dB"
                );
            }
        })
    };

    let mut round = 0;
    while !reader.is_finished() {
        let gain = gains[round % gains.len()];
        snapshot.publish(peak_only_chain(1000.0, gain, 1.0));
        round += 1;
    }

    reader.join().unwrap();
}

#[test]
fn test_gate_shared_between_notifiers() {
    let gate = Arc::new(ChangeGate::new(false));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                for _ in 0..100 {
                    gate.notify();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(gate.test_and_clear());
    assert!(!gate.test_and_clear());
}

#[tokio::test]
async fn test_config_drives_sampler() {
    let config = EditorConfig {
        min_db: -12.0,
        max_db: 12.0,
        plot_width: 10,
        plot_height: 100,
        ..EditorConfig::default()
    };
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("editor.toml");
    config.save_to_file(&path).await.unwrap();
    let loaded = EditorConfig::load_from_file(&path).await.unwrap();
    assert_eq!(loaded, config);

    let chain = peak_only_chain(1000.0, 12.0, 1.0);
    let curve = loaded
        .sampler()
        .sample(&chain.chains(), SAMPLE_RATE, loaded.plot_area());
    let top = curve.peak().unwrap();
    // +12 dB is the top edge under a +/-12 dB display range
    assert!(top.y < 5.0, "y = {}", top.y);
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn slope() -> impl Strategy<Value = Slope> {
        (0usize..4).prop_map(Slope::from_index)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_curve_is_finite_and_full_width(
            width in 0i32..400,
            peak_freq in 20.0f64..20000.0,
            peak_gain in -24.0f64..24.0,
            peak_q in 0.1f64..10.0,
            low_cut in 20.0f64..20000.0,
            high_cut in 20.0f64..20000.0,
            low_slope in slope(),
            high_slope in slope(),
            sample_rate in prop::sample::select(vec![44100.0, 48000.0, 96000.0]),
        ) {
            let settings = ChainSettings {
                peak_freq,
                peak_gain_db: peak_gain,
                peak_quality: peak_q,
                low_cut_freq: low_cut,
                high_cut_freq: high_cut,
                low_cut_slope: low_slope,
                high_cut_slope: high_slope,
            };
            let chain = ProcessingChain::from_settings(&settings, sample_rate);
            let area = PlotArea::new(0, 0, width, 100);
            let curve = CurveSampler::default().sample(&chain.chains(), sample_rate, area);

            prop_assert_eq!(curve.len(), width as usize);
            for (p, point) in curve.points().iter().enumerate() {
                prop_assert!(point.y.is_finite());
                prop_assert_eq!(point.x, p as f64);
            }
        }
    }
}
