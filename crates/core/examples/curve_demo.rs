//! Example walking through one editor refresh cycle
//!
//! Run with: cargo run --package simpleeq-core --example curve_demo

use simpleeq_core::domain::{
    AtomicParameterStore, EditorConfig, ParameterId, ParameterStore, ResponseCurveEditor,
    SharedSampleRate,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("simpleeq_core=debug,info")
        .init();

    println!("=== SimpleEQ Response Curve Demo ===\n");

    // 1. Configuration
    let config = EditorConfig {
        plot_width: 60,
        plot_height: 20,
        ..EditorConfig::default()
    };
    config.validate()?;
    println!(
        "1. Plot {}x{} px, {}..{} dB",
        config.plot_width, config.plot_height, config.min_db, config.max_db
    );

    // 2. Editor wired to a parameter store
    let store = Arc::new(AtomicParameterStore::default());
    let sample_rate = Arc::new(SharedSampleRate::new(config.default_sample_rate));
    let mut editor = ResponseCurveEditor::new(store.clone(), sample_rate, &config);

    // 3. Edit a few parameters like a user dragging sliders
    println!("\n2. Setting a +6 dB peak at 1 kHz and a 24 dB/oct low cut at 100 Hz");
    store.set(ParameterId::PeakFreq, 1000.0);
    store.set(ParameterId::PeakGain, 6.0);
    store.set(ParameterId::LowCutFreq, 100.0);
    store.set(ParameterId::LowCutSlope, 1.0);

    // 4. One timer tick rebuilds the curve
    let Some(curve) = editor.tick() else {
        return Err("expected a redraw".into());
    };

    println!("\n3. Sampled {} points:", curve.len());
    for point in curve.points().iter().step_by(6) {
        println!(
            "   {:>8.1} Hz  {:>+7.2} dB  y={:>6.2}",
            point.frequency_hz, point.gain_db, point.y
        );
    }

    // 5. Nothing changed, nothing to redraw
    println!("\n4. Second tick redraws: {}", editor.tick().is_some());

    Ok(())
}
