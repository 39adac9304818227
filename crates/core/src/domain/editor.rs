//! Response curve editor: the redraw side of the plugin UI
//!
//! The editor listens for parameter changes, and on each timer tick
//! rebuilds the processing chain from the current parameter values,
//! publishes it and resamples the response curve. Ticks without a
//! pending change are free.

use crate::domain::chain::ProcessingChain;
use crate::domain::config::EditorConfig;
use crate::domain::parameters::{ParameterId, ParameterStore};
use crate::domain::response::{CurveSampler, PlotArea, ResponseCurve};
use crate::domain::sync::{ChainSnapshot, ChangeGate};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Supplies the audio engine's current sample rate
pub trait SampleRateSource: Send + Sync {
    fn current_sample_rate(&self) -> f64;
}

/// Sample rate that the audio engine can update from its own thread
#[derive(Debug)]
pub struct SharedSampleRate(AtomicU64);

impl SharedSampleRate {
    pub fn new(sample_rate: f64) -> Self {
        Self(AtomicU64::new(sample_rate.to_bits()))
    }

    pub fn set(&self, sample_rate: f64) {
        self.0.store(sample_rate.to_bits(), Ordering::Release);
    }
}

impl SampleRateSource for SharedSampleRate {
    fn current_sample_rate(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

fn is_valid_sample_rate(sample_rate: f64) -> bool {
    sample_rate > 0.0 && sample_rate.is_finite()
}

/// Owns the curve shown in the plot area
pub struct ResponseCurveEditor {
    parameters: Arc<dyn ParameterStore>,
    sample_rate: Arc<dyn SampleRateSource>,
    snapshot: Arc<ChainSnapshot>,
    gate: Arc<ChangeGate>,
    sampler: CurveSampler,
    area: PlotArea,
    curve: ResponseCurve,
}

impl ResponseCurveEditor {
    /// Create an editor and register it for parameter changes
    ///
    /// The editor starts dirty so the first tick always draws.
    pub fn new(
        parameters: Arc<dyn ParameterStore>,
        sample_rate: Arc<dyn SampleRateSource>,
        config: &EditorConfig,
    ) -> Self {
        let gate = Arc::new(ChangeGate::new(true));
        parameters.add_listener(gate.clone());

        Self {
            parameters,
            sample_rate,
            snapshot: Arc::new(ChainSnapshot::default()),
            gate,
            sampler: config.sampler(),
            area: config.plot_area(),
            curve: ResponseCurve::default(),
        }
    }

    /// Change notification entry point for hosts that bypass the store
    pub fn parameter_changed(&self, id: ParameterId, value: f64) {
        debug!(parameter = id.as_str(), value, "Parameter change notified");
        self.gate.notify();
    }

    /// Gate shared with other notifiers
    pub fn change_gate(&self) -> Arc<ChangeGate> {
        Arc::clone(&self.gate)
    }

    /// Chain published by the last successful rebuild
    pub fn snapshot(&self) -> Arc<ChainSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// New plot bounds; the next tick resamples
    pub fn resized(&mut self, area: PlotArea) {
        if area != self.area {
            debug!(width = area.width, height = area.height, "Plot area resized");
            self.area = area;
            self.gate.notify();
        }
    }

    pub fn area(&self) -> PlotArea {
        self.area
    }

    /// Last curve built
    pub fn curve(&self) -> &ResponseCurve {
        &self.curve
    }

    /// Timer callback
    ///
    /// Returns the new curve when a change was pending, `None` otherwise.
    pub fn tick(&mut self) -> Option<&ResponseCurve> {
        if !self.gate.test_and_clear() {
            return None;
        }

        let sample_rate = self.sample_rate.current_sample_rate();
        if !is_valid_sample_rate(sample_rate) {
            warn!(sample_rate, "No valid sample rate yet, postponing redraw");
            self.gate.notify();
            return None;
        }

        let settings = self.parameters.chain_settings();
        self.snapshot
            .publish(ProcessingChain::from_settings(&settings, sample_rate));

        let chain = self.snapshot.load();
        self.curve = self.sampler.sample(&chain.chains(), sample_rate, self.area);
        debug!(points = self.curve.len(), sample_rate, "Response curve rebuilt");

        Some(&self.curve)
    }
}
