//! Filter stages, cut chains and the mono processing chain
//!
//! A cut filter is modelled as a fixed set of [`MAX_CUT_STAGES`] cascaded
//! biquads where only the first `selected_order` stages are active. The
//! remaining stages stay bypassed and never contribute magnitude, which is
//! how a variable slope fits into a fixed-size chain.

use crate::domain::coefficients::{butterworth_highpass, butterworth_lowpass, BiquadCoeffs};
use crate::domain::parameters::ChainSettings;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Maximum number of cascaded biquads in a cut chain (48 dB/octave)
pub const MAX_CUT_STAGES: usize = 4;

/// Highest usable high-pass cutoff as a fraction of Nyquist
const MAX_CUTOFF_RATIO: f64 = 0.99;

/// Source of a single stage's analytical magnitude response
///
/// Implementations must be pure: the sampler calls this from the UI thread
/// while the audio side may be building the next set of coefficients.
pub trait MagnitudeResponse: Send + Sync + fmt::Debug {
    /// Linear gain at `frequency` (Hz) for the given sample rate
    fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64;
}

/// One cascaded filter element
#[derive(Debug, Clone)]
pub struct FilterStage {
    bypassed: bool,
    coefficients: Arc<dyn MagnitudeResponse>,
}

impl FilterStage {
    /// Create an active stage
    pub fn new(coefficients: Arc<dyn MagnitudeResponse>) -> Self {
        Self {
            bypassed: false,
            coefficients,
        }
    }

    /// Create a bypassed stage with unity coefficients
    pub fn bypassed() -> Self {
        Self {
            bypassed: true,
            coefficients: Arc::new(BiquadCoeffs::UNITY),
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Linear gain of this stage alone
    ///
    /// Only meaningful for active stages; aggregation skips bypassed ones.
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        debug_assert!(!self.bypassed, "queried a bypassed stage");
        self.coefficients.magnitude_at(frequency, sample_rate)
    }
}

/// Ordered sequence of stages with a selected order
#[derive(Debug, Clone)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
    selected_order: usize,
}

impl FilterChain {
    /// Cut chain with all [`MAX_CUT_STAGES`] stages bypassed
    pub fn cut() -> Self {
        Self {
            stages: vec![FilterStage::bypassed(); MAX_CUT_STAGES],
            selected_order: 0,
        }
    }

    /// Cut chain whose first stages take the given sections
    ///
    /// Sections beyond [`MAX_CUT_STAGES`] are ignored.
    pub fn cut_from_sections<I>(sections: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn MagnitudeResponse>>,
    {
        let mut chain = Self::cut();
        let mut order = 0;
        for (index, coefficients) in sections.into_iter().take(MAX_CUT_STAGES).enumerate() {
            chain.stages[index] = FilterStage::new(coefficients);
            order = index + 1;
        }
        chain.selected_order = order;
        chain
    }

    /// Chain holding exactly one active stage (the peak band)
    pub fn single(coefficients: Arc<dyn MagnitudeResponse>) -> Self {
        Self {
            stages: vec![FilterStage::new(coefficients)],
            selected_order: 1,
        }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn selected_order(&self) -> usize {
        self.selected_order
    }

    /// Activate the first `order` stages and bypass the rest
    ///
    /// `order` is clamped to the chain's capacity.
    pub fn set_order(&mut self, order: usize) {
        let order = order.min(self.stages.len());
        for (index, stage) in self.stages.iter_mut().enumerate() {
            stage.bypassed = index >= order;
        }
        self.selected_order = order;
    }

    /// Replace the coefficients of one stage
    pub fn set_stage_coefficients(
        &mut self,
        index: usize,
        coefficients: Arc<dyn MagnitudeResponse>,
    ) {
        if let Some(stage) = self.stages.get_mut(index) {
            stage.coefficients = coefficients;
        }
    }

    /// Bypass or re-enable a single stage
    ///
    /// Stages at or beyond the selected order always stay bypassed.
    pub fn set_stage_bypassed(&mut self, index: usize, bypassed: bool) {
        let selected_order = self.selected_order;
        if let Some(stage) = self.stages.get_mut(index) {
            if index >= selected_order && !bypassed {
                trace!(index, selected_order, "Ignoring enable beyond selected order");
                return;
            }
            stage.bypassed = bypassed;
        }
    }

    /// Product of all active stage magnitudes (1.0 when fully bypassed)
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        self.stages
            .iter()
            .filter(|stage| !stage.is_bypassed())
            .fold(1.0, |mag, stage| mag * stage.magnitude_at(frequency, sample_rate))
    }
}

/// Compound linear magnitude over several chains
///
/// Chains are walked in the given order and stages in chain order, so the
/// floating-point result is reproducible for a fixed argument order.
pub fn aggregate_magnitude(chains: &[&FilterChain], frequency: f64, sample_rate: f64) -> f64 {
    chains
        .iter()
        .fold(1.0, |mag, chain| mag * chain.magnitude_at(frequency, sample_rate))
}

/// Position of a sub-chain inside the processing chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

/// Full mono signal path: low-cut, peak, high-cut
#[derive(Debug, Clone)]
pub struct ProcessingChain {
    low_cut: FilterChain,
    peak: FilterChain,
    high_cut: FilterChain,
}

impl Default for ProcessingChain {
    fn default() -> Self {
        Self {
            low_cut: FilterChain::cut(),
            peak: FilterChain::single(Arc::new(BiquadCoeffs::UNITY)),
            high_cut: FilterChain::cut(),
        }
    }
}

impl ProcessingChain {
    pub fn new(low_cut: FilterChain, peak: FilterChain, high_cut: FilterChain) -> Self {
        Self {
            low_cut,
            peak,
            high_cut,
        }
    }

    /// Derive every stage from the current parameter values
    pub fn from_settings(settings: &ChainSettings, sample_rate: f64) -> Self {
        let peak = BiquadCoeffs::peaking(
            sample_rate,
            settings.peak_freq,
            settings.peak_gain_db,
            settings.peak_quality,
        );

        let nyquist = sample_rate / 2.0;

        let low_order = 2 * settings.low_cut_slope.stage_count();
        let low_freq = settings.low_cut_freq.min(nyquist * MAX_CUTOFF_RATIO);
        let low_cut = FilterChain::cut_from_sections(
            butterworth_highpass(sample_rate, low_freq, low_order)
                .into_iter()
                .map(|c| Arc::new(c) as Arc<dyn MagnitudeResponse>),
        );

        // A low-pass at or above Nyquist passes the whole band
        let high_order = 2 * settings.high_cut_slope.stage_count();
        let high_sections = if settings.high_cut_freq < nyquist {
            butterworth_lowpass(sample_rate, settings.high_cut_freq, high_order)
        } else {
            trace!(
                freq = settings.high_cut_freq,
                nyquist,
                "High cut above Nyquist, stages pass through"
            );
            vec![BiquadCoeffs::UNITY; high_order / 2]
        };
        let high_cut = FilterChain::cut_from_sections(
            high_sections
                .into_iter()
                .map(|c| Arc::new(c) as Arc<dyn MagnitudeResponse>),
        );

        debug!(
            sample_rate,
            low_cut_stages = low_cut.selected_order(),
            high_cut_stages = high_cut.selected_order(),
            "Processing chain rebuilt: peak {:.1}dB@{:.0}Hz Q={:.2}",
            settings.peak_gain_db,
            settings.peak_freq,
            settings.peak_quality
        );

        Self::new(low_cut, FilterChain::single(Arc::new(peak)), high_cut)
    }

    pub fn get(&self, position: ChainPosition) -> &FilterChain {
        match position {
            ChainPosition::LowCut => &self.low_cut,
            ChainPosition::Peak => &self.peak,
            ChainPosition::HighCut => &self.high_cut,
        }
    }

    pub fn get_mut(&mut self, position: ChainPosition) -> &mut FilterChain {
        match position {
            ChainPosition::LowCut => &mut self.low_cut,
            ChainPosition::Peak => &mut self.peak,
            ChainPosition::HighCut => &mut self.high_cut,
        }
    }

    /// Sub-chains in signal order
    pub fn chains(&self) -> [&FilterChain; 3] {
        [&self.low_cut, &self.peak, &self.high_cut]
    }

    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        aggregate_magnitude(&self.chains(), frequency, sample_rate)
    }
}
