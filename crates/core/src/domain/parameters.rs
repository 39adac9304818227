//! Plugin parameters seen by the editor
//!
//! The editor binds seven controls to these parameters. Values live in a
//! [`ParameterStore`] that host automation and the UI may write from any
//! thread; listeners are told *that* something changed so the refresh
//! poller can rebuild the curve.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::trace;

pub type Result<T> = std::result::Result<T, ParameterError>;

/// Errors raised when addressing parameters by name or index
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid choice index {index} for {parameter}")]
    InvalidChoice { parameter: &'static str, index: usize },
}

/// Parameter constraints shared by the editor and the parameter model
pub mod ranges {
    /// Frequency range for cut and peak frequencies (Hz)
    pub const FREQ_MIN: f64 = 20.0;
    pub const FREQ_MAX: f64 = 20000.0;

    /// Peak gain range (dB)
    pub const GAIN_MIN: f64 = -24.0;
    pub const GAIN_MAX: f64 = 24.0;

    /// Peak quality range
    pub const Q_MIN: f64 = 0.1;
    pub const Q_MAX: f64 = 10.0;

    /// Default peak center frequency (Hz)
    pub const PEAK_FREQ_DEFAULT: f64 = 750.0;
}

/// Number of automatable parameters
pub const PARAMETER_COUNT: usize = 7;

/// Identity of an automatable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterId {
    LowCutFreq,
    HighCutFreq,
    LowCutSlope,
    HighCutSlope,
    PeakFreq,
    PeakGain,
    PeakQuality,
}

impl ParameterId {
    pub const ALL: [ParameterId; PARAMETER_COUNT] = [
        ParameterId::LowCutFreq,
        ParameterId::HighCutFreq,
        ParameterId::LowCutSlope,
        ParameterId::HighCutSlope,
        ParameterId::PeakFreq,
        ParameterId::PeakGain,
        ParameterId::PeakQuality,
    ];

    /// Host-facing parameter name
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterId::LowCutFreq => "LoCut_Freq",
            ParameterId::HighCutFreq => "HiCut_Freq",
            ParameterId::LowCutSlope => "LoCut_Slope",
            ParameterId::HighCutSlope => "HiCut_Slope",
            ParameterId::PeakFreq => "Peak_Freq",
            ParameterId::PeakGain => "Peak_Gain",
            ParameterId::PeakQuality => "Peak_Quality",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Valid range and default value
    pub fn range(&self) -> ParameterRange {
        use ranges::*;
        match self {
            ParameterId::LowCutFreq => ParameterRange::new(FREQ_MIN, FREQ_MAX, FREQ_MIN),
            ParameterId::HighCutFreq => ParameterRange::new(FREQ_MIN, FREQ_MAX, FREQ_MAX),
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => {
                ParameterRange::new(0.0, (Slope::ALL.len() - 1) as f64, 0.0)
            }
            ParameterId::PeakFreq => ParameterRange::new(FREQ_MIN, FREQ_MAX, PEAK_FREQ_DEFAULT),
            ParameterId::PeakGain => ParameterRange::new(GAIN_MIN, GAIN_MAX, 0.0),
            ParameterId::PeakQuality => ParameterRange::new(Q_MIN, Q_MAX, 1.0),
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterId {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self> {
        ParameterId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ParameterError::UnknownParameter(s.to_string()))
    }
}

/// Inclusive value range with a default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64, default: f64) -> Self {
        Self { min, max, default }
    }

    /// Clamp a value into range (NaN falls back to the default)
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Cut filter slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Number of cascaded biquads needed for this slope
    pub fn stage_count(&self) -> usize {
        self.index() + 1
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn db_per_octave(&self) -> u32 {
        12 * self.stage_count() as u32
    }

    /// Slope for a choice index, clamping out-of-range indices
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Slope for a choice index, rejecting out-of-range indices
    pub fn try_from_index(index: usize, parameter: ParameterId) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ParameterError::InvalidChoice {
                parameter: parameter.as_str(),
                index,
            })
    }

    /// Slope from a raw (possibly fractional) choice value
    fn from_value(value: f64) -> Self {
        Self::from_index(value.round().max(0.0) as usize)
    }
}

/// Snapshot of every parameter the processing chain depends on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub peak_freq: f64,
    pub peak_gain_db: f64,
    pub peak_quality: f64,
    pub low_cut_freq: f64,
    pub high_cut_freq: f64,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq: ParameterId::PeakFreq.range().default,
            peak_gain_db: ParameterId::PeakGain.range().default,
            peak_quality: ParameterId::PeakQuality.range().default,
            low_cut_freq: ParameterId::LowCutFreq.range().default,
            high_cut_freq: ParameterId::HighCutFreq.range().default,
            low_cut_slope: Slope::default(),
            high_cut_slope: Slope::default(),
        }
    }
}

impl ChainSettings {
    /// Copy with one parameter replaced (clamped into range)
    #[must_use]
    pub fn with_parameter(mut self, id: ParameterId, value: f64) -> Self {
        let value = id.range().clamp(value);
        match id {
            ParameterId::LowCutFreq => self.low_cut_freq = value,
            ParameterId::HighCutFreq => self.high_cut_freq = value,
            ParameterId::LowCutSlope => self.low_cut_slope = Slope::from_value(value),
            ParameterId::HighCutSlope => self.high_cut_slope = Slope::from_value(value),
            ParameterId::PeakFreq => self.peak_freq = value,
            ParameterId::PeakGain => self.peak_gain_db = value,
            ParameterId::PeakQuality => self.peak_quality = value,
        }
        self
    }

    /// Current value of one parameter (choice parameters as their index)
    pub fn value_of(&self, id: ParameterId) -> f64 {
        match id {
            ParameterId::LowCutFreq => self.low_cut_freq,
            ParameterId::HighCutFreq => self.high_cut_freq,
            ParameterId::LowCutSlope => self.low_cut_slope.index() as f64,
            ParameterId::HighCutSlope => self.high_cut_slope.index() as f64,
            ParameterId::PeakFreq => self.peak_freq,
            ParameterId::PeakGain => self.peak_gain_db,
            ParameterId::PeakQuality => self.peak_quality,
        }
    }
}

/// Receives parameter-change notifications
pub trait ParameterListener: Send + Sync {
    fn parameter_value_changed(&self, id: ParameterId, value: f64);
}

/// Read/write access to the live parameter values
pub trait ParameterStore: Send + Sync {
    /// Consistent-enough snapshot of all values for one rebuild
    fn chain_settings(&self) -> ChainSettings;

    /// Write one value and notify listeners
    fn set(&self, id: ParameterId, value: f64);

    fn add_listener(&self, listener: Arc<dyn ParameterListener>);
}

/// Atomic f64 wrapper for lock-free cross-thread parameter access
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(val: f64) -> Self {
        Self(AtomicU64::new(val.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, val: f64) {
        self.0.store(val.to_bits(), Ordering::Release);
    }
}

/// Parameter store backed by one atomic per parameter
pub struct AtomicParameterStore {
    values: [AtomicF64; PARAMETER_COUNT],
    listeners: RwLock<Vec<Arc<dyn ParameterListener>>>,
}

impl Default for AtomicParameterStore {
    fn default() -> Self {
        Self::new(ChainSettings::default())
    }
}

impl AtomicParameterStore {
    pub fn new(initial: ChainSettings) -> Self {
        Self {
            values: ParameterId::ALL.map(|id| AtomicF64::new(initial.value_of(id))),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn get(&self, id: ParameterId) -> f64 {
        self.values[id.index()].load()
    }
}

impl ParameterStore for AtomicParameterStore {
    fn chain_settings(&self) -> ChainSettings {
        ParameterId::ALL
            .into_iter()
            .fold(ChainSettings::default(), |settings, id| {
                settings.with_parameter(id, self.get(id))
            })
    }

    fn set(&self, id: ParameterId, value: f64) {
        let value = id.range().clamp(value);
        self.values[id.index()].store(value);
        trace!(parameter = id.as_str(), value, "Parameter changed");

        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener.parameter_value_changed(id, value);
        }
    }

    fn add_listener(&self, listener: Arc<dyn ParameterListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}
