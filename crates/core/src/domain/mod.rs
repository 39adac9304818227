//! Domain entities and business rules

pub mod chain;
pub mod coefficients;
pub mod config;
pub mod editor;
pub mod parameters;
pub mod response;
pub mod sync;

// Re-export specific items to avoid ambiguous glob imports
pub use chain::{
    aggregate_magnitude, ChainPosition, FilterChain, FilterStage, MagnitudeResponse,
    ProcessingChain, MAX_CUT_STAGES,
};
pub use coefficients::{butterworth_highpass, butterworth_lowpass, BiquadCoeffs};
pub use config::{ConfigError, ConfigManager, EditorConfig};
pub use editor::{ResponseCurveEditor, SampleRateSource, SharedSampleRate};
pub use parameters::{
    AtomicParameterStore, ChainSettings, ParameterError, ParameterId, ParameterListener,
    ParameterStore, Slope,
};
pub use response::{
    gain_to_db, map_db_to_y, CurvePoint, CurveSampler, DecibelRange, FrequencyAxis, PathCommand,
    PlotArea, ResponseCurve, VerticalRange, MIN_DB_SENTINEL,
};
pub use sync::{ChainSnapshot, ChangeGate};
