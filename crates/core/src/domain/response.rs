//! Response curve sampling
//!
//! Maps each horizontal pixel of the plot area onto a logarithmic
//! frequency axis, asks the chains for their compound magnitude there and
//! places the resulting decibel value on the vertical pixel span.

use crate::domain::chain::{aggregate_magnitude, FilterChain};
use crate::domain::parameters::ranges;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Decibel value used in place of `-inf` for zero or invalid magnitudes
pub const MIN_DB_SENTINEL: f64 = -200.0;

/// Convert a linear magnitude to decibels
///
/// Zero, negative and non-finite magnitudes map to [`MIN_DB_SENTINEL`] so
/// layout math never sees `-inf` or NaN.
#[inline]
pub fn gain_to_db(magnitude: f64) -> f64 {
    if magnitude > 0.0 && magnitude.is_finite() {
        (20.0 * magnitude.log10()).max(MIN_DB_SENTINEL)
    } else {
        MIN_DB_SENTINEL
    }
}

/// Logarithmic frequency axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAxis {
    pub min_hz: f64,
    pub max_hz: f64,
}

impl Default for FrequencyAxis {
    fn default() -> Self {
        Self {
            min_hz: ranges::FREQ_MIN,
            max_hz: ranges::FREQ_MAX,
        }
    }
}

impl FrequencyAxis {
    pub fn new(min_hz: f64, max_hz: f64) -> Self {
        Self { min_hz, max_hz }
    }

    /// Frequency for a normalized axis position `t` in [0, 1]
    pub fn frequency_at_normalized(&self, t: f64) -> f64 {
        let log_min = self.min_hz.log10();
        let log_max = self.max_hz.log10();
        10.0_f64.powf(log_min + t * (log_max - log_min))
    }

    /// Frequency shown at pixel `pixel` of a `width`-pixel plot
    ///
    /// Pixel 0 is `min_hz` and pixel `width - 1` is `max_hz`.
    pub fn frequency_at(&self, pixel: usize, width: usize) -> f64 {
        self.frequency_at_normalized(normalized_position(pixel, width))
    }

    /// Fractional pixel position of `freq` (inverse of [`Self::frequency_at`])
    pub fn pixel_for_frequency(&self, freq: f64, width: usize) -> f64 {
        if width <= 1 {
            return 0.0;
        }
        let log_min = self.min_hz.log10();
        let log_max = self.max_hz.log10();
        let t = (freq.log10() - log_min) / (log_max - log_min);
        t * (width - 1) as f64
    }
}

fn normalized_position(pixel: usize, width: usize) -> f64 {
    if width <= 1 {
        0.0
    } else {
        pixel as f64 / (width - 1) as f64
    }
}

/// Decibel span displayed by the plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecibelRange {
    pub min: f64,
    pub max: f64,
}

impl Default for DecibelRange {
    fn default() -> Self {
        Self {
            min: ranges::GAIN_MIN,
            max: ranges::GAIN_MAX,
        }
    }
}

/// Vertical pixel span; `top` is the smaller screen coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalRange {
    pub top: f64,
    pub bottom: f64,
}

/// Map a decibel value onto the vertical pixel span
///
/// `db_range.min` lands on `bottom` and `db_range.max` on `top`. Values
/// outside the range extrapolate linearly.
#[inline]
pub fn map_db_to_y(db: f64, db_range: DecibelRange, vertical: VerticalRange) -> f64 {
    let t = (db - db_range.min) / (db_range.max - db_range.min);
    vertical.bottom + t * (vertical.top - vertical.bottom)
}

/// Rectangle of the plot in editor pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlotArea {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PlotArea {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixel columns to sample (0 for non-positive widths)
    pub fn pixel_width(&self) -> usize {
        usize::try_from(self.width).unwrap_or(0)
    }

    pub fn vertical_range(&self) -> VerticalRange {
        VerticalRange {
            top: f64::from(self.y),
            bottom: f64::from(self.y) + f64::from(self.height),
        }
    }
}

/// One sampled pixel column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
    pub frequency_hz: f64,
    pub gain_db: f64,
}

/// Drawing instruction for the render adapter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
}

/// Sampled response polyline, left to right
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseCurve {
    bounds: PlotArea,
    points: Vec<CurvePoint>,
}

impl ResponseCurve {
    pub fn bounds(&self) -> PlotArea {
        self.bounds
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point with the highest gain (first one on ties)
    pub fn peak(&self) -> Option<&CurvePoint> {
        self.points
            .iter()
            .reduce(|best, p| if p.gain_db > best.gain_db { p } else { best })
    }

    /// Polyline as a `MoveTo` followed by `LineTo`s
    pub fn to_path_commands(&self) -> Vec<PathCommand> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 0 {
                    PathCommand::MoveTo { x: p.x, y: p.y }
                } else {
                    PathCommand::LineTo { x: p.x, y: p.y }
                }
            })
            .collect()
    }
}

/// Samples chains into a [`ResponseCurve`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurveSampler {
    pub axis: FrequencyAxis,
    pub db_range: DecibelRange,
}

impl CurveSampler {
    pub fn new(axis: FrequencyAxis, db_range: DecibelRange) -> Self {
        Self { axis, db_range }
    }

    /// Sample one point per pixel column of `area`
    ///
    /// Pure function of its inputs; a non-positive width yields an empty
    /// curve.
    pub fn sample(
        &self,
        chains: &[&FilterChain],
        sample_rate: f64,
        area: PlotArea,
    ) -> ResponseCurve {
        let width = area.pixel_width();
        let vertical = area.vertical_range();
        let origin_x = f64::from(area.x);

        let points = (0..width)
            .map(|p| {
                let frequency_hz = self.axis.frequency_at(p, width);
                let magnitude = aggregate_magnitude(chains, frequency_hz, sample_rate);
                let gain_db = gain_to_db(magnitude);
                CurvePoint {
                    x: origin_x + p as f64,
                    y: map_db_to_y(gain_db, self.db_range, vertical),
                    frequency_hz,
                    gain_db,
                }
            })
            .collect::<Vec<_>>();

        trace!(width, sample_rate, "Response curve sampled");

        ResponseCurve {
            bounds: area,
            points,
        }
    }
}
