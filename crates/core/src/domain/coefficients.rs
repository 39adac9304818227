//! Biquad coefficient sets and their analytical magnitude response
//!
//! The editor never filters audio itself. It only needs to know how loud
//! each section is at a given frequency, which this module answers by
//! evaluating the transfer function on the unit circle:
//!
//! ```text
//! H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2),  z = e^(jω)
//! ```
//!
//! The designs below (RBJ peak, Butterworth cascades for the cut filters)
//! mirror what the plugin's parameter model derives on the audio side.

use crate::domain::chain::MagnitudeResponse;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Biquad filter coefficients
///
/// Coefficients are stored normalized so that `a0 == 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    /// Numerator coefficients
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    /// Denominator coefficients (a0 is normalized to 1.0)
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::UNITY
    }
}

impl BiquadCoeffs {
    /// Pass-through section (unity gain at every frequency)
    pub const UNITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Build a section from raw, un-normalized coefficients
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Calculate coefficients for a peaking EQ filter
    ///
    /// Boosts or cuts frequencies around a center frequency. The gain at
    /// `freq` is exactly `gain_db`.
    ///
    /// # Parameters
    /// - `sample_rate`: Audio sample rate in Hz
    /// - `freq`: Center frequency in Hz
    /// - `gain_db`: Boost/cut in decibels
    /// - `q`: Quality factor (bandwidth)
    #[must_use]
    pub fn peaking(sample_rate: f64, freq: f64, gain_db: f64, q: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        Self::normalized(
            1.0 + alpha * a,
            -2.0 * cos_w0,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w0,
            1.0 - alpha / a,
        )
    }

    /// Second-order high-pass section with the given Q
    #[must_use]
    pub fn highpass(sample_rate: f64, freq: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        Self::normalized(
            (1.0 + cos_w0) / 2.0,
            -(1.0 + cos_w0),
            (1.0 + cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// Second-order low-pass section with the given Q
    #[must_use]
    pub fn lowpass(sample_rate: f64, freq: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        Self::normalized(
            (1.0 - cos_w0) / 2.0,
            1.0 - cos_w0,
            (1.0 - cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// Linear magnitude |H(e^jω)| at `freq` for the given sample rate
    #[must_use]
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq / sample_rate;
        // z^-1 on the unit circle
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;

        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;

        num.norm() / den.norm()
    }
}

impl MagnitudeResponse for BiquadCoeffs {
    fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        BiquadCoeffs::magnitude_at(self, frequency, sample_rate)
    }
}

/// Per-section Q values of an even-order Butterworth cascade
///
/// An order-N Butterworth filter factors into N/2 second-order sections
/// with Q_k = 1 / (2 cos((2k+1)π / 2N)).
fn butterworth_q_values(order: usize) -> impl Iterator<Item = f64> {
    let n = order as f64;
    (0..order / 2).map(move |k| {
        let theta = (2.0 * k as f64 + 1.0) * PI / (2.0 * n);
        1.0 / (2.0 * theta.cos())
    })
}

/// Design an even-order Butterworth high-pass as cascaded biquads
///
/// Returns `order / 2` sections. Odd orders are rounded down.
#[must_use]
pub fn butterworth_highpass(sample_rate: f64, freq: f64, order: usize) -> Vec<BiquadCoeffs> {
    butterworth_q_values(order)
        .map(|q| BiquadCoeffs::highpass(sample_rate, freq, q))
        .collect()
}

/// Design an even-order Butterworth low-pass as cascaded biquads
///
/// Returns `order / 2` sections. Odd orders are rounded down.
#[must_use]
pub fn butterworth_lowpass(sample_rate: f64, freq: f64, order: usize) -> Vec<BiquadCoeffs> {
    butterworth_q_values(order)
        .map(|q| BiquadCoeffs::lowpass(sample_rate, freq, q))
        .collect()
}
