//! Helper utilities for integration tests

use simpleeq_core::domain::{FilterChain, MagnitudeResponse};
use std::sync::Arc;

/// Stage with the same gain at every frequency
#[derive(Debug, Clone, Copy)]
pub struct FixedGain(pub f64);

impl MagnitudeResponse for FixedGain {
    fn magnitude_at(&self, _frequency: f64, _sample_rate: f64) -> f64 {
        self.0
    }
}

/// Cut chain whose active stages all have the given linear gains
pub fn fixed_cut_chain(gains: &[f64]) -> FilterChain {
    FilterChain::cut_from_sections(
        gains
            .iter()
            .map(|&g| Arc::new(FixedGain(g)) as Arc<dyn MagnitudeResponse>),
    )
}

/// Convert linear amplitude to decibels
pub fn amplitude_to_db(amp: f64) -> f64 {
    20.0 * amp.log10()
}

/// Index of the largest value (first one on ties)
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
