//! SimpleEQ editor core
//!
//! Computes the aggregate magnitude response of the equalizer's filter
//! chain and samples it into a curve for the plot area.

pub mod domain;
