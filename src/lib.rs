//! Automatic zero/first-order phase correction of 1D NMR spectra, with the
//! array, statistics and XY helpers used around it.

pub mod array;
pub mod data;
pub mod log;
pub mod pipeline;
pub mod stats;
pub mod xy;

pub use data::spectrum::Spectrum;
pub use pipeline::autophase::{
    auto_phase_correction, AutoPhaseError, AutoPhaseOptions, AutoPhaseResult, AutoPhaseWarning,
};
