//! Statistics on spectral arrays: correlation and noise level.

pub mod correlation;
pub mod noise;

pub use correlation::correlation;
pub use noise::{noise_level, NoiseLevel, NoiseOptions};
