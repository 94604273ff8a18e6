//! Automatic phase correction of 1D spectra.
//!
//! Robust, general automatic phase correction for high-resolution NMR data
//! (doi:10.1002/mrc.4586):
//!
//! ```text
//!   1. magnitude of the complex spectrum
//!   2. Holoborodko derivative of the magnitude
//!   3. sigma-clipped signal masks of both, small gaps merged
//!   4. AND of the masks → contiguous regions longer than min_reg_size
//!   5. per-region zero-order grid search (minimum negative area)
//!   6. area-weighted straight line through (centroid / n, angle)
//!   7. apply intercept (PH0) and slope (PH1) to the full spectrum
//! ```

pub mod derivative;
pub mod regions;
pub mod regression;
pub mod search;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::spectrum::Spectrum;
use crate::pipeline::processing::phase_correct;

use derivative::holoborodko;
use regions::{combine_masks, detect_signal_regions, extract_regions, true_runs, Region};
use regression::weighted_linear_regression;
use search::{auto_phase_region, RegionResult};

/// Region areas are divided by this before they are used as weights.
pub const AREA_SCALE: f64 = 1e11;

/// Default cap on sigma-clipping passes per mask.
pub const DEFAULT_MAX_CLIP_ITERATIONS: usize = 10_000;

// ─── Errors and warnings ────────────────────────────────────────────────────

/// Pipeline stage, for error and warning context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Input,
    Derivative,
    MagnitudeRegions,
    DerivativeRegions,
    RegionCombiner,
    Regression,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "input"),
            Stage::Derivative => write!(f, "derivative filter"),
            Stage::MagnitudeRegions => write!(f, "magnitude region detection"),
            Stage::DerivativeRegions => write!(f, "derivative region detection"),
            Stage::RegionCombiner => write!(f, "region combiner"),
            Stage::Regression => write!(f, "weighted regression"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutoPhaseError {
    #[error("{stage}: need at least {required} points, got {actual}")]
    InputLength {
        stage: Stage,
        required: usize,
        actual: usize,
    },
    #[error("{stage}: length mismatch ({left} vs {right})")]
    LengthMismatch {
        stage: Stage,
        left: usize,
        right: usize,
    },
    #[error(
        "no signal region longer than {min_reg_size} points in a {points}-point spectrum \
         ({candidate_runs} shorter candidate runs dropped)"
    )]
    NoRegionsFound {
        points: usize,
        min_reg_size: usize,
        candidate_runs: usize,
    },
    #[error("singular phase regression over {points} region(s): determinant {determinant:e}")]
    SingularRegression { determinant: f64, points: usize },
}

/// Non-fatal conditions reported alongside a successful result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AutoPhaseWarning {
    /// Region area too close to zero for a centroid; the midpoint was used
    NearZeroArea { start: usize, len: usize, area: f64 },
    /// Best phase still leaves a negative area; the region gets a negative weight
    NegativeArea { start: usize, len: usize, area: f64 },
    /// Sigma clipping stopped at the pass limit before converging
    ClippingLimitReached { stage: Stage, iterations: usize },
}

impl fmt::Display for AutoPhaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoPhaseWarning::NearZeroArea { start, len, area } => write!(
                f,
                "region {}..{}: near-zero area {:.3e}, centroid replaced by midpoint",
                start,
                start + len,
                area
            ),
            AutoPhaseWarning::NegativeArea { start, len, area } => write!(
                f,
                "region {}..{}: negative area {:.3e} after phasing",
                start,
                start + len,
                area
            ),
            AutoPhaseWarning::ClippingLimitReached { stage, iterations } => {
                write!(f, "{}: clipping stopped after {} passes", stage, iterations)
            }
        }
    }
}

// ─── Options and result ─────────────────────────────────────────────────────

fn default_max_clip_iterations() -> usize {
    DEFAULT_MAX_CLIP_ITERATIONS
}

/// Options for automatic phase correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoPhaseOptions {
    /// Minimum contiguous region length; regions must be strictly longer.
    /// Noise gaps shorter than this are merged into the surrounding signal.
    pub min_reg_size: usize,
    /// Safety cap on sigma-clipping passes per mask.
    #[serde(default = "default_max_clip_iterations")]
    pub max_clip_iterations: usize,
}

impl AutoPhaseOptions {
    pub fn new(min_reg_size: usize) -> Self {
        Self {
            min_reg_size,
            max_clip_iterations: DEFAULT_MAX_CLIP_ITERATIONS,
        }
    }

    pub fn with_max_clip_iterations(mut self, max_clip_iterations: usize) -> Self {
        self.max_clip_iterations = max_clip_iterations;
        self
    }
}

/// Result of automatic phase correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPhaseResult {
    /// Phase-corrected copy of the input
    pub data: Spectrum,
    /// Zero-order phase in degrees
    pub ph0: f64,
    /// First-order phase in degrees, total across the spectrum
    pub ph1: f64,
    /// Per-region results, ascending by start index
    pub regions: Vec<RegionResult>,
    pub warnings: Vec<AutoPhaseWarning>,
}

// ─── Pipeline ───────────────────────────────────────────────────────────────

#[cfg(feature = "parallel")]
fn search_regions(regions: &[Region]) -> Vec<RegionResult> {
    use rayon::prelude::*;
    regions.par_iter().map(auto_phase_region).collect()
}

#[cfg(not(feature = "parallel"))]
fn search_regions(regions: &[Region]) -> Vec<RegionResult> {
    regions.iter().map(auto_phase_region).collect()
}

fn region_warnings(result: &RegionResult) -> Option<AutoPhaseWarning> {
    if result.centroid_fallback {
        Some(AutoPhaseWarning::NearZeroArea {
            start: result.start,
            len: result.len,
            area: result.area,
        })
    } else if result.area < 0.0 {
        Some(AutoPhaseWarning::NegativeArea {
            start: result.start,
            len: result.len,
            area: result.area,
        })
    } else {
        None
    }
}

/// Find and apply the zero/first-order phase of `spectrum`.
///
/// The input is not modified; the corrected spectrum is returned in
/// [`AutoPhaseResult::data`].
pub fn auto_phase_correction(
    spectrum: &Spectrum,
    options: &AutoPhaseOptions,
) -> Result<AutoPhaseResult, AutoPhaseError> {
    if !spectrum.is_consistent() {
        return Err(AutoPhaseError::LengthMismatch {
            stage: Stage::Input,
            left: spectrum.real.len(),
            right: spectrum.imag.len(),
        });
    }
    let n = spectrum.len();
    if n < derivative::MIN_POINTS {
        return Err(AutoPhaseError::InputLength {
            stage: Stage::Input,
            required: derivative::MIN_POINTS,
            actual: n,
        });
    }

    let min_reg_size = options.min_reg_size;
    let mut warnings = Vec::new();

    let magnitude = spectrum.magnitude();
    let ds = holoborodko(&magnitude)?;

    let peaks_ds = detect_signal_regions(&ds, min_reg_size, options.max_clip_iterations);
    let peaks_sp = detect_signal_regions(&magnitude, min_reg_size, options.max_clip_iterations);
    for (stage, mask) in [
        (Stage::DerivativeRegions, &peaks_ds),
        (Stage::MagnitudeRegions, &peaks_sp),
    ] {
        log::debug!(
            "{}: {} signal points after {} passes",
            stage,
            mask.signal_points(),
            mask.iterations
        );
        if !mask.converged {
            let warning = AutoPhaseWarning::ClippingLimitReached {
                stage,
                iterations: mask.iterations,
            };
            log::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    let combined = combine_masks(&peaks_sp.mask, &peaks_ds.mask)?;
    let regions = extract_regions(spectrum, &combined, min_reg_size)?;
    if regions.is_empty() {
        return Err(AutoPhaseError::NoRegionsFound {
            points: n,
            min_reg_size,
            candidate_runs: true_runs(&combined).len(),
        });
    }
    log::debug!("{} regions longer than {} points", regions.len(), min_reg_size);

    let results = search_regions(&regions);
    for result in &results {
        log::debug!(
            "region {}..{}: ph0={:.3}°, area={:.4e}, x0={:.2}",
            result.start,
            result.start + result.len,
            result.ph0,
            result.area,
            result.x0
        );
        if let Some(warning) = region_warnings(result) {
            log::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    let x: Vec<f64> = results.iter().map(|r| r.x0 / n as f64).collect();
    let y: Vec<f64> = results.iter().map(|r| r.ph0).collect();
    let w: Vec<f64> = results.iter().map(|r| r.area / AREA_SCALE).collect();
    let fit = weighted_linear_regression(&x, &y, &w)?;

    let (ph0, ph1) = (fit.intercept, fit.slope);
    log::info!(
        "Auto phase: PH0={:.2}°, PH1={:.2}° from {} regions",
        ph0,
        ph1,
        results.len()
    );

    let data = phase_correct(spectrum, ph0.to_radians(), ph1.to_radians());

    Ok(AutoPhaseResult {
        data,
        ph0,
        ph1,
        regions: results,
        warnings,
    })
}
