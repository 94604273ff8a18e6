//! Signal/baseline segmentation.
//!
//! A sequence (magnitude or its derivative) is split into signal and noise
//! by iterative 3σ clipping; short noise gaps between signal blocks are then
//! absorbed. Two such masks are intersected and the surviving runs become
//! the regions handed to the phase search.

use std::ops::Range;

use crate::data::spectrum::Spectrum;

use super::{AutoPhaseError, Stage};

/// Clipping threshold in standard deviations.
pub const CLIP_SIGMAS: f64 = 3.0;

/// Outcome of one region-detection run
#[derive(Debug, Clone)]
pub struct RegionMask {
    /// `true` marks a signal position
    pub mask: Vec<bool>,
    /// Number of clipping passes performed
    pub iterations: usize,
    /// `false` when the pass limit stopped clipping early
    pub converged: bool,
}

impl RegionMask {
    /// Number of signal positions
    pub fn signal_points(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// A contiguous signal run cut out of the spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Index of the first point in the full spectrum
    pub start: usize,
    /// Owned copy of the region's points
    pub data: Spectrum,
}

impl Region {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Mean and population standard deviation of the unmasked elements
fn unmasked_stats(s: &[f64], mask: &[bool]) -> Option<(f64, f64)> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (&v, &m) in s.iter().zip(mask) {
        if !m {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;

    let var = s
        .iter()
        .zip(mask)
        .filter(|&(_, &m)| !m)
        .map(|(&v, _)| (v - mean).powi(2))
        .sum::<f64>()
        / count as f64;

    Some((mean, var.sqrt()))
}

/// Iterative sigma clipping.
///
/// Each pass recomputes mean/std over the still-unmasked points and marks
/// every unmasked point further than 3σ from the mean. Stops after a pass
/// that marks nothing, when nothing is left unmasked, or after
/// `max_iterations` passes.
pub fn sigma_clip(s: &[f64], max_iterations: usize) -> RegionMask {
    let mut mask = vec![false; s.len()];
    let mut iterations = 0;

    loop {
        if iterations >= max_iterations {
            return RegionMask {
                mask,
                iterations,
                converged: false,
            };
        }

        let Some((mean, std)) = unmasked_stats(s, &mask) else {
            break;
        };
        let limit = CLIP_SIGMAS * std;

        let mut changed = false;
        for (v, m) in s.iter().zip(mask.iter_mut()) {
            if !*m && (v - mean).abs() > limit {
                *m = true;
                changed = true;
            }
        }
        iterations += 1;

        if !changed {
            break;
        }
    }

    RegionMask {
        mask,
        iterations,
        converged: true,
    }
}

/// Flip every `false` run shorter than `min_reg_size` to `true`.
///
/// Leading and trailing runs are treated like interior ones. A mask without
/// any signal is left untouched.
pub fn merge_small_gaps(mask: &mut [bool], min_reg_size: usize) {
    if !mask.iter().any(|&m| m) {
        return;
    }

    let n = mask.len();
    let mut i = 0;
    while i < n {
        if mask[i] {
            i += 1;
            continue;
        }
        let gap_start = i;
        while i < n && !mask[i] {
            i += 1;
        }
        if i - gap_start < min_reg_size {
            mask[gap_start..i].fill(true);
        }
    }
}

/// Sigma clipping followed by gap merging
pub fn detect_signal_regions(
    s: &[f64],
    min_reg_size: usize,
    max_iterations: usize,
) -> RegionMask {
    let mut clipped = sigma_clip(s, max_iterations);
    merge_small_gaps(&mut clipped.mask, min_reg_size);
    clipped
}

/// Elementwise AND of two masks
pub fn combine_masks(a: &[bool], b: &[bool]) -> Result<Vec<bool>, AutoPhaseError> {
    if a.len() != b.len() {
        return Err(AutoPhaseError::LengthMismatch {
            stage: Stage::RegionCombiner,
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(&x, &y)| x && y).collect())
}

/// Maximal runs of `true`, in ascending order. A run reaching the last
/// index is closed at `mask.len()`.
pub fn true_runs(mask: &[bool]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &m) in mask.iter().enumerate() {
        match (m, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..mask.len());
    }
    runs
}

/// Cut every run longer than `min_reg_size` out of the spectrum.
pub fn extract_regions(
    spectrum: &Spectrum,
    mask: &[bool],
    min_reg_size: usize,
) -> Result<Vec<Region>, AutoPhaseError> {
    if mask.len() != spectrum.len() {
        return Err(AutoPhaseError::LengthMismatch {
            stage: Stage::RegionCombiner,
            left: spectrum.len(),
            right: mask.len(),
        });
    }

    Ok(true_runs(mask)
        .into_iter()
        .filter(|run| run.len() > min_reg_size)
        .map(|run| Region {
            start: run.start,
            data: spectrum.slice(run.start, run.end),
        })
        .collect())
}
