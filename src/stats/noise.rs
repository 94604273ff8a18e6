/// Noise level estimation by SAN plot analysis (doi:10.1002/mrc.4882)
///
/// Values are sorted in descending order and split into a positive and a
/// negative branch. The noise standard deviation is read off each branch
/// at a cut-off fraction and divided by the matching quantile of the noise
/// distribution: the half-normal for real spectra, the Rayleigh for
/// magnitude spectra. A refinement pass drops values above
/// `factor_std × noise` (signals) and re-reads the level.

use serde::{Deserialize, Serialize};

use crate::array::ArrayError;

/// Cut-off grid used to pick the cut-off automatically: centres 0.5..=0.9
const CUT_OFF_CENTRES: [usize; 5] = [50, 60, 70, 80, 90];
/// Half-width of each cut-off window, in hundredths (exclusive)
const CUT_OFF_HALF_WIDTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseOptions {
    /// Points flagged `true` are excluded; ignored unless it matches the data length
    pub mask: Option<Vec<bool>>,
    /// Fixed cut-off fraction instead of the automatic choice
    pub cut_off: Option<f64>,
    pub refine: bool,
    pub magnitude_mode: bool,
    /// Multiplies the input when greater than 1
    pub scale_factor: f64,
    pub factor_std: f64,
    /// Remove the median before splitting (ignored in magnitude mode)
    pub fix_offset: bool,
}

impl Default for NoiseOptions {
    fn default() -> Self {
        Self {
            mask: None,
            cut_off: None,
            refine: true,
            magnitude_mode: false,
            scale_factor: 1.0,
            factor_std: 5.0,
            fix_offset: true,
        }
    }
}

/// Estimated noise standard deviation of both branches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseLevel {
    pub positive: f64,
    pub negative: f64,
    /// Largest value over the positive noise level
    pub snr: f64,
}

pub fn noise_level(data: &[f64], options: &NoiseOptions) -> Result<NoiseLevel, ArrayError> {
    let mut input: Vec<f64> = match &options.mask {
        Some(mask) if mask.len() == data.len() => data
            .iter()
            .zip(mask)
            .filter(|&(_, &masked)| !masked)
            .map(|(&v, _)| v)
            .collect(),
        _ => data.to_vec(),
    };
    if input.is_empty() {
        return Err(ArrayError::Empty);
    }

    if options.scale_factor > 1.0 {
        input.iter_mut().for_each(|v| *v *= options.scale_factor);
    }

    input.sort_by(|a, b| b.total_cmp(a));

    if options.fix_offset && !options.magnitude_mode {
        let median = median_of_sorted(&input);
        input.iter_mut().for_each(|v| *v -= median);
    }

    // Both branches stay in descending order: the positive one starts at the
    // largest value, the negative one at the value closest to zero.
    let sign_positive: Vec<f64> = input.iter().copied().filter(|&v| v > 0.0).collect();
    let sign_negative: Vec<f64> = input.iter().copied().filter(|&v| v < 0.0).collect();
    if sign_positive.is_empty() {
        return Err(ArrayError::NoValues("positive"));
    }

    let magnitude = options.magnitude_mode;
    let cut_off = options
        .cut_off
        .unwrap_or_else(|| determine_cut_off(&sign_positive, magnitude));

    let sky_point = sign_positive[0];
    let mut positive = sign_positive[quantile_index(sign_positive.len(), cut_off)];
    let mut negative = if sign_negative.is_empty() {
        0.0
    } else {
        -sign_negative[quantile_index(sign_negative.len(), 1.0 - cut_off)]
    };

    let correction = -norm_inv(cut_off / 2.0, magnitude);

    if options.refine {
        let cut_signals = positive * options.factor_std;
        let removed = sign_positive
            .iter()
            .position(|&v| v < cut_signals)
            .unwrap_or(0);
        let kept = &sign_positive[removed..];
        positive = kept[quantile_index(kept.len(), cut_off)];
        positive /= -norm_inv(effective_cut_off(cut_off, kept.len(), removed) / 2.0, magnitude);

        if negative != 0.0 {
            let cut_signals = negative * options.factor_std;
            let kept_len = sign_negative
                .iter()
                .take_while(|v| v.abs() < cut_signals)
                .count();
            if kept_len > 0 {
                let removed = sign_negative.len() - kept_len;
                negative = -sign_negative[quantile_index(kept_len, 1.0 - cut_off)];
                negative /=
                    -norm_inv(effective_cut_off(cut_off, kept_len, removed) / 2.0, magnitude);
            } else {
                negative /= correction;
            }
        }
    } else {
        positive /= correction;
        negative /= correction;
    }

    log::debug!(
        "noise level: cut-off {:.2}, positive {:.4e}, negative {:.4e}",
        cut_off,
        positive,
        negative
    );

    Ok(NoiseLevel {
        positive,
        negative,
        snr: sky_point / positive,
    })
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

fn quantile_index(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).round().max(0.0) as usize).min(len.saturating_sub(1))
}

/// Fraction of the full branch that lies above the refined quantile
fn effective_cut_off(cut_off: f64, kept: usize, removed: usize) -> f64 {
    (cut_off * kept as f64 + removed as f64) / (kept + removed) as f64
}

/// Pick the cut-off whose window gives the most stable noise estimate
fn determine_cut_off(sign_positive: &[f64], magnitude: bool) -> f64 {
    let index_max = (sign_positive.len() - 1) as f64;
    let estimates: Vec<(usize, f64)> = (1..=99usize)
        .map(|k| {
            let fraction = k as f64 / 100.0;
            let value = sign_positive[(index_max * fraction).round() as usize];
            (k, -value / norm_inv(fraction / 2.0, magnitude))
        })
        .collect();

    let mut best = (f64::MAX, CUT_OFF_CENTRES[0]);
    for centre in CUT_OFF_CENTRES {
        let window: Vec<f64> = estimates
            .iter()
            .filter(|(k, _)| k.abs_diff(centre) < CUT_OFF_HALF_WIDTH)
            .map(|&(_, v)| v)
            .collect();
        let mean = window.iter().map(|v| v.abs()).sum::<f64>() / window.len() as f64;
        let spread: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
        if spread < best.0 {
            best = (spread, centre);
        }
    }
    best.1 as f64 / 100.0
}

/// Lower-tail quantile of the noise distribution
///
/// Normal in real mode. In magnitude mode the Rayleigh survival function
/// `exp(-x²/2)` is inverted at `2p`, so both modes map `p = c/2` onto the
/// point exceeded by a fraction `c` of the one-sided noise.
fn norm_inv(p: f64, magnitude: bool) -> f64 {
    if magnitude {
        -(-2.0 * (2.0 * p).ln()).sqrt()
    } else {
        inv_normal_cdf(p)
    }
}

/// Inverse standard normal CDF (Acklam's rational approximation)
fn inv_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
