//! Per-region zero-order phase search.
//!
//! Coarse-to-fine grid over the phase angle: 3 rounds of 22 candidates
//! (`steps + 2`, both ends included), each round narrowing the window to
//! one step on either side of the best angle. The objective is the negative
//! area of the real channel, which vanishes for a clean absorptive line.

use serde::{Deserialize, Serialize};

use super::regions::Region;

pub const SEARCH_START_DEG: f64 = -180.0;
pub const SEARCH_STOP_DEG: f64 = 180.0;
pub const SEARCH_STEPS: usize = 20;
pub const SEARCH_ROUNDS: usize = 3;

/// Relative threshold under which a region's area is treated as zero.
pub const NEAR_ZERO_AREA: f64 = 1e-12;

/// Best zero-order phase of one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    /// First index of the region in the full spectrum
    pub start: usize,
    /// Number of points in the region
    pub len: usize,
    /// Best zero-order angle in degrees
    pub ph0: f64,
    /// Sum of the corrected real channel; negative when no clean
    /// absorptive lineshape was found
    pub area: f64,
    /// Area-weighted centroid, in points of the full spectrum
    pub x0: f64,
    /// The area was too small for a centroid; `x0` is the region midpoint
    pub centroid_fallback: bool,
}

/// Real channel of `region` after a zero-order rotation by `angle_deg`
fn rotated_real(region: &Region, angle_deg: f64) -> impl Iterator<Item = f64> + '_ {
    let (sin_p, cos_p) = angle_deg.to_radians().sin_cos();
    region
        .data
        .real
        .iter()
        .zip(region.data.imag.iter())
        .map(move |(&re, &im)| re * cos_p - im * sin_p)
}

/// Sum of the negative excursions of the rotated real channel
pub fn negative_area(region: &Region, angle_deg: f64) -> f64 {
    rotated_real(region, angle_deg)
        .filter(|&re| re < 0.0)
        .map(|re| -re)
        .sum()
}

/// Angle in degrees minimising [`negative_area`].
///
/// Ties keep the first (lowest) candidate of the round.
pub fn best_angle(region: &Region) -> f64 {
    let mut start = SEARCH_START_DEG;
    let mut stop = SEARCH_STOP_DEG;
    let mut best = start;

    for round in 0..SEARCH_ROUNDS {
        let d_ang = (stop - start) / (SEARCH_STEPS + 1) as f64;
        let mut min_area = f64::MAX;
        best = start;

        for k in 0..=SEARCH_STEPS + 1 {
            let angle = start + k as f64 * d_ang;
            let area = negative_area(region, angle);
            if area < min_area {
                min_area = area;
                best = angle;
            }
        }

        log::trace!(
            "region @{} round {}: best {:.4}° (negative area {:.4e}, step {:.4}°)",
            region.start,
            round + 1,
            best,
            min_area,
            d_ang
        );
        start = best - d_ang;
        stop = best + d_ang;
    }

    best
}

/// Phase one region and measure its area and centroid.
pub fn auto_phase_region(region: &Region) -> RegionResult {
    let ph0 = best_angle(region);

    let mut area = 0.0;
    let mut abs_area = 0.0;
    let mut sum_x = 0.0;
    for (j, re) in rotated_real(region, ph0).enumerate() {
        area += re;
        abs_area += re.abs();
        sum_x += re * (j + region.start) as f64;
    }

    let centroid = sum_x / area;
    let first = region.start as f64;
    let last = (region.start + region.len().saturating_sub(1)) as f64;
    // a tiny net area can push the centroid out of the region
    let degenerate = area.abs() <= NEAR_ZERO_AREA * abs_area
        || !centroid.is_finite()
        || !(first..=last).contains(&centroid);
    let x0 = if degenerate {
        (first + last) / 2.0
    } else {
        centroid
    };

    RegionResult {
        start: region.start,
        len: region.len(),
        ph0,
        area,
        x0,
        centroid_fallback: degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spectrum::Spectrum;
    use num_complex::Complex;

    /// Absorptive Lorentzian centred in a `2·half + 1` window, rotated by `-error_deg`
    fn lorentzian_region(start: usize, half: i64, gamma: f64, error_deg: f64) -> Region {
        let rot = Complex::from_polar(1.0, -error_deg.to_radians());
        let points: Vec<Complex<f64>> = (-half..=half)
            .map(|x| {
                let x = x as f64;
                let line = Complex::new(gamma, -x) / (gamma * gamma + x * x);
                line * rot
            })
            .collect();
        Region {
            start,
            data: Spectrum::from_complex(&points),
        }
    }

    #[test]
    fn test_finds_known_phase_error() {
        // Any angle within atan(gamma / half) of the error leaves no negative
        // area, so the window must be wide against the linewidth.
        for &error in &[30.0, -75.0, 0.0, 140.0] {
            let region = lorentzian_region(500, 200, 0.5, error);
            let res = auto_phase_region(&region);
            assert!(
                (res.ph0 - error).abs() < 0.5,
                "expected {:.2}°, got {:.4}°",
                error,
                res.ph0
            );
            assert!(res.area > 0.0);
            assert!(!res.centroid_fallback);
            assert!((res.x0 - 700.0).abs() < 2.0, "centroid {}", res.x0);
        }
    }

    #[test]
    fn test_flat_optimum_resolves_to_lowest_angle() {
        let region = lorentzian_region(0, 100, 3.0, 30.0);
        let plateau = (3.0f64 / 100.0).atan().to_degrees();
        let res = auto_phase_region(&region);
        assert!(negative_area(&region, res.ph0) < 1e-12);
        assert!(res.ph0 <= 30.0, "{}", res.ph0);
        assert!(res.ph0 >= 30.0 - plateau - 0.1, "{}", res.ph0);
    }

    #[test]
    fn test_negative_area_vanishes_at_correct_angle() {
        let region = lorentzian_region(0, 50, 2.0, 45.0);
        assert!(negative_area(&region, 45.0) < 1e-12);
        assert!(negative_area(&region, 60.0) > negative_area(&region, 50.0));
        assert!(negative_area(&region, 30.0) > negative_area(&region, 40.0));
    }

    #[test]
    fn test_search_is_deterministic() {
        let region = lorentzian_region(1234, 80, 4.0, -12.3);
        let a = auto_phase_region(&region);
        let b = auto_phase_region(&region);
        assert_eq!(a.ph0.to_bits(), b.ph0.to_bits());
        assert_eq!(a.area.to_bits(), b.area.to_bits());
        assert_eq!(a.x0.to_bits(), b.x0.to_bits());
    }

    #[test]
    fn test_zero_region_falls_back_to_midpoint() {
        let region = Region {
            start: 40,
            data: Spectrum::new(vec![0.0; 21], vec![0.0; 21]),
        };
        let res = auto_phase_region(&region);
        assert!(res.centroid_fallback);
        assert_eq!(res.area, 0.0);
        assert_eq!(res.x0, 50.0);
        assert!(res.ph0.is_finite());
    }

    #[test]
    fn test_centroid_outside_region_falls_back_to_midpoint() {
        // nearly cancelling lobes: the net area is tiny but not negligible
        // against Σ|re|, and sum_x / area lands far outside the region
        let region = Region {
            start: 100,
            data: Spectrum::new(vec![-1.0, 1.0 + 1e-6, -1.0, 1.0], vec![0.0; 4]),
        };
        let res = auto_phase_region(&region);
        assert!(res.centroid_fallback, "{:?}", res);
        assert_eq!(res.x0, 101.5);
        assert!(res.x0 >= 100.0 && res.x0 < 104.0);
    }
}
