//! Closed-form weighted least squares for a straight line.
//!
//! Solves the normal equations
//!
//! ```text
//!   | Σx²w  Σxw | |slope    |   | Σxwy |
//!   | Σxw   Σw  | |intercept| = | Σwy  |
//! ```
//!
//! by inverting the 2×2 matrix analytically.

use serde::{Deserialize, Serialize};

use super::{AutoPhaseError, Stage};

/// Determinant threshold, relative to `Σx²w·Σw`.
pub const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Fitted line `y = intercept + slope·x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

pub fn weighted_linear_regression(
    x: &[f64],
    y: &[f64],
    w: &[f64],
) -> Result<LinearFit, AutoPhaseError> {
    if x.len() != y.len() {
        return Err(AutoPhaseError::LengthMismatch {
            stage: Stage::Regression,
            left: x.len(),
            right: y.len(),
        });
    }
    if x.len() != w.len() {
        return Err(AutoPhaseError::LengthMismatch {
            stage: Stage::Regression,
            left: x.len(),
            right: w.len(),
        });
    }

    let mut sxtw = 0.0;
    let mut swx = 0.0;
    let mut sw = 0.0;
    let mut sxtwy = 0.0;
    let mut swy = 0.0;
    for ((&xi, &yi), &wi) in x.iter().zip(y).zip(w) {
        sxtw += xi * xi * wi;
        swx += xi * wi;
        sw += wi;
        sxtwy += xi * wi * yi;
        swy += wi * yi;
    }

    let det = sxtw * sw - swx * swx;
    let scale = (sxtw * sw).abs();
    if x.is_empty() || !det.is_finite() || det.abs() <= SINGULAR_TOLERANCE * scale {
        return Err(AutoPhaseError::SingularRegression {
            determinant: det,
            points: x.len(),
        });
    }

    Ok(LinearFit {
        slope: (sw * sxtwy - swx * swy) / det,
        intercept: (sxtw * swy - swx * sxtwy) / det,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} vs {} (tol {})", a, b, tol);
    }

    #[test]
    fn test_recovers_exact_line() {
        let x = [0.05, 0.2, 0.31, 0.5, 0.77, 0.93];
        let w = [3.0, 0.001, 12.5, 1.0, 7.25, 0.4];
        let y: Vec<f64> = x.iter().map(|xi| 12.5 - 47.0 * xi).collect();

        let fit = weighted_linear_regression(&x, &y, &w).unwrap();
        assert_close(fit.slope, -47.0, 1e-9);
        assert_close(fit.intercept, 12.5, 1e-9);
    }

    #[test]
    fn test_two_points_fit_exactly() {
        let fit = weighted_linear_regression(&[0.25, 0.75], &[10.0, -20.0], &[5.0, 1.0]).unwrap();
        assert_close(fit.at(0.25), 10.0, 1e-9);
        assert_close(fit.at(0.75), -20.0, 1e-9);
    }

    #[test]
    fn test_line_passes_through_weighted_mean() {
        let x = [0.1, 0.4, 0.45, 0.9];
        let y = [3.0, -1.0, 8.0, 2.0];
        let w = [2.0, 1.0, 4.0, 0.5];
        let fit = weighted_linear_regression(&x, &y, &w).unwrap();

        let sw: f64 = w.iter().sum();
        let x_bar = x.iter().zip(&w).map(|(a, b)| a * b).sum::<f64>() / sw;
        let y_bar = y.iter().zip(&w).map(|(a, b)| a * b).sum::<f64>() / sw;
        assert_close(fit.at(x_bar), y_bar, 1e-9);
    }

    #[test]
    fn test_heavier_point_pulls_fit() {
        let x = [0.0, 0.5, 1.0];
        let y = [0.0, 10.0, 0.0];

        let even = weighted_linear_regression(&x, &y, &[1.0, 1.0, 1.0]).unwrap();
        let heavy = weighted_linear_regression(&x, &y, &[1.0, 10.0, 1.0]).unwrap();

        let r_even = (y[1] - even.at(x[1])).abs();
        let r_heavy = (y[1] - heavy.at(x[1])).abs();
        assert!(r_heavy < r_even, "{} should be below {}", r_heavy, r_even);
        assert_close(heavy.intercept, 100.0 / 12.0, 1e-9);
    }

    #[test]
    fn test_single_position_is_singular() {
        let err = weighted_linear_regression(&[0.3, 0.3, 0.3], &[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0])
            .unwrap_err();
        match err {
            AutoPhaseError::SingularRegression { points, .. } => assert_eq!(points, 3),
            other => panic!("unexpected error: {}", other),
        }

        let single = weighted_linear_regression(&[0.6], &[45.0], &[1e-8]);
        assert!(matches!(single, Err(AutoPhaseError::SingularRegression { points: 1, .. })));
    }

    #[test]
    fn test_empty_input_is_singular() {
        let err = weighted_linear_regression(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, AutoPhaseError::SingularRegression { points: 0, .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let err = weighted_linear_regression(&[0.1, 0.2], &[1.0], &[1.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            AutoPhaseError::LengthMismatch { stage: Stage::Regression, left: 2, right: 1 }
        ));
    }
}
