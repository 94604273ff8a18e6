//! Elementwise helpers on plain `f64` arrays.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArrayError {
    #[error("size mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("empty input")]
    Empty,
    #[error("zero variance, correlation undefined")]
    ZeroVariance,
    #[error("index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no {0} values to estimate noise from")]
    NoValues(&'static str),
}

/// Right-hand side of [`subtract`]
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Array(&'a [f64]),
    Constant(f64),
}

impl<'a> From<&'a [f64]> for Operand<'a> {
    fn from(values: &'a [f64]) -> Self {
        Operand::Array(values)
    }
}

impl<'a> From<&'a Vec<f64>> for Operand<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        Operand::Array(values)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Constant(value)
    }
}

/// `a - b`, elementwise or against a constant
pub fn subtract<'a>(a: &[f64], b: impl Into<Operand<'a>>) -> Result<Vec<f64>, ArrayError> {
    match b.into() {
        Operand::Constant(c) => Ok(a.iter().map(|v| v - c).collect()),
        Operand::Array(b) => {
            if a.len() != b.len() {
                return Err(ArrayError::LengthMismatch {
                    left: a.len(),
                    right: b.len(),
                });
            }
            Ok(a.iter().zip(b).map(|(x, y)| x - y).collect())
        }
    }
}

/// Index of the value closest to `target` in an ascending array
pub fn find_closest_index(x: &[f64], target: f64) -> Option<usize> {
    if x.is_empty() {
        return None;
    }
    let upper = x.partition_point(|&v| v < target);
    if upper == 0 {
        return Some(0);
    }
    if upper == x.len() {
        return Some(x.len() - 1);
    }
    let lower = upper - 1;
    if (target - x[lower]).abs() <= (x[upper] - target).abs() {
        Some(lower)
    } else {
        Some(upper)
    }
}
