use crate::array::ArrayError;

/// Pearson correlation coefficient of two equal-length arrays
pub fn correlation(a: &[f64], b: &[f64]) -> Result<f64, ArrayError> {
    if a.len() != b.len() {
        return Err(ArrayError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(ArrayError::Empty);
    }

    let n = a.len() as f64;
    let (mut sum_a, mut sum_a2, mut sum_b, mut sum_b2, mut sum_ab) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        sum_a += x;
        sum_a2 += x * x;
        sum_b += y;
        sum_b2 += y * y;
        sum_ab += x * y;
    }

    let var_a = n * sum_a2 - sum_a * sum_a;
    let var_b = n * sum_b2 - sum_b * sum_b;
    if var_a <= 0.0 || var_b <= 0.0 {
        return Err(ArrayError::ZeroVariance);
    }
    Ok((n * sum_ab - sum_a * sum_b) / (var_a.sqrt() * var_b.sqrt()))
}
