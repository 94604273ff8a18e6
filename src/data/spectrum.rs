use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Frequency-domain (or time-domain) 1D data as two index-aligned channels.
///
/// Index order is the frequency axis; no ppm or Hz calibration is carried
/// here, the phase-correction pipeline only needs positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Real channel
    pub real: Vec<f64>,
    /// Imaginary channel (same length as `real`)
    pub imag: Vec<f64>,
}

impl Spectrum {
    pub fn new(real: Vec<f64>, imag: Vec<f64>) -> Self {
        Self { real, imag }
    }

    /// Build from a slice of complex points
    pub fn from_complex(points: &[Complex<f64>]) -> Self {
        Self {
            real: points.iter().map(|c| c.re).collect(),
            imag: points.iter().map(|c| c.im).collect(),
        }
    }

    /// Number of points in the real channel
    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    /// Both channels have the same number of points
    pub fn is_consistent(&self) -> bool {
        self.real.len() == self.imag.len()
    }

    /// Iterate the spectrum as complex points
    pub fn iter_complex(&self) -> impl Iterator<Item = Complex<f64>> + '_ {
        self.real
            .iter()
            .zip(self.imag.iter())
            .map(|(&re, &im)| Complex::new(re, im))
    }

    /// Elementwise complex modulus, `sqrt(re² + im²)`
    pub fn magnitude(&self) -> Vec<f64> {
        self.iter_complex().map(|c| c.norm()).collect()
    }

    /// Owned copy of the points in `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Spectrum {
        Spectrum {
            real: self.real[start..end].to_vec(),
            imag: self.imag[start..end].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude() {
        let spectrum = Spectrum::new(vec![3.0, 0.0, -6.0], vec![4.0, -2.0, 8.0]);
        assert_eq!(spectrum.magnitude(), vec![5.0, 2.0, 10.0]);
    }

    #[test]
    fn test_magnitude_empty() {
        assert!(Spectrum::default().magnitude().is_empty());
    }

    #[test]
    fn test_slice_is_a_copy() {
        let spectrum = Spectrum::new(vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]);
        let mut part = spectrum.slice(1, 3);
        assert_eq!(part.real, vec![2.0, 3.0]);
        assert_eq!(part.imag, vec![6.0, 7.0]);

        part.real[0] = 100.0;
        assert_eq!(spectrum.real[1], 2.0);
    }

    #[test]
    fn test_from_complex() {
        let pts = [Complex::new(1.0, -1.0), Complex::new(0.5, 2.0)];
        let spectrum = Spectrum::from_complex(&pts);
        assert_eq!(spectrum.real, vec![1.0, 0.5]);
        assert_eq!(spectrum.imag, vec![-1.0, 2.0]);
        assert!(spectrum.is_consistent());
    }
}
