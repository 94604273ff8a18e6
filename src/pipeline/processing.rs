/// Spectrum processing operations
///
/// Each operation takes a spectrum by reference, returns a new one and
/// records itself in the reproducibility log together with the equivalent
/// NMRPipe command.

use num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::data::spectrum::Spectrum;
use crate::log::reproducibility::ReproLog;
use super::autophase::{auto_phase_correction, AutoPhaseError, AutoPhaseOptions, AutoPhaseResult};

/// Processing operation descriptor, as stored in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProcessingOp {
    FourierTransform { use_imaginary: bool, size: usize },
    PhaseCorrection { ph0: f64, ph1: f64 },
    AutoPhase { min_reg_size: usize, regions: usize, ph0: f64, ph1: f64 },
}

impl std::fmt::Display for ProcessingOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingOp::FourierTransform { use_imaginary, size } => {
                if *use_imaginary {
                    write!(f, "Fourier Transform (Complex, {} points)", size)
                } else {
                    write!(f, "Fourier Transform (Real-only, {} points)", size)
                }
            }
            ProcessingOp::PhaseCorrection { ph0, ph1 } => {
                write!(f, "Phase Correction (PH0={:.1}°, PH1={:.1}°)", ph0, ph1)
            }
            ProcessingOp::AutoPhase { ph0, ph1, regions, .. } => write!(
                f,
                "Automatic Phase Correction (PH0={:.1}°, PH1={:.1}°, {} regions)",
                ph0, ph1, regions
            ),
        }
    }
}

// =========================================================================
//  Fourier Transform
// =========================================================================

/// Next power of two >= n
pub fn next_power_of_two(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// Complex FFT of time-domain data into a frequency-domain spectrum
///
/// The FID is zero-filled to a power of two, its first point halved, and
/// the result shifted and reversed so that index 0 is the highest
/// frequency (downfield end).
pub fn fourier_transform(fid: &Spectrum, use_imaginary: bool, log: &mut ReproLog) -> Spectrum {
    let n = fid.len();
    if n == 0 {
        return Spectrum::default();
    }

    let fft_size = next_power_of_two(n);

    let mut buffer: Vec<Complex<f64>> = if use_imaginary {
        fid.iter_complex().collect()
    } else {
        fid.real.iter().map(|&r| Complex::new(r, 0.0)).collect()
    };
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    // First-point correction removes the DC offset artefact (FT -auto)
    buffer[0] *= 0.5;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    // FFT shift, then reverse so index 0 is downfield
    let half = fft_size / 2;
    let mut shifted: Vec<Complex<f64>> = (0..fft_size)
        .map(|i| buffer[(i + half) % fft_size])
        .collect();
    shifted.reverse();

    let nmrpipe_cmd = if use_imaginary {
        "nmrPipe -fn FT -auto".to_string()
    } else {
        "nmrPipe -fn FT -real".to_string()
    };
    log.add_entry(
        ProcessingOp::FourierTransform {
            use_imaginary,
            size: fft_size,
        },
        &format!("FFT {} → {} points, with FFT shift", n, fft_size),
        &nmrpipe_cmd,
    );

    Spectrum::from_complex(&shifted)
}

// =========================================================================
//  Phase Correction
// =========================================================================

/// Rotate every point by `exp(i·(ph0 + ph1·k/n))`, angles in radians.
///
/// `ph1` is the total first-order change across the spectrum.
pub fn phase_correct(spectrum: &Spectrum, ph0: f64, ph1: f64) -> Spectrum {
    let n = spectrum.len();
    let points: Vec<Complex<f64>> = spectrum
        .iter_complex()
        .enumerate()
        .map(|(i, c)| {
            let frac = i as f64 / n as f64;
            c * Complex::from_polar(1.0, ph0 + ph1 * frac)
        })
        .collect();
    Spectrum::from_complex(&points)
}

/// Apply zero-order and first-order phase correction given in degrees
pub fn apply_phase_correction(
    spectrum: &Spectrum,
    ph0_degrees: f64,
    ph1_degrees: f64,
    log: &mut ReproLog,
) -> Spectrum {
    let phased = phase_correct(spectrum, ph0_degrees.to_radians(), ph1_degrees.to_radians());

    let nmrpipe_cmd = format!("nmrPipe -fn PS -p0 {:.2} -p1 {:.2} -di", ph0_degrees, ph1_degrees);
    log.add_entry(
        ProcessingOp::PhaseCorrection {
            ph0: ph0_degrees,
            ph1: ph1_degrees,
        },
        &format!("PH0={:.2}°, PH1={:.2}°", ph0_degrees, ph1_degrees),
        &nmrpipe_cmd,
    );
    phased
}

/// Automatic phase correction, recorded in the log on success
pub fn auto_phase(
    spectrum: &Spectrum,
    options: &AutoPhaseOptions,
    log: &mut ReproLog,
) -> Result<AutoPhaseResult, AutoPhaseError> {
    let result = auto_phase_correction(spectrum, options).map_err(|e| {
        log::warn!("Automatic phase correction failed: {}", e);
        e
    })?;

    let nmrpipe_cmd = format!("nmrPipe -fn PS -p0 {:.2} -p1 {:.2} -di", result.ph0, result.ph1);
    log.add_entry(
        ProcessingOp::AutoPhase {
            min_reg_size: options.min_reg_size,
            regions: result.regions.len(),
            ph0: result.ph0,
            ph1: result.ph1,
        },
        &format!(
            "PH0={:.2}°, PH1={:.2}° from {} regions (min region {} points, {} warnings)",
            result.ph0,
            result.ph1,
            result.regions.len(),
            options.min_reg_size,
            result.warnings.len()
        ),
        &nmrpipe_cmd,
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(1024), 1024);
        assert_eq!(next_power_of_two(1025), 2048);
    }

    #[test]
    fn test_phase_correct_zero_order() {
        let spectrum = Spectrum::new(vec![1.0, 0.0], vec![0.0, 1.0]);
        let out = phase_correct(&spectrum, PI / 2.0, 0.0);
        assert!((out.real[0] - 0.0).abs() < 1e-12);
        assert!((out.imag[0] - 1.0).abs() < 1e-12);
        assert!((out.real[1] + 1.0).abs() < 1e-12);
        assert!(out.imag[1].abs() < 1e-12);
    }

    #[test]
    fn test_phase_correct_first_order_ramp() {
        let n = 8;
        let spectrum = Spectrum::new(vec![1.0; n], vec![0.0; n]);
        let out = phase_correct(&spectrum, 0.0, PI);
        for i in 0..n {
            let expected = PI * i as f64 / n as f64;
            assert!((out.real[i] - expected.cos()).abs() < 1e-12);
            assert!((out.imag[i] - expected.sin()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_phase_correct_round_trip() {
        let spectrum = Spectrum::new(vec![0.3, -1.2, 4.0, 2.5], vec![1.0, 0.7, -0.2, 0.0]);
        let there = phase_correct(&spectrum, 0.8, -2.1);
        let back = phase_correct(&there, -0.8, 2.1);
        for i in 0..spectrum.len() {
            assert!((back.real[i] - spectrum.real[i]).abs() < 1e-12);
            assert!((back.imag[i] - spectrum.imag[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_apply_phase_correction_logs() {
        let mut log = ReproLog::new();
        let spectrum = Spectrum::new(vec![1.0; 4], vec![0.0; 4]);
        let out = apply_phase_correction(&spectrum, 90.0, 0.0, &mut log);
        assert!(out.real[0].abs() < 1e-12);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.entries[0].op,
            ProcessingOp::PhaseCorrection { ph0: 90.0, ph1: 0.0 }
        );
        assert!(log.entries[0].nmrpipe_command.contains("-p0 90.00"));
    }

    #[test]
    fn test_fourier_transform_peak_position() {
        let n = 256;
        let k0 = 32.0;
        let fid: Vec<Complex<f64>> = (0..n)
            .map(|t| {
                let t = t as f64;
                Complex::from_polar((-0.05 * t).exp(), 2.0 * PI * k0 * t / n as f64)
            })
            .collect();
        let mut log = ReproLog::new();
        let spectrum = fourier_transform(&Spectrum::from_complex(&fid), true, &mut log);

        assert_eq!(spectrum.len(), n);
        let mag = spectrum.magnitude();
        let peak = mag
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        // bin 32 → shifted to 160 → reversed to 95
        assert_eq!(peak.0, 95);
        assert!(spectrum.real[95] > 0.0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_fourier_transform_zero_fills() {
        let fid = Spectrum::new(vec![1.0; 100], vec![0.0; 100]);
        let mut log = ReproLog::new();
        let spectrum = fourier_transform(&fid, false, &mut log);
        assert_eq!(spectrum.len(), 128);
        assert!(spectrum.is_consistent());
    }
}
