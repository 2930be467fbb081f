//! Goertzel filter bank over the capture history.
//!
//! Each target frequency gets one second-order recurrence
//! `s0 = g*s1 - s2 + x` with `g = 2cos(2πf/fs)`; after the whole history has
//! been consumed the squared magnitude is `s1² + s2² - g*s1*s2`.
//!
//! The bank rescans the entire ring once per rendered frame. Running the
//! recurrence incrementally per audio period would lower the cost but change
//! the latency and smoothing of the visualisation.

use std::f64::consts::PI;

use super::ring::RingReader;
use crate::error::AnalysisError;

/// Precomputed coefficients for a fixed set of target frequencies.
#[derive(Debug, Clone)]
pub struct SpectralBank {
    frequencies: Vec<f32>,
    coefficients: Vec<f64>,
    sample_rate: u32,
}

impl SpectralBank {
    /// Build the bank for the sample rate the device actually negotiated.
    ///
    /// Frequencies at or above Nyquist are rejected: their coefficient is
    /// defined but the magnitude would be meaningless.
    pub fn new(frequencies: &[f32], sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::ZeroSampleRate);
        }
        if frequencies.is_empty() {
            return Err(AnalysisError::NoFrequencies);
        }

        let nyquist_hz = sample_rate as f32 / 2.0;
        for &frequency_hz in frequencies {
            if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
                return Err(AnalysisError::InvalidFrequency { frequency_hz });
            }
            if frequency_hz >= nyquist_hz {
                return Err(AnalysisError::AboveNyquist {
                    frequency_hz,
                    nyquist_hz,
                });
            }
        }

        let coefficients = frequencies
            .iter()
            .map(|&f| 2.0 * (2.0 * PI * f as f64 / sample_rate as f64).cos())
            .collect();

        Ok(Self {
            frequencies: frequencies.to_vec(),
            coefficients,
            sample_rate,
        })
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Scan the ring and return one squared magnitude per frequency.
    pub fn scan(&self, ring: &RingReader) -> Vec<f32> {
        let mut out = vec![0.0; self.len()];
        self.scan_into(ring, &mut out);
        out
    }

    /// Scan the ring oldest to newest, writing one magnitude per frequency.
    ///
    /// # Panics
    /// If `out` is not exactly one slot per frequency.
    pub fn scan_into(&self, ring: &RingReader, out: &mut [f32]) {
        let mut state = self.fresh_state();
        ring.for_each_ordered(|sample| self.step(&mut state, sample));
        self.finish(&state, out);
    }

    /// Same recurrence over a plain slice of samples.
    pub fn scan_samples(&self, samples: &[f32], out: &mut [f32]) {
        let mut state = self.fresh_state();
        for &sample in samples {
            self.step(&mut state, sample);
        }
        self.finish(&state, out);
    }

    /// `(s1, s2)` per frequency, reset for every scan.
    fn fresh_state(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 0.0); self.coefficients.len()]
    }

    #[inline]
    fn step(&self, state: &mut [(f64, f64)], sample: f32) {
        let x = sample as f64;
        for ((s1, s2), &g) in state.iter_mut().zip(&self.coefficients) {
            let s0 = g * *s1 - *s2 + x;
            *s2 = *s1;
            *s1 = s0;
        }
    }

    fn finish(&self, state: &[(f64, f64)], out: &mut [f32]) {
        assert_eq!(
            out.len(),
            self.coefficients.len(),
            "output needs one slot per frequency"
        );
        for ((slot, &(s1, s2)), &g) in out.iter_mut().zip(state).zip(&self.coefficients) {
            let power = s1 * s1 + s2 * s2 - g * s1 * s2;
            *slot = power.max(0.0) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth;

    #[test]
    fn test_coefficient_formula() {
        let bank = SpectralBank::new(&[12_000.0], 48_000).unwrap();
        // 2cos(π/2) = 0
        assert!(bank.coefficients()[0].abs() < 1e-9);

        let bank = SpectralBank::new(&[8_000.0], 48_000).unwrap();
        // 2cos(π/3) = 1
        assert!((bank.coefficients()[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_nyquist_and_above() {
        let err = SpectralBank::new(&[440.0, 4_000.0], 8_000).unwrap_err();
        assert!(matches!(err, AnalysisError::AboveNyquist { .. }));
        assert!(SpectralBank::new(&[3_999.0], 8_000).is_ok());
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(matches!(
            SpectralBank::new(&[0.0], 48_000),
            Err(AnalysisError::InvalidFrequency { .. })
        ));
        assert!(matches!(
            SpectralBank::new(&[f32::NAN], 48_000),
            Err(AnalysisError::InvalidFrequency { .. })
        ));
        assert!(matches!(
            SpectralBank::new(&[], 48_000),
            Err(AnalysisError::NoFrequencies)
        ));
        assert!(matches!(
            SpectralBank::new(&[440.0], 0),
            Err(AnalysisError::ZeroSampleRate)
        ));
    }

    #[test]
    fn test_silence_is_zero() {
        let bank = SpectralBank::new(&[110.0, 220.0, 440.0, 880.0], 48_000).unwrap();
        let mut out = [1.0; 4];
        bank.scan_samples(&synth::silence(4096), &mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn test_on_bin_magnitude_matches_dft() {
        // For an integer number of cycles the squared magnitude is (A·N/2)²
        let sample_rate = 48_000;
        let n = 4800;
        let samples = synth::sine(1_000.0, sample_rate, n, 1.0);
        let bank = SpectralBank::new(&[1_000.0], sample_rate).unwrap();
        let mut out = [0.0];
        bank.scan_samples(&samples, &mut out);

        let expected = (n as f32 / 2.0).powi(2);
        assert!(
            (out[0] - expected).abs() / expected < 1e-3,
            "got {}, expected {}",
            out[0],
            expected
        );
    }
}
