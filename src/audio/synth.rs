//! Deterministic test signals.

use std::f64::consts::TAU;

/// `len` samples of a sine at `frequency_hz`, starting at phase zero.
pub fn sine(frequency_hz: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
    let step = TAU * frequency_hz as f64 / sample_rate as f64;
    (0..len)
        .map(|i| amplitude * ((i as f64 * step) % TAU).sin() as f32)
        .collect()
}

pub fn silence(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_shape() {
        let samples = sine(1.0, 4, 4, 2.0);
        assert!(samples[0].abs() < 1e-6);
        assert!((samples[1] - 2.0).abs() < 1e-5);
        assert!(samples[2].abs() < 1e-5);
        assert!((samples[3] + 2.0).abs() < 1e-5);
    }
}
