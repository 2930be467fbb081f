//! Audio capture and analysis configuration.

/// Capture-side parameters, applied when the input device is opened.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Minimum analysis history (samples). The ring length is this value
    /// rounded down to a whole number of periods, and never less than one period.
    pub min_history_samples: usize,

    /// Period (samples per callback) requested from the driver.
    /// The driver may negotiate a different value.
    pub requested_period: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_history_samples: 8192,
            requested_period: 512,
        }
    }
}

/// Spectral analysis parameters.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Lowest target frequency (Hz). 55 Hz = A1
    pub base_frequency_hz: f32,

    /// Ladder resolution: 12 = semitones, 24 = quarter tones
    pub steps_per_octave: u32,

    /// Number of target frequencies (= number of bands drawn)
    pub band_count: usize,

    /// Per-frame decay of the rolling peak used for normalisation (0..1)
    pub peak_decay: f32,

    /// Lowest value the rolling peak may decay to (Goertzel amplitude units).
    /// Keeps a quiet room from being stretched to full brightness.
    pub peak_floor: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_frequency_hz: 55.0,
            steps_per_octave: 12,
            band_count: 72, // six octaves, tops out just under 3.5 kHz
            peak_decay: 0.99,
            peak_floor: 1.0,
        }
    }
}

impl AnalysisConfig {
    /// Equal-tempered frequency ladder starting at `base_frequency_hz`.
    pub fn frequencies(&self) -> Vec<f32> {
        note_ladder(self.base_frequency_hz, self.steps_per_octave, self.band_count)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_frequency_hz.is_finite() && self.base_frequency_hz > 0.0) {
            return Err(format!(
                "base frequency must be positive, got {}",
                self.base_frequency_hz
            ));
        }
        if self.steps_per_octave == 0 {
            return Err("steps per octave must be > 0".to_string());
        }
        if self.band_count == 0 {
            return Err("band count must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.peak_decay) {
            return Err(format!("peak decay must be in 0..=1, got {}", self.peak_decay));
        }
        if !(self.peak_floor.is_finite() && self.peak_floor > 0.0) {
            return Err(format!("peak floor must be positive, got {}", self.peak_floor));
        }
        Ok(())
    }
}

/// `count` frequencies spaced `1/steps_per_octave` of an octave apart.
pub fn note_ladder(base_hz: f32, steps_per_octave: u32, count: usize) -> Vec<f32> {
    (0..count)
        .map(|step| base_hz * 2f32.powf(step as f32 / steps_per_octave as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_ladder_octaves() {
        let ladder = note_ladder(110.0, 12, 25);
        assert_eq!(ladder.len(), 25);
        assert!((ladder[0] - 110.0).abs() < 1e-3);
        assert!((ladder[12] - 220.0).abs() < 1e-2);
        assert!((ladder[24] - 440.0).abs() < 1e-2);
    }

    #[test]
    fn test_default_ladder_fits_low_rate_devices() {
        // An 8 kHz device has a 4 kHz Nyquist limit
        let config = AnalysisConfig::default();
        let top = *config.frequencies().last().unwrap();
        assert!(top < 4000.0, "top band {} Hz", top);
    }

    #[test]
    fn test_validate_rejects_bad_decay() {
        let config = AnalysisConfig {
            peak_decay: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(AnalysisConfig::default().validate().is_ok());
    }
}
