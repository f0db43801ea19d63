use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::{FrequencyFrame, BIN_COUNT, FFT_SIZE};

/// Per-bin exponential smoothing factor, applied to linear magnitudes
/// before dB conversion.
const SMOOTHING: f32 = 0.6;

/// dB window mapped onto the 0..=255 byte range.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Spectral analysis of the decoded playback buffer.
///
/// Produces one [`FrequencyFrame`] per call from the 2048 samples ending at
/// the given playhead: Hann window, forward FFT, magnitude smoothing, then
/// the dB-to-byte mapping. Sampling is read-only with respect to the audio;
/// the only state carried across frames is the smoothing history.
pub struct FrequencySampler {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    samples: Vec<f32>,
}

impl FrequencySampler {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            fft,
            window: hann_window(FFT_SIZE),
            smoothed: vec![0.0; BIN_COUNT],
            samples: Vec::new(),
        }
    }

    /// Attach the mono mixdown of a freshly decoded track.
    pub fn load(&mut self, mono: Vec<f32>) {
        self.samples = mono;
        self.reset();
    }

    /// Clear the smoothing history, e.g. when a new playback node starts.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Capture the spectrum at `playhead` (a sample offset into the track).
    ///
    /// Never fails: before audio is loaded, or past the end of the buffer,
    /// the frame degrades toward silence rather than erroring.
    pub fn sample(&mut self, playhead: usize) -> FrequencyFrame {
        if self.samples.is_empty() {
            return FrequencyFrame::default();
        }

        let end = playhead.min(self.samples.len());
        let start = end.saturating_sub(FFT_SIZE);

        let mut buffer = vec![Complex::new(0.0f32, 0.0); FFT_SIZE];
        for (i, &s) in self.samples[start..end].iter().enumerate() {
            buffer[i] = Complex::new(s * self.window[i], 0.0);
        }

        self.fft.process(&mut buffer);

        let mut frame = FrequencyFrame::default();
        for i in 0..BIN_COUNT {
            let magnitude = buffer[i].norm() / FFT_SIZE as f32;
            self.smoothed[i] = SMOOTHING * self.smoothed[i] + (1.0 - SMOOTHING) * magnitude;
            frame.bins[i] = magnitude_to_byte(self.smoothed[i]);
        }

        frame
    }
}

impl Default for FrequencySampler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Map a linear magnitude onto the [MIN_DB, MAX_DB] window as a byte.
fn magnitude_to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB);
    (scaled.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window_edges_and_center() {
        let size = 1024;
        let window = hann_window(size);

        assert!(window[0].abs() < 0.01);
        assert!(window[size - 1].abs() < 0.01);
        assert!((window[size / 2] - 1.0).abs() < 0.01);
    }

    #[test]
    fn byte_mapping_bounds() {
        assert_eq!(magnitude_to_byte(0.0), 0);
        // -120 dB, below the window floor
        assert_eq!(magnitude_to_byte(1e-6), 0);
        // 0 dB, above the window ceiling
        assert_eq!(magnitude_to_byte(1.0), 255);
    }

    #[test]
    fn byte_mapping_midpoint() {
        // -65 dB sits exactly halfway between -100 and -30
        let magnitude = 10.0f32.powf(-65.0 / 20.0);
        let byte = magnitude_to_byte(magnitude);
        assert!((126..=128).contains(&byte), "got {}", byte);
    }

    #[test]
    fn unloaded_sampler_returns_silence() {
        let mut sampler = FrequencySampler::new();
        let frame = sampler.sample(0);
        assert_eq!(frame.len(), BIN_COUNT);
        assert!(frame.is_silent());
    }

    #[test]
    fn silent_audio_stays_silent() {
        let mut sampler = FrequencySampler::new();
        sampler.load(vec![0.0; FFT_SIZE * 4]);
        for playhead in [0, FFT_SIZE, FFT_SIZE * 2, FFT_SIZE * 4] {
            assert!(sampler.sample(playhead).is_silent());
        }
    }

    #[test]
    fn playhead_past_end_degrades_to_silence() {
        let mut sampler = FrequencySampler::new();
        sampler.load(vec![0.0; FFT_SIZE]);
        assert!(sampler.sample(FFT_SIZE * 100).is_silent());
    }

    #[test]
    fn sine_peaks_at_its_own_bin() {
        let bin = 64;
        let samples: Vec<f32> = (0..FFT_SIZE * 2)
            .map(|i| {
                (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin()
            })
            .collect();

        let mut sampler = FrequencySampler::new();
        sampler.load(samples);
        let frame = sampler.sample(FFT_SIZE);

        assert!(frame.bins[bin] > 200, "peak bin = {}", frame.bins[bin]);
        assert!(
            frame.bins[bin] > frame.bins[512],
            "peak {} vs far bin {}",
            frame.bins[bin],
            frame.bins[512]
        );
    }

    #[test]
    fn smoothing_carries_energy_across_frames() {
        let bin = 64;
        let mut samples: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin()
            })
            .collect();
        // Tone, then silence
        samples.extend(std::iter::repeat(0.0).take(FFT_SIZE));

        let mut sampler = FrequencySampler::new();
        sampler.load(samples);
        let loud = sampler.sample(FFT_SIZE);

        // The smoothed magnitude decays over silent frames instead of
        // dropping straight to zero
        let mut after = FrequencyFrame::default();
        for _ in 0..4 {
            after = sampler.sample(FFT_SIZE * 2);
        }
        assert!(after.bins[bin] > 0);
        assert!(after.bins[bin] < loud.bins[bin]);
    }
}
