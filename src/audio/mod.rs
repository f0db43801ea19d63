pub mod playback;
pub mod sampler;
pub mod timer;

pub use playback::{PlaybackController, Transport};
pub use sampler::FrequencySampler;
pub use timer::TimerModel;

/// Analysis window size in samples; one frame carries half as many bins.
pub const FFT_SIZE: usize = 2048;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// One frame of frequency magnitudes, one unsigned byte per bin.
///
/// Zero-filled before any audio has played; immutable once handed to the
/// renderer for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyFrame {
    pub bins: Vec<u8>,
}

impl Default for FrequencyFrame {
    fn default() -> Self {
        Self {
            bins: vec![0; BIN_COUNT],
        }
    }
}

impl FrequencyFrame {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.bins.iter().all(|&b| b == 0)
    }
}

/// Playback lifecycle; mutated only by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

/// Fully decoded PCM, kept around so a replay never re-reads the file.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples as decoded, used to build each playback node.
    pub interleaved: Vec<f32>,
    /// Mono mixdown for spectral analysis.
    pub mono: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.mono.len() as f32 / self.sample_rate as f32
    }
}
