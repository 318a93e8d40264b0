//! A single multi-channel recording, the unit that WAV I/O and resampling work on.

use ndarray::{Array2, Axis};

/// Planar f32 PCM at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Samples in [-1.0, 1.0], shape `(channels, frames)`.
    pub samples: Array2<f32>,
    /// Sample rate in Hz (e.g. 16000, 44100, 48000).
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Array2<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.samples.len_of(Axis(0))
    }

    /// Number of time samples per channel.
    pub fn frames(&self) -> usize {
        self.samples.len_of(Axis(1))
    }

    /// Returns the duration of this clip in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Returns true if the clip contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
