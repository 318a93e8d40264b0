//! Rank-3 `(batch, channels, time)` container fed to the shift operator.
//!
//! Callers may hand in a single `(channels, time)` example. It is promoted to
//! a batch of one and `into_dyn` demotes the result back, so the operator
//! itself only ever sees rank 3.

pub mod clip;

use ndarray::{s, Array2, Array3, ArrayD, ArrayView3, Axis, Ix2, Ix3};
use tracing::warn;

use crate::error::{Result, ShiftError};
use clip::AudioClip;

/// A batch of multi-channel audio examples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBatch {
    samples: Array3<f32>,
    /// `true` when built from a rank-2 example and must be returned as rank 2.
    promoted: bool,
}

impl AudioBatch {
    /// Wrap a `(batch, channels, time)` array.
    pub fn new(samples: Array3<f32>) -> Self {
        Self {
            samples,
            promoted: false,
        }
    }

    /// Wrap a single `(channels, time)` example as a batch of one.
    pub fn from_example(samples: Array2<f32>) -> Self {
        Self {
            samples: samples.insert_axis(Axis(0)),
            promoted: true,
        }
    }

    /// Accept a rank-2 or rank-3 array of any shape.
    ///
    /// # Errors
    /// Returns `ShiftError::Rank` for any other rank.
    pub fn from_dyn(samples: ArrayD<f32>) -> Result<Self> {
        match samples.ndim() {
            2 => Ok(Self::from_example(samples.into_dimensionality::<Ix2>()?)),
            3 => Ok(Self::new(samples.into_dimensionality::<Ix3>()?)),
            rank => Err(ShiftError::Rank(rank)),
        }
    }

    /// Return the samples at the rank they were supplied with.
    pub fn into_dyn(self) -> ArrayD<f32> {
        if self.promoted {
            self.samples.index_axis_move(Axis(0), 0).into_dyn()
        } else {
            self.samples.into_dyn()
        }
    }

    /// Stack clips that share a channel count and sample rate.
    ///
    /// Shorter clips are zero-padded at the end to the longest clip's length.
    ///
    /// # Errors
    /// Returns `ShiftError::ClipMismatch` for an empty slice, or when channel
    /// counts or sample rates differ.
    pub fn from_clips(clips: &[AudioClip]) -> Result<Self> {
        let first = clips
            .first()
            .ok_or_else(|| ShiftError::ClipMismatch("no clips to batch".into()))?;
        let channels = first.channels();
        let sample_rate = first.sample_rate;

        for clip in clips {
            if clip.channels() != channels {
                return Err(ShiftError::ClipMismatch(format!(
                    "channel count {} differs from {}",
                    clip.channels(),
                    channels
                )));
            }
            if clip.sample_rate != sample_rate {
                return Err(ShiftError::ClipMismatch(format!(
                    "sample rate {} Hz differs from {} Hz; resample first",
                    clip.sample_rate, sample_rate
                )));
            }
        }

        let frames = clips.iter().map(AudioClip::frames).max().unwrap_or(0);
        let mut samples = Array3::<f32>::zeros((clips.len(), channels, frames));
        for (idx, clip) in clips.iter().enumerate() {
            if clip.frames() < frames {
                warn!(
                    clip = idx,
                    frames = clip.frames(),
                    padded_to = frames,
                    "zero-padding short clip"
                );
            }
            samples
                .slice_mut(s![idx, .., ..clip.frames()])
                .assign(&clip.samples);
        }

        Ok(Self::new(samples))
    }

    /// Split the batch back into clips, trimming each to `lengths[i]` frames.
    ///
    /// # Errors
    /// Returns `ShiftError::ClipMismatch` when `lengths` does not have one
    /// entry per batch element or an entry exceeds the batch time length.
    pub fn into_clips(self, sample_rate: u32, lengths: &[usize]) -> Result<Vec<AudioClip>> {
        if lengths.len() != self.batch_size() {
            return Err(ShiftError::ClipMismatch(format!(
                "{} lengths for a batch of {}",
                lengths.len(),
                self.batch_size()
            )));
        }
        let time_len = self.time_len();
        if let Some(&too_long) = lengths.iter().find(|&&len| len > time_len) {
            return Err(ShiftError::ClipMismatch(format!(
                "clip length {too_long} exceeds batch length {time_len}"
            )));
        }

        Ok(self
            .samples
            .axis_iter(Axis(0))
            .zip(lengths)
            .map(|(example, &len)| {
                AudioClip::new(example.slice(s![.., ..len]).to_owned(), sample_rate)
            })
            .collect())
    }

    /// Build a batch with new samples but the same rank bookkeeping.
    pub(crate) fn with_samples(&self, samples: Array3<f32>) -> Self {
        Self {
            samples,
            promoted: self.promoted,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.samples.len_of(Axis(0))
    }

    pub fn channels(&self) -> usize {
        self.samples.len_of(Axis(1))
    }

    /// Length of the time axis (the last dimension).
    pub fn time_len(&self) -> usize {
        self.samples.len_of(Axis(2))
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.samples.view()
    }

    pub fn samples(&self) -> &Array3<f32> {
        &self.samples
    }

    pub fn into_inner(self) -> Array3<f32> {
        self.samples
    }
}

impl From<Array3<f32>> for AudioBatch {
    fn from(samples: Array3<f32>) -> Self {
        Self::new(samples)
    }
}

impl From<Array2<f32>> for AudioBatch {
    fn from(samples: Array2<f32>) -> Self {
        Self::from_example(samples)
    }
}
