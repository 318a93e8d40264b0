//! Clip sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! ## Design
//!
//! A batch has a single time axis and a single sample rate, so clips recorded
//! at different rates must be brought to a common rate before they are stacked.
//! `RateConverter` does this one whole clip at a time, with every channel
//! resampled in the same rubato call.
//!
//! When source rate == target rate, `RateConverter` is a passthrough and no
//! rubato session is created at all.
//!
//! ## Usage
//!
//! ```ignore
//! let mut rc = RateConverter::new(48_000, 16_000, 2, 1024)?;
//! let clip_16k = rc.process_clip(&clip_48k)?;
//! ```

use ndarray::{s, Array2};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::batch::clip::AudioClip;
use crate::error::{Result, ShiftError};

/// Converts planar f32 audio from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` when source rate == target rate (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    source_rate: u32,
    target_rate: u32,
    channels: usize,
    /// How many input frames rubato expects per process call.
    chunk_size: usize,
    /// Pre-allocated output buffer: `[channels][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// Create a new converter.
    ///
    /// # Parameters
    /// - `source_rate`: Sample rate of the incoming clips (Hz).
    /// - `target_rate`: Sample rate of the produced clips (Hz).
    /// - `channels`: Channel count of every clip passed to `process_clip`.
    /// - `chunk_size`: Input frame count per rubato call (e.g. `1024`).
    ///
    /// # Errors
    /// Returns `ShiftError::Resample` for a zero `chunk_size` or if rubato
    /// fails to initialise.
    pub fn new(source_rate: u32, target_rate: u32, channels: usize, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ShiftError::Resample("chunk_size must be at least 1".into()));
        }
        if source_rate == target_rate {
            return Ok(Self {
                resampler: None,
                source_rate,
                target_rate,
                channels,
                chunk_size,
                output_buf: Vec::new(),
            });
        }
        if source_rate == 0 || target_rate == 0 {
            return Err(ShiftError::Resample(format!(
                "cannot resample between {source_rate} Hz and {target_rate} Hz"
            )));
        }

        let ratio = target_rate as f64 / source_rate as f64;

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio, no dynamic adjustment
            PolynomialDegree::Cubic,
            chunk_size,
            channels,
        )
        .map_err(|e| ShiftError::Resample(format!("resampler init: {e}")))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; channels];

        tracing::info!(
            source_rate,
            target_rate,
            channels,
            chunk_size,
            max_out,
            "resampling enabled from={} to={}",
            source_rate,
            target_rate
        );

        Ok(Self {
            resampler: Some(resampler),
            source_rate,
            target_rate,
            channels,
            chunk_size,
            output_buf,
        })
    }

    /// Resample a whole clip.
    ///
    /// The clip is fed in `chunk_size` blocks; the last block is zero-padded
    /// and extra blocks of silence flush the filter delay. The output is
    /// aligned to the input (the resampler delay is dropped) and trimmed to
    /// `round(frames * target_rate / source_rate)` frames.
    ///
    /// # Errors
    /// Returns `ShiftError::ClipMismatch` when the clip's rate or channel count
    /// differs from this converter's, and `ShiftError::Resample` on rubato failure.
    pub fn process_clip(&mut self, clip: &AudioClip) -> Result<AudioClip> {
        if clip.sample_rate != self.source_rate {
            return Err(ShiftError::ClipMismatch(format!(
                "converter expects {} Hz, clip is {} Hz",
                self.source_rate, clip.sample_rate
            )));
        }
        if clip.channels() != self.channels {
            return Err(ShiftError::ClipMismatch(format!(
                "converter expects {} channels, clip has {}",
                self.channels,
                clip.channels()
            )));
        }

        let Some(ref mut resampler) = self.resampler else {
            return Ok(clip.clone());
        };
        resampler.reset();

        let frames = clip.frames();
        let ratio = self.target_rate as f64 / self.source_rate as f64;
        let expected = (frames as f64 * ratio).round() as usize;
        let delay = resampler.output_delay();

        let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); self.channels];
        let mut input: Vec<Vec<f32>> = vec![vec![0f32; self.chunk_size]; self.channels];
        let mut start = 0usize;

        // Each call should yield about chunk_size * ratio frames; allow double.
        let needed_input = ((expected + delay) as f64 / ratio).ceil() as usize + self.chunk_size;
        let max_calls = 2 * needed_input.div_ceil(self.chunk_size) + 2;
        let mut calls = 0usize;

        while planar.first().map_or(expected + delay, Vec::len) < expected + delay {
            if calls == max_calls {
                return Err(ShiftError::Resample(format!(
                    "resampler stalled: {} of {} frames after {calls} calls",
                    planar.first().map_or(0, Vec::len),
                    expected + delay
                )));
            }
            calls += 1;
            let end = (start + self.chunk_size).min(frames);
            for (ch, buf) in input.iter_mut().enumerate() {
                buf.fill(0.0);
                if start < end {
                    let src = clip.samples.slice(s![ch, start..end]);
                    for (dst, &v) in buf.iter_mut().zip(src.iter()) {
                        *dst = v;
                    }
                }
            }

            let (_consumed, produced) = resampler
                .process_into_buffer(&input, &mut self.output_buf, None)
                .map_err(|e| ShiftError::Resample(format!("resampler process: {e}")))?;
            for (out, buf) in planar.iter_mut().zip(&self.output_buf) {
                out.extend_from_slice(&buf[..produced]);
            }
            start = end;
        }

        let mut samples = Array2::<f32>::zeros((self.channels, expected));
        for (ch, out) in planar.iter().enumerate() {
            for (dst, &v) in samples
                .row_mut(ch)
                .iter_mut()
                .zip(&out[delay..delay + expected])
            {
                *dst = v;
            }
        }

        Ok(AudioClip::new(samples, self.target_rate))
    }

    /// Returns `true` when source rate == target rate (no resampling occurs).
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}
