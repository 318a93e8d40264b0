//! Randomized time shift with optional rollover.
//!
//! ## Flow
//!
//! ```text
//! ShiftConfig ──validate──► Shift
//!                             │
//!   AudioBatch + sample rate ─┤ randomize(rng) ──► ShiftVector (one i32 per example)
//!                             │
//!   AudioBatch + ShiftVector ─┴ apply ──► shifted AudioBatch (same shape)
//! ```
//!
//! The shift vector is returned to the caller rather than stored on the
//! operator, so one `Shift` can be shared freely and `apply` can be replayed
//! with a recorded vector.
//!
//! The `WaveformTransform` trait is the seam an augmentation pipeline plugs
//! into: it decides *whether* to transform a sub-batch and hands the selected
//! examples to `randomize_parameters` / `apply_transform`.

pub mod engine;
pub mod randomize;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::batch::AudioBatch;
use crate::error::{Result, ShiftError};

/// Unit that `min_shift` / `max_shift` are expressed in.
///
/// Deserialization goes through `FromStr`, so serde and the CLI accept and
/// reject exactly the same strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftUnit {
    /// Fraction of the batch's time length.
    Fraction,
    /// Whole audio samples.
    Samples,
    /// Seconds; needs the sample rate at randomization time.
    Seconds,
}

impl ShiftUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftUnit::Fraction => "fraction",
            ShiftUnit::Samples => "samples",
            ShiftUnit::Seconds => "seconds",
        }
    }
}

impl fmt::Display for ShiftUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftUnit {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fraction" => Ok(ShiftUnit::Fraction),
            "samples" => Ok(ShiftUnit::Samples),
            "seconds" => Ok(ShiftUnit::Seconds),
            other => Err(ShiftError::Config(format!(
                "shift_unit must be \"samples\", \"fraction\" or \"seconds\", got {other:?}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for ShiftUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|e| match e {
            ShiftError::Config(msg) => serde::de::Error::custom(msg),
            other => serde::de::Error::custom(other),
        })
    }
}

/// Configuration for `Shift`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    /// Lower bound of the shift, in `shift_unit`. Default: -0.5.
    pub min_shift: f64,
    /// Upper bound of the shift, in `shift_unit`. Default: 0.5.
    pub max_shift: f64,
    /// Default: `fraction`.
    pub shift_unit: ShiftUnit,
    /// `true`: content leaving one edge re-enters at the other.
    /// `false`: vacated positions are zero-filled. Default: `true`.
    pub rollover: bool,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            min_shift: -0.5,
            max_shift: 0.5,
            shift_unit: ShiftUnit::Fraction,
            rollover: true,
        }
    }
}

impl ShiftConfig {
    /// Check the construction-time invariants.
    ///
    /// # Errors
    /// `ShiftError::Config` for non-finite bounds, `min_shift > max_shift`,
    /// or fractional bounds when the unit is `samples`.
    pub fn validate(&self) -> Result<()> {
        if !self.min_shift.is_finite() || !self.max_shift.is_finite() {
            return Err(ShiftError::Config(format!(
                "shift bounds must be finite, got [{}, {}]",
                self.min_shift, self.max_shift
            )));
        }
        if self.min_shift > self.max_shift {
            return Err(ShiftError::Config(
                "min_shift must not be greater than max_shift".into(),
            ));
        }
        if self.shift_unit == ShiftUnit::Samples
            && (self.min_shift.fract() != 0.0 || self.max_shift.fract() != 0.0)
        {
            return Err(ShiftError::Config(format!(
                "shift_unit \"samples\" needs whole numbers, got [{}, {}]",
                self.min_shift, self.max_shift
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing keys take their defaults.
    ///
    /// # Errors
    /// `ShiftError::Config` for well-formed JSON with bad values (unknown unit,
    /// wrong types, failed `validate`); `ShiftError::Json` for malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| {
            if e.is_data() {
                ShiftError::Config(e.to_string())
            } else {
                ShiftError::Json(e)
            }
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// One signed shift amount, in samples, per batch element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftVector(Array1<i32>);

impl ShiftVector {
    pub fn new(shifts: Array1<i32>) -> Self {
        Self(shifts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, i32> {
        self.0.view()
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.0.to_vec()
    }

    pub fn into_inner(self) -> Array1<i32> {
        self.0
    }
}

impl From<Vec<i32>> for ShiftVector {
    fn from(shifts: Vec<i32>) -> Self {
        Self(Array1::from(shifts))
    }
}

/// Contract between an augmentation pipeline and a randomized waveform operator.
pub trait WaveformTransform: Send + Sync {
    /// Per-call randomized state produced by `randomize_parameters`.
    type Params;

    /// Whether `randomize_parameters` needs a sample rate for this configuration.
    fn is_sample_rate_required(&self) -> bool;

    /// Draw fresh parameters for the selected examples.
    fn randomize_parameters(
        &self,
        batch: &AudioBatch,
        sample_rate: Option<u32>,
        rng: &mut dyn RngCore,
    ) -> Result<Self::Params>;

    /// Transform the selected examples with previously drawn parameters.
    fn apply_transform(&self, batch: &AudioBatch, params: &Self::Params) -> Result<AudioBatch>;
}

/// Shift audio forwards or backwards in time, with or without rollover.
#[derive(Debug, Clone)]
pub struct Shift {
    config: ShiftConfig,
}

impl Shift {
    /// Create a shift operator.
    ///
    /// # Errors
    /// Returns `ShiftError::Config` if the bounds are inverted or invalid for the unit.
    pub fn new(min_shift: f64, max_shift: f64, shift_unit: ShiftUnit, rollover: bool) -> Result<Self> {
        Self::from_config(ShiftConfig {
            min_shift,
            max_shift,
            shift_unit,
            rollover,
        })
    }

    /// Create from config.
    ///
    /// # Errors
    /// Returns `ShiftError::Config` when `config.validate()` fails.
    pub fn from_config(config: ShiftConfig) -> Result<Self> {
        config.validate()?;
        info!(
            min_shift = config.min_shift,
            max_shift = config.max_shift,
            unit = config.shift_unit.as_str(),
            rollover = config.rollover,
            "shift configured"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &ShiftConfig {
        &self.config
    }

    /// `true` iff the unit is `seconds`.
    pub fn requires_sample_rate(&self) -> bool {
        self.config.shift_unit == ShiftUnit::Seconds
    }

    /// Convert the configured range to samples and draw one shift per example.
    ///
    /// # Errors
    /// - `ShiftError::MissingSampleRate` for the `seconds` unit without a positive rate.
    /// - `ShiftError::Range` when a converted bound does not fit in `i32`.
    pub fn randomize<R: RngCore + ?Sized>(
        &self,
        batch: &AudioBatch,
        sample_rate: Option<u32>,
        rng: &mut R,
    ) -> Result<ShiftVector> {
        let (lo, hi) = randomize::bounds_in_samples(&self.config, batch.time_len(), sample_rate)?;
        let shifts = randomize::draw_shifts(lo, hi, batch.batch_size(), rng);
        debug!(
            batch_size = batch.batch_size(),
            lo,
            hi,
            "drew shift vector"
        );
        Ok(shifts)
    }

    /// Shift every example by its entry in `shifts`.
    ///
    /// The input is left untouched; the output has the same shape and rank.
    ///
    /// # Errors
    /// Returns `ShiftError::ShiftLength` if `shifts` does not match the batch size.
    pub fn apply(&self, batch: &AudioBatch, shifts: &ShiftVector) -> Result<AudioBatch> {
        let shifted = engine::shift_batch(batch.view(), shifts.view(), self.config.rollover)?;
        debug!(
            batch_size = batch.batch_size(),
            channels = batch.channels(),
            time_len = batch.time_len(),
            rollover = self.config.rollover,
            "applied shift"
        );
        Ok(batch.with_samples(shifted))
    }

    /// `randomize` followed by `apply`, returning both the drawn shifts and the result.
    pub fn process<R: RngCore + ?Sized>(
        &self,
        batch: &AudioBatch,
        sample_rate: Option<u32>,
        rng: &mut R,
    ) -> Result<(ShiftVector, AudioBatch)> {
        let shifts = self.randomize(batch, sample_rate, rng)?;
        let shifted = self.apply(batch, &shifts)?;
        Ok((shifts, shifted))
    }
}

impl Default for Shift {
    fn default() -> Self {
        Self {
            config: ShiftConfig::default(),
        }
    }
}

impl WaveformTransform for Shift {
    type Params = ShiftVector;

    fn is_sample_rate_required(&self) -> bool {
        self.requires_sample_rate()
    }

    fn randomize_parameters(
        &self,
        batch: &AudioBatch,
        sample_rate: Option<u32>,
        rng: &mut dyn RngCore,
    ) -> Result<ShiftVector> {
        self.randomize(batch, sample_rate, rng)
    }

    fn apply_transform(&self, batch: &AudioBatch, params: &ShiftVector) -> Result<AudioBatch> {
        self.apply(batch, params)
    }
}
