//! # shiftaug-core
//!
//! Randomized time-shift augmentation for batched multi-channel audio.
//!
//! ## Architecture
//!
//! ```text
//! WAV files ─► AudioClip ─► RateConverter ─► AudioBatch (B, C, T)
//!                                                  │
//!                                    Shift::randomize ─► ShiftVector
//!                                                  │
//!                                    Shift::apply (gather + zero-fill mask)
//!                                                  │
//!                                          shifted AudioBatch ─► clips ─► WAV
//! ```
//!
//! The operator is pure: `apply` never mutates its input and `Shift` holds no
//! per-call state, so randomness only enters through the caller's RNG.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod batch;
pub mod error;
pub mod shift;

// Convenience re-exports for downstream crates
pub use batch::{clip::AudioClip, AudioBatch};
pub use error::ShiftError;
pub use shift::{Shift, ShiftConfig, ShiftUnit, ShiftVector, WaveformTransform};
