//! WAV file I/O via `hound`.
//!
//! Integer PCM of any bit depth is scaled to [-1.0, 1.0]; float PCM is read
//! as-is. Writing always produces 32-bit float WAV so shifted output keeps
//! full precision.

pub mod resample;

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use ndarray::{Array2, Axis};
use tracing::{debug, warn};

use crate::batch::clip::AudioClip;
use crate::error::{Result, ShiftError};

/// Read a WAV file into a planar `(channels, frames)` clip.
///
/// # Errors
/// Returns `ShiftError::Wav` if the file is missing or not a valid WAV.
pub fn read_wav(path: &Path) -> Result<AudioClip> {
    let reader = WavReader::open(path)?;
    let clip = read_wav_from(reader)?;
    debug!(
        path = %path.display(),
        channels = clip.channels(),
        frames = clip.frames(),
        sample_rate = clip.sample_rate,
        "read wav"
    );
    Ok(clip)
}

/// Decode an already opened WAV stream.
pub fn read_wav_from<R: Read>(mut reader: WavReader<R>) -> Result<AudioClip> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(ShiftError::ClipMismatch("WAV declares zero channels".into()));
    }

    let mut interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample)?;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let remainder = interleaved.len() % channels;
    if remainder != 0 {
        warn!(remainder, "dropping trailing partial frame");
        interleaved.truncate(interleaved.len() - remainder);
    }
    let frames = interleaved.len() / channels;

    let samples = Array2::from_shape_vec((frames, channels), interleaved)?
        .reversed_axes()
        .as_standard_layout()
        .into_owned();

    Ok(AudioClip::new(samples, spec.sample_rate))
}

/// Factor mapping signed `bits`-wide PCM onto [-1.0, 1.0].
fn int_scale(bits: u16) -> Result<f32> {
    if !(1..=32).contains(&bits) {
        return Err(ShiftError::Wav(hound::Error::FormatError(
            "integer PCM bit depth must be between 1 and 32",
        )));
    }
    Ok(1.0 / (1u64 << (bits - 1)) as f32)
}

/// Write a clip as 32-bit float WAV, creating or truncating `path`.
pub fn write_wav(path: &Path, clip: &AudioClip) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    write_wav_to(file, clip)?;
    debug!(path = %path.display(), frames = clip.frames(), "wrote wav");
    Ok(())
}

/// Encode a clip as 32-bit float WAV into any seekable writer.
pub fn write_wav_to<W: Write + Seek>(writer: W, clip: &AudioClip) -> Result<()> {
    let channels = u16::try_from(clip.channels())
        .map_err(|_| ShiftError::ClipMismatch(format!("{} channels", clip.channels())))?;
    let spec = WavSpec {
        channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut wav = WavWriter::new(writer, spec)?;
    for frame in clip.samples.axis_iter(Axis(1)) {
        for &sample in frame {
            wav.write_sample(sample)?;
        }
    }
    wav.finalize()?;
    Ok(())
}
