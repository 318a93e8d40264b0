//! Subcommand implementations. Each returns a serializable report for `main` to print.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use shiftaug_core::audio::resample::RateConverter;
use shiftaug_core::audio::{read_wav, write_wav};
use shiftaug_core::{AudioBatch, AudioClip, Shift};
use tracing::info;

use crate::settings::AppSettings;

/// What happened to one input file.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub shift_samples: i32,
    pub shift_secs: f64,
    pub sample_rate: u32,
}

/// Read `inputs`, shift them as one batch, and write the results into `out_dir`.
pub fn shift_files(
    settings: &AppSettings,
    inputs: &[PathBuf],
    out_dir: &Path,
) -> Result<Vec<ShiftReport>> {
    if inputs.is_empty() {
        bail!("no input files given");
    }
    let shift = Shift::from_config(settings.shift).context("invalid shift configuration")?;

    let mut clips = Vec::with_capacity(inputs.len());
    for path in inputs {
        clips.push(read_wav(path).with_context(|| format!("reading {}", path.display()))?);
    }

    let sample_rate = settings
        .target_sample_rate
        .unwrap_or_else(|| clips[0].sample_rate);
    let clips = conform_rates(clips, sample_rate, settings.resample_chunk_size)?;
    let lengths: Vec<usize> = clips.iter().map(AudioClip::frames).collect();

    let batch = AudioBatch::from_clips(&clips).context("batching inputs")?;
    let mut rng = settings.rng();
    let (shifts, shifted) = shift.process(&batch, Some(sample_rate), &mut rng)?;
    let shifted = shifted.into_clips(sample_rate, &lengths)?;

    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut reports = Vec::with_capacity(inputs.len());
    for ((input, clip), &shift_samples) in inputs.iter().zip(&shifted).zip(shifts.view()) {
        let output = output_path(input, out_dir, &settings.output_suffix);
        write_wav(&output, clip).with_context(|| format!("writing {}", output.display()))?;
        info!(
            input = %input.display(),
            output = %output.display(),
            shift_samples,
            "shifted"
        );
        reports.push(ShiftReport {
            input: input.clone(),
            output,
            shift_samples,
            shift_secs: f64::from(shift_samples) / f64::from(sample_rate),
            sample_rate,
        });
    }

    Ok(reports)
}

/// Resample every clip not already at `sample_rate`.
fn conform_rates(clips: Vec<AudioClip>, sample_rate: u32, chunk_size: usize) -> Result<Vec<AudioClip>> {
    clips
        .into_iter()
        .map(|clip| -> Result<AudioClip> {
            if clip.sample_rate == sample_rate {
                return Ok(clip);
            }
            let mut rc = RateConverter::new(clip.sample_rate, sample_rate, clip.channels(), chunk_size)?;
            Ok(rc.process_clip(&clip)?)
        })
        .collect()
}

/// `<out_dir>/<stem><suffix>.wav`
pub fn output_path(input: &Path, out_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip".into());
    out_dir.join(format!("{stem}{suffix}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use shiftaug_core::{ShiftConfig, ShiftUnit};

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("shiftaug-commands-{}-{name}", std::process::id()))
    }

    #[test]
    fn output_path_appends_suffix() {
        let out = output_path(Path::new("/data/in/voice.wav"), Path::new("/tmp/out"), "_shifted");
        assert_eq!(out, PathBuf::from("/tmp/out/voice_shifted.wav"));
    }

    #[test]
    fn shifts_files_end_to_end() {
        let dir = scratch_dir("e2e");
        let in_dir = dir.join("in");
        fs::create_dir_all(&in_dir).unwrap();

        let ramp = |frames: usize| {
            Array2::from_shape_fn((1, frames), |(_, t)| (t + 1) as f32 / frames as f32)
        };
        let a = in_dir.join("a.wav");
        let b = in_dir.join("b.wav");
        write_wav(&a, &AudioClip::new(ramp(10), 8_000)).unwrap();
        write_wav(&b, &AudioClip::new(ramp(6), 8_000)).unwrap();

        let settings = AppSettings {
            shift: ShiftConfig {
                min_shift: 2.0,
                max_shift: 2.0,
                shift_unit: ShiftUnit::Samples,
                rollover: false,
            },
            seed: Some(1),
            ..AppSettings::default()
        };
        let out_dir = dir.join("out");
        let reports = shift_files(&settings, &[a, b], &out_dir).unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.shift_samples == 2));
        assert_eq!(reports[0].shift_secs, 2.0 / 8_000.0);

        let shifted_a = read_wav(&reports[0].output).unwrap();
        assert_eq!(shifted_a.frames(), 10);
        assert_eq!(shifted_a.samples[[0, 0]], 0.0);
        assert_eq!(shifted_a.samples[[0, 1]], 0.0);
        assert_eq!(shifted_a.samples[[0, 2]], 0.1);

        let shifted_b = read_wav(&reports[1].output).unwrap();
        assert_eq!(shifted_b.frames(), 6);
        assert_eq!(shifted_b.samples[[0, 2]], 1.0 / 6.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_config_is_reported_before_reading() {
        let settings = AppSettings {
            shift: ShiftConfig {
                min_shift: 1.0,
                max_shift: -1.0,
                ..ShiftConfig::default()
            },
            ..AppSettings::default()
        };
        let err = shift_files(&settings, &[PathBuf::from("missing.wav")], Path::new("out"))
            .unwrap_err();
        assert!(err.to_string().contains("invalid shift configuration"));
    }
}
