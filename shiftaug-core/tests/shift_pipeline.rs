use std::io::Cursor;

use hound::WavReader;
use ndarray::{array, s, Array2, Array3, ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shiftaug_core::audio::resample::RateConverter;
use shiftaug_core::audio::{read_wav_from, write_wav_to};
use shiftaug_core::{AudioBatch, AudioClip, Shift, ShiftConfig, ShiftError, ShiftUnit};

fn tone(frames: usize, sample_rate: u32, channels: usize) -> AudioClip {
    let samples = Array2::from_shape_fn((channels, frames), |(c, t)| {
        let phase = t as f32 / sample_rate as f32 * 440.0 * (c + 1) as f32;
        (phase * std::f32::consts::TAU).sin() * 0.5
    });
    AudioClip::new(samples, sample_rate)
}

#[test]
fn wav_clips_shift_and_come_back_out() {
    let clips = vec![tone(800, 8_000, 2), tone(500, 8_000, 2), tone(800, 8_000, 2)];

    // Through WAV bytes to exercise the same path the CLI uses.
    let decoded: Vec<AudioClip> = clips
        .iter()
        .map(|clip| {
            let mut buf = Cursor::new(Vec::new());
            write_wav_to(&mut buf, clip).unwrap();
            buf.set_position(0);
            read_wav_from(WavReader::new(buf).unwrap()).unwrap()
        })
        .collect();
    assert_eq!(decoded, clips);

    let lengths: Vec<usize> = decoded.iter().map(AudioClip::frames).collect();
    let batch = AudioBatch::from_clips(&decoded).unwrap();
    assert_eq!(batch.samples().dim(), (3, 2, 800));

    let shift = Shift::new(-0.01, 0.01, ShiftUnit::Seconds, false).unwrap();
    assert!(shift.requires_sample_rate());
    let mut rng = StdRng::seed_from_u64(1234);
    let (shifts, shifted) = shift.process(&batch, Some(8_000), &mut rng).unwrap();

    assert_eq!(shifts.len(), 3);
    assert!(shifts.view().iter().all(|s| (-80..=80).contains(s)));

    for (b, &k) in shifts.view().iter().enumerate() {
        for c in 0..2 {
            for t in 0..800i64 {
                let src = t - i64::from(k);
                let expected = if (0..800).contains(&src) {
                    batch.samples()[[b, c, src as usize]]
                } else {
                    0.0
                };
                assert_eq!(shifted.samples()[[b, c, t as usize]], expected);
            }
        }
    }

    let out = shifted.into_clips(8_000, &lengths).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out[1].frames(), 500);
    assert_eq!(out[1].channels(), 2);
}

#[test]
fn seconds_unit_without_sample_rate_is_reported() {
    let shift = Shift::new(-0.5, 0.5, ShiftUnit::Seconds, true).unwrap();
    let batch = AudioBatch::new(Array3::zeros((2, 1, 10)));
    let mut rng = StdRng::seed_from_u64(0);
    let err = shift.randomize(&batch, None, &mut rng).unwrap_err();
    assert!(matches!(err, ShiftError::MissingSampleRate));
}

#[test]
fn fraction_bound_too_large_for_input_is_range_error() {
    let shift = Shift::new(0.0, 1.0e6, ShiftUnit::Fraction, true).unwrap();
    let batch = AudioBatch::new(Array3::zeros((1, 1, 10_000)));
    let mut rng = StdRng::seed_from_u64(0);
    let err = shift.randomize(&batch, None, &mut rng).unwrap_err();
    assert!(matches!(err, ShiftError::Range { .. }));
}

#[test]
fn constant_shift_replicates_across_batch() {
    let shift = Shift::new(3.0, 3.0, ShiftUnit::Samples, true).unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    for b in [1usize, 5, 17] {
        let batch = AudioBatch::new(Array3::zeros((b, 2, 8)));
        let shifts = shift.randomize(&batch, None, &mut rng).unwrap();
        assert_eq!(shifts.to_vec(), vec![3; b]);
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let shift = Shift::default();
    let batch = AudioBatch::new(Array3::from_shape_fn((8, 1, 64), |(b, _, t)| (b * 64 + t) as f32));

    let (a_shifts, a) = shift
        .process(&batch, None, &mut StdRng::seed_from_u64(77))
        .unwrap();
    let (b_shifts, b) = shift
        .process(&batch, None, &mut StdRng::seed_from_u64(77))
        .unwrap();
    assert_eq!(a_shifts, b_shifts);
    assert_eq!(a, b);
}

#[test]
fn rank_two_dynamic_input_returns_rank_two() {
    let shift = Shift::new(-2.0, -2.0, ShiftUnit::Samples, true).unwrap();
    let input: ArrayD<f32> = array![[1.0f32, 2.0, 3.0, 4.0, 5.0]].into_dyn();
    let batch = AudioBatch::from_dyn(input).unwrap();
    let (_, out) = shift
        .process(&batch, None, &mut StdRng::seed_from_u64(0))
        .unwrap();
    let out = out.into_dyn();
    assert_eq!(out.shape(), &[1, 5]);
    assert_eq!(out, array![[3.0f32, 4.0, 5.0, 1.0, 2.0]].into_dyn());
}

#[test]
fn empty_time_axis_passes_through() {
    let shift = Shift::default();
    let batch = AudioBatch::from_dyn(ArrayD::zeros(IxDyn(&[3, 2, 0]))).unwrap();
    let (shifts, out) = shift
        .process(&batch, None, &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(shifts.to_vec(), vec![0, 0, 0]);
    assert_eq!(out.into_dyn().shape(), &[3, 2, 0]);
}

#[test]
fn resampled_clips_batch_with_native_ones() {
    let native = tone(1_600, 16_000, 1);
    let mut rc = RateConverter::new(48_000, 16_000, 1, 1024).unwrap();
    let converted = rc.process_clip(&tone(4_800, 48_000, 1)).unwrap();
    assert_eq!(converted.sample_rate, 16_000);
    assert_eq!(converted.frames(), 1_600);

    let batch = AudioBatch::from_clips(&[native, converted]).unwrap();
    assert_eq!(batch.samples().dim(), (2, 1, 1_600));
}

#[test]
fn config_from_json_drives_operator() {
    let config = ShiftConfig::from_json(
        r#"{"min_shift": 1, "max_shift": 1, "shift_unit": "samples", "rollover": false}"#,
    )
    .unwrap();
    let shift = Shift::from_config(config).unwrap();
    let batch = AudioBatch::new(array![[[1.0f32, 2.0, 3.0]], [[4.0, 5.0, 6.0]]]);
    let (_, out) = shift
        .process(&batch, None, &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(out.samples().slice(s![.., 0, ..]), array![[0.0f32, 1.0, 2.0], [0.0, 4.0, 5.0]]);
}
