//! Shift range conversion and per-example sampling.
//!
//! ## Algorithm
//!
//! 1. Convert `min_shift` / `max_shift` to samples:
//!    `samples` as-is, `fraction` × time length, `seconds` × sample rate,
//!    rounded half-to-even.
//! 2. Reject bounds that do not fit in `i32`.
//! 3. Equal bounds fill the vector with that constant.
//! 4. Otherwise draw each example's shift uniformly from `[lo, hi]`.

use ndarray::Array1;
use rand::distributions::{Distribution, Uniform};
use rand::RngCore;

use super::{ShiftConfig, ShiftUnit, ShiftVector};
use crate::error::{Result, ShiftError};

/// Integer sample bounds `(lo, hi)` for a batch with `time_len` samples per channel.
///
/// # Errors
/// - `ShiftError::MissingSampleRate` when the unit is `seconds` and
///   `sample_rate` is `None` or zero.
/// - `ShiftError::Range` when either bound does not fit in `i32`.
pub fn bounds_in_samples(
    config: &ShiftConfig,
    time_len: usize,
    sample_rate: Option<u32>,
) -> Result<(i32, i32)> {
    let scale = match config.shift_unit {
        ShiftUnit::Samples => 1.0,
        ShiftUnit::Fraction => time_len as f64,
        ShiftUnit::Seconds => match sample_rate {
            Some(rate) if rate > 0 => f64::from(rate),
            _ => return Err(ShiftError::MissingSampleRate),
        },
    };

    let lo = to_i32((config.min_shift * scale).round_ties_even())?;
    let hi = to_i32((config.max_shift * scale).round_ties_even())?;
    Ok((lo, hi))
}

fn to_i32(value: f64) -> Result<i32> {
    if value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        Ok(value as i32)
    } else {
        Err(ShiftError::Range { value })
    }
}

/// Draw `batch_size` independent shifts from the inclusive range `[lo, hi]`.
pub fn draw_shifts<R: RngCore + ?Sized>(
    lo: i32,
    hi: i32,
    batch_size: usize,
    rng: &mut R,
) -> ShiftVector {
    if lo >= hi {
        return ShiftVector::new(Array1::from_elem(batch_size, lo));
    }
    let dist = Uniform::new_inclusive(lo, hi);
    ShiftVector::new(Array1::from_shape_fn(batch_size, |_| dist.sample(rng)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(min_shift: f64, max_shift: f64, shift_unit: ShiftUnit) -> ShiftConfig {
        ShiftConfig {
            min_shift,
            max_shift,
            shift_unit,
            rollover: true,
        }
    }

    #[test]
    fn fraction_of_one_hundred_samples() {
        let bounds = bounds_in_samples(&config(-0.5, 0.5, ShiftUnit::Fraction), 100, None);
        assert_eq!(bounds.unwrap(), (-50, 50));
    }

    #[test]
    fn fraction_ignores_sample_rate() {
        let bounds = bounds_in_samples(&config(0.0, 0.25, ShiftUnit::Fraction), 8, Some(16_000));
        assert_eq!(bounds.unwrap(), (0, 2));
    }

    #[test]
    fn samples_used_as_is() {
        let bounds = bounds_in_samples(&config(-7.0, 12.0, ShiftUnit::Samples), 3, None);
        assert_eq!(bounds.unwrap(), (-7, 12));
    }

    #[test]
    fn seconds_scale_by_sample_rate() {
        let bounds = bounds_in_samples(&config(-0.25, 0.5, ShiftUnit::Seconds), 10, Some(16_000));
        assert_eq!(bounds.unwrap(), (-4_000, 8_000));
    }

    #[test]
    fn seconds_without_rate_fails() {
        let cfg = config(-0.1, 0.1, ShiftUnit::Seconds);
        assert!(matches!(
            bounds_in_samples(&cfg, 100, None),
            Err(ShiftError::MissingSampleRate)
        ));
        assert!(matches!(
            bounds_in_samples(&cfg, 100, Some(0)),
            Err(ShiftError::MissingSampleRate)
        ));
    }

    #[test]
    fn rounding_is_half_to_even() {
        // 0.5 * 5 = 2.5 -> 2, 0.5 * 7 = 3.5 -> 4
        let cfg = config(0.5, 0.5, ShiftUnit::Fraction);
        assert_eq!(bounds_in_samples(&cfg, 5, None).unwrap(), (2, 2));
        assert_eq!(bounds_in_samples(&cfg, 7, None).unwrap(), (4, 4));
    }

    #[test]
    fn unrepresentable_bound_is_range_error() {
        let cfg = config(0.0, 3.0e9, ShiftUnit::Samples);
        assert!(matches!(
            bounds_in_samples(&cfg, 10, None),
            Err(ShiftError::Range { .. })
        ));

        let cfg = config(-100_000.0, 0.0, ShiftUnit::Seconds);
        assert!(matches!(
            bounds_in_samples(&cfg, 10, Some(48_000)),
            Err(ShiftError::Range { .. })
        ));
    }

    #[test]
    fn i32_extremes_are_representable() {
        let cfg = config(f64::from(i32::MIN), f64::from(i32::MAX), ShiftUnit::Samples);
        assert_eq!(
            bounds_in_samples(&cfg, 1, None).unwrap(),
            (i32::MIN, i32::MAX)
        );
    }

    #[test]
    fn equal_bounds_replicate_constant() {
        let mut rng = StdRng::seed_from_u64(0);
        for batch_size in [0, 1, 3, 64] {
            let shifts = draw_shifts(9, 9, batch_size, &mut rng);
            assert_eq!(shifts.to_vec(), vec![9; batch_size]);
        }
    }

    #[test]
    fn draws_stay_inside_inclusive_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let shifts = draw_shifts(-2, 2, 2_000, &mut rng);
        assert_eq!(shifts.len(), 2_000);
        assert!(shifts.view().iter().all(|s| (-2..=2).contains(s)));
        // Both endpoints are reachable.
        assert!(shifts.view().iter().any(|&s| s == -2));
        assert!(shifts.view().iter().any(|&s| s == 2));
    }

    #[test]
    fn same_seed_same_shifts() {
        let a = draw_shifts(-100, 100, 32, &mut StdRng::seed_from_u64(5));
        let b = draw_shifts(-100, 100, 32, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }
}
