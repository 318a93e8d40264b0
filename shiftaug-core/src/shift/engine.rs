//! Vectorized per-example time shift.
//!
//! Output `(b, c, t)` reads input `(b, c, (t - shifts[b]) mod T)`. The whole
//! transform is three array passes:
//!
//! 1. broadcast `t - shifts[b]` into a `(B, 1, T)` source-index array,
//! 2. one flat gather through `(B, C, T)` indices into the input buffer,
//! 3. without rollover, zero every cell whose unwrapped source falls outside `[0, T)`.
//!
//! Step 3 leaves `out[t] = in[t - s]` for `0 <= t - s < T` and `0` elsewhere,
//! which covers both the head gap of a positive shift and the tail gap of a
//! negative one.

use ndarray::{Array1, Array3, ArrayView1, ArrayView3, Zip};

use crate::error::{Result, ShiftError};

/// Shift every example of `batch` by its entry in `shifts`, returning a new array.
///
/// `rollover == true` is a circular shift. `rollover == false` zero-fills the
/// positions vacated by the shift.
///
/// # Errors
/// Returns `ShiftError::ShiftLength` when `shifts.len()` differs from the batch size.
pub fn shift_batch(
    batch: ArrayView3<'_, f32>,
    shifts: ArrayView1<'_, i32>,
    rollover: bool,
) -> Result<Array3<f32>> {
    let (b, c, t) = batch.dim();
    if shifts.len() != b {
        return Err(ShiftError::ShiftLength {
            expected: b,
            got: shifts.len(),
        });
    }
    if b == 0 || c == 0 || t == 0 {
        return Ok(Array3::zeros((b, c, t)));
    }

    let len = t as i64;
    let time = Array1::from_iter(0..len).into_shape_with_order((1, 1, t))?;
    let offsets = shifts.mapv(i64::from).into_shape_with_order((b, 1, 1))?;
    // (B, 1, T)
    let unwrapped = &time - &offsets;
    let wrapped = unwrapped.mapv(|u| u.rem_euclid(len) as usize);

    // Flat offset of each (b, c) row in a standard-layout buffer: (B, C, 1)
    let rows = Array1::from_iter(0..b * c).into_shape_with_order((b, c, 1))? * t;
    let gather = &rows + &wrapped;

    let source = batch.as_standard_layout();
    let flat = source
        .as_slice()
        .ok_or_else(|| anyhow::anyhow!("standard-layout copy is not contiguous"))?;
    let mut out = gather.mapv(|i| flat[i]);

    if !rollover {
        Zip::from(&mut out)
            .and_broadcast(&unwrapped)
            .for_each(|sample, &u| {
                if u < 0 || u >= len {
                    *sample = 0.0;
                }
            });
    }

    Ok(out)
}
