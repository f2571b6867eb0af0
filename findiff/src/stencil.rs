//! Application of one-dimensional stencils along an axis of an
//! n-dimensional field

use crate::coefs::{Coefficients, Stencil};
use crate::error::BoundsError;
use crate::Float;
use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use std::ops::Range;

/// Weights closer to one than this are added without multiplication
const UNIT_WEIGHT_EPS: Float = 1e-14;

/// Moves `range` by `offset`, requiring the result to lie inside `0..npts`
pub fn shift_range(
    axis: Axis,
    range: Range<usize>,
    offset: isize,
    npts: usize,
) -> Result<Range<usize>, BoundsError> {
    let start = range.start as isize + offset;
    let end = range.end as isize + offset;
    if start < 0 || end > npts as isize || start > end {
        return Err(BoundsError::ShiftOutOfBounds {
            axis: axis.index(),
            start,
            end,
            npts,
        });
    }
    Ok(start as usize..end as usize)
}

/// View of `u` where `axis` is restricted to `range` shifted by `offset`,
/// all other axes are kept whole
pub fn shifted_view<'a>(
    u: &ArrayViewD<'a, Float>,
    axis: Axis,
    range: Range<usize>,
    offset: isize,
) -> Result<ArrayViewD<'a, Float>, BoundsError> {
    let range = shift_range(axis, range, offset, u.len_of(axis))?;
    let mut view = u.clone();
    view.slice_axis_inplace(axis, Slice::from(range));
    Ok(view)
}

fn check_axis(u: &ArrayViewD<Float>, axis: Axis) -> Result<usize, BoundsError> {
    if axis.index() >= u.ndim() {
        Err(BoundsError::AxisOutOfRange {
            axis: axis.index(),
            ndim: u.ndim(),
        })
    } else {
        Ok(u.len_of(axis))
    }
}

/// Adds the stencil evaluated at every index of `reference` into `du`
fn accumulate(
    du: &mut ArrayD<Float>,
    u: &ArrayViewD<Float>,
    stencil: &Stencil,
    axis: Axis,
    reference: Range<usize>,
) -> Result<(), BoundsError> {
    let mut target = du.slice_axis_mut(axis, Slice::from(reference.clone()));
    for (weight, offset) in stencil.iter() {
        let source = shifted_view(u, axis, reference.clone(), offset)?;
        if approx::abs_diff_eq!(weight, 1.0, epsilon = UNIT_WEIGHT_EPS) {
            target += &source;
        } else {
            target.scaled_add(weight, &source);
        }
    }
    Ok(())
}

/// Derivative of `order` along `axis` on a uniform grid with spacing `h`
///
/// The interior `b..npts-b` uses the central stencil, where `b` is its
/// half-width. The first and last `b` points use the forward and backward
/// stencils respectively.
pub fn diff_uniform(
    u: ArrayViewD<Float>,
    h: Float,
    order: usize,
    axis: Axis,
    coefs: &Coefficients,
) -> Result<ArrayD<Float>, BoundsError> {
    let npts = check_axis(&u, axis)?;
    let b = coefs.half_width();
    if npts < 2 * b {
        return Err(BoundsError::TooFewPoints {
            required: 2 * b,
            available: npts,
        });
    }

    let mut du = ArrayD::zeros(u.raw_dim());
    accumulate(&mut du, &u, &coefs.center, axis, b..npts - b)?;
    accumulate(&mut du, &u, &coefs.forward, axis, 0..b)?;
    accumulate(&mut du, &u, &coefs.backward, axis, npts - b..npts)?;

    let h_inv = 1.0 / h.powi(order as i32);
    du.mapv_inplace(|v| v * h_inv);
    Ok(du)
}

/// Derivative along `axis` with one stencil per node
///
/// The stencils carry the local grid geometry, so no further scaling is
/// applied.
pub fn diff_non_uniform(
    u: ArrayViewD<Float>,
    axis: Axis,
    stencils: &[Stencil],
) -> Result<ArrayD<Float>, BoundsError> {
    let npts = check_axis(&u, axis)?;
    if stencils.len() != npts {
        return Err(BoundsError::CoordinateMismatch {
            axis: axis.index(),
            expected: npts,
            found: stencils.len(),
        });
    }

    let mut du = ArrayD::zeros(u.raw_dim());
    for (i, stencil) in stencils.iter().enumerate() {
        let mut target = du.index_axis_mut(axis, i);
        for (weight, offset) in stencil.iter() {
            let source = shifted_view(&u, axis, i..i + 1, offset)?;
            target.scaled_add(weight, &source.index_axis(axis, 0));
        }
    }
    Ok(du)
}
