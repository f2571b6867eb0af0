use super::{AxisStencils, Factor, PartialDerivative};
use crate::coefs::Stencil;
use crate::error::{BoundsError, Error};
use crate::grid::GridContext;
use crate::utils::kronecker_product;
use crate::Float;
use sprs::{CsMat, TriMat};

fn add_row(
    mat: &mut TriMat<Float>,
    axis: usize,
    row: usize,
    stencil: &Stencil,
    scale: Float,
    npts: usize,
) -> Result<(), BoundsError> {
    for (weight, offset) in stencil.iter() {
        let col = row as isize + offset;
        if col < 0 || col >= npts as isize {
            return Err(BoundsError::ShiftOutOfBounds {
                axis,
                start: col,
                end: col + 1,
                npts,
            });
        }
        mat.add_triplet(row, col as usize, weight * scale);
    }
    Ok(())
}

/// Differentiation matrix of a single axis with `npts` points
fn axis_matrix(
    stencils: &AxisStencils,
    axis: usize,
    order: usize,
    npts: usize,
) -> Result<CsMat<Float>, Error> {
    let mut mat = TriMat::new((npts, npts));
    match stencils {
        AxisStencils::Uniform { coefs, h } => {
            let scale = 1.0 / h.powi(order as i32);
            for row in 0..npts {
                let stencil = coefs.get(coefs.scheme_at(row, npts));
                add_row(&mut mat, axis, row, stencil, scale, npts)?;
            }
        }
        AxisStencils::NonUniform(stencils) => {
            for (row, stencil) in stencils.iter().enumerate() {
                add_row(&mut mat, axis, row, stencil, 1.0, npts)?;
            }
        }
    }
    Ok(mat.to_csr())
}

pub(super) fn partial_derivative(
    d: &PartialDerivative,
    ctx: &dyn GridContext,
    shape: &[usize],
) -> Result<CsMat<Float>, Error> {
    let mut mat: CsMat<Float> = CsMat::eye(shape.iter().product());
    for (axis, order) in d.derivs() {
        if axis >= shape.len() {
            return Err(BoundsError::AxisOutOfRange {
                axis,
                ndim: shape.len(),
            }
            .into());
        }
        let npts = shape[axis];
        let stencils = PartialDerivative::stencils(ctx, axis, order, npts)?;
        let d1 = axis_matrix(&stencils, axis, order, npts)?;

        // Row-major flattening: axes before `axis` vary slowest
        let outer = CsMat::eye(shape[..axis].iter().product());
        let inner = CsMat::eye(shape[axis + 1..].iter().product());
        let expanded = kronecker_product(
            kronecker_product(outer.view(), d1.view()).view(),
            inner.view(),
        );
        mat = &expanded * &mat;
    }
    Ok(mat)
}

pub(super) fn scale(
    factor: &Factor,
    mat: &CsMat<Float>,
    shape: &[usize],
) -> Result<CsMat<Float>, Error> {
    match factor {
        Factor::Scalar(c) => Ok(mat.map(|&v| c * v)),
        Factor::Array(c) => {
            let c = c.broadcast(shape).ok_or_else(Error::incompatible_shape)?;
            let n = c.len();
            let mut diag = TriMat::with_capacity((n, n), n);
            for (i, &v) in c.iter().enumerate() {
                diag.add_triplet(i, i, v);
            }
            let diag: CsMat<Float> = diag.to_csr();
            Ok(&diag * mat)
        }
    }
}
