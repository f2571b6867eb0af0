use crate::coefs::{coefficients, coefficients_non_uniform, half_width, Coefficients, Stencil};
use crate::error::{BoundsError, ConfigurationError, Error};
use crate::grid::GridContext;
use crate::stencil::{diff_non_uniform, diff_uniform};
use crate::Float;
use indexmap::IndexMap;
use ndarray::{ArrayD, ArrayViewD, Axis};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "sparse")]
mod matrix;

/// A linear differential operator that can be evaluated on a sampled field
pub trait Operator: std::fmt::Debug + Send + Sync {
    /// Evaluates the operator on `u`, returning a field of the same shape
    fn apply(&self, ctx: &dyn GridContext, u: ArrayViewD<Float>) -> Result<ArrayD<Float>, Error>;

    /// The operator as a matrix acting on the row-major flattening of a
    /// field of the given shape
    #[cfg(feature = "sparse")]
    fn matrix(&self, ctx: &dyn GridContext, shape: &[usize])
        -> Result<sprs::CsMat<Float>, Error>;
}

impl<T: Operator + ?Sized> Operator for Box<T> {
    fn apply(&self, ctx: &dyn GridContext, u: ArrayViewD<Float>) -> Result<ArrayD<Float>, Error> {
        (**self).apply(ctx, u)
    }
    #[cfg(feature = "sparse")]
    fn matrix(
        &self,
        ctx: &dyn GridContext,
        shape: &[usize],
    ) -> Result<sprs::CsMat<Float>, Error> {
        (**self).matrix(ctx, shape)
    }
}

/// The partial derivative
///
/// ∂^(n_i + n_j + ...) / ∂x_i^n_i ∂x_j^n_j ...
///
/// stored as a mapping from axis to derivative order. The derivatives are
/// taken one axis at a time, in the order the axes were given.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde1",
    serde(try_from = "Vec<(i64, i64)>", into = "Vec<(i64, i64)>")
)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDerivative {
    derivs: IndexMap<usize, usize>,
}

/// Stencils needed to differentiate along one axis
pub(crate) enum AxisStencils {
    Uniform { coefs: Coefficients, h: Float },
    NonUniform(Vec<Stencil>),
}

impl PartialDerivative {
    /// The operator leaving fields unchanged
    pub fn identity() -> Self {
        Self::default()
    }

    /// Derivative of `order` along a single `axis`
    pub fn new(axis: i64, order: i64) -> Result<Self, ConfigurationError> {
        Self::from_pairs(&[(axis, order)])
    }

    /// Mixed derivative from `(axis, order)` pairs, an empty list gives
    /// the identity
    pub fn from_pairs(pairs: &[(i64, i64)]) -> Result<Self, ConfigurationError> {
        let mut derivs = IndexMap::with_capacity(pairs.len());
        for &(axis, order) in pairs {
            if axis < 0 {
                return Err(ConfigurationError::InvalidAxis { axis });
            }
            if order <= 0 {
                return Err(ConfigurationError::InvalidOrder { order });
            }
            let axis = usize::try_from(axis).map_err(|_| ConfigurationError::InvalidAxis { axis })?;
            let order =
                usize::try_from(order).map_err(|_| ConfigurationError::InvalidOrder { order })?;
            if derivs.insert(axis, order).is_some() {
                return Err(ConfigurationError::DuplicateAxis { axis });
            }
        }
        Ok(Self { derivs })
    }

    /// Builds the operator from an untyped argument list, which is either
    /// empty or a single `axis, order` pair
    pub fn from_args(args: &[i64]) -> Result<Self, ConfigurationError> {
        match *args {
            [] => Ok(Self::identity()),
            [axis, order] => Self::new(axis, order),
            _ => Err(ConfigurationError::AmbiguousArguments { len: args.len() }),
        }
    }

    /// Differentiated axes in increasing order
    pub fn axes(&self) -> Vec<usize> {
        let mut axes = self.derivs.keys().copied().collect::<Vec<_>>();
        axes.sort_unstable();
        axes
    }

    /// Derivative order along `axis`, zero if the axis is not differentiated
    pub fn order(&self, axis: usize) -> usize {
        self.derivs.get(&axis).copied().unwrap_or(0)
    }

    /// `(axis, order)` in evaluation order
    pub fn derivs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.derivs.iter().map(|(&axis, &order)| (axis, order))
    }

    pub fn is_identity(&self) -> bool {
        self.derivs.is_empty()
    }

    pub(crate) fn stencils(
        ctx: &dyn GridContext,
        axis: usize,
        order: usize,
        npts: usize,
    ) -> Result<AxisStencils, Error> {
        if ctx.is_uniform() {
            let h = ctx.spacing(axis).ok_or(BoundsError::MissingAxis { axis })?;
            let b = half_width(order, ctx.accuracy())?;
            if npts < 2 * b {
                return Err(BoundsError::TooFewPoints {
                    required: 2 * b,
                    available: npts,
                }
                .into());
            }
            let coefs = coefficients(order, ctx.accuracy())?;
            Ok(AxisStencils::Uniform { coefs, h })
        } else {
            let x = ctx
                .coordinates(axis)
                .ok_or(BoundsError::MissingAxis { axis })?;
            if x.len() != npts {
                return Err(BoundsError::CoordinateMismatch {
                    axis,
                    expected: npts,
                    found: x.len(),
                }
                .into());
            }
            let stencils = (0..npts)
                .map(|i| coefficients_non_uniform(order, ctx.accuracy(), x, i))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AxisStencils::NonUniform(stencils))
        }
    }
}

impl Operator for PartialDerivative {
    fn apply(&self, ctx: &dyn GridContext, u: ArrayViewD<Float>) -> Result<ArrayD<Float>, Error> {
        let mut u = u.to_owned();
        for (&axis, &order) in &self.derivs {
            if axis >= u.ndim() {
                return Err(BoundsError::AxisOutOfRange {
                    axis,
                    ndim: u.ndim(),
                }
                .into());
            }
            log::trace!(
                "Differentiating along axis {axis} with order {order} (uniform: {})",
                ctx.is_uniform()
            );
            let npts = u.len_of(Axis(axis));
            u = match Self::stencils(ctx, axis, order, npts)? {
                AxisStencils::Uniform { coefs, h } => {
                    diff_uniform(u.view(), h, order, Axis(axis), &coefs)?
                }
                AxisStencils::NonUniform(stencils) => {
                    diff_non_uniform(u.view(), Axis(axis), &stencils)?
                }
            };
        }
        Ok(u)
    }

    #[cfg(feature = "sparse")]
    fn matrix(
        &self,
        ctx: &dyn GridContext,
        shape: &[usize],
    ) -> Result<sprs::CsMat<Float>, Error> {
        matrix::partial_derivative(self, ctx, shape)
    }
}

impl TryFrom<Vec<(i64, i64)>> for PartialDerivative {
    type Error = ConfigurationError;
    fn try_from(pairs: Vec<(i64, i64)>) -> Result<Self, Self::Error> {
        Self::from_pairs(&pairs)
    }
}

impl From<PartialDerivative> for Vec<(i64, i64)> {
    fn from(d: PartialDerivative) -> Self {
        d.derivs()
            .map(|(axis, order)| (axis as i64, order as i64))
            .collect()
    }
}

/// Sum of two operators
#[derive(Debug)]
pub struct Plus {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
}

impl Plus {
    pub fn new(left: impl Operator + 'static, right: impl Operator + 'static) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl Operator for Plus {
    fn apply(&self, ctx: &dyn GridContext, u: ArrayViewD<Float>) -> Result<ArrayD<Float>, Error> {
        #[cfg(feature = "rayon")]
        let (left, right) = rayon::join(
            || self.left.apply(ctx, u.view()),
            || self.right.apply(ctx, u.view()),
        );
        #[cfg(not(feature = "rayon"))]
        let (left, right) = (
            self.left.apply(ctx, u.view()),
            self.right.apply(ctx, u.view()),
        );

        let (left, right) = (left?, right?);
        if left.shape() != right.shape() {
            return Err(Error::incompatible_shape());
        }
        Ok(left + &right)
    }

    #[cfg(feature = "sparse")]
    fn matrix(
        &self,
        ctx: &dyn GridContext,
        shape: &[usize],
    ) -> Result<sprs::CsMat<Float>, Error> {
        let left = self.left.matrix(ctx, shape)?;
        let right = self.right.matrix(ctx, shape)?;
        Ok(&left + &right)
    }
}

/// Constant multiplier of an operator, either a scalar or an array that
/// broadcasts to the field
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    Scalar(Float),
    Array(ArrayD<Float>),
}

impl From<Float> for Factor {
    fn from(c: Float) -> Self {
        Self::Scalar(c)
    }
}

impl<D: ndarray::Dimension> From<ndarray::Array<Float, D>> for Factor {
    fn from(c: ndarray::Array<Float, D>) -> Self {
        Self::Array(c.into_dyn())
    }
}

impl Factor {
    /// Multiplies `du` elementwise by the factor
    pub fn scale(&self, mut du: ArrayD<Float>) -> Result<ArrayD<Float>, Error> {
        match self {
            Self::Scalar(c) => {
                du.mapv_inplace(|v| c * v);
            }
            Self::Array(c) => {
                let c = c.broadcast(du.shape()).ok_or_else(Error::incompatible_shape)?;
                du.zip_mut_with(&c, |v, &c| *v *= c);
            }
        }
        Ok(du)
    }
}

/// A constant factor times an operator
///
/// The factor is never evaluated on the grid, products of two operators are
/// not supported.
#[derive(Debug)]
pub struct Multiply {
    factor: Factor,
    operator: Box<dyn Operator>,
}

impl Multiply {
    pub fn new(factor: impl Into<Factor>, operator: impl Operator + 'static) -> Self {
        Self {
            factor: factor.into(),
            operator: Box::new(operator),
        }
    }

    pub fn factor(&self) -> &Factor {
        &self.factor
    }
}

impl Operator for Multiply {
    fn apply(&self, ctx: &dyn GridContext, u: ArrayViewD<Float>) -> Result<ArrayD<Float>, Error> {
        let du = self.operator.apply(ctx, u)?;
        self.factor.scale(du)
    }

    #[cfg(feature = "sparse")]
    fn matrix(
        &self,
        ctx: &dyn GridContext,
        shape: &[usize],
    ) -> Result<sprs::CsMat<Float>, Error> {
        let m = self.operator.matrix(ctx, shape)?;
        matrix::scale(&self.factor, &m, shape)
    }
}

macro_rules! impl_operator_arithmetic {
    ($($op: ty),*) => {$(
        impl<R: Operator + 'static> std::ops::Add<R> for $op {
            type Output = Plus;
            fn add(self, rhs: R) -> Self::Output {
                Plus::new(self, rhs)
            }
        }

        impl std::ops::Mul<$op> for Float {
            type Output = Multiply;
            fn mul(self, rhs: $op) -> Self::Output {
                Multiply::new(self, rhs)
            }
        }

        impl std::ops::Mul<Float> for $op {
            type Output = Multiply;
            fn mul(self, rhs: Float) -> Self::Output {
                Multiply::new(rhs, self)
            }
        }

        impl std::ops::Mul<$op> for Factor {
            type Output = Multiply;
            fn mul(self, rhs: $op) -> Self::Output {
                Multiply::new(self, rhs)
            }
        }
    )*};
}

impl_operator_arithmetic!(PartialDerivative, Plus, Multiply);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array2};

    #[test]
    fn construction() {
        let d = PartialDerivative::from_pairs(&[(1, 2), (0, 1)]).unwrap();
        assert_eq!(d.axes(), vec![0, 1]);
        assert_eq!(d.order(1), 2);
        assert_eq!(d.order(0), 1);
        assert_eq!(d.order(3), 0);
        assert_eq!(d.derivs().collect::<Vec<_>>(), vec![(1, 2), (0, 1)]);
        assert!(!d.is_identity());
        assert!(PartialDerivative::from_pairs(&[]).unwrap().is_identity());
    }

    #[test]
    fn invalid_construction() {
        assert_eq!(
            PartialDerivative::from_pairs(&[(0, 1), (0, 2)]),
            Err(ConfigurationError::DuplicateAxis { axis: 0 })
        );
        assert_eq!(
            PartialDerivative::new(-1, 1),
            Err(ConfigurationError::InvalidAxis { axis: -1 })
        );
        assert_eq!(
            PartialDerivative::new(0, 0),
            Err(ConfigurationError::InvalidOrder { order: 0 })
        );
        assert_eq!(
            PartialDerivative::new(0, -2),
            Err(ConfigurationError::InvalidOrder { order: -2 })
        );
    }

    #[test]
    fn loose_arguments() {
        assert!(PartialDerivative::from_args(&[]).unwrap().is_identity());
        assert_eq!(
            PartialDerivative::from_args(&[1, 2]),
            PartialDerivative::new(1, 2)
        );
        assert_eq!(
            PartialDerivative::from_args(&[0, 1, 2]),
            Err(ConfigurationError::AmbiguousArguments { len: 3 })
        );
        assert_eq!(
            PartialDerivative::from_args(&[0]),
            Err(ConfigurationError::AmbiguousArguments { len: 1 })
        );
    }

    #[test]
    fn axis_outside_field() {
        let grid = Grid::uniform(vec![0.1, 0.1], 2).unwrap();
        let u = Array1::<Float>::zeros(10).into_dyn();
        let d = PartialDerivative::new(1, 1).unwrap();
        assert!(matches!(
            d.apply(&grid, u.view()),
            Err(Error::Bounds(BoundsError::AxisOutOfRange { axis: 1, ndim: 1 }))
        ));
    }

    #[test]
    fn grid_without_axis() {
        let grid = Grid::uniform(vec![0.1], 2).unwrap();
        let u = Array2::<Float>::zeros((10, 10)).into_dyn();
        let d = PartialDerivative::new(1, 1).unwrap();
        assert!(matches!(
            d.apply(&grid, u.view()),
            Err(Error::Bounds(BoundsError::MissingAxis { axis: 1 }))
        ));

        let grid = Grid::non_uniform(vec![Array1::<Float>::linspace(0.0, 1.0, 5)], 2).unwrap();
        assert!(matches!(
            d.apply(&grid, u.view()),
            Err(Error::Bounds(BoundsError::MissingAxis { axis: 1 }))
        ));
    }

    #[test]
    fn coordinate_count_must_match() {
        let grid = Grid::non_uniform(vec![Array1::<Float>::linspace(0.0, 1.0, 5)], 2).unwrap();
        let u = Array1::<Float>::zeros(6).into_dyn();
        let d = PartialDerivative::new(0, 1).unwrap();
        assert!(matches!(
            d.apply(&grid, u.view()),
            Err(Error::Bounds(BoundsError::CoordinateMismatch {
                axis: 0,
                expected: 6,
                found: 5
            }))
        ));
    }

    #[test]
    fn stencil_wider_than_axis() {
        let uniform = Grid::uniform(vec![0.1], 2).unwrap();
        let non_uniform = Grid::non_uniform(vec![Array1::<Float>::linspace(0.0, 1.0, 5)], 2).unwrap();
        let u = Array1::<Float>::zeros(5).into_dyn();

        // Rejected from the layout alone, before any weights are computed
        let d = PartialDerivative::new(0, 200).unwrap();
        assert!(matches!(
            d.apply(&uniform, u.view()),
            Err(Error::Bounds(BoundsError::TooFewPoints {
                required: 200,
                available: 5
            }))
        ));
        let d = PartialDerivative::new(0, 1600).unwrap();
        for grid in [&uniform, &non_uniform] {
            assert!(matches!(
                d.apply(grid, u.view()),
                Err(Error::Bounds(BoundsError::TooFewPoints { available: 5, .. }))
            ));
        }
    }

    #[test]
    fn arithmetic() {
        let grid = Grid::uniform(vec![0.1], 2).unwrap();
        let x = Array1::<Float>::linspace(0.0, 1.0, 11);
        let u = x.mapv(|x| x * x).into_dyn();

        let op = 2.0 * PartialDerivative::new(0, 1).unwrap() + PartialDerivative::new(0, 2).unwrap();
        let du = op.apply(&grid, u.view()).unwrap();
        let expected = x.mapv(|x| 4.0 * x + 2.0).into_dyn();
        assert_abs_diff_eq!(du, expected, epsilon = 1e-8);

        let op = PartialDerivative::new(0, 2).unwrap() * 0.5;
        assert_eq!(op.factor(), &Factor::Scalar(0.5));
        let du = op.apply(&grid, u.view()).unwrap();
        assert_abs_diff_eq!(du, ArrayD::from_elem(du.raw_dim(), 1.0), epsilon = 1e-8);

        let op = Factor::from(x.clone()) * PartialDerivative::new(0, 1).unwrap();
        let du = op.apply(&grid, u.view()).unwrap();
        let expected = x.mapv(|x| 2.0 * x * x).into_dyn();
        assert_abs_diff_eq!(du, expected, epsilon = 1e-8);
    }

    #[test]
    fn factor_must_broadcast() {
        let grid = Grid::uniform(vec![0.1], 2).unwrap();
        let u = Array1::<Float>::zeros(11).into_dyn();
        let op = Multiply::new(Array1::<Float>::ones(4), PartialDerivative::identity());
        assert!(matches!(op.apply(&grid, u.view()), Err(Error::Shape(_))));

        let op = Multiply::new(Array1::<Float>::ones(1), PartialDerivative::identity());
        assert!(op.apply(&grid, u.view()).is_ok());
    }
}
