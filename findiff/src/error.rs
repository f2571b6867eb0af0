use crate::Float;

/// Invalid operator or grid specification, reported at construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("axis must be a non-negative integer, got {axis}")]
    InvalidAxis { axis: i64 },
    #[error("derivative order must be a positive integer, got {order}")]
    InvalidOrder { order: i64 },
    #[error("derivative along axis {axis} specified more than once")]
    DuplicateAxis { axis: usize },
    #[error("ambiguous argument list of length {len}, expected (axis, order) pairs")]
    AmbiguousArguments { len: usize },
    #[error("accuracy must be a positive even integer, got {accuracy}")]
    InvalidAccuracy { accuracy: usize },
    #[error("spacing along axis {axis} must be positive and finite, got {spacing}")]
    InvalidSpacing { axis: usize, spacing: Float },
    #[error("coordinates along axis {axis} must be at least two strictly increasing values")]
    NonMonotonicCoordinates { axis: usize },
    #[error("stencil has {weights} weights but {offsets} offsets")]
    StencilLength { weights: usize, offsets: usize },
}

/// A stencil reaching outside the field, reported during evaluation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundsError {
    #[error("shifted range {start}..{end} along axis {axis} is outside 0..{npts}")]
    ShiftOutOfBounds {
        axis: usize,
        start: isize,
        end: isize,
        npts: usize,
    },
    #[error("axis {axis} does not exist in a field with {ndim} dimensions")]
    AxisOutOfRange { axis: usize, ndim: usize },
    #[error("grid does not describe axis {axis}")]
    MissingAxis { axis: usize },
    #[error("axis {axis} has {found} grid nodes, but the field has {expected} points")]
    CoordinateMismatch {
        axis: usize,
        expected: usize,
        found: usize,
    },
    #[error("stencil needs {required} points, but only {available} are available")]
    TooFewPoints { required: usize, available: usize },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    #[error("incompatible shapes: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("finite difference system is singular")]
    SingularSystem,
}

impl Error {
    pub(crate) fn incompatible_shape() -> Self {
        Self::Shape(ndarray::ShapeError::from_kind(
            ndarray::ErrorKind::IncompatibleShape,
        ))
    }
}

#[test]
fn error_messages() {
    let e = Error::from(ConfigurationError::DuplicateAxis { axis: 1 });
    assert_eq!(e.to_string(), "derivative along axis 1 specified more than once");

    let e = Error::from(BoundsError::ShiftOutOfBounds {
        axis: 0,
        start: -1,
        end: 3,
        npts: 5,
    });
    assert_eq!(
        e.to_string(),
        "shifted range -1..3 along axis 0 is outside 0..5"
    );
    assert!(matches!(Error::incompatible_shape(), Error::Shape(_)));
}
