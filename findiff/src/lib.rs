//! Finite difference partial derivatives on rectilinear grids
//!
//! Derivatives are built as [`PartialDerivative`]s and combined with
//! [`Plus`] and [`Multiply`] into linear differential operators, which are
//! then evaluated against a [`GridContext`] and a field:
//!
//! ```
//! use findiff::{Grid, Operator, PartialDerivative};
//! use ndarray::Array1;
//!
//! let x = Array1::linspace(0.0, 1.0, 11);
//! let u = x.mapv(|x| x * x);
//! let grid = Grid::uniform(vec![0.1], 2).unwrap();
//!
//! let d2dx2 = PartialDerivative::new(0, 2).unwrap();
//! let du = d2dx2.apply(&grid, u.view().into_dyn()).unwrap();
//! approx::assert_abs_diff_eq!(du[[5]], 2.0, epsilon = 1e-8);
//! ```

/// Type used for floats, configure with the `f32` feature
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(not(feature = "f32"))]
/// Type used for floats, configure with the `f32` feature
pub type Float = f64;

pub mod coefs;
pub mod error;
pub mod grid;
pub mod operators;
pub mod stencil;
#[cfg(feature = "sparse")]
pub mod utils;

pub use error::{BoundsError, ConfigurationError, Error};
pub use grid::{Grid, GridContext};
pub use operators::{Factor, Multiply, Operator, PartialDerivative, Plus};
