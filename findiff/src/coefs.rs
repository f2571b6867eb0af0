//! Finite difference weights from Taylor expansions
//!
//! A stencil with offsets `s_j` approximates the `d`-th derivative when its
//! weights `w_j` satisfy `sum_j w_j s_j^i = d! δ_id` for every `i` below the
//! number of points. The weights are computed with Fornberg's recursion
//! instead of solving this Vandermonde system directly. Uniform stencils are
//! computed on unit spacing and scaled by the caller, non-uniform stencils use
//! the physical coordinate distances.

use crate::error::{BoundsError, ConfigurationError, Error};
use crate::Float;
use ndarray::{Array2, ArrayView1};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Weights and offsets (relative to a reference index) of a single stencil
///
/// Every weight has exactly one offset.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(try_from = "StencilParts"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
    weights: Vec<Float>,
    offsets: Vec<isize>,
    accuracy: usize,
}

#[cfg(feature = "serde1")]
#[derive(Deserialize)]
struct StencilParts {
    weights: Vec<Float>,
    offsets: Vec<isize>,
    accuracy: usize,
}

#[cfg(feature = "serde1")]
impl TryFrom<StencilParts> for Stencil {
    type Error = ConfigurationError;
    fn try_from(parts: StencilParts) -> Result<Self, Self::Error> {
        Self::new(parts.weights, parts.offsets, parts.accuracy)
    }
}

impl Stencil {
    pub fn new(
        weights: Vec<Float>,
        offsets: Vec<isize>,
        accuracy: usize,
    ) -> Result<Self, ConfigurationError> {
        if weights.len() != offsets.len() {
            return Err(ConfigurationError::StencilLength {
                weights: weights.len(),
                offsets: offsets.len(),
            });
        }
        Ok(Self {
            weights,
            offsets,
            accuracy,
        })
    }
    pub fn weights(&self) -> &[Float] {
        &self.weights
    }
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }
    /// Truncation order of the stencil
    pub fn accuracy(&self) -> usize {
        self.accuracy
    }
    pub fn len(&self) -> usize {
        self.weights.len()
    }
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
    /// Pairs of `(weight, offset)`
    pub fn iter(&self) -> impl Iterator<Item = (Float, isize)> + '_ {
        self.weights.iter().copied().zip(self.offsets.iter().copied())
    }
}

/// Which part of an axis a stencil is used on
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "lowercase"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scheme {
    Center,
    Forward,
    Backward,
}

/// Stencils for the interior and both boundaries of a uniform axis
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub center: Stencil,
    pub forward: Stencil,
    pub backward: Stencil,
}

impl Coefficients {
    /// Number of boundary points on each side of the axis
    pub fn half_width(&self) -> usize {
        self.center.len() / 2
    }

    pub fn get(&self, scheme: Scheme) -> &Stencil {
        match scheme {
            Scheme::Center => &self.center,
            Scheme::Forward => &self.forward,
            Scheme::Backward => &self.backward,
        }
    }

    /// Scheme used at `index` on an axis of `npts` points
    pub fn scheme_at(&self, index: usize, npts: usize) -> Scheme {
        let b = self.half_width();
        if index < b {
            Scheme::Forward
        } else if index + b >= npts {
            Scheme::Backward
        } else {
            Scheme::Center
        }
    }
}

struct Layout {
    num_side: usize,
    num_one_sided: usize,
}

impl Layout {
    fn new(order: usize, accuracy: usize) -> Result<Self, ConfigurationError> {
        if order == 0 {
            return Err(ConfigurationError::InvalidOrder { order: 0 });
        }
        if accuracy == 0 || accuracy % 2 != 0 {
            return Err(ConfigurationError::InvalidAccuracy { accuracy });
        }
        let num_central = 2 * ((order + 1) / 2) - 1 + accuracy;
        Ok(Self {
            num_side: num_central / 2,
            num_one_sided: order + accuracy,
        })
    }

    fn center(&self) -> Vec<isize> {
        let s = self.num_side as isize;
        (-s..=s).collect()
    }
    fn forward(&self) -> Vec<isize> {
        (0..self.num_one_sided as isize).collect()
    }
    fn backward(&self) -> Vec<isize> {
        (1 - self.num_one_sided as isize..=0).collect()
    }

    /// Smallest axis on which every node has a stencil inside the axis
    fn required_points(&self) -> usize {
        (self.num_side + self.num_one_sided - 1).max(2 * self.num_side + 1)
    }
}

/// Weights for the `order`-th derivative at zero using the nodes
/// `positions`, following Fornberg's recursion
fn weights_for(positions: &[Float], order: usize) -> Result<Vec<Float>, Error> {
    let n = positions.len();
    assert!(n > order);
    // c[(j, k)]: weight of node j for the k-th derivative
    let mut c = Array2::<Float>::zeros((n, order + 1));
    c[(0, 0)] = 1.0;

    let mut c1 = 1.0;
    let mut c4 = positions[0];
    for i in 1..n {
        let mn = i.min(order);
        let mut c2 = 1.0;
        let c5 = c4;
        c4 = positions[i];
        for j in 0..i {
            let c3 = positions[i] - positions[j];
            c2 *= c3;
            if j == i - 1 {
                for k in (1..=mn).rev() {
                    c[(i, k)] = c1 * (k as Float * c[(i - 1, k - 1)] - c5 * c[(i - 1, k)]) / c2;
                }
                c[(i, 0)] = -c1 * c5 * c[(i - 1, 0)] / c2;
            }
            for k in (1..=mn).rev() {
                c[(j, k)] = (c4 * c[(j, k)] - k as Float * c[(j, k - 1)]) / c3;
            }
            c[(j, 0)] = c4 * c[(j, 0)] / c3;
        }
        c1 = c2;
    }

    let weights = c.column(order).to_vec();
    if weights.iter().all(|w| w.is_finite()) {
        Ok(weights)
    } else {
        Err(Error::SingularSystem)
    }
}

/// Order of the leading error term of a stencil on unit spacing
fn truncation_order(weights: &[Float], offsets: &[isize], order: usize) -> usize {
    const TOLERANCE: Float = 1e-6;
    let n = offsets.len();
    (n..n + 4)
        .find(|&k| {
            let moment = weights
                .iter()
                .zip(offsets)
                .map(|(&w, &s)| w * num_traits::pow(s as Float, k))
                .sum::<Float>();
            moment.abs() > TOLERANCE
        })
        .unwrap_or(n + 4)
        - order
}

fn uniform_stencil(offsets: Vec<isize>, order: usize) -> Result<Stencil, Error> {
    let positions = offsets.iter().map(|&s| s as Float).collect::<Vec<_>>();
    let weights = weights_for(&positions, order)?;
    let accuracy = truncation_order(&weights, &offsets, order);
    Ok(Stencil::new(weights, offsets, accuracy)?)
}

/// Half-width of the central uniform stencil, known before any weights are
/// computed
pub(crate) fn half_width(order: usize, accuracy: usize) -> Result<usize, ConfigurationError> {
    Ok(Layout::new(order, accuracy)?.num_side)
}

/// Stencils on unit spacing for the `order`-th derivative with the given
/// accuracy, which must be a positive even number
///
/// The result has to be scaled by `1/h^order` for spacing `h`.
pub fn coefficients(order: usize, accuracy: usize) -> Result<Coefficients, Error> {
    let layout = Layout::new(order, accuracy)?;
    log::trace!("Computing uniform coefficients for order {order}, accuracy {accuracy}");

    Ok(Coefficients {
        center: uniform_stencil(layout.center(), order)?,
        forward: uniform_stencil(layout.forward(), order)?,
        backward: uniform_stencil(layout.backward(), order)?,
    })
}

/// Stencil for the `order`-th derivative at node `index` of the coordinates
///
/// Nodes closer to a boundary than the central half-width get a one-sided
/// stencil. The weights include the local geometry and need no scaling.
pub fn coefficients_non_uniform(
    order: usize,
    accuracy: usize,
    coordinates: ArrayView1<Float>,
    index: usize,
) -> Result<Stencil, Error> {
    let layout = Layout::new(order, accuracy)?;
    let npts = coordinates.len();
    let required = layout.required_points();
    if npts < required || index >= npts {
        return Err(BoundsError::TooFewPoints {
            required: required.max(index + 1),
            available: npts,
        }
        .into());
    }

    let offsets = if index < layout.num_side {
        layout.forward()
    } else if index + layout.num_side >= npts {
        layout.backward()
    } else {
        layout.center()
    };

    let origin = coordinates[index];
    let positions = offsets
        .iter()
        .map(|&s| coordinates[(index as isize + s) as usize] - origin)
        .collect::<Vec<_>>();
    let weights = weights_for(&positions, order)?;
    Ok(Stencil::new(weights, offsets, accuracy)?)
}
