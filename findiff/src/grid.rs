use crate::error::ConfigurationError;
use crate::Float;
use ndarray::{Array1, ArrayView1};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// What the derivative operators need to know about the grid a field is
/// sampled on
pub trait GridContext: Send + Sync {
    fn is_uniform(&self) -> bool;
    /// Constant spacing along `axis`, only available for uniform grids
    fn spacing(&self, axis: usize) -> Option<Float>;
    /// Node positions along `axis`, only available for non-uniform grids
    fn coordinates(&self, axis: usize) -> Option<ArrayView1<'_, Float>>;
    /// Accuracy order used to size the stencils
    fn accuracy(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq)]
enum Spacing {
    Uniform(Vec<Float>),
    NonUniform(Vec<Array1<Float>>),
}

/// A rectilinear grid, either with constant spacing per axis or with
/// explicit node coordinates per axis
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde1",
    serde(try_from = "GridDescription", into = "GridDescription")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    spacing: Spacing,
    accuracy: usize,
}

fn check_accuracy(accuracy: usize) -> Result<(), ConfigurationError> {
    if accuracy == 0 || accuracy % 2 != 0 {
        Err(ConfigurationError::InvalidAccuracy { accuracy })
    } else {
        Ok(())
    }
}

impl Grid {
    pub fn uniform(
        spacing: impl Into<Vec<Float>>,
        accuracy: usize,
    ) -> Result<Self, ConfigurationError> {
        check_accuracy(accuracy)?;
        let spacing = spacing.into();
        for (axis, &h) in spacing.iter().enumerate() {
            if !(h.is_finite() && h > 0.0) {
                return Err(ConfigurationError::InvalidSpacing { axis, spacing: h });
            }
        }
        Ok(Self {
            spacing: Spacing::Uniform(spacing),
            accuracy,
        })
    }

    pub fn non_uniform(
        coordinates: Vec<Array1<Float>>,
        accuracy: usize,
    ) -> Result<Self, ConfigurationError> {
        check_accuracy(accuracy)?;
        for (axis, x) in coordinates.iter().enumerate() {
            let increasing = x.windows(2).into_iter().all(|w| w[1] > w[0]);
            if x.len() < 2 || !increasing || x.iter().any(|v| !v.is_finite()) {
                return Err(ConfigurationError::NonMonotonicCoordinates { axis });
            }
        }
        Ok(Self {
            spacing: Spacing::NonUniform(coordinates),
            accuracy,
        })
    }

    pub fn ndim(&self) -> usize {
        match &self.spacing {
            Spacing::Uniform(h) => h.len(),
            Spacing::NonUniform(x) => x.len(),
        }
    }

    pub fn with_accuracy(self, accuracy: usize) -> Result<Self, ConfigurationError> {
        check_accuracy(accuracy)?;
        Ok(Self { accuracy, ..self })
    }
}

impl GridContext for Grid {
    fn is_uniform(&self) -> bool {
        matches!(self.spacing, Spacing::Uniform(_))
    }
    fn spacing(&self, axis: usize) -> Option<Float> {
        match &self.spacing {
            Spacing::Uniform(h) => h.get(axis).copied(),
            Spacing::NonUniform(_) => None,
        }
    }
    fn coordinates(&self, axis: usize) -> Option<ArrayView1<'_, Float>> {
        match &self.spacing {
            Spacing::Uniform(_) => None,
            Spacing::NonUniform(x) => x.get(axis).map(|x| x.view()),
        }
    }
    fn accuracy(&self) -> usize {
        self.accuracy
    }
}

/// Unvalidated serialised form of [`Grid`]
#[cfg(feature = "serde1")]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridDescription {
    Uniform {
        spacing: Vec<Float>,
        accuracy: usize,
    },
    NonUniform {
        coordinates: Vec<Vec<Float>>,
        accuracy: usize,
    },
}

#[cfg(feature = "serde1")]
impl TryFrom<GridDescription> for Grid {
    type Error = ConfigurationError;
    fn try_from(desc: GridDescription) -> Result<Self, Self::Error> {
        match desc {
            GridDescription::Uniform { spacing, accuracy } => Self::uniform(spacing, accuracy),
            GridDescription::NonUniform {
                coordinates,
                accuracy,
            } => Self::non_uniform(
                coordinates.into_iter().map(Array1::from).collect(),
                accuracy,
            ),
        }
    }
}

#[cfg(feature = "serde1")]
impl From<Grid> for GridDescription {
    fn from(grid: Grid) -> Self {
        match grid.spacing {
            Spacing::Uniform(spacing) => Self::Uniform {
                spacing,
                accuracy: grid.accuracy,
            },
            Spacing::NonUniform(coordinates) => Self::NonUniform {
                coordinates: coordinates.into_iter().map(|x| x.to_vec()).collect(),
                accuracy: grid.accuracy,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid() {
        let grid = Grid::uniform(vec![0.1, 0.5], 4).unwrap();
        assert!(grid.is_uniform());
        assert_eq!(grid.ndim(), 2);
        assert_eq!(grid.spacing(1), Some(0.5));
        assert_eq!(grid.spacing(2), None);
        assert!(grid.coordinates(0).is_none());
        assert_eq!(grid.accuracy(), 4);
    }

    #[test]
    fn non_uniform_grid() {
        let x = ndarray::arr1(&[0.0, 0.1, 0.3, 0.7]);
        let grid = Grid::non_uniform(vec![x.clone()], 2).unwrap();
        assert!(!grid.is_uniform());
        assert_eq!(grid.coordinates(0), Some(x.view()));
        assert!(grid.coordinates(1).is_none());
        assert!(grid.spacing(0).is_none());
    }

    #[test]
    fn invalid_grids() {
        assert_eq!(
            Grid::uniform(vec![0.1], 3),
            Err(ConfigurationError::InvalidAccuracy { accuracy: 3 })
        );
        assert_eq!(
            Grid::uniform(vec![0.1], 0),
            Err(ConfigurationError::InvalidAccuracy { accuracy: 0 })
        );
        assert_eq!(
            Grid::uniform(vec![0.1, -1.0], 2),
            Err(ConfigurationError::InvalidSpacing {
                axis: 1,
                spacing: -1.0
            })
        );
        assert!(Grid::uniform(vec![Float::NAN], 2).is_err());
        assert_eq!(
            Grid::non_uniform(vec![ndarray::arr1(&[0.0, 0.2, 0.1])], 2),
            Err(ConfigurationError::NonMonotonicCoordinates { axis: 0 })
        );
        assert!(Grid::non_uniform(vec![ndarray::arr1(&[0.0])], 2).is_err());
    }

    #[test]
    fn change_accuracy() {
        let grid = Grid::uniform(vec![1.0], 2).unwrap();
        let grid = grid.with_accuracy(6).unwrap();
        assert_eq!(grid.accuracy(), 6);
        assert!(grid.with_accuracy(5).is_err());
    }
}
