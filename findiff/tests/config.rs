#![cfg(feature = "serde1")]

use findiff::{Factor, Grid, GridContext, PartialDerivative};

#[derive(Debug, serde::Deserialize)]
struct Problem {
    grid: Grid,
    operator: PartialDerivative,
    #[serde(default)]
    factor: Option<Factor>,
}

#[test]
fn uniform_problem() {
    let problem: Problem = json5::from_str(
        r#"{
            // unit square with 21x11 points
            grid: { uniform: { spacing: [0.05, 0.1], accuracy: 4 } },
            operator: [[1, 2], [0, 1]],
            factor: { scalar: 0.5 },
        }"#,
    )
    .unwrap();

    assert!(problem.grid.is_uniform());
    assert_eq!(problem.grid.accuracy(), 4);
    assert_eq!(problem.grid.spacing(1), Some(0.1));
    assert_eq!(
        problem.operator,
        PartialDerivative::from_pairs(&[(1, 2), (0, 1)]).unwrap()
    );
    assert_eq!(problem.factor, Some(Factor::Scalar(0.5)));
}

#[test]
fn non_uniform_problem() {
    let problem: Problem = json5::from_str(
        r#"{
            grid: {
                non_uniform: {
                    coordinates: [[0.0, 0.1, 0.3, 0.6, 1.0, 1.5]],
                    accuracy: 2,
                },
            },
            operator: [],
        }"#,
    )
    .unwrap();

    assert!(!problem.grid.is_uniform());
    assert_eq!(problem.grid.coordinates(0).unwrap().len(), 6);
    assert!(problem.operator.is_identity());
    assert!(problem.factor.is_none());
}

#[test]
fn invalid_configurations() {
    let invalid = [
        // odd accuracy
        r#"{ grid: { uniform: { spacing: [0.1], accuracy: 3 } }, operator: [] }"#,
        // negative spacing
        r#"{ grid: { uniform: { spacing: [-0.1], accuracy: 2 } }, operator: [] }"#,
        // coordinates out of order
        r#"{ grid: { non_uniform: { coordinates: [[0.0, 0.2, 0.1]], accuracy: 2 } }, operator: [] }"#,
        // repeated axis
        r#"{ grid: { uniform: { spacing: [0.1], accuracy: 2 } }, operator: [[0, 1], [0, 2]] }"#,
        // order zero
        r#"{ grid: { uniform: { spacing: [0.1], accuracy: 2 } }, operator: [[0, 0]] }"#,
        // negative axis
        r#"{ grid: { uniform: { spacing: [0.1], accuracy: 2 } }, operator: [[-1, 1]] }"#,
    ];
    for config in invalid {
        let err = json5::from_str::<Problem>(config).unwrap_err();
        assert!(!err.to_string().is_empty(), "{config}");
    }
}

#[test]
fn roundtrip_through_json5() {
    let grid = Grid::uniform(vec![0.25, 0.5], 6).unwrap();
    let s = json5::to_string(&grid).unwrap();
    let back: Grid = json5::from_str(&s).unwrap();
    assert_eq!(grid, back);

    let d = PartialDerivative::from_pairs(&[(2, 1), (0, 3)]).unwrap();
    let s = json5::to_string(&d).unwrap();
    let back: PartialDerivative = json5::from_str(&s).unwrap();
    assert_eq!(d, back);
}

#[test]
fn stencil_records_are_checked() {
    use findiff::coefs::Stencil;

    let s: Stencil = json5::from_str("{ weights: [-1.0, 1.0], offsets: [0, 1], accuracy: 1 }").unwrap();
    assert_eq!(s.offsets(), &[0, 1]);
    assert!(json5::from_str::<Stencil>("{ weights: [1.0], offsets: [0, 1], accuracy: 1 }").is_err());
}
