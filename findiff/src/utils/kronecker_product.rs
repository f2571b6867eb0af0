use sprs::{CsMatI, CsMatViewI, SpIndex};

/// Computes the sparse kronecker product
/// M = A \kron B
///
/// Both operands must be stored as CSR, which is what the operator
/// matrices are assembled as.
#[allow(non_snake_case)]
#[must_use]
pub fn kronecker_product<N, I, Iptr>(
    A: CsMatViewI<N, I, Iptr>,
    B: CsMatViewI<N, I, Iptr>,
) -> CsMatI<N, I, Iptr>
where
    N: num_traits::Num + Copy,
    I: SpIndex,
    Iptr: SpIndex,
{
    assert!(A.is_csr() && B.is_csr());
    let (a_rows, a_cols) = A.shape();
    let (b_rows, b_cols) = B.shape();
    let shape = (a_rows * b_rows, a_cols * b_cols);

    let nnz = A.nnz() * B.nnz();
    let mut values = Vec::with_capacity(nnz);
    let mut indices = Vec::with_capacity(nnz);
    let mut indptr = Vec::with_capacity(shape.0 + 1);

    indptr.push(Iptr::from_usize(0));
    for a_row in A.outer_iterator() {
        for b_row in B.outer_iterator() {
            for (a_col, &a) in a_row.iter() {
                for (b_col, &b) in b_row.iter() {
                    indices.push(I::from_usize(a_col * b_cols + b_col));
                    values.push(a * b);
                }
            }
            indptr.push(Iptr::from_usize(values.len()));
        }
    }
    CsMatI::new(shape, indptr, indices, values)
}

#[test]
fn test_kronecker_product() {
    let mut a = sprs::TriMat::new((2, 3));
    a.add_triplet(0, 1, 2);
    a.add_triplet(0, 2, 3);
    a.add_triplet(1, 0, 6);
    a.add_triplet(1, 2, 8);
    let a: sprs::CsMat<i32> = a.to_csr();

    let mut b = sprs::TriMat::new((3, 2));
    b.add_triplet(0, 0, 1);
    b.add_triplet(1, 0, 2);
    b.add_triplet(2, 0, 3);
    b.add_triplet(2, 1, -3);
    let b: sprs::CsMat<i32> = b.to_csr();

    let c = kronecker_product(a.view(), b.view());
    assert_eq!(c.shape(), (6, 6));
    assert_eq!(c.nnz(), 16);
    for (&n, (j, i)) in c.iter() {
        let expected = a.get(j / 3, i / 2).copied().unwrap_or(0)
            * b.get(j % 3, i % 2).copied().unwrap_or(0);
        assert_eq!(n, expected, "entry ({j},{i})");
    }
}

#[test]
fn identity_expansion() {
    let mut d = sprs::TriMat::new((3, 3));
    d.add_triplet(0, 0, -1.0);
    d.add_triplet(0, 1, 1.0);
    d.add_triplet(1, 1, -1.0);
    d.add_triplet(1, 2, 1.0);
    d.add_triplet(2, 1, -1.0);
    d.add_triplet(2, 2, 1.0);
    let d: sprs::CsMat<f64> = d.to_csr();
    let eye = sprs::CsMat::<f64>::eye(2);

    // Acts on the outer index of a row-major (2, 3) array
    let m = kronecker_product(d.view(), eye.view());
    assert_eq!(m.shape(), (6, 6));
    assert_eq!(m.get(0, 0), Some(&-1.0));
    assert_eq!(m.get(0, 2), Some(&1.0));
    assert_eq!(m.get(1, 3), Some(&1.0));
    assert_eq!(m.get(0, 1), None);
}
