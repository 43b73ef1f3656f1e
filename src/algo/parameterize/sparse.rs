//! Sparse least-squares helpers built on `nalgebra-sparse`.
//!
//! The parameterizer assembles a rectangular energy matrix `M`, forms the
//! normal matrix `A = MᵗM`, fixes a few unknowns to prescribed values and
//! solves the remaining symmetric positive definite system with a sparse
//! Cholesky factorization.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};

use crate::error::{MeshError, Result};

/// Diagonal entries at or below this are treated as missing.
const MIN_DIAGONAL: f64 = 1e-300;

/// Build a CSR matrix from `(row, col, value)` triplets.
///
/// Duplicate entries at the same position are summed.
pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(rows, cols);
    for &(r, c, v) in triplets {
        coo.push(r, c, v);
    }
    CsrMatrix::from(&coo)
}

/// Compute the normal matrix `MᵗM`.
pub fn normal_matrix(m: &CsrMatrix<f64>) -> CsrMatrix<f64> {
    let mt = m.transpose();
    &mt * m
}

/// Solve `A x = 0` with some unknowns fixed.
///
/// `pins` lists `(column, value)` pairs. Each pinned column is eliminated
/// from the system: its off-diagonal couplings are moved to the right-hand
/// side, its row and column are cleared, the diagonal becomes 1 and the
/// right-hand side entry becomes the pinned value. The reduced system stays
/// symmetric, so it is factored with a sparse Cholesky decomposition.
///
/// # Errors
///
/// - [`MeshError::InvalidState`] if `A` is not square or a pin is out of range
/// - [`MeshError::SingularSystem`] if a free unknown has no diagonal term
/// - [`MeshError::FactorizationFailed`] if the reduced matrix is not positive definite
/// - [`MeshError::NonFiniteSolution`] if the solve yields NaN or infinity
pub fn solve_pinned(a: &CsrMatrix<f64>, pins: &[(usize, f64)]) -> Result<DVector<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MeshError::InvalidState(format!(
            "system matrix is {}x{}, expected square",
            n,
            a.ncols()
        )));
    }

    let mut pinned: Vec<Option<f64>> = vec![None; n];
    for &(col, value) in pins {
        if col >= n {
            return Err(MeshError::InvalidState(format!(
                "pinned unknown {} outside system of size {}",
                col, n
            )));
        }
        pinned[col] = Some(value);
    }

    let mut rhs = vec![0.0; n];
    let mut diagonal = vec![0.0; n];
    let mut coo = CooMatrix::new(n, n);

    for (r, c, &v) in a.triplet_iter() {
        match (pinned[r], pinned[c]) {
            (None, None) => {
                if r == c {
                    diagonal[r] += v;
                }
                coo.push(r, c, v);
            }
            (None, Some(t)) => rhs[r] -= v * t,
            _ => {}
        }
    }

    for (col, value) in pinned.iter().enumerate() {
        if let Some(t) = *value {
            coo.push(col, col, 1.0);
            rhs[col] = t;
        }
    }

    if let Some(column) = (0..n).find(|&c| pinned[c].is_none() && diagonal[c] <= MIN_DIAGONAL) {
        return Err(MeshError::SingularSystem { column });
    }

    let csc = CscMatrix::from(&coo);
    let cholesky =
        CscCholesky::factor(&csc).map_err(|e| MeshError::FactorizationFailed(format!("{:?}", e)))?;

    let b = DMatrix::from_column_slice(n, 1, &rhs);
    let x = cholesky.solve(&b);

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MeshError::NonFiniteSolution);
    }

    Ok(DVector::from_iterator(n, x.column(0).iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_laplacian() -> CsrMatrix<f64> {
        from_triplets(
            3,
            3,
            &[
                (0, 0, 1.0),
                (0, 1, -1.0),
                (1, 0, -1.0),
                (1, 1, 2.0),
                (1, 2, -1.0),
                (2, 1, -1.0),
                (2, 2, 1.0),
            ],
        )
    }

    #[test]
    fn test_from_triplets_sums_duplicates() {
        let m = from_triplets(2, 2, &[(0, 0, 1.0), (0, 0, 2.0), (1, 1, 4.0)]);
        assert_eq!(m.nnz(), 2);
        let (_, _, v) = m.triplet_iter().next().unwrap();
        assert_eq!(*v, 3.0);
    }

    #[test]
    fn test_normal_matrix() {
        // M = [[1, 2], [0, 1]]  =>  MᵗM = [[1, 2], [2, 5]]
        let m = from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 1.0)]);
        let a = normal_matrix(&m);

        let mut dense = DMatrix::<f64>::zeros(2, 2);
        for (r, c, &v) in a.triplet_iter() {
            dense[(r, c)] += v;
        }
        assert_eq!(dense, DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 5.0]));
    }

    #[test]
    fn test_pinned_endpoints_interpolate() {
        let x = solve_pinned(&path_laplacian(), &[(0, 0.0), (2, 2.0)]).unwrap();
        assert!((x[0] - 0.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
        assert!((x[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unconstrained_unknown_is_singular() {
        let a = from_triplets(3, 3, &[(0, 0, 1.0), (2, 2, 1.0)]);
        let result = solve_pinned(&a, &[(0, 1.0)]);
        assert!(matches!(result, Err(MeshError::SingularSystem { column: 1 })));
    }

    #[test]
    fn test_indefinite_matrix_fails_to_factor() {
        let a = from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 1.0)]);
        let result = solve_pinned(&a, &[]);
        assert!(matches!(result, Err(MeshError::FactorizationFailed(_))));
    }

    #[test]
    fn test_pin_out_of_range() {
        assert!(matches!(
            solve_pinned(&path_laplacian(), &[(3, 0.0)]),
            Err(MeshError::InvalidState(_))
        ));
    }
}
