//! Sparse system helpers and a factorize-once / solve-many handle.
//!
//! Systems are assembled in CSR form, restricted to a subset of rows and
//! columns, converted to CSC and factorized with a sparse Cholesky
//! decomposition. The factorization is reused for every right-hand side.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};

use crate::error::{MeshError, Result};

/// Column sums of a sparse matrix.
pub fn column_sums(matrix: &CsrMatrix<f64>) -> Vec<f64> {
    let mut sums = vec![0.0; matrix.ncols()];
    for (_, j, &v) in matrix.triplet_iter() {
        sums[j] += v;
    }
    sums
}

/// Extract the square submatrix on the given rows/columns.
///
/// `keep` lists the retained indices in ascending order; row/column `keep[k]`
/// of `matrix` becomes row/column `k` of the result. `scale` multiplies every
/// entry and `shift` is added to the diagonal.
pub fn restrict(matrix: &CsrMatrix<f64>, keep: &[usize], scale: f64, shift: f64) -> CscMatrix<f64> {
    let mut position = vec![usize::MAX; matrix.nrows()];
    for (k, &i) in keep.iter().enumerate() {
        position[i] = k;
    }

    let m = keep.len();
    let mut coo = CooMatrix::new(m, m);
    for (i, j, &v) in matrix.triplet_iter() {
        let (pi, pj) = (position[i], position[j]);
        if pi != usize::MAX && pj != usize::MAX {
            coo.push(pi, pj, scale * v);
        }
    }
    if shift != 0.0 {
        for k in 0..m {
            coo.push(k, k, shift);
        }
    }

    CscMatrix::from(&coo)
}

/// A cached sparse Cholesky factorization.
///
/// Holds `L L^T = s * A` for a sign `s`, so negative semidefinite systems can
/// be factorized through their negation. [`solve`](Self::solve) always solves
/// against the original matrix `A`.
pub struct Factorization {
    cholesky: CscCholesky<f64>,
    sign: f64,
    dim: usize,
}

impl Factorization {
    /// Factorize a symmetric positive definite matrix.
    pub fn positive_definite(matrix: &CscMatrix<f64>, system: &'static str) -> Result<Self> {
        Self::factor(matrix, 1.0, system)
    }

    /// Factorize a symmetric negative (semi)definite matrix supplied in
    /// negated form, i.e. `negated = -A` is positive (semi)definite.
    ///
    /// Callers that need a semidefinite `A` to factorize must add their own
    /// diagonal shift to `negated` first.
    pub fn negative_definite(negated: &CscMatrix<f64>, system: &'static str) -> Result<Self> {
        Self::factor(negated, -1.0, system)
    }

    fn factor(matrix: &CscMatrix<f64>, sign: f64, system: &'static str) -> Result<Self> {
        let cholesky =
            CscCholesky::factor(matrix).map_err(|_| MeshError::Factorization { system })?;
        Ok(Self {
            cholesky,
            sign,
            dim: matrix.nrows(),
        })
    }

    /// Dimension of the factorized system.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Solve `A x = b` with the cached factorization.
    ///
    /// # Panics
    ///
    /// Panics if `b.len()` differs from [`dim`](Self::dim).
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        assert_eq!(b.len(), self.dim, "Vector dimension mismatch");
        if self.dim == 0 {
            return DVector::zeros(0);
        }

        let rhs = DMatrix::from_column_slice(self.dim, 1, b.as_slice());
        let x = self.cholesky.solve(&rhs);
        DVector::from_iterator(self.dim, x.iter().map(|&v| self.sign * v))
    }
}

impl std::fmt::Debug for Factorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factorization")
            .field("dim", &self.dim)
            .field("sign", &self.sign)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd_2x2() -> CsrMatrix<f64> {
        // [ 4  1 ]
        // [ 1  3 ]
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, 4.0);
        coo.push(0, 1, 1.0);
        coo.push(1, 0, 1.0);
        coo.push(1, 1, 3.0);
        CsrMatrix::from(&coo)
    }

    #[test]
    fn test_column_sums() {
        assert_eq!(column_sums(&spd_2x2()), vec![5.0, 4.0]);
    }

    #[test]
    fn test_cholesky_solve() {
        // Solution: x = 1/11, y = 7/11
        let a = restrict(&spd_2x2(), &[0, 1], 1.0, 0.0);
        let fac = Factorization::positive_definite(&a, "test").unwrap();
        let x = fac.solve(&DVector::from_vec(vec![1.0, 2.0]));

        assert!((x[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_definite_solve() {
        // Solve -A x = b through the factorization of A.
        let a = restrict(&spd_2x2(), &[0, 1], 1.0, 0.0);
        let fac = Factorization::negative_definite(&a, "test").unwrap();
        let x = fac.solve(&DVector::from_vec(vec![-1.0, -2.0]));

        assert!((x[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_restrict_drops_rows_and_columns() {
        let mut coo = CooMatrix::new(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                coo.push(i, j, (10 * i + j) as f64);
            }
        }
        let m = CsrMatrix::from(&coo);

        let sub = restrict(&m, &[0, 2], 2.0, 1.0);
        let dense: Vec<(usize, usize, f64)> =
            sub.triplet_iter().map(|(i, j, &v)| (i, j, v)).collect();
        assert_eq!(sub.nrows(), 2);
        assert!(dense.contains(&(0, 0, 1.0)));
        assert!(dense.contains(&(0, 1, 4.0)));
        assert!(dense.contains(&(1, 0, 40.0)));
        assert!(dense.contains(&(1, 1, 45.0)));
    }

    #[test]
    fn test_indefinite_matrix_fails() {
        let a = restrict(&spd_2x2(), &[0, 1], -1.0, 0.0);
        let err = Factorization::positive_definite(&a, "heat").unwrap_err();
        assert!(matches!(err, MeshError::Factorization { system: "heat" }));
    }
}
