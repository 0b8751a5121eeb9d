//! LU decomposition solver
//!
//! Dense LU factorization with partial pivoting for solving small dense
//! systems. The factorization is computed once and can be reused for
//! multiple right-hand sides, which is how the block-Jacobi preconditioner
//! consumes it.

use crate::traits::SolverScalar;
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LuError {
    #[error("matrix is singular or nearly singular (pivot below tolerance)")]
    SingularMatrix,
    #[error("matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// LU factorization result
///
/// Stores the combined L and U factors along with pivot information.
/// L is unit lower triangular and stored below the diagonal.
#[derive(Debug, Clone)]
pub struct LuFactorization<T: SolverScalar> {
    /// Combined L and U matrices
    pub lu: Array2<T>,
    /// Pivot indices (row swaps applied during elimination)
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: SolverScalar> LuFactorization<T> {
    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x = b.clone();

        // Apply the recorded row swaps
        for i in 0..self.n {
            let pivot = self.pivots[i];
            if pivot != i {
                x.swap(i, pivot);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                let update = l_ij * x[j];
                x[i] -= update;
            }
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                let update = u_ij * x[j];
                x[i] -= update;
            }
            let u_ii = self.lu[[i, i]];
            if u_ii.abs() < T::breakdown_tolerance() {
                return Err(LuError::SingularMatrix);
            }
            x[i] = x[i] / u_ii;
        }

        Ok(x)
    }
}

/// Compute LU factorization with partial pivoting
///
/// Fails with [`LuError::SingularMatrix`] when the largest available pivot
/// falls below the scalar breakdown tolerance (1e-14 for f64).
pub fn lu_factorize<T: SolverScalar>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let mut lu = a.clone();
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Find pivot
        let mut max_val = lu[[k, k]].abs();
        let mut max_row = k;

        for i in (k + 1)..n {
            let val = lu[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val < T::breakdown_tolerance() {
            return Err(LuError::SingularMatrix);
        }

        // Swap rows if needed
        if max_row != k {
            for j in 0..n {
                let tmp = lu[[k, j]];
                lu[[k, j]] = lu[[max_row, j]];
                lu[[max_row, j]] = tmp;
            }
            pivots.swap(k, max_row);
        }

        // Compute multipliers and eliminate
        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let mult = lu[[i, k]] / pivot;
            lu[[i, k]] = mult;

            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

/// Solve Ax = b using LU decomposition
///
/// Convenience function that combines factorization and solve.
pub fn lu_solve<T: SolverScalar>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
    let factorization = lu_factorize(a)?;
    factorization.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_lu_solve() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_pivoting() {
        // Zero on the first diagonal entry requires a row swap
        let a = array![[0.0_f64, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
        let b = array![3.0_f64, 2.0, 4.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..3 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_identity() {
        let n = 5;
        let a = Array2::from_diag(&Array1::from_elem(n, 1.0_f64));
        let b = Array1::from_iter((1..=n).map(|i| i as f64));

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        for i in 0..n {
            assert_relative_eq!(x[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0]];
        let b = array![1.0_f64, 2.0];

        assert_eq!(lu_solve(&a, &b).unwrap_err(), LuError::SingularMatrix);
    }

    #[test]
    fn test_lu_near_singular_pivot() {
        // Pivots below the 1e-14 threshold count as singular
        let a = array![[1e-15_f64, 0.0], [0.0, 1e-15]];
        let b = array![1.0_f64, 1.0];

        assert_eq!(lu_solve(&a, &b).unwrap_err(), LuError::SingularMatrix);
    }

    #[test]
    fn test_lu_factorize_multiple_rhs() {
        let a = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];

        let factorization = lu_factorize(&a).expect("Factorization should succeed");

        let b1 = array![1.0_f64, 2.0, 3.0];
        let x1 = factorization.solve(&b1).expect("Solve should succeed");
        let ax1 = a.dot(&x1);
        for i in 0..3 {
            assert_relative_eq!(ax1[i], b1[i], epsilon = 1e-10);
        }

        let b2 = array![4.0_f64, 5.0, 6.0];
        let x2 = factorization.solve(&b2).expect("Solve should succeed");
        let ax2 = a.dot(&x2);
        for i in 0..3 {
            assert_relative_eq!(ax2[i], b2[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_dimension_mismatch() {
        let a = array![[1.0_f64, 0.0], [0.0, 1.0]];
        let factorization = lu_factorize(&a).unwrap();
        let b = array![1.0_f64, 2.0, 3.0];
        assert!(matches!(
            factorization.solve(&b).unwrap_err(),
            LuError::DimensionMismatch { .. }
        ));
    }
}
