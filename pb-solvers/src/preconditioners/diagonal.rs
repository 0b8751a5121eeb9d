//! Diagonal (Jacobi) preconditioner
//!
//! Scales each component by the inverse of the corresponding diagonal
//! entry of A. Element-wise, so it costs a single pass per application.

use crate::traits::{Preconditioner, SolverScalar};
use ndarray::Array1;

/// Diagonal (Jacobi) preconditioner
///
/// M = diag(A), so M⁻¹ scales each component by 1/A_ii
#[derive(Debug, Clone)]
pub struct DiagonalPreconditioner<T: SolverScalar> {
    /// Inverse diagonal elements
    inv_diag: Array1<T>,
}

impl<T: SolverScalar> DiagonalPreconditioner<T> {
    /// Create from a diagonal vector
    ///
    /// Entries below the breakdown tolerance are replaced by one, leaving
    /// the corresponding components unscaled.
    pub fn from_diagonal(diag: &Array1<T>) -> Self {
        let inv_diag = diag.mapv(|d| {
            if d.abs() > T::breakdown_tolerance() {
                T::one() / d
            } else {
                T::one()
            }
        });
        Self { inv_diag }
    }

    /// Create from an inverse diagonal vector directly
    pub fn from_inverse_diagonal(inv_diag: Array1<T>) -> Self {
        Self { inv_diag }
    }
}

impl<T: SolverScalar> Preconditioner<T> for DiagonalPreconditioner<T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        assert_eq!(r.len(), self.inv_diag.len());
        r.iter()
            .zip(self.inv_diag.iter())
            .map(|(&ri, &di)| ri * di)
            .collect()
    }
}
