//! Core traits for linear algebra operations
//!
//! This module defines the fundamental abstractions used throughout the solver
//! crate:
//! - [`SolverScalar`]: trait for real scalar types (f64, f32)
//! - [`LinearOperator`]: trait for matrix-like objects that can perform
//!   matrix-vector products
//! - [`Preconditioner`]: trait for preconditioning operations

use ndarray::Array1;
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;

/// Trait for real scalar types usable in the solvers.
///
/// The boundary-integral formulation of the linearized Poisson-Boltzmann
/// equation is real-valued, so only floating-point fields are needed.
///
/// # Implementations
///
/// Provided for:
/// - `f64` (default for all production solves)
/// - `f32` (for memory-constrained applications)
pub trait SolverScalar:
    Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static
{
    /// Small threshold below which a pivot or divisor is treated as zero
    fn breakdown_tolerance() -> Self {
        Self::from_f64(1e-14).unwrap()
    }
}

impl SolverScalar for f64 {}

impl SolverScalar for f32 {
    fn breakdown_tolerance() -> Self {
        1e-6
    }
}

/// Trait for linear operators (matrices) that can perform matrix-vector
/// products.
///
/// This abstraction allows solvers to work with dense matrices and
/// matrix-free operators (e.g., a treecode) interchangeably.
pub trait LinearOperator<T: SolverScalar>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1), so that M*A is better conditioned
/// than A alone. This accelerates convergence of iterative methods.
pub trait Preconditioner<T: SolverScalar>: Send + Sync {
    /// Apply the preconditioner: z = M * r
    ///
    /// This should approximate solving A * z = r
    fn apply(&self, r: &Array1<T>) -> Array1<T>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPreconditioner;

impl<T: SolverScalar> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_f64_scalar() {
        let x: f64 = 3.0;
        assert_relative_eq!(x.recip(), 1.0 / 3.0);
        assert!(f64::breakdown_tolerance() < 1e-10);
    }

    #[test]
    fn test_identity_preconditioner() {
        let precond = IdentityPreconditioner;
        let r = array![1.0_f64, 2.0, 3.0];
        let z = precond.apply(&r);
        assert_eq!(r, z);
    }
}
