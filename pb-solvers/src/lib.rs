//! Linear solvers for boundary-integral electrostatics
//!
//! This crate provides the linear algebra consumed by the treecode
//! boundary-element solver:
//!
//! - **Iterative solver**: restarted GMRES(m), with and without left
//!   preconditioning
//! - **Direct solver**: dense LU decomposition with partial pivoting
//!   (used for block-Jacobi leaf factorizations)
//! - **Generic scalar types**: works with f64 and f32
//!
//! Operators are consumed through the [`LinearOperator`] and
//! [`Preconditioner`] traits, so matrix-free operators (such as a treecode
//! matrix-vector product) plug in without exposing their internals.
//!
//! # Example
//!
//! ```ignore
//! use pb_solvers::{gmres_preconditioned, GmresConfig, IdentityPreconditioner};
//!
//! let config = GmresConfig::default();
//! let solution = gmres_preconditioned(&operator, &IdentityPreconditioner, &rhs, &config)?;
//! ```

pub mod blas_helpers;
pub mod direct;
pub mod iterative;
pub mod preconditioners;
pub mod traits;

// Re-export main types
pub use traits::{IdentityPreconditioner, LinearOperator, Preconditioner, SolverScalar};

// Re-export iterative solvers
pub use iterative::{
    GmresConfig, GmresError, GmresSolution, gmres, gmres_preconditioned,
    gmres_preconditioned_with_guess,
};

// Re-export direct solvers
pub use direct::{LuError, LuFactorization, lu_factorize, lu_solve};

// Re-export preconditioners
pub use preconditioners::DiagonalPreconditioner;
