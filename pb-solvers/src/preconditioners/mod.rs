//! Preconditioners for iterative solvers
//!
//! The treecode crate builds its own block-Jacobi preconditioner from leaf
//! LU factorizations; this module provides the simple diagonal (Jacobi)
//! preconditioner used as the unpreconditioned fallback.

mod diagonal;

pub use diagonal::DiagonalPreconditioner;
