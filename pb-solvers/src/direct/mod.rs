//! Direct solvers
//!
//! Dense LU factorization with partial pivoting, used to factor the
//! block-Jacobi leaf blocks once and back-substitute on every
//! preconditioner application.

mod lu;

pub use lu::{LuError, LuFactorization, lu_factorize, lu_solve};
