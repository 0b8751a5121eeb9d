//! Iterative solvers for linear systems
//!
//! The boundary-integral operator is dense and non-symmetric, so the crate
//! provides [`gmres`]: restarted GMRES(m) with optional left preconditioning.

mod gmres;

pub use gmres::{
    GmresConfig, GmresError, GmresSolution, gmres, gmres_preconditioned,
    gmres_preconditioned_with_guess,
};
