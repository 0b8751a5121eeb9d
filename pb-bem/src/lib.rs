//! # Boundary-integral Poisson-Boltzmann solver
//!
//! Computes the electrostatic solvation free energy of a biomolecule in an
//! ionic solvent by solving the Poisson-Boltzmann boundary integral equation
//! on a triangulated molecular surface.
//!
//! ## Pipeline
//!
//! - Read atomic coordinates, charges and radii from a PQR file
//! - Triangulate the solvent-excluded surface (NanoShaper) or read a
//!   pre-built MSMS/PLY mesh
//! - Discretize the integral equation over one boundary element per vertex
//! - Solve the dense 2N x 2N system by restarted GMRES, with the
//!   matrix-vector product accelerated by a barycentric-Lagrange treecode
//!   and a block-Jacobi preconditioner built from the same tree
//! - Integrate the surface potential against the atomic charges to obtain
//!   the solvation energy
//!
//! Parallel execution uses Rayon; results are deterministic for a fixed
//! configuration regardless of thread count.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // Scientific code often has many parameters

pub mod core;

pub use crate::core::config::Params;
pub use crate::core::error::BemError;
pub use crate::core::solver::{SolveSummary, run};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
