//! Error taxonomy of the solver
//!
//! Components raise these errors at their discovery point; the binary
//! translates the kind into a process exit code. Only the singular
//! preconditioner block and GMRES non-convergence are recoverable, and both
//! are handled inside the solve driver (degrade / warn) rather than
//! surfacing here.

use pb_solvers::{GmresError, LuError};
use thiserror::Error;

/// Top-level error type of the boundary-element solver
#[derive(Error, Debug)]
pub enum BemError {
    /// Malformed or out-of-range key/value in the parameter file
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or unreadable input file, failed mesher invocation
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed PQR/MSMS/PLY content
    #[error("malformed input in {file}: {reason}")]
    Malformed {
        /// Offending file
        file: String,
        /// What went wrong
        reason: String,
    },

    /// Degenerate geometry: atom coincident with a surface element
    #[error("geometry error: {0}")]
    Geometry(String),

    /// A leaf block of the preconditioner could not be factorized
    #[error("singular preconditioner block: {0}")]
    SingularPreconditioner(#[from] LuError),

    /// Invalid arguments handed to the linear solver
    #[error("solver error: {0}")]
    Solver(#[from] GmresError),
}

impl BemError {
    /// Process exit code for this error kind (0 is success)
    pub fn exit_code(&self) -> i32 {
        match self {
            BemError::Config(_) => 1,
            BemError::Io(_) | BemError::Malformed { .. } => 2,
            BemError::Geometry(_) => 3,
            BemError::SingularPreconditioner(_) => 4,
            BemError::Solver(_) => 5,
        }
    }
}
