//! Core type definitions for the boundary-element solver
//!
//! Defines the physical parameter bundle shared by the kernels, the
//! treecode operator and the preconditioner, plus the mesh/output selector
//! enums used by the configuration layer.

use serde::{Deserialize, Serialize};

use crate::core::constants::BULK_COEFF;

/// Physical parameters of the electrostatics problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Solute (protein) dielectric constant ε_p
    pub eps_solute: f64,
    /// Solvent dielectric constant ε_w
    pub eps_solvent: f64,
    /// Bulk ionic strength I (mol/L)
    pub bulk_strength: f64,
    /// Absolute temperature T (K)
    pub temperature: f64,
    /// Dielectric ratio ε = ε_w/ε_p
    pub eps: f64,
    /// Debye-Hueckel screening parameter κ (1/Å)
    pub kappa: f64,
    /// κ²
    pub kappa2: f64,
}

impl PhysicsParams {
    /// Derive ε, κ and κ² from the primitive physical inputs
    pub fn new(eps_solute: f64, eps_solvent: f64, bulk_strength: f64, temperature: f64) -> Self {
        let eps = eps_solvent / eps_solute;
        let kappa2 = BULK_COEFF * bulk_strength / eps_solvent / temperature;
        let kappa = kappa2.sqrt();

        Self {
            eps_solute,
            eps_solvent,
            bulk_strength,
            temperature,
            eps,
            kappa,
            kappa2,
        }
    }

    /// Diagonal coefficient of the first block row: ½(1 + ε)
    pub fn potential_coeff_1(&self) -> f64 {
        0.5 * (1.0 + self.eps)
    }

    /// Diagonal coefficient of the second block row: ½(1 + 1/ε)
    pub fn potential_coeff_2(&self) -> f64 {
        0.5 * (1.0 + 1.0 / self.eps)
    }
}

/// Surface definition handed to the mesher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshKind {
    /// Solvent-excluded surface
    Ses,
    /// Skin surface
    Skin,
}

/// On-disk format of the triangulated surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshFormat {
    /// MSMS .vert/.face text pair (1-based face indices)
    Msms,
    /// PLY, ASCII or binary little-endian (0-based face indices)
    Ply,
}

/// Output artifacts selected by the `outdata` configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Legacy-ASCII VTK polydata
    Vtk,
    /// ASCII PLY with per-vertex potential
    Ply,
    /// CSV rows of per-element state
    Csv,
    /// CSV with a header row
    CsvHeaders,
    /// Wall-clock timer report
    Timers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_physics_params() {
        let phys = PhysicsParams::new(1.0, 80.0, 0.15, 298.15);

        assert_relative_eq!(phys.eps, 80.0, epsilon = 1e-12);
        assert_relative_eq!(
            phys.kappa2,
            BULK_COEFF * 0.15 / 80.0 / 298.15,
            epsilon = 1e-12
        );
        assert_relative_eq!(phys.kappa, phys.kappa2.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(phys.potential_coeff_1(), 0.5 * 81.0, epsilon = 1e-12);
        assert_relative_eq!(
            phys.potential_coeff_2(),
            0.5 * (1.0 + 1.0 / 80.0),
            epsilon = 1e-12
        );
    }
}
