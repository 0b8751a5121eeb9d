//! Physical and unit-conversion constants
//!
//! The linearized Poisson-Boltzmann equation is solved in Angstrom units
//! with energies in kJ/mol.

/// 1/(4π)
pub const ONE_OVER_4PI: f64 = 0.079577471545948;

/// Conversion from kcal to kJ
pub const KCAL_TO_KJ: f64 = 4.184;

/// Coefficient of the squared Debye-Hueckel screening parameter:
/// κ² = BULK_COEFF · I / (ε_w · T)
pub const BULK_COEFF: f64 = 2529.12179861515279;

/// Energy unit coefficient (332.0716 kcal·Å/e² expressed in kJ)
pub const UNITS_COEFF: f64 = 1389.3875744;

/// Solvation-energy prefactor: 2 · UNITS_COEFF · π
pub const UNITS_PARA: f64 = 8729.779593448;

/// Atoms closer than this to a boundary element make the source term
/// singular and are rejected as a geometry error
pub const MIN_ATOM_SURFACE_DISTANCE: f64 = 1.0e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_one_over_4pi() {
        assert_relative_eq!(ONE_OVER_4PI, 1.0 / (4.0 * PI), epsilon = 1e-12);
    }

    #[test]
    fn test_units_para() {
        assert_relative_eq!(UNITS_PARA, 2.0 * UNITS_COEFF * PI, max_relative = 1e-10);
    }
}
