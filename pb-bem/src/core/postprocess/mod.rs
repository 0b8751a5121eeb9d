//! Post-processing of the solved surface potential

pub mod energy;

pub use energy::{coulomb_energy, solvation_energy};
