//! Energy integration
//!
//! The electrostatic solvation free energy integrates the solved traces
//! against the atomic charges through the screened single- and
//! double-layer kernels; the intra-molecular Coulomb energy is the plain
//! pairwise sum. Both are reported in kJ/mol.

use crate::core::constants::{ONE_OVER_4PI, UNITS_COEFF, UNITS_PARA};
use crate::core::io::pqr::Molecule;
use crate::core::mesh::elements::Elements;
use crate::core::parallel::parallel_map_indexed;
use crate::core::types::PhysicsParams;

/// Integrate the solvation energy from the solved potential vector
///
/// The sum is invariant under the element permutation, so it may be taken
/// in tree order or input order as long as `potential` matches the
/// elements' current order.
pub fn solvation_energy(
    elements: &Elements,
    molecule: &Molecule,
    phys: &PhysicsParams,
    potential: &[f64],
) -> f64 {
    let num = elements.num();
    debug_assert_eq!(potential.len(), 2 * num);

    let per_element: Vec<f64> = parallel_map_indexed(num, |i| {
        let [x, y, z] = elements.position(i);
        let [nx, ny, nz] = elements.normal(i);
        let area = elements.area[i];

        let mut acc = 0.0;
        for j in 0..molecule.num_atoms() {
            let [ax, ay, az] = molecule.position(j);
            let x_dist = x - ax;
            let y_dist = y - ay;
            let z_dist = z - az;
            let dist = (x_dist * x_dist + y_dist * y_dist + z_dist * z_dist).sqrt();

            let cos_theta = (nx * x_dist + ny * y_dist + nz * z_dist) / dist;

            let kappa_r = phys.kappa * dist;
            let exp_kappa_r = (-kappa_r).exp();

            let g0 = ONE_OVER_4PI / dist;
            let gk = exp_kappa_r * g0;
            let g1 = cos_theta * g0 / dist;
            let g2 = g1 * (1.0 + kappa_r) * exp_kappa_r;

            let l1 = g1 - phys.eps * g2;
            let l2 = g0 - gk;

            acc += molecule.charge(j) * (l1 * potential[i] + l2 * potential[num + i]) * area;
        }
        acc
    });

    per_element.iter().sum::<f64>() * UNITS_PARA
}

/// Pairwise intra-molecular Coulomb energy
pub fn coulomb_energy(molecule: &Molecule, eps_solute: f64) -> f64 {
    let n = molecule.num_atoms();
    let mut energy = 0.0;

    for i in 0..n {
        let [xi, yi, zi] = molecule.position(i);
        for j in (i + 1)..n {
            let [xj, yj, zj] = molecule.position(j);
            let dx = xi - xj;
            let dy = yi - yj;
            let dz = zi - zj;
            let dist = (dx * dx + dy * dy + dz * dz).sqrt();
            energy += molecule.charge(i) * molecule.charge(j) / (eps_solute * dist);
        }
    }

    energy * UNITS_COEFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coulomb_two_charges() {
        let molecule = Molecule::from_atoms(vec![
            ([0.0, 0.0, 0.0], 1.0, 1.0),
            ([0.0, 0.0, 2.0], -1.0, 1.0),
        ]);

        let energy = coulomb_energy(&molecule, 1.0);
        assert_relative_eq!(energy, -UNITS_COEFF / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_coulomb_scales_with_dielectric() {
        let molecule = Molecule::from_atoms(vec![
            ([0.0, 0.0, 0.0], 1.0, 1.0),
            ([3.0, 0.0, 0.0], 1.0, 1.0),
        ]);

        let e1 = coulomb_energy(&molecule, 1.0);
        let e2 = coulomb_energy(&molecule, 2.0);
        assert_relative_eq!(e1, 2.0 * e2, max_relative = 1e-12);
    }

    #[test]
    fn test_single_atom_has_no_coulomb_energy() {
        let molecule = Molecule::from_atoms(vec![([0.0, 0.0, 0.0], 1.0, 2.0)]);
        assert_relative_eq!(coulomb_energy(&molecule, 1.0), 0.0);
    }

    #[test]
    fn test_solvation_energy_zero_potential() {
        use crate::core::mesh::elements::Elements;
        use crate::core::mesh::generators::icosphere;

        let elements = Elements::from_mesh(&icosphere(2.0, 1));
        let molecule = Molecule::from_atoms(vec![([0.0, 0.0, 0.0], 1.0, 2.0)]);
        let phys = PhysicsParams::new(1.0, 80.0, 0.15, 298.15);

        let potential = vec![0.0; 2 * elements.num()];
        assert_relative_eq!(
            solvation_energy(&elements, &molecule, &phys, &potential),
            0.0
        );
    }
}
