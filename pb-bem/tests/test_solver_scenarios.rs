//! Solver behavior scenarios: preconditioning, degeneracies, and
//! non-convergence handling

mod common;

use common::test_params;

use pb_bem::BemError;
use pb_bem::core::io::pqr::Molecule;
use pb_bem::core::mesh::generators::icosphere;
use pb_bem::core::solver::solve_prepared;
use pb_bem::core::timers::Timers;

/// Ten-atom synthetic chain along x with alternating partial charges
fn chain_molecule() -> Molecule {
    let atoms = (0..10)
        .map(|i| {
            let x = -3.6 + 0.8 * i as f64;
            let q = if i % 2 == 0 { 0.5 } else { -0.5 };
            ([x, 0.0, 0.0], q, 1.0)
        })
        .collect();
    Molecule::from_atoms(atoms)
}

#[test]
fn test_preconditioner_reduces_iterations_not_energy() {
    let with_precondition = test_params(
        "pdie 1.0\nsdie 80.0\nbulk 0.15\ntemp 298.15\n\
         tree_degree 3\ntree_theta 0.8\ntree_max_per_leaf 50\n\
         gmres_restart 10\ngmres_residual 1e-6\ngmres_num_iter 1000\n\
         precondition on\n",
    );
    let without_precondition = test_params(
        "pdie 1.0\nsdie 80.0\nbulk 0.15\ntemp 298.15\n\
         tree_degree 3\ntree_theta 0.8\ntree_max_per_leaf 50\n\
         gmres_restart 10\ngmres_residual 1e-6\ngmres_num_iter 1000\n\
         precondition off\n",
    );

    let molecule = chain_molecule();
    let mesh = icosphere(5.0, 3);

    let mut timers = Timers::default();
    let (preconditioned, _, _) =
        solve_prepared(&with_precondition, &molecule, &mesh, &mut timers).unwrap();
    let (unpreconditioned, _, _) =
        solve_prepared(&without_precondition, &molecule, &mesh, &mut timers).unwrap();

    assert!(preconditioned.converged);
    assert!(unpreconditioned.converged);

    assert!(
        preconditioned.iterations <= unpreconditioned.iterations,
        "block-Jacobi took {} iterations, scalar {}",
        preconditioned.iterations,
        unpreconditioned.iterations
    );

    let rel = (preconditioned.solvation_energy - unpreconditioned.solvation_energy).abs()
        / unpreconditioned.solvation_energy.abs();
    assert!(
        rel < 1e-4,
        "preconditioning changed the energy by {rel:e} relative"
    );
}

#[test]
fn test_chain_permutation_roundtrip_is_exact() {
    // The solved potential comes back in input order: solving the same
    // problem twice yields identical vectors, and every entry is finite
    let params = test_params(
        "tree_degree 3\ntree_theta 0.8\ntree_max_per_leaf 30\n\
         gmres_residual 1e-6\nprecondition on\n",
    );

    let molecule = chain_molecule();
    let mesh = icosphere(5.0, 2);

    let mut timers = Timers::default();
    let (_, potential_a, area_a) =
        solve_prepared(&params, &molecule, &mesh, &mut timers).unwrap();
    let (_, potential_b, area_b) =
        solve_prepared(&params, &molecule, &mesh, &mut timers).unwrap();

    assert_eq!(potential_a.len(), 2 * mesh.num_vertices());
    assert!(potential_a.iter().all(|v| v.is_finite()));

    for (a, b) in potential_a.iter().zip(potential_b.iter()) {
        assert_eq!(a.to_bits(), b.to_bits(), "solve is not deterministic");
    }
    for (a, b) in area_a.iter().zip(area_b.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_atom_on_surface_is_a_geometry_error() {
    let params = test_params("tree_degree 3\ntree_theta 0.8\ntree_max_per_leaf 50\n");

    let mesh = icosphere(2.0, 2);
    let v0 = mesh.vertices[0];
    // One atom a hair off a mesh vertex
    let molecule = Molecule::from_atoms(vec![
        ([0.0, 0.0, 0.0], 1.0, 2.0),
        ([v0[0], v0[1], v0[2] + 1e-12], 0.5, 1.0),
    ]);

    let mut timers = Timers::default();
    let result = solve_prepared(&params, &molecule, &mesh, &mut timers);

    match result {
        Err(err @ BemError::Geometry(_)) => {
            assert_eq!(err.exit_code(), 3);
        }
        other => panic!("expected a geometry error, got {other:?}"),
    }
}

#[test]
fn test_unreachable_tolerance_returns_best_iterate() {
    let params = test_params(
        "pdie 1.0\nsdie 80.0\nbulk 0.15\ntemp 298.15\n\
         tree_degree 3\ntree_theta 0.8\ntree_max_per_leaf 50\n\
         gmres_restart 10\ngmres_residual 1e-18\ngmres_num_iter 5\n\
         precondition on\n",
    );

    let molecule = Molecule::from_atoms(vec![([0.0, 0.0, 0.0], 1.0, 2.0)]);
    let mesh = icosphere(2.0, 3);

    let mut timers = Timers::default();
    let (summary, potential, _) =
        solve_prepared(&params, &molecule, &mesh, &mut timers).unwrap();

    // Non-convergence is a warning, not an error
    assert!(!summary.converged);
    assert_eq!(summary.iterations, 5);
    assert!(summary.residual > 0.0);

    // The best iterate is still usable
    assert!(potential.iter().all(|v| v.is_finite()));
    assert!(summary.solvation_energy.is_finite());
    assert!(summary.solvation_energy < 0.0);
}
