//! Solve driver
//!
//! Wires one run end to end: molecule and surface input, element and tree
//! construction, interaction lists, preconditioner selection, the GMRES
//! solve against the treecode operator, energy integration, and output.

use std::path::PathBuf;

use ndarray::Array1;
use pb_solvers::{GmresConfig, gmres_preconditioned};
use serde::{Deserialize, Serialize};

use crate::core::assembly::{
    BlockJacobiPreconditioner, InteractionList, SolvePreconditioner, TreecodeOperator,
    scalar_preconditioner,
};
use crate::core::config::Params;
use crate::core::error::BemError;
use crate::core::io::output;
use crate::core::io::pqr::Molecule;
use crate::core::mesh::cluster::Clusters;
use crate::core::mesh::elements::Elements;
use crate::core::mesh::octree::Tree;
use crate::core::mesh::{SurfaceMesh, load_surface};
use crate::core::postprocess::{coulomb_energy, solvation_energy};
use crate::core::timers::Timers;
use crate::core::types::OutputKind;

/// Result summary of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveSummary {
    /// Number of boundary elements
    pub num_elements: usize,
    /// Total triangulated surface area (Å²)
    pub surface_area: f64,
    /// GMRES matrix-vector products performed
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether GMRES reached the configured tolerance
    pub converged: bool,
    /// Electrostatic solvation free energy (kJ/mol)
    pub solvation_energy: f64,
    /// Intra-molecular Coulomb energy (kJ/mol)
    pub coulomb_energy: f64,
}

/// Full run: read inputs, solve, integrate energies, write outputs
pub fn run(params: &Params) -> Result<SolveSummary, BemError> {
    let mut timers = Timers::default();

    let (molecule, mesh) = Timers::time(&mut timers.input, || -> Result<_, BemError> {
        let molecule = Molecule::from_pqr(&params.pqr_path)?;
        let mesh = load_surface(params, &molecule)?;
        Ok((molecule, mesh))
    })?;

    let (summary, potential, area) = solve_prepared(params, &molecule, &mesh, &mut timers)?;

    Timers::time(&mut timers.output, || -> Result<(), BemError> {
        write_outputs(params, &mesh, &area, &potential)
    })?;

    if params.wants_output(OutputKind::Timers) {
        timers.report();
    }

    log::info!(
        "Solvation energy: {:.6} kJ/mol, Coulomb energy: {:.6} kJ/mol",
        summary.solvation_energy,
        summary.coulomb_energy
    );

    Ok(summary)
}

/// Solve on an already-loaded molecule and surface
///
/// Returns the summary, the solved trace vector (unscaled) and the
/// per-element areas, both in original input order.
pub fn solve_prepared(
    params: &Params,
    molecule: &Molecule,
    mesh: &SurfaceMesh,
    timers: &mut Timers,
) -> Result<(SolveSummary, Vec<f64>, Vec<f64>), BemError> {
    let phys = &params.phys;

    let mut elements = Elements::from_mesh(mesh);

    Timers::time(&mut timers.source_term, || {
        elements.compute_source_term(molecule, phys.eps_solute)
    })?;

    let (tree, clusters, lists) = Timers::time(&mut timers.setup, || {
        let tree = Tree::build(&mut elements, params.tree_max_per_leaf);
        elements.reorder();
        let clusters = Clusters::new(&tree, params.tree_degree);
        let lists = InteractionList::build(&tree, params.tree_theta, params.tree_min_for_cluster);
        (tree, clusters, lists)
    });

    // The singular-leaf degradation is the one recoverable failure here:
    // warn and continue with the scalar preconditioner.
    let preconditioner = Timers::time(&mut timers.preconditioner, || {
        if !params.precondition {
            return SolvePreconditioner::Scalar(scalar_preconditioner(elements.num(), phys));
        }
        match BlockJacobiPreconditioner::build(&elements, &tree, phys) {
            Ok(block) => SolvePreconditioner::BlockJacobi(block),
            Err(err) => {
                log::warn!("{err}; falling back to scalar preconditioning");
                SolvePreconditioner::Scalar(scalar_preconditioner(elements.num(), phys))
            }
        }
    });

    let gmres_config = GmresConfig {
        max_iterations: params.gmres_num_iter,
        restart: params.gmres_restart,
        tolerance: params.gmres_residual,
        print_interval: 1,
    };

    let b = Array1::from(elements.source_term.clone());

    let solution = Timers::time(&mut timers.solve, || {
        let operator = TreecodeOperator::new(&elements, &tree, &clusters, &lists, phys);
        gmres_preconditioned(&operator, &preconditioner, &b, &gmres_config)
    })?;

    if !solution.converged {
        log::warn!(
            "GMRES reached the iteration limit ({} products) at residual {:.3e}; \
             returning the best iterate",
            solution.iterations,
            solution.residual
        );
    }

    let mut potential = solution.x.to_vec();

    let solvation = Timers::time(&mut timers.energy, || {
        solvation_energy(&elements, molecule, phys, &potential)
    });
    let coulomb = coulomb_energy(molecule, phys.eps_solute);

    elements.unorder(&mut potential);

    let summary = SolveSummary {
        num_elements: elements.num(),
        surface_area: elements.surface_area(),
        iterations: solution.iterations,
        residual: solution.residual,
        converged: solution.converged,
        solvation_energy: solvation,
        coulomb_energy: coulomb,
    };

    Ok((summary, potential, elements.area))
}

fn write_outputs(
    params: &Params,
    mesh: &SurfaceMesh,
    area: &[f64],
    potential: &[f64],
) -> Result<(), BemError> {
    let selected: Vec<OutputKind> = params
        .outputs
        .iter()
        .copied()
        .filter(|k| *k != OutputKind::Timers)
        .collect();
    if selected.is_empty() {
        return Ok(());
    }

    let scaled = output::scale_potential(potential);

    for kind in selected {
        let path = |ext: &str| PathBuf::from(format!("{}.{ext}", params.output_prefix));
        match kind {
            OutputKind::Vtk => output::write_vtk(&path("vtk"), mesh, &scaled)?,
            OutputKind::Ply => output::write_ply(&path("ply"), mesh, &scaled)?,
            OutputKind::Csv => output::write_csv(&path("csv"), mesh, area, &scaled, false)?,
            OutputKind::CsvHeaders => {
                output::write_csv(&path("csv"), mesh, area, &scaled, true)?
            }
            OutputKind::Timers => {}
        }
    }

    Ok(())
}
