//! External NanoShaper invocation
//!
//! When no input mesh prefix is configured, the molecule is written to
//! `molecule.xyzr`, a `surfaceConfiguration.prm` is generated, and the
//! `NanoShaper` binary is executed in the working directory. Its
//! `triangulatedSurf.*` output is read back and all temporaries are removed.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::core::config::Params;
use crate::core::error::BemError;
use crate::core::io::pqr::Molecule;
use crate::core::mesh::{SurfaceMesh, msms, ply};
use crate::core::types::{MeshFormat, MeshKind};

#[cfg(windows)]
const NANOSHAPER_BINARY: &str = "NanoShaper.exe";
#[cfg(not(windows))]
const NANOSHAPER_BINARY: &str = "NanoShaper";

const CONFIG_FILE: &str = "surfaceConfiguration.prm";
const XYZR_FILE: &str = "molecule.xyzr";
const SURF_PREFIX: &str = "triangulatedSurf";

/// Scratch files NanoShaper leaves behind
const SCRATCH_FILES: &[&str] = &[
    "stderror.txt",
    "triangleAreas.txt",
    "exposed.xyz",
    "exposedIndices.txt",
];

/// Mesh the molecule by invoking NanoShaper and reading its output
pub fn generate_surface(params: &Params, molecule: &Molecule) -> Result<SurfaceMesh, BemError> {
    molecule.write_xyzr(Path::new(XYZR_FILE))?;
    write_config(params)?;

    log::info!("Invoking {NANOSHAPER_BINARY} for surface triangulation");
    let status = Command::new(NANOSHAPER_BINARY).status().map_err(|e| {
        BemError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to invoke {NANOSHAPER_BINARY}: {e}"),
        ))
    })?;
    if !status.success() {
        cleanup(params.mesh_format);
        return Err(BemError::Io(std::io::Error::other(format!(
            "{NANOSHAPER_BINARY} exited with status {status}"
        ))));
    }

    let mesh = match params.mesh_format {
        MeshFormat::Msms => msms::read(SURF_PREFIX),
        MeshFormat::Ply => ply::read(Path::new(&format!("{SURF_PREFIX}.ply"))),
    };

    cleanup(params.mesh_format);
    mesh
}

/// Write the NanoShaper parameter file for this run
fn write_config(params: &Params) -> Result<(), BemError> {
    let mut file = fs::File::create(CONFIG_FILE)?;

    writeln!(file, "Grid_scale = {}", params.mesh_density)?;
    writeln!(file, "Grid_perfil = {}", 90.0)?;
    writeln!(file, "XYZR_FileName = {XYZR_FILE}")?;
    writeln!(file, "Build_epsilon_maps = false")?;
    writeln!(file, "Build_status_map = false")?;

    if params.mesh_format == MeshFormat::Ply {
        writeln!(file, "Save_Mesh_PLY_Format = true")?;
    } else {
        writeln!(file, "Save_Mesh_MSMS_Format = true")?;
    }

    writeln!(file, "Compute_Vertex_Normals = true")?;

    match params.mesh {
        MeshKind::Ses => writeln!(file, "Surface = ses")?,
        MeshKind::Skin => writeln!(file, "Surface = skin")?,
    }

    writeln!(file, "Smooth_Mesh = true")?;
    writeln!(file, "Skin_Surface_Parameter = {}", 0.45)?;
    writeln!(file, "Cavity_Detection_Filling = false")?;
    writeln!(file, "Conditional_Volume_Filling_Value = {}", 11.4)?;
    writeln!(file, "Keep_Water_Shaped_Cavities = false")?;
    writeln!(file, "Probe_Radius = {}", params.mesh_probe_radius)?;
    writeln!(file, "Accurate_Triangulation = true")?;
    writeln!(file, "Triangulation = true")?;
    writeln!(file, "Check_duplicated_vertices = true")?;
    writeln!(file, "Save_Status_map = false")?;
    writeln!(file, "Save_PovRay = false")?;
    writeln!(file, "Max_ses_patches_per_auxiliary_grid_2d_cell = {}", 1600)?;
    writeln!(file, "Max_ses_patches_auxiliary_grid_2d_size = {}", 50)?;

    Ok(())
}

/// Remove the parameter file, the xyzr export, NanoShaper scratch files and
/// the triangulated surface
fn cleanup(format: MeshFormat) {
    let mut files: Vec<String> = SCRATCH_FILES.iter().map(|s| s.to_string()).collect();
    files.push(CONFIG_FILE.to_string());
    files.push(XYZR_FILE.to_string());
    match format {
        MeshFormat::Ply => files.push(format!("{SURF_PREFIX}.ply")),
        MeshFormat::Msms => {
            files.push(format!("{SURF_PREFIX}.vert"));
            files.push(format!("{SURF_PREFIX}.face"));
        }
    }
    for f in files {
        let _ = fs::remove_file(f);
    }
}
