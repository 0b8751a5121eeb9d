//! Surface-potential output writers
//!
//! The solved traces are scaled to kJ/mol/e (UNITS_COEFF · 4π) and
//! written per `outdata` selection: legacy-ASCII VTK polydata, ASCII PLY
//! with per-vertex potential, or CSV rows.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::constants::UNITS_COEFF;
use crate::core::error::BemError;
use crate::core::mesh::SurfaceMesh;

/// Scale factor from solved traces to output units
pub fn output_scale() -> f64 {
    UNITS_COEFF * 4.0 * std::f64::consts::PI
}

/// Scale the potential vector for output and report its extrema
pub fn scale_potential(potential: &[f64]) -> Vec<f64> {
    let scaled: Vec<f64> = potential.iter().map(|p| p * output_scale()).collect();

    let num = scaled.len() / 2;
    let (lo, hi) = min_max(&scaled[..num]);
    let (dlo, dhi) = min_max(&scaled[num..]);
    log::info!("Surface potential range: [{lo:.6e}, {hi:.6e}]");
    log::info!("Normal derivative range: [{dlo:.6e}, {dhi:.6e}]");

    scaled
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

/// Write legacy-ASCII VTK polydata with the potential and its normal
/// derivative as point data
pub fn write_vtk(path: &Path, mesh: &SurfaceMesh, potential: &[f64]) -> Result<(), BemError> {
    let num = mesh.num_vertices();
    let mut w = BufWriter::new(fs::File::create(path)?);

    writeln!(w, "# vtk DataFile Version 3.0")?;
    writeln!(w, "Boundary-element surface potential")?;
    writeln!(w, "ASCII")?;
    writeln!(w, "DATASET POLYDATA")?;

    writeln!(w, "POINTS {num} double")?;
    for v in &mesh.vertices {
        writeln!(w, "{} {} {}", v[0], v[1], v[2])?;
    }

    writeln!(w, "POLYGONS {} {}", mesh.num_faces(), 4 * mesh.num_faces())?;
    for f in &mesh.faces {
        writeln!(w, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writeln!(w, "POINT_DATA {num}")?;
    writeln!(w, "SCALARS potential double")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for i in 0..num {
        writeln!(w, "{}", potential[i])?;
    }
    writeln!(w, "SCALARS normal_derivative double")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for i in 0..num {
        writeln!(w, "{}", potential[num + i])?;
    }

    writeln!(w, "NORMALS normals double")?;
    for n in &mesh.normals {
        writeln!(w, "{} {} {}", n[0], n[1], n[2])?;
    }

    Ok(())
}

/// Write ASCII PLY with potential and normal derivative as extra vertex
/// properties
pub fn write_ply(path: &Path, mesh: &SurfaceMesh, potential: &[f64]) -> Result<(), BemError> {
    let num = mesh.num_vertices();
    let mut w = BufWriter::new(fs::File::create(path)?);

    writeln!(w, "ply")?;
    writeln!(w, "format ascii 1.0")?;
    writeln!(w, "comment boundary-element surface potential")?;
    writeln!(w, "element vertex {num}")?;
    for prop in ["x", "y", "z", "nx", "ny", "nz", "potential", "normal_derivative"] {
        writeln!(w, "property double {prop}")?;
    }
    writeln!(w, "element face {}", mesh.num_faces())?;
    writeln!(w, "property list uchar uint vertex_indices")?;
    writeln!(w, "end_header")?;

    for i in 0..num {
        let v = mesh.vertices[i];
        let n = mesh.normals[i];
        writeln!(
            w,
            "{} {} {} {} {} {} {} {}",
            v[0],
            v[1],
            v[2],
            n[0],
            n[1],
            n[2],
            potential[i],
            potential[num + i]
        )?;
    }
    for f in &mesh.faces {
        writeln!(w, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    Ok(())
}

/// Write one CSV row per element, optionally preceded by a header row
pub fn write_csv(
    path: &Path,
    mesh: &SurfaceMesh,
    area: &[f64],
    potential: &[f64],
    headers: bool,
) -> Result<(), BemError> {
    let num = mesh.num_vertices();
    let mut w = BufWriter::new(fs::File::create(path)?);

    if headers {
        writeln!(w, "x,y,z,nx,ny,nz,area,potential,normal_derivative")?;
    }

    for i in 0..num {
        let v = mesh.vertices[i];
        let n = mesh.normals[i];
        writeln!(
            w,
            "{},{},{},{},{},{},{},{},{}",
            v[0],
            v[1],
            v[2],
            n[0],
            n[1],
            n[2],
            area[i],
            potential[i],
            potential[num + i]
        )?;
    }

    Ok(())
}
