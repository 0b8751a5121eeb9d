//! Triangulated molecular surface handling
//!
//! The mesh layer produces a [`SurfaceMesh`] from one of three places: a
//! pre-built MSMS `.vert`/`.face` pair, a pre-built PLY file, or a fresh
//! NanoShaper run on the molecule. Everything downstream consumes the mesh
//! through [`elements::Elements`].

pub mod cluster;
pub mod elements;
pub mod generators;
pub mod msms;
pub mod nanoshaper;
pub mod octree;
pub mod ply;

use std::path::Path;

use crate::core::config::Params;
use crate::core::error::BemError;
use crate::core::io::pqr::Molecule;
use crate::core::types::MeshFormat;

/// A triangulated molecular surface
///
/// Vertices carry unit outward normals; faces are 0-based triangles
/// regardless of the on-disk format.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    /// Vertex positions (Å)
    pub vertices: Vec<[f64; 3]>,
    /// Unit outward normals, one per vertex
    pub normals: Vec<[f64; 3]>,
    /// Triangles as 0-based vertex index triples
    pub faces: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    /// Number of vertices
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Reject faces that reference vertices out of range
    pub fn validate(&self, source: &str) -> Result<(), BemError> {
        let n = self.vertices.len();
        if self.normals.len() != n {
            return Err(BemError::Malformed {
                file: source.to_string(),
                reason: format!("{} normals for {} vertices", self.normals.len(), n),
            });
        }
        for (i, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&v| v >= n) {
                return Err(BemError::Malformed {
                    file: source.to_string(),
                    reason: format!("face {i} references vertex out of range"),
                });
            }
        }
        Ok(())
    }
}

/// Obtain the surface for a run: read the configured mesh prefix, or mesh
/// the molecule with NanoShaper when no prefix is given
pub fn load_surface(params: &Params, molecule: &Molecule) -> Result<SurfaceMesh, BemError> {
    let mesh = if params.input_mesh_prefix.is_empty() {
        nanoshaper::generate_surface(params, molecule)?
    } else {
        read_mesh(&params.input_mesh_prefix, params.mesh_format)?
    };
    mesh.validate(&params.input_mesh_prefix)?;

    log::info!(
        "Surface mesh: {} vertices, {} faces",
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Read a mesh with the given prefix in the given format
pub fn read_mesh(prefix: &str, format: MeshFormat) -> Result<SurfaceMesh, BemError> {
    match format {
        MeshFormat::Msms => msms::read(prefix),
        MeshFormat::Ply => ply::read(Path::new(&format!("{prefix}.ply"))),
    }
}
