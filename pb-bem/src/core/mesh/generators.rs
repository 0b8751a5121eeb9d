//! Mesh generators for analytical test geometries
//!
//! Provides a subdivided-icosahedron sphere used by the validation tests,
//! where the analytic (Born ion) solvation energy is known. Normals are
//! exact on a sphere: the unit radial direction.

use std::collections::HashMap;

use crate::core::mesh::SurfaceMesh;

/// Generate an icosphere surface (subdivided icosahedron) centered at the
/// origin
///
/// Subdivision levels: 0 gives 12 vertices, 1 gives 42, 2 gives 162,
/// 3 gives 642.
pub fn icosphere(radius: f64, subdivisions: usize) -> SurfaceMesh {
    // Golden ratio
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;

    let mut vertices: Vec<[f64; 3]> = vec![
        [-1.0, phi, 0.0],
        [1.0, phi, 0.0],
        [-1.0, -phi, 0.0],
        [1.0, -phi, 0.0],
        [0.0, -1.0, phi],
        [0.0, 1.0, phi],
        [0.0, -1.0, -phi],
        [0.0, 1.0, -phi],
        [phi, 0.0, -1.0],
        [phi, 0.0, 1.0],
        [-phi, 0.0, -1.0],
        [-phi, 0.0, 1.0],
    ];

    for v in &mut vertices {
        normalize(v);
    }

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut new_faces = Vec::with_capacity(4 * faces.len());
        let mut edge_midpoints: HashMap<(usize, usize), usize> = HashMap::new();

        for face in &faces {
            let [v0, v1, v2] = *face;

            let m01 = midpoint(&mut vertices, &mut edge_midpoints, v0, v1);
            let m12 = midpoint(&mut vertices, &mut edge_midpoints, v1, v2);
            let m20 = midpoint(&mut vertices, &mut edge_midpoints, v2, v0);

            new_faces.push([v0, m01, m20]);
            new_faces.push([v1, m12, m01]);
            new_faces.push([v2, m20, m12]);
            new_faces.push([m01, m12, m20]);
        }

        faces = new_faces;
    }

    // On the unit sphere the outward normal equals the position
    let normals = vertices.clone();
    let scaled: Vec<[f64; 3]> = vertices
        .iter()
        .map(|v| [v[0] * radius, v[1] * radius, v[2] * radius])
        .collect();

    SurfaceMesh {
        vertices: scaled,
        normals,
        faces,
    }
}

fn normalize(v: &mut [f64; 3]) {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    v[0] /= len;
    v[1] /= len;
    v[2] /= len;
}

fn midpoint(
    vertices: &mut Vec<[f64; 3]>,
    cache: &mut HashMap<(usize, usize), usize>,
    a: usize,
    b: usize,
) -> usize {
    let key = if a < b { (a, b) } else { (b, a) };
    if let Some(&idx) = cache.get(&key) {
        return idx;
    }

    let va = vertices[a];
    let vb = vertices[b];
    let mut mid = [
        0.5 * (va[0] + vb[0]),
        0.5 * (va[1] + vb[1]),
        0.5 * (va[2] + vb[2]),
    ];
    normalize(&mut mid);

    let idx = vertices.len();
    vertices.push(mid);
    cache.insert(key, idx);
    idx
}
