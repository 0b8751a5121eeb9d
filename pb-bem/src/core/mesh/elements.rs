//! Boundary elements of the discretized integral equation
//!
//! One element per surface vertex, stored as structure-of-arrays to keep
//! the pairwise kernels cache-friendly. Each element carries its position,
//! unit outward normal, averaged incident-triangle area, the two source-term
//! components, and a permutation entry mapping the current (tree-ordered)
//! index back to the original input index.

use crate::core::constants::{MIN_ATOM_SURFACE_DISTANCE, ONE_OVER_4PI};
use crate::core::error::BemError;
use crate::core::io::pqr::Molecule;
use crate::core::mesh::SurfaceMesh;
use crate::core::parallel::parallel_map_indexed;

/// The element set of one triangulated surface
#[derive(Debug, Clone)]
pub struct Elements {
    num: usize,

    /// Positions
    pub x: Vec<f64>,
    /// Positions
    pub y: Vec<f64>,
    /// Positions
    pub z: Vec<f64>,

    /// Unit outward normals
    pub nx: Vec<f64>,
    /// Unit outward normals
    pub ny: Vec<f64>,
    /// Unit outward normals
    pub nz: Vec<f64>,

    /// Averaged incident-triangle area per element
    pub area: Vec<f64>,

    /// Source term (s₁ then s₂, length 2N)
    pub source_term: Vec<f64>,

    /// Permutation: `order[i]` is the original input index of the element
    /// currently at position i
    order: Vec<usize>,

    surface_area: f64,
}

/// Per-element charges derived from the current GMRES iterate
///
/// Recomputed at the start of every matrix-vector product; the target
/// charges weight the downward pass, the source charges feed the upward
/// pass and the direct kernels.
#[derive(Debug, Clone)]
pub struct ElementCharges {
    /// 1/(4π) per element
    pub target_q: Vec<f64>,
    /// n_x/(4π)
    pub target_q_dx: Vec<f64>,
    /// n_y/(4π)
    pub target_q_dy: Vec<f64>,
    /// n_z/(4π)
    pub target_q_dz: Vec<f64>,
    /// a_i · φ_{N+i}
    pub source_q: Vec<f64>,
    /// n_x · a_i · φ_i
    pub source_q_dx: Vec<f64>,
    /// n_y · a_i · φ_i
    pub source_q_dy: Vec<f64>,
    /// n_z · a_i · φ_i
    pub source_q_dz: Vec<f64>,
}

impl Elements {
    /// Build the element set from a triangulated surface
    ///
    /// Areas accumulate one third of every incident triangle's Heron area.
    /// Elements with non-positive accumulated area are retained with a
    /// warning; the kernels weight them by zero.
    pub fn from_mesh(mesh: &SurfaceMesh) -> Self {
        let num = mesh.num_vertices();

        let mut x = Vec::with_capacity(num);
        let mut y = Vec::with_capacity(num);
        let mut z = Vec::with_capacity(num);
        let mut nx = Vec::with_capacity(num);
        let mut ny = Vec::with_capacity(num);
        let mut nz = Vec::with_capacity(num);

        for (v, n) in mesh.vertices.iter().zip(mesh.normals.iter()) {
            x.push(v[0]);
            y.push(v[1]);
            z.push(v[2]);
            nx.push(n[0]);
            ny.push(n[1]);
            nz.push(n[2]);
        }

        let mut area = vec![0.0; num];
        for face in &mesh.faces {
            let a = triangle_area([
                [x[face[0]], y[face[0]], z[face[0]]],
                [x[face[1]], y[face[1]], z[face[1]]],
                [x[face[2]], y[face[2]], z[face[2]]],
            ]);
            for &v in face {
                area[v] += a / 3.0;
            }
        }

        let degenerate = area.iter().filter(|&&a| a <= 0.0).count();
        if degenerate > 0 {
            log::warn!("{degenerate} elements have non-positive area");
        }

        let surface_area: f64 = area.iter().sum();
        log::info!("Surface area of triangulated mesh is {surface_area:.6}");

        Self {
            num,
            x,
            y,
            z,
            nx,
            ny,
            nz,
            area,
            source_term: vec![0.0; 2 * num],
            order: (0..num).collect(),
            surface_area,
        }
    }

    /// Number of elements
    pub fn num(&self) -> usize {
        self.num
    }

    /// Total surface area (Σ aᵢ)
    pub fn surface_area(&self) -> f64 {
        self.surface_area
    }

    /// Position of element i
    #[inline]
    pub fn position(&self, i: usize) -> [f64; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    /// Unit normal of element i
    #[inline]
    pub fn normal(&self, i: usize) -> [f64; 3] {
        [self.nx[i], self.ny[i], self.nz[i]]
    }

    /// Current permutation (current index → original input index)
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Assemble the source term from the molecule's atomic charges
    ///
    /// For each element i: s₁ᵢ = Σ_j q_j·G₀/ε_p and s₂ᵢ = Σ_j q_j·G₁/ε_p,
    /// with r taken from element to atom. An atom closer than
    /// [`MIN_ATOM_SURFACE_DISTANCE`] to an element is a geometry error.
    pub fn compute_source_term(
        &mut self,
        molecule: &Molecule,
        eps_solute: f64,
    ) -> Result<(), BemError> {
        let num = self.num;
        let (x, y, z) = (&self.x, &self.y, &self.z);
        let (nx, ny, nz) = (&self.nx, &self.ny, &self.nz);

        let per_element: Vec<Result<(f64, f64), BemError>> = parallel_map_indexed(num, |i| {
            let mut s1 = 0.0;
            let mut s2 = 0.0;

            for j in 0..molecule.num_atoms() {
                let [ax, ay, az] = molecule.position(j);
                let x_dist = ax - x[i];
                let y_dist = ay - y[i];
                let z_dist = az - z[i];
                let dist = (x_dist * x_dist + y_dist * y_dist + z_dist * z_dist).sqrt();

                if dist < MIN_ATOM_SURFACE_DISTANCE {
                    return Err(BemError::Geometry(format!(
                        "atom {j} coincides with surface element {i} (distance {dist:.3e})"
                    )));
                }

                let cos_theta = (nx[i] * x_dist + ny[i] * y_dist + nz[i] * z_dist) / dist;

                let g0 = ONE_OVER_4PI / dist;
                let g1 = cos_theta * g0 / dist;

                s1 += molecule.charge(j) * g0 / eps_solute;
                s2 += molecule.charge(j) * g1 / eps_solute;
            }

            Ok((s1, s2))
        });

        for (i, result) in per_element.into_iter().enumerate() {
            let (s1, s2) = result?;
            self.source_term[i] = s1;
            self.source_term[num + i] = s2;
        }

        Ok(())
    }

    /// Derive target and source charges from the current iterate
    pub fn compute_charges(&self, potential: &[f64]) -> ElementCharges {
        let num = self.num;
        debug_assert_eq!(potential.len(), 2 * num);

        let mut charges = ElementCharges {
            target_q: vec![0.0; num],
            target_q_dx: vec![0.0; num],
            target_q_dy: vec![0.0; num],
            target_q_dz: vec![0.0; num],
            source_q: vec![0.0; num],
            source_q_dx: vec![0.0; num],
            source_q_dy: vec![0.0; num],
            source_q_dz: vec![0.0; num],
        };

        for i in 0..num {
            charges.target_q[i] = ONE_OVER_4PI;
            charges.target_q_dx[i] = ONE_OVER_4PI * self.nx[i];
            charges.target_q_dy[i] = ONE_OVER_4PI * self.ny[i];
            charges.target_q_dz[i] = ONE_OVER_4PI * self.nz[i];

            charges.source_q[i] = self.area[i] * potential[num + i];
            charges.source_q_dx[i] = self.nx[i] * self.area[i] * potential[i];
            charges.source_q_dy[i] = self.ny[i] * self.area[i] * potential[i];
            charges.source_q_dz[i] = self.nz[i] * self.area[i] * potential[i];
        }

        charges
    }

    /// Bounding box [x_min, x_max, y_min, y_max, z_min, z_max] of an
    /// element range
    pub fn bounds(&self, begin: usize, end: usize) -> [f64; 6] {
        let mut b = [
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ];
        for i in begin..end {
            b[0] = b[0].min(self.x[i]);
            b[1] = b[1].max(self.x[i]);
            b[2] = b[2].min(self.y[i]);
            b[3] = b[3].max(self.y[i]);
            b[4] = b[4].min(self.z[i]);
            b[5] = b[5].max(self.z[i]);
        }
        b
    }

    /// Partition the range [begin, end) in place so elements with
    /// coordinate < mid on the given axis come first; returns the pivot.
    ///
    /// Only positions and the permutation move; the remaining per-element
    /// arrays follow in one [`Elements::reorder`] call after the tree is
    /// built.
    pub(crate) fn partition_axis(
        &mut self,
        axis: usize,
        begin: usize,
        end: usize,
        mid: f64,
    ) -> usize {
        let mut pivot = begin;
        for i in begin..end {
            let c = match axis {
                0 => self.x[i],
                1 => self.y[i],
                _ => self.z[i],
            };
            if c < mid {
                self.swap_elements(i, pivot);
                pivot += 1;
            }
        }
        pivot
    }

    fn swap_elements(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.x.swap(i, j);
        self.y.swap(i, j);
        self.z.swap(i, j);
        self.order.swap(i, j);
    }

    /// Apply the permutation accumulated during tree construction to the
    /// arrays that were not partitioned in place
    pub fn reorder(&mut self) {
        let num = self.num;
        permute_gather(&self.order, &mut self.nx);
        permute_gather(&self.order, &mut self.ny);
        permute_gather(&self.order, &mut self.nz);
        permute_gather(&self.order, &mut self.area);

        let (s1, s2) = self.source_term.split_at_mut(num);
        permute_gather(&self.order, s1);
        permute_gather(&self.order, s2);
    }

    /// Restore original input order on all per-element arrays and on the
    /// given potential vector (both halves)
    pub fn unorder(&mut self, potential: &mut [f64]) {
        let num = self.num;
        debug_assert_eq!(potential.len(), 2 * num);

        permute_scatter(&self.order, &mut self.x);
        permute_scatter(&self.order, &mut self.y);
        permute_scatter(&self.order, &mut self.z);
        permute_scatter(&self.order, &mut self.nx);
        permute_scatter(&self.order, &mut self.ny);
        permute_scatter(&self.order, &mut self.nz);
        permute_scatter(&self.order, &mut self.area);

        let (s1, s2) = self.source_term.split_at_mut(num);
        permute_scatter(&self.order, s1);
        permute_scatter(&self.order, s2);

        let (p1, p2) = potential.split_at_mut(num);
        permute_scatter(&self.order, p1);
        permute_scatter(&self.order, p2);

        for (i, o) in self.order.iter_mut().enumerate() {
            *o = i;
        }
    }
}

/// Gather: v[i] ← v_old[order[i]]
fn permute_gather(order: &[usize], v: &mut [f64]) {
    let tmp = v.to_vec();
    for (i, &idx) in order.iter().enumerate() {
        v[i] = tmp[idx];
    }
}

/// Scatter: v[order[i]] ← v_old[i]
fn permute_scatter(order: &[usize], v: &mut [f64]) {
    let tmp = v.to_vec();
    for (i, &idx) in order.iter().enumerate() {
        v[idx] = tmp[i];
    }
}

/// Triangle area by Heron's formula on the edge lengths
pub fn triangle_area(v: [[f64; 3]; 3]) -> f64 {
    let edge = |a: [f64; 3], b: [f64; 3]| -> f64 {
        let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    };

    let aa = edge(v[0], v[1]);
    let bb = edge(v[0], v[2]);
    let cc = edge(v[1], v[2]);

    let ss = 0.5 * (aa + bb + cc);
    // Near-degenerate triangles can drive the radicand slightly negative
    (ss * (ss - aa) * (ss - bb) * (ss - cc)).max(0.0).sqrt()
}
