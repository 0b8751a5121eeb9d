//! Interpolation clusters for the treecode
//!
//! Every tree node carries a tensor-product Chebyshev grid scaled to its
//! bounding box. The upward pass projects the node's source charges onto
//! the grid by barycentric-Lagrange interpolation (each node projects its
//! own element range independently); the downward pass is the symmetric
//! dual, distributing accumulated grid potentials back onto the elements.

use crate::core::mesh::elements::{ElementCharges, Elements};
use crate::core::mesh::octree::Tree;
use crate::core::parallel::parallel_map_indexed;

/// Chebyshev grid of one node, scaled to its bounding box
#[derive(Debug, Clone)]
pub struct NodeGrid {
    /// Grid coordinates along x (p+1 points)
    pub tx: Vec<f64>,
    /// Grid coordinates along y
    pub ty: Vec<f64>,
    /// Grid coordinates along z
    pub tz: Vec<f64>,
}

/// Interpolated charges of one node: the scalar component and the three
/// vector-like components, each of size (p+1)³
#[derive(Debug, Clone)]
pub struct NodeMoments {
    /// Scalar component
    pub q: Vec<f64>,
    /// x component
    pub q_dx: Vec<f64>,
    /// y component
    pub q_dy: Vec<f64>,
    /// z component
    pub q_dz: Vec<f64>,
}

/// Accumulated far-field potentials of one node, same shape as the moments
#[derive(Debug, Clone)]
pub struct NodePotentials {
    /// Scalar component
    pub p: Vec<f64>,
    /// x component
    pub p_dx: Vec<f64>,
    /// y component
    pub p_dy: Vec<f64>,
    /// z component
    pub p_dz: Vec<f64>,
}

/// The interpolation clusters of a tree
#[derive(Debug, Clone)]
pub struct Clusters {
    degree: usize,
    pts_per_axis: usize,
    pts_per_node: usize,
    /// Chebyshev points cos(kπ/p) on [-1, 1]
    cheb: Vec<f64>,
    /// Barycentric weights w_k = (-1)^k · d_k, d_0 = d_p = ½
    weights: Vec<f64>,
    /// Per-node scaled grids, indexed like the tree arena
    grids: Vec<NodeGrid>,
}

impl Clusters {
    /// Build the per-node grids for interpolation degree p
    pub fn new(tree: &Tree, degree: usize) -> Self {
        let p = degree.max(1);
        let pts_per_axis = p + 1;

        let cheb: Vec<f64> = (0..pts_per_axis)
            .map(|k| (k as f64 * std::f64::consts::PI / p as f64).cos())
            .collect();

        let mut weights = vec![0.0; pts_per_axis];
        for (k, w) in weights.iter_mut().enumerate() {
            let d = if k == 0 || k == p { 0.5 } else { 1.0 };
            *w = if k % 2 == 0 { d } else { -d };
        }

        let grids = tree
            .nodes
            .iter()
            .map(|node| {
                let scale = |lo: f64, hi: f64| -> Vec<f64> {
                    cheb.iter().map(|t| lo + (t + 1.0) / 2.0 * (hi - lo)).collect()
                };
                NodeGrid {
                    tx: scale(node.bounds[0], node.bounds[1]),
                    ty: scale(node.bounds[2], node.bounds[3]),
                    tz: scale(node.bounds[4], node.bounds[5]),
                }
            })
            .collect();

        Self {
            degree: p,
            pts_per_axis,
            pts_per_node: pts_per_axis * pts_per_axis * pts_per_axis,
            cheb,
            weights,
            grids,
        }
    }

    /// Interpolation degree p
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Points per axis (p+1)
    pub fn pts_per_axis(&self) -> usize {
        self.pts_per_axis
    }

    /// Grid size per node, (p+1)³
    pub fn pts_per_node(&self) -> usize {
        self.pts_per_node
    }

    /// Scaled grid of a node
    pub fn grid(&self, node_idx: usize) -> &NodeGrid {
        &self.grids[node_idx]
    }

    /// Standard Chebyshev points on [-1, 1]
    pub fn chebyshev_points(&self) -> &[f64] {
        &self.cheb
    }

    /// Barycentric coefficients α_k = w_k/(x − t_k) for one axis
    ///
    /// Returns the coefficient sum. A target sitting exactly on a grid
    /// point degenerates the formula; the coefficient vector collapses to
    /// an indicator there and the sum to one.
    pub fn axis_coefficients(&self, grid_axis: &[f64], x: f64, alpha: &mut [f64]) -> f64 {
        let mut sum = 0.0;
        let mut exact = None;

        for (k, (&t, a)) in grid_axis.iter().zip(alpha.iter_mut()).enumerate() {
            let diff = x - t;
            if diff.abs() < f64::MIN_POSITIVE {
                exact = Some(k);
            }
            *a = self.weights[k] / diff;
            sum += *a;
        }

        if let Some(k) = exact {
            alpha.fill(0.0);
            alpha[k] = 1.0;
            return 1.0;
        }

        sum
    }

    /// Upward pass: project every node's source charges onto its grid
    ///
    /// Internal nodes project their full element range directly rather than
    /// combining child moments.
    pub fn upward_pass(
        &self,
        elements: &Elements,
        charges: &ElementCharges,
        tree: &Tree,
    ) -> Vec<NodeMoments> {
        parallel_map_indexed(tree.num_nodes(), |node_idx| {
            self.node_moments(node_idx, elements, charges, tree)
        })
    }

    fn node_moments(
        &self,
        node_idx: usize,
        elements: &Elements,
        charges: &ElementCharges,
        tree: &Tree,
    ) -> NodeMoments {
        let node = &tree.nodes[node_idx];
        let grid = &self.grids[node_idx];
        let m = self.pts_per_axis;

        let mut moments = NodeMoments {
            q: vec![0.0; self.pts_per_node],
            q_dx: vec![0.0; self.pts_per_node],
            q_dy: vec![0.0; self.pts_per_node],
            q_dz: vec![0.0; self.pts_per_node],
        };

        let mut ax = vec![0.0; m];
        let mut ay = vec![0.0; m];
        let mut az = vec![0.0; m];

        for i in node.begin..node.end {
            let sum_x = self.axis_coefficients(&grid.tx, elements.x[i], &mut ax);
            let sum_y = self.axis_coefficients(&grid.ty, elements.y[i], &mut ay);
            let sum_z = self.axis_coefficients(&grid.tz, elements.z[i], &mut az);

            let denom = 1.0 / (sum_x * sum_y * sum_z);

            let q = charges.source_q[i];
            let q_dx = charges.source_q_dx[i];
            let q_dy = charges.source_q_dy[i];
            let q_dz = charges.source_q_dz[i];

            let mut kk = 0;
            for k1 in 0..m {
                let axw = ax[k1] * denom;
                for k2 in 0..m {
                    let axy = axw * ay[k2];
                    for k3 in 0..m {
                        let w = axy * az[k3];
                        moments.q[kk] += w * q;
                        moments.q_dx[kk] += w * q_dx;
                        moments.q_dy[kk] += w * q_dy;
                        moments.q_dz[kk] += w * q_dz;
                        kk += 1;
                    }
                }
            }
        }

        moments
    }

    /// Zeroed potential accumulators, one per tree node
    pub fn empty_potentials(&self, tree: &Tree) -> Vec<NodePotentials> {
        (0..tree.num_nodes())
            .map(|_| NodePotentials {
                p: vec![0.0; self.pts_per_node],
                p_dx: vec![0.0; self.pts_per_node],
                p_dy: vec![0.0; self.pts_per_node],
                p_dz: vec![0.0; self.pts_per_node],
            })
            .collect()
    }

    /// Downward contribution of one node: interpolate its accumulated grid
    /// potentials onto its own element range
    ///
    /// Returns a buffer of length 2·range; the first half goes to the
    /// potential entries, the second half to the normal-derivative entries.
    pub fn node_potential_contribution(
        &self,
        node_idx: usize,
        elements: &Elements,
        charges: &ElementCharges,
        tree: &Tree,
        potentials: &NodePotentials,
    ) -> Vec<f64> {
        let node = &tree.nodes[node_idx];
        let grid = &self.grids[node_idx];
        let m = self.pts_per_axis;
        let len = node.num_elements();

        let mut out = vec![0.0; 2 * len];

        let mut ax = vec![0.0; m];
        let mut ay = vec![0.0; m];
        let mut az = vec![0.0; m];

        for i in node.begin..node.end {
            let sum_x = self.axis_coefficients(&grid.tx, elements.x[i], &mut ax);
            let sum_y = self.axis_coefficients(&grid.ty, elements.y[i], &mut ay);
            let sum_z = self.axis_coefficients(&grid.tz, elements.z[i], &mut az);

            let denom = 1.0 / (sum_x * sum_y * sum_z);

            let mut s0 = 0.0;
            let mut s1 = 0.0;
            let mut s2 = 0.0;
            let mut s3 = 0.0;

            let mut kk = 0;
            for k1 in 0..m {
                let axw = ax[k1] * denom;
                for k2 in 0..m {
                    let axy = axw * ay[k2];
                    for k3 in 0..m {
                        let w = axy * az[k3];
                        s0 += w * potentials.p[kk];
                        s1 += w * potentials.p_dx[kk];
                        s2 += w * potentials.p_dy[kk];
                        s3 += w * potentials.p_dz[kk];
                        kk += 1;
                    }
                }
            }

            let local = i - node.begin;
            out[local] += charges.target_q[i] * s0;
            out[len + local] += charges.target_q_dx[i] * s1
                + charges.target_q_dy[i] * s2
                + charges.target_q_dz[i] * s3;
        }

        out
    }
}
