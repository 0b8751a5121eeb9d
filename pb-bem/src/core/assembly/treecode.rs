//! Treecode-accelerated matrix-vector product
//!
//! One application of the boundary-integral operator runs the upward pass,
//! walks the four interaction lists of every target node, runs the
//! downward pass, and folds in the ½(1+ε) / ½(1+1/ε) self terms:
//!
//! y ← β·y + α·(c·x − Σ interactions)
//!
//! Parallelism is per target node. Direct and particle-cluster
//! contributions land in a per-node buffer, cluster-directed contributions
//! in the target node's own potential grid; buffers are folded into the
//! output sequentially in node order, so results are deterministic for any
//! thread count.

use ndarray::Array1;
use pb_solvers::LinearOperator;
use rayon::prelude::*;

use crate::core::assembly::interaction_list::InteractionList;
use crate::core::assembly::kernel::{accumulate_cluster, cluster_terms, layer_kernels};
use crate::core::mesh::cluster::{Clusters, NodeMoments, NodePotentials};
use crate::core::mesh::elements::{ElementCharges, Elements};
use crate::core::mesh::octree::Tree;
use crate::core::parallel::parallel_map_indexed;
use crate::core::types::PhysicsParams;

/// The matrix-free boundary-integral operator
///
/// Holds shared references to the solve context; every application derives
/// its scratch state (element charges, cluster moments and potentials)
/// from the input vector, so the operator itself is immutable and `Sync`.
pub struct TreecodeOperator<'a> {
    elements: &'a Elements,
    tree: &'a Tree,
    clusters: &'a Clusters,
    lists: &'a InteractionList,
    phys: &'a PhysicsParams,
}

impl<'a> TreecodeOperator<'a> {
    /// Bundle the solve context into an operator
    pub fn new(
        elements: &'a Elements,
        tree: &'a Tree,
        clusters: &'a Clusters,
        lists: &'a InteractionList,
        phys: &'a PhysicsParams,
    ) -> Self {
        Self {
            elements,
            tree,
            clusters,
            lists,
            phys,
        }
    }

    /// y ← β·y + α·A·x
    ///
    /// `x` is the current iterate (potential and normal-derivative halves);
    /// `y` doubles as the β-weighted accumulator, matching the reference
    /// GMRES matvec contract.
    pub fn apply_scaled(&self, alpha: f64, x: &[f64], beta: f64, y: &mut [f64]) {
        let num = self.elements.num();
        debug_assert_eq!(x.len(), 2 * num);
        debug_assert_eq!(y.len(), 2 * num);

        let charges = self.elements.compute_charges(x);
        let moments = self.clusters.upward_pass(self.elements, &charges, self.tree);
        let mut potentials = self.clusters.empty_potentials(self.tree);

        // Interaction walk, parallel over target nodes. Each task owns its
        // node's potential grid and returns the node's direct buffer.
        let direct: Vec<Vec<f64>> = potentials
            .par_iter_mut()
            .enumerate()
            .map(|(target, potential)| {
                self.walk_target_node(target, x, &charges, &moments, potential)
            })
            .collect();

        // Fold the per-node buffers in fixed node order
        let mut acc = vec![0.0; 2 * num];
        for (target, buf) in direct.iter().enumerate() {
            let node = &self.tree.nodes[target];
            let len = node.num_elements();
            for local in 0..len {
                acc[node.begin + local] += buf[local];
                acc[num + node.begin + local] += buf[len + local];
            }
        }

        // Downward pass: per-node contributions, folded in node order
        let down: Vec<Vec<f64>> = parallel_map_indexed(self.tree.num_nodes(), |node_idx| {
            self.clusters.node_potential_contribution(
                node_idx,
                self.elements,
                &charges,
                self.tree,
                &potentials[node_idx],
            )
        });
        for (node_idx, buf) in down.iter().enumerate() {
            let node = &self.tree.nodes[node_idx];
            let len = node.num_elements();
            for local in 0..len {
                acc[node.begin + local] += buf[local];
                acc[num + node.begin + local] += buf[len + local];
            }
        }

        // Self-coupling terms and the α/β combination
        let c1 = self.phys.potential_coeff_1();
        let c2 = self.phys.potential_coeff_2();

        for i in 0..num {
            y[i] = beta * y[i] + alpha * (c1 * x[i] - acc[i]);
            y[num + i] = beta * y[num + i] + alpha * (c2 * x[num + i] - acc[num + i]);
        }
    }

    /// Process the four interaction lists of one target node
    ///
    /// Direct (PP) and particle-cluster (PC) contributions return in a
    /// buffer of length 2·range; cluster-particle (CP) and cluster-cluster
    /// (CC) contributions accumulate into the node's potential grid.
    fn walk_target_node(
        &self,
        target: usize,
        x_old: &[f64],
        charges: &ElementCharges,
        moments: &[NodeMoments],
        potential: &mut NodePotentials,
    ) -> Vec<f64> {
        let node = &self.tree.nodes[target];
        let len = node.num_elements();
        let mut buf = vec![0.0; 2 * len];

        for &source in &self.lists.particle_particle[target] {
            self.particle_particle(target, source, x_old, &mut buf);
        }
        for &source in &self.lists.particle_cluster[target] {
            self.particle_cluster(target, source, charges, &moments[source], &mut buf);
        }
        for &source in &self.lists.cluster_particle[target] {
            self.cluster_particle(target, source, charges, potential);
        }
        for &source in &self.lists.cluster_cluster[target] {
            self.cluster_cluster(target, source, &moments[source], potential);
        }

        buf
    }

    fn particle_particle(&self, target: usize, source: usize, x_old: &[f64], buf: &mut [f64]) {
        let num = self.elements.num();
        let t = &self.tree.nodes[target];
        let s = &self.tree.nodes[source];
        let len = t.num_elements();

        for j in t.begin..t.end {
            let target_pos = self.elements.position(j);
            let target_normal = self.elements.normal(j);
            let local = j - t.begin;

            for k in s.begin..s.end {
                // The self pair is singular and handled by the diagonal terms
                let Some(kernels) = layer_kernels(
                    self.phys,
                    target_pos,
                    target_normal,
                    self.elements.position(k),
                    self.elements.normal(k),
                ) else {
                    continue;
                };

                let area = self.elements.area[k];
                let old_0 = x_old[k];
                let old_1 = x_old[num + k];

                buf[local] += (kernels.l1 * old_0 + kernels.l2 * old_1) * area;
                buf[len + local] += (kernels.l3 * old_0 + kernels.l4 * old_1) * area;
            }
        }
    }

    fn particle_cluster(
        &self,
        target: usize,
        source: usize,
        charges: &ElementCharges,
        moments: &NodeMoments,
        buf: &mut [f64],
    ) {
        let t = &self.tree.nodes[target];
        let len = t.num_elements();
        let grid = self.clusters.grid(source);
        let m = self.clusters.pts_per_axis();

        for j in t.begin..t.end {
            let [tx, ty, tz] = self.elements.position(j);
            let mut acc = [0.0_f64; 4];

            let mut kk = 0;
            for k1 in 0..m {
                let dx = tx - grid.tx[k1];
                for k2 in 0..m {
                    let dy = ty - grid.ty[k2];
                    for k3 in 0..m {
                        let dz = tz - grid.tz[k3];

                        let terms = cluster_terms(self.phys, dx, dy, dz);
                        accumulate_cluster(
                            &terms,
                            dx,
                            dy,
                            dz,
                            moments.q[kk],
                            moments.q_dx[kk],
                            moments.q_dy[kk],
                            moments.q_dz[kk],
                            &mut acc,
                        );
                        kk += 1;
                    }
                }
            }

            let local = j - t.begin;
            buf[local] += charges.target_q[j] * acc[0];
            buf[len + local] += charges.target_q_dx[j] * acc[1]
                + charges.target_q_dy[j] * acc[2]
                + charges.target_q_dz[j] * acc[3];
        }
    }

    fn cluster_particle(
        &self,
        target: usize,
        source: usize,
        charges: &ElementCharges,
        potential: &mut NodePotentials,
    ) {
        let s = &self.tree.nodes[source];
        let grid = self.clusters.grid(target);
        let m = self.clusters.pts_per_axis();

        let mut jj = 0;
        for j1 in 0..m {
            let tx = grid.tx[j1];
            for j2 in 0..m {
                let ty = grid.ty[j2];
                for j3 in 0..m {
                    let tz = grid.tz[j3];

                    let mut acc = [0.0_f64; 4];
                    for k in s.begin..s.end {
                        let dx = tx - self.elements.x[k];
                        let dy = ty - self.elements.y[k];
                        let dz = tz - self.elements.z[k];

                        let terms = cluster_terms(self.phys, dx, dy, dz);
                        accumulate_cluster(
                            &terms,
                            dx,
                            dy,
                            dz,
                            charges.source_q[k],
                            charges.source_q_dx[k],
                            charges.source_q_dy[k],
                            charges.source_q_dz[k],
                            &mut acc,
                        );
                    }

                    potential.p[jj] += acc[0];
                    potential.p_dx[jj] += acc[1];
                    potential.p_dy[jj] += acc[2];
                    potential.p_dz[jj] += acc[3];
                    jj += 1;
                }
            }
        }
    }

    fn cluster_cluster(
        &self,
        target: usize,
        source: usize,
        moments: &NodeMoments,
        potential: &mut NodePotentials,
    ) {
        let target_grid = self.clusters.grid(target);
        let source_grid = self.clusters.grid(source);
        let m = self.clusters.pts_per_axis();

        let mut jj = 0;
        for j1 in 0..m {
            let tx = target_grid.tx[j1];
            for j2 in 0..m {
                let ty = target_grid.ty[j2];
                for j3 in 0..m {
                    let tz = target_grid.tz[j3];

                    let mut acc = [0.0_f64; 4];
                    let mut kk = 0;
                    for k1 in 0..m {
                        let dx = tx - source_grid.tx[k1];
                        for k2 in 0..m {
                            let dy = ty - source_grid.ty[k2];
                            for k3 in 0..m {
                                let dz = tz - source_grid.tz[k3];

                                let terms = cluster_terms(self.phys, dx, dy, dz);
                                accumulate_cluster(
                                    &terms,
                                    dx,
                                    dy,
                                    dz,
                                    moments.q[kk],
                                    moments.q_dx[kk],
                                    moments.q_dy[kk],
                                    moments.q_dz[kk],
                                    &mut acc,
                                );
                                kk += 1;
                            }
                        }
                    }

                    potential.p[jj] += acc[0];
                    potential.p_dx[jj] += acc[1];
                    potential.p_dy[jj] += acc[2];
                    potential.p_dz[jj] += acc[3];
                    jj += 1;
                }
            }
        }
    }
}

impl LinearOperator<f64> for TreecodeOperator<'_> {
    fn num_rows(&self) -> usize {
        2 * self.elements.num()
    }

    fn num_cols(&self) -> usize {
        2 * self.elements.num()
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(x.len());
        self.apply_scaled(
            1.0,
            x.as_slice().expect("contiguous iterate"),
            0.0,
            y.as_slice_mut().expect("contiguous output"),
        );
        y
    }
}
