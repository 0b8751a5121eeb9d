//! Interaction lists from the multipole acceptance criterion
//!
//! A dual traversal of the tree classifies every (target node, source node)
//! encounter into one of four kinds: direct particle-particle, and the
//! three cluster-mediated kinds. A source node is far from a target node
//! when the enclosing spheres are separated, (r_t + r_s) < θ·d; whether
//! either side then interacts through its cluster depends on it holding
//! more elements than the cluster threshold. Near pairs descend the larger
//! side until both are leaves.
//!
//! The resulting lists cover every (target element, source element) pair
//! exactly once across the target's root-to-leaf path.

use crate::core::mesh::octree::Tree;

/// Per-target-node source lists, one bucket per interaction kind
#[derive(Debug, Clone)]
pub struct InteractionList {
    /// Direct evaluation: both sides as particles
    pub particle_particle: Vec<Vec<usize>>,
    /// Target particles against the source cluster
    pub particle_cluster: Vec<Vec<usize>>,
    /// Target cluster against source particles
    pub cluster_particle: Vec<Vec<usize>>,
    /// Both sides through their clusters
    pub cluster_cluster: Vec<Vec<usize>>,
}

impl InteractionList {
    /// Classify all interactions of the tree against itself
    ///
    /// `theta` is the MAC opening parameter; `min_for_cluster` is the
    /// minimum element count for a node to use its cluster representation
    /// (ties fall back to direct evaluation).
    pub fn build(tree: &Tree, theta: f64, min_for_cluster: usize) -> Self {
        let n = tree.num_nodes();
        let mut lists = Self {
            particle_particle: vec![Vec::new(); n],
            particle_cluster: vec![Vec::new(); n],
            cluster_particle: vec![Vec::new(); n],
            cluster_cluster: vec![Vec::new(); n],
        };

        if n > 0 {
            lists.classify(tree, 0, 0, theta, min_for_cluster);
        }

        let (pp, pc, cp, cc) = lists.counts();
        log::debug!("Interaction lists: {pp} PP, {pc} PC, {cp} CP, {cc} CC");

        lists
    }

    /// Total entries per bucket
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.particle_particle.iter().map(Vec::len).sum(),
            self.particle_cluster.iter().map(Vec::len).sum(),
            self.cluster_particle.iter().map(Vec::len).sum(),
            self.cluster_cluster.iter().map(Vec::len).sum(),
        )
    }

    fn classify(
        &mut self,
        tree: &Tree,
        target: usize,
        source: usize,
        theta: f64,
        min_for_cluster: usize,
    ) {
        let t = &tree.nodes[target];
        let s = &tree.nodes[source];

        let dist = t.centroid_distance(s);

        if t.radius + s.radius < theta * dist {
            // Far pair: pick the representation per side
            let target_clustered = t.num_elements() > min_for_cluster;
            let source_clustered = s.num_elements() > min_for_cluster;

            match (target_clustered, source_clustered) {
                (true, true) => self.cluster_cluster[target].push(source),
                (false, true) => self.particle_cluster[target].push(source),
                (true, false) => self.cluster_particle[target].push(source),
                (false, false) => self.particle_particle[target].push(source),
            }
            return;
        }

        match (t.is_leaf(), s.is_leaf()) {
            (true, true) => self.particle_particle[target].push(source),
            (true, false) => {
                for &child in &tree.nodes[source].children {
                    self.classify(tree, target, child, theta, min_for_cluster);
                }
            }
            (false, true) => {
                for &child in &tree.nodes[target].children {
                    self.classify(tree, child, source, theta, min_for_cluster);
                }
            }
            (false, false) => {
                // Both internal: descend the wider side, source on ties
                if t.radius > s.radius {
                    for &child in &tree.nodes[target].children {
                        self.classify(tree, child, source, theta, min_for_cluster);
                    }
                } else {
                    for &child in &tree.nodes[source].children {
                        self.classify(tree, target, child, theta, min_for_cluster);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::elements::Elements;
    use crate::core::mesh::generators::icosphere;

    fn sphere_tree(subdivisions: usize, max_per_leaf: usize) -> Tree {
        let mut elements = Elements::from_mesh(&icosphere(1.0, subdivisions));
        Tree::build(&mut elements, max_per_leaf)
    }

    /// For every target leaf, walk its root path and count how often each
    /// source element is covered by any bucket. Exactly-once coverage is
    /// the partition property the matvec relies on.
    fn assert_exact_coverage(tree: &Tree, lists: &InteractionList) {
        let n = tree.nodes[0].end;

        // Build parent links to walk root paths
        let mut parent = vec![usize::MAX; tree.num_nodes()];
        for (idx, node) in tree.nodes.iter().enumerate() {
            for &c in &node.children {
                parent[c] = idx;
            }
        }

        for &leaf in tree.leaves() {
            let mut coverage = vec![0_usize; n];

            let mut node = leaf;
            loop {
                for bucket in [
                    &lists.particle_particle[node],
                    &lists.particle_cluster[node],
                    &lists.cluster_particle[node],
                    &lists.cluster_cluster[node],
                ] {
                    for &src in bucket {
                        for e in tree.nodes[src].begin..tree.nodes[src].end {
                            coverage[e] += 1;
                        }
                    }
                }
                if node == 0 {
                    break;
                }
                node = parent[node];
            }

            assert!(
                coverage.iter().all(|&c| c == 1),
                "leaf {leaf} covers some source element {} times",
                coverage.iter().copied().max().unwrap_or(0)
            );
        }
    }

    #[test]
    fn test_theta_zero_is_all_direct() {
        let tree = sphere_tree(3, 30);
        let lists = InteractionList::build(&tree, 0.0, 40);

        let (pp, pc, cp, cc) = lists.counts();
        assert!(pp > 0);
        assert_eq!(pc + cp + cc, 0, "theta 0 admits no far pairs");

        // All PP pairs are leaf-leaf
        for (target, bucket) in lists.particle_particle.iter().enumerate() {
            if !bucket.is_empty() {
                assert!(tree.nodes[target].is_leaf());
            }
            for &src in bucket {
                assert!(tree.nodes[src].is_leaf());
            }
        }

        assert_exact_coverage(&tree, &lists);
    }

    #[test]
    fn test_moderate_theta_uses_clusters() {
        let tree = sphere_tree(3, 30);
        let lists = InteractionList::build(&tree, 0.8, 40);

        let (_, pc, cp, cc) = lists.counts();
        assert!(
            pc + cp + cc > 0,
            "theta 0.8 on a multi-level tree admits far pairs"
        );
        assert_exact_coverage(&tree, &lists);
    }

    #[test]
    fn test_cluster_threshold_respected() {
        let tree = sphere_tree(3, 30);
        let min_for_cluster = 40;
        let lists = InteractionList::build(&tree, 0.8, min_for_cluster);

        for (target, bucket) in lists.cluster_cluster.iter().enumerate() {
            for &src in bucket {
                assert!(tree.nodes[target].num_elements() > min_for_cluster);
                assert!(tree.nodes[src].num_elements() > min_for_cluster);
            }
        }
        for (target, bucket) in lists.particle_cluster.iter().enumerate() {
            for &src in bucket {
                assert!(tree.nodes[target].num_elements() <= min_for_cluster);
                assert!(tree.nodes[src].num_elements() > min_for_cluster);
            }
        }
        for (target, bucket) in lists.cluster_particle.iter().enumerate() {
            for &src in bucket {
                assert!(tree.nodes[target].num_elements() > min_for_cluster);
                assert!(tree.nodes[src].num_elements() <= min_for_cluster);
            }
        }
    }

    #[test]
    fn test_single_node_tree_is_one_self_pair() {
        let tree = sphere_tree(1, 500);
        assert_eq!(tree.num_nodes(), 1);

        let lists = InteractionList::build(&tree, 0.8, 40);
        assert_eq!(lists.particle_particle[0], vec![0]);
        assert_eq!(lists.counts(), (1, 0, 0, 0));
    }

    #[test]
    fn test_far_pairs_satisfy_mac() {
        let tree = sphere_tree(3, 30);
        let theta = 0.7;
        let lists = InteractionList::build(&tree, theta, 40);

        for (target, bucket) in lists.cluster_cluster.iter().enumerate() {
            let t = &tree.nodes[target];
            for &src in bucket {
                let s = &tree.nodes[src];
                assert!(t.radius + s.radius < theta * t.centroid_distance(s));
            }
        }
    }
}
