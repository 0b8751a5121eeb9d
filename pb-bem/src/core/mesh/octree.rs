//! Spatial tree over the boundary elements
//!
//! Recursive bisection of the element array into a 1-8-way hierarchy.
//! Nodes are stored in a flat arena indexed in depth-first order; children
//! are arena indices, so traversal is cache-friendly and free of ownership
//! cycles. Construction partitions the element coordinate arrays in place,
//! tracking every swap through the elements' permutation.

use crate::core::mesh::elements::Elements;

/// One tree node over a contiguous element range
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// First element index (inclusive)
    pub begin: usize,
    /// Last element index (exclusive)
    pub end: usize,
    /// Tight bounding box [x_min, x_max, y_min, y_max, z_min, z_max]
    pub bounds: [f64; 6],
    /// Bounding-box centroid
    pub x_mid: f64,
    /// Bounding-box centroid
    pub y_mid: f64,
    /// Bounding-box centroid
    pub z_mid: f64,
    /// Enclosing-sphere radius (half the box diagonal)
    pub radius: f64,
    /// Depth (root = 0)
    pub level: usize,
    /// Child node indices in the arena (empty for leaves)
    pub children: Vec<usize>,
}

impl TreeNode {
    /// Number of elements in this node's range
    pub fn num_elements(&self) -> usize {
        self.end - self.begin
    }

    /// Whether the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Distance between this node's centroid and another's
    pub fn centroid_distance(&self, other: &TreeNode) -> f64 {
        let dx = self.x_mid - other.x_mid;
        let dy = self.y_mid - other.y_mid;
        let dz = self.z_mid - other.z_mid;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Spatial tree in a flat arena, depth-first node order
#[derive(Debug, Clone)]
pub struct Tree {
    /// All nodes; index 0 is the root
    pub nodes: Vec<TreeNode>,
    /// Leaf indices in depth-first order
    leaves: Vec<usize>,
    /// Subdivision threshold
    max_per_leaf: usize,
}

impl Tree {
    /// Build the tree, partitioning the elements' coordinates in place
    ///
    /// A node subdivides while its element count exceeds `max_per_leaf`.
    /// Each subdivision splits along every axis whose extent exceeds
    /// max_extent/√2, giving 2, 4 or 8 children (empty child ranges are
    /// dropped).
    pub fn build(elements: &mut Elements, max_per_leaf: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            leaves: Vec::new(),
            max_per_leaf: max_per_leaf.max(1),
        };
        tree.construct(elements, 0, elements.num(), 0);
        tree.leaves = tree
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| i)
            .collect();

        log::info!(
            "Built tree: {} nodes, {} leaves, max depth {}, max {} per leaf",
            tree.nodes.len(),
            tree.leaves.len(),
            tree.nodes.iter().map(|n| n.level).max().unwrap_or(0),
            tree.max_per_leaf
        );

        tree
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Leaf node indices in depth-first order
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    fn construct(
        &mut self,
        elements: &mut Elements,
        begin: usize,
        end: usize,
        level: usize,
    ) -> usize {
        let bounds = elements.bounds(begin, end);
        let dx = bounds[1] - bounds[0];
        let dy = bounds[3] - bounds[2];
        let dz = bounds[5] - bounds[4];

        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode {
            begin,
            end,
            bounds,
            x_mid: 0.5 * (bounds[0] + bounds[1]),
            y_mid: 0.5 * (bounds[2] + bounds[3]),
            z_mid: 0.5 * (bounds[4] + bounds[5]),
            radius: 0.5 * (dx * dx + dy * dy + dz * dz).sqrt(),
            level,
            children: Vec::new(),
        });

        if end - begin > self.max_per_leaf {
            let ranges = partition_8(elements, begin, end, &bounds);
            let mut children = Vec::with_capacity(ranges.len());
            for (child_begin, child_end) in ranges {
                children.push(self.construct(elements, child_begin, child_end, level + 1));
            }
            self.nodes[node_idx].children = children;
        }

        node_idx
    }
}

/// Split an element range at the bounding-box midpoints of every axis whose
/// extent exceeds max_extent/√2, in fixed x, y, z order
///
/// Returns the non-empty child ranges sorted by begin index, so leaf ranges
/// concatenated in depth-first order tile the parent range.
fn partition_8(
    elements: &mut Elements,
    begin: usize,
    end: usize,
    bounds: &[f64; 6],
) -> Vec<(usize, usize)> {
    let x_len = bounds[1] - bounds[0];
    let y_len = bounds[3] - bounds[2];
    let z_len = bounds[5] - bounds[4];

    let x_mid = 0.5 * (bounds[0] + bounds[1]);
    let y_mid = 0.5 * (bounds[2] + bounds[3]);
    let z_mid = 0.5 * (bounds[4] + bounds[5]);

    let max_len = x_len.max(y_len).max(z_len);
    let critical_len = max_len / std::f64::consts::SQRT_2;

    let mut ranges = vec![(begin, end)];

    for (axis, len, mid) in [(0, x_len, x_mid), (1, y_len, y_mid), (2, z_len, z_mid)] {
        if len <= critical_len {
            continue;
        }
        let mut split = Vec::with_capacity(2 * ranges.len());
        for (range_begin, range_end) in ranges {
            let pivot = elements.partition_axis(axis, range_begin, range_end, mid);
            split.push((range_begin, pivot));
            split.push((pivot, range_end));
        }
        ranges = split;
    }

    ranges.retain(|(b, e)| e > b);
    ranges.sort_by_key(|&(b, _)| b);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::SurfaceMesh;
    use crate::core::mesh::generators::icosphere;
    use approx::assert_relative_eq;

    fn sphere_elements(subdivisions: usize) -> Elements {
        Elements::from_mesh(&icosphere(1.0, subdivisions))
    }

    #[test]
    fn test_root_covers_all() {
        let mut elements = sphere_elements(2);
        let n = elements.num();
        let tree = Tree::build(&mut elements, 20);

        assert_eq!(tree.nodes[0].begin, 0);
        assert_eq!(tree.nodes[0].end, n);
        assert!(tree.num_nodes() > 1);
    }

    #[test]
    fn test_leaf_ranges_partition_elements() {
        let mut elements = sphere_elements(3);
        let n = elements.num();
        let tree = Tree::build(&mut elements, 25);

        // Leaves in DFS order tile [0, N) without gaps or overlap
        let mut next = 0;
        for &leaf in tree.leaves() {
            let node = &tree.nodes[leaf];
            assert_eq!(node.begin, next);
            assert!(node.end > node.begin);
            assert!(node.num_elements() <= 25);
            next = node.end;
        }
        assert_eq!(next, n);
    }

    #[test]
    fn test_children_partition_parent() {
        let mut elements = sphere_elements(3);
        let tree = Tree::build(&mut elements, 25);

        for node in &tree.nodes {
            if node.is_leaf() {
                continue;
            }
            assert!(node.children.len() >= 2 && node.children.len() <= 8);
            let mut next = node.begin;
            for &c in &node.children {
                assert_eq!(tree.nodes[c].begin, next);
                next = tree.nodes[c].end;
                assert_eq!(tree.nodes[c].level, node.level + 1);
            }
            assert_eq!(next, node.end);
        }
    }

    #[test]
    fn test_permutation_tracks_swaps() {
        let mut elements = sphere_elements(2);
        let original = elements.clone();
        let tree = Tree::build(&mut elements, 10);
        let _ = tree;

        for i in 0..elements.num() {
            let o = elements.order()[i];
            assert_relative_eq!(elements.x[i], original.x[o]);
            assert_relative_eq!(elements.y[i], original.y[o]);
            assert_relative_eq!(elements.z[i], original.z[o]);
        }
    }

    #[test]
    fn test_radius_is_half_diagonal() {
        let mut elements = sphere_elements(1);
        let tree = Tree::build(&mut elements, 10);

        for node in &tree.nodes {
            let dx = node.bounds[1] - node.bounds[0];
            let dy = node.bounds[3] - node.bounds[2];
            let dz = node.bounds[5] - node.bounds[4];
            assert_relative_eq!(
                node.radius,
                0.5 * (dx * dx + dy * dy + dz * dz).sqrt(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_single_leaf_tree() {
        let mesh = SurfaceMesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            faces: vec![[0, 1, 2]],
        };
        let mut elements = Elements::from_mesh(&mesh);
        let tree = Tree::build(&mut elements, 500);

        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.nodes[0].is_leaf());
        assert_eq!(tree.leaves(), &[0]);
    }

    #[test]
    fn test_planar_points_split_two_or_four_ways() {
        // Points in the z = 0 plane never split along z
        let mesh = SurfaceMesh {
            vertices: (0..64)
                .map(|i| [(i % 8) as f64, (i / 8) as f64, 0.0])
                .collect(),
            normals: vec![[0.0, 0.0, 1.0]; 64],
            faces: vec![],
        };
        let mut elements = Elements::from_mesh(&mesh);
        let tree = Tree::build(&mut elements, 10);

        for node in &tree.nodes {
            if !node.is_leaf() {
                assert!(node.children.len() == 2 || node.children.len() == 4);
            }
        }
    }
}
