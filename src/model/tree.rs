//! Provides generic tree representations.
//!
//! Provides core data structures for representing phylogenetic trees:
//! * [`GenTree<L>`] - Main tree structure using the arena pattern
//!   for efficient memory layout, generic over way vertices handle labels.
//! * [PhyloTree] as realization with [TaxonIndex]
//! * [VertexIndex] as type used to index vertices in tree

use crate::model::taxon_namespace::TaxonIndex;
use crate::model::vertex::{BranchLength, Vertex};

/// Float comparison tolerance
const EPSILON: f64 = 1e-7;

/// Index of a vertex in a tree (arena).
pub type VertexIndex = usize;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: VertexIndex = usize::MAX;

// =$========================================================================$=
// TREE
// =$========================================================================$=
/// A binary phylogenetic tree represented using the arena pattern
/// on [Vertex].
///
/// Vertices are stored in a contiguous vector and referenced by
/// [VertexIndex].
///
/// Generic over `L` (LabelRef), representing how leaves handle labels
/// (e.g. as index into a [TaxonNamespace](crate::model::TaxonNamespace)).
///
/// # Structure
/// - All vertices (root, internal, and leaves) are stored in the arena.
/// - Index of root is maintained.
/// - No assumption on order of indices is maintained.
/// - Branch lengths are optional, but if provided must be non-negative.
/// - A tree with a single leaf has that leaf as its root
///   (see [`GenTree::add_lone_leaf`]); its branch length is the stem.
///
/// # Construction
/// To construct a tree, specify its size based on the number of leaves,
/// then add vertices one by one. Bottom-up construction is likely easiest.
/// Test validity with [`GenTree::is_valid()`].
///
/// # Example
/// ```
/// use protracted_speciation::model::{PhyloTree, TaxonNamespace};
/// use protracted_speciation::model::vertex::BranchLength;
///
/// // Create a tree: ((A:0.2,B:0.2):0.2,C:0.4);
/// let mut tree = PhyloTree::new(3);
/// let mut taxa = TaxonNamespace::new(3);
///
/// let a = tree.add_leaf(Some(BranchLength::new(0.2)), taxa.get_or_insert("A"));
/// let b = tree.add_leaf(Some(BranchLength::new(0.2)), taxa.get_or_insert("B"));
/// let c = tree.add_leaf(Some(BranchLength::new(0.4)), taxa.get_or_insert("C"));
/// let ab = tree.add_internal_vertex((a, b), Some(BranchLength::new(0.2)));
/// tree.add_root((ab, c), None);
///
/// assert!(tree.is_valid());
/// assert!(tree.is_ultrametric());
/// ```
#[derive(Debug, Clone)]
pub struct GenTree<L> {
    /// Number of leaf nodes in the tree
    num_leaves_init: usize,

    /// Vertices of this tree (arena pattern)
    vertices: Vec<Vertex<L>>,

    /// Index of the root of this tree
    root_index: VertexIndex,

    /// Name of tree; optional
    name: Option<String>,
}

/// Tree whose leaves point into a shared [TaxonNamespace](crate::model::TaxonNamespace).
pub type PhyloTree = GenTree<TaxonIndex>;

// ============================================================================
// New, Getters / Accessors, etc. (pub)
// ============================================================================
impl<L> GenTree<L> {
    /// Creates a new tree with capacity for a binary tree with `num_leaves` leaves.
    ///
    /// # Arguments
    /// `num_leaves` - number of leaves of the new binary tree, implying number of vertices; must be positive
    pub fn new(num_leaves: usize) -> Self {
        assert!(num_leaves > 0);
        let capacity = 2 * num_leaves - 1;
        GenTree {
            num_leaves_init: num_leaves,
            name: None,
            root_index: NO_ROOT_SET_INDEX,
            vertices: Vec::with_capacity(capacity),
        }
    }

    /// Adds a root to the tree, assigning a unique index, which gets returned.
    ///
    /// # Arguments
    /// * `children` - Tuple of child indices
    /// * `branch_length` - Optional length of the stem above the root (non-negative)
    pub fn add_root(
        &mut self,
        children: (VertexIndex, VertexIndex),
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices
            .push(Vertex::new_root(index, children, branch_length));

        self.root_index = index;
        self.vertices[children.0].set_parent(index);
        self.vertices[children.1].set_parent(index);

        index
    }

    /// Adds an internal vertex to the tree, assigning a unique index, which gets returned.
    ///
    /// # Arguments
    /// * `children` - Tuple of child indices
    /// * `branch_length` - Length of incoming branch, i.e. distance to parent (non-negative)
    pub fn add_internal_vertex(
        &mut self,
        children: (VertexIndex, VertexIndex),
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices
            .push(Vertex::new_internal(index, children, branch_length));

        self.vertices[children.0].set_parent(index);
        self.vertices[children.1].set_parent(index);

        index
    }

    /// Adds a leaf to the tree, assigning a unique index, which gets returned.
    ///
    /// # Arguments
    /// * `branch_length` - Length of incoming branch, i.e. distance to parent (non-negative)
    /// * `label` - Label (ref) for this leaf
    pub fn add_leaf(&mut self, branch_length: Option<BranchLength>, label: L) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices
            .push(Vertex::new_leaf(index, branch_length, label));
        index
    }

    /// Adds a leaf that is at the same time the root of this tree.
    ///
    /// Only valid for a tree with a single leaf; the branch length is
    /// interpreted as the stem of the tree.
    pub fn add_lone_leaf(&mut self, branch_length: Option<BranchLength>, label: L) -> VertexIndex {
        let index = self.add_leaf(branch_length, label);
        self.root_index = index;
        index
    }

    /// Returns reference to name of this tree, or `None` if not set.
    pub fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    /// Set a name for this tree.
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Returns whether root of tree has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index != NO_ROOT_SET_INDEX
    }

    /// Returns a reference to the root vertex.
    ///
    /// # Panics
    /// Panics if the root hasn't been set and thus tree hasn't been fully constructed yet.
    pub fn root(&self) -> &Vertex<L> {
        &self[self.root_index]
    }

    /// Returns the index of the root.
    pub fn root_index(&self) -> VertexIndex {
        self.root_index
    }

    /// Returns a reference to the vertex at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn vertex(&self, index: VertexIndex) -> &Vertex<L> {
        &self[index]
    }

    /// Returns the number of leaves this tree was initialized to hold.
    pub fn num_leaves_init(&self) -> usize {
        self.num_leaves_init
    }

    /// Returns the number of leaves in this tree.
    pub fn num_leaves(&self) -> usize {
        self.vertices.iter().filter(|&v| v.is_leaf()).count()
    }

    /// Returns the number of internal vertices in this tree.
    pub fn num_internal(&self) -> usize {
        self.vertices.iter().filter(|&v| v.is_internal()).count()
    }

    /// Returns the number of vertices in this tree.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns an iterator over all leaves, in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = &Vertex<L>> {
        self.vertices.iter().filter(|v| v.is_leaf())
    }

    /// Returns the height of this tree (assuming it is ultrametric; undefined otherwise),
    /// that is, the distance of the root to any/each leaf.
    ///
    /// The stem above the root is not included.
    pub fn height(&self) -> f64 {
        self.height_of(&self.vertices[self.root_index])
    }

    /// Returns the height of the given vertex (assuming it is ultrametric;
    /// result undefined otherwise).
    ///
    /// # Panics
    /// Panics if a vertex on the leftmost path lacks a [BranchLength].
    pub fn height_of(&self, vertex: &Vertex<L>) -> f64 {
        let mut height = 0.0;
        let mut current_vertex = vertex;
        while let Some((left, _)) = current_vertex.children() {
            current_vertex = &self.vertices[left];
            height += *current_vertex.branch_length().unwrap();
        }

        height
    }

    /// Returns the distance from the root to each leaf as `(leaf index, distance)`.
    ///
    /// The stem above the root is not included.
    ///
    /// # Panics
    /// Panics if not all non-root vertices have an associated [BranchLength].
    pub fn root_to_leaf_distances(&self) -> Vec<(VertexIndex, f64)> {
        let mut distances = vec![0.0; self.num_vertices()];
        let mut result = Vec::with_capacity(self.num_leaves_init);

        for vertex in self.pre_order_iter() {
            let index = vertex.index();
            if index != self.root_index {
                let parent = vertex.parent_index().unwrap();
                distances[index] = distances[parent] + *vertex.branch_length().unwrap();
            }
            if vertex.is_leaf() {
                result.push((index, distances[index]));
            }
        }

        result
    }

    /// Checks if the tree is ultrametric (all leaves equidistant from root).
    ///
    /// # Panics
    /// Panics if not all vertices (besides root) have an associated [BranchLength],
    /// which can be checked first with `vertices_have_branch_lengths()`.
    pub fn is_ultrametric(&self) -> bool {
        // Distance from leaves in subtree to parent for each vertex
        let mut distances = vec![0.0; self.num_vertices()];

        for vertex in self.post_order_iter() {
            if vertex.is_leaf() {
                distances[vertex.index()] = *vertex.branch_length().unwrap();
            } else {
                let (left, right) = vertex.children().unwrap();
                let left_dist: f64 = distances[left];
                let right_dist: f64 = distances[right];

                if (left_dist - right_dist).abs() > EPSILON {
                    return false;
                }

                if !vertex.is_root() {
                    distances[vertex.index()] = left_dist + *vertex.branch_length().unwrap();
                }
            }
        }

        true
    }

    /// Returns the sum of all branch lengths in the tree, including the stem.
    pub fn total_branch_length(&self) -> f64 {
        self.vertices
            .iter()
            .filter_map(|v| v.branch_length())
            .map(|bl| *bl)
            .sum::<f64>()
    }

    /// Checks if all non-root vertices have branch lengths set.
    pub fn vertices_have_branch_lengths(&self) -> bool {
        self.vertices
            .iter()
            .all(|v| v.index() == self.root_index || v.has_branch_length())
    }
}

impl<L: ValidLabel> GenTree<L> {
    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root index is valid and points to a Root vertex (or the lone leaf)
    /// - All vertex indices match their position in the arena
    /// - All child indices are valid and point back to correct parent
    /// - All parent indices are valid and include this vertex as a child
    /// - Root vertex has no parent set, all others have valid parent set
    /// - Leaf count matches the binary tree invariant
    pub fn is_valid(&self) -> bool {
        // Check root index is set and within bounds
        if self.root_index == NO_ROOT_SET_INDEX || self.root_index >= self.vertices.len() {
            return false;
        }

        // A lone leaf is the whole tree
        let root = &self.vertices[self.root_index];
        if root.is_leaf() {
            return self.vertices.len() == 1
                && !root.has_parent()
                && root.label().is_some_and(|l| l.is_valid_for_tree(1));
        }

        if !root.is_root() {
            return false;
        }

        let mut leaf_count = 0;
        let mut found_root = false;

        for (index, vertex) in self.vertices.iter().enumerate() {
            // Check vertex index matches its arena position
            if vertex.index() != index {
                return false;
            }

            // Check that there is only one root
            if vertex.is_root() {
                if found_root {
                    return false;
                }
                found_root = true;
            }

            if vertex.is_leaf() {
                leaf_count += 1;
            }

            // Check children references
            if let Some((left, right)) = vertex.children() {
                if left >= self.vertices.len() || right >= self.vertices.len() {
                    return false;
                }

                let left_parent = self.vertices[left].parent_index();
                let right_parent = self.vertices[right].parent_index();

                if left_parent != Some(index) || right_parent != Some(index) {
                    return false;
                }
            }

            // Check parent references
            if !vertex.is_root() {
                match vertex.parent_index() {
                    None => return false,
                    Some(parent_index) => {
                        if parent_index >= self.vertices.len() {
                            return false;
                        }

                        match self.vertices[parent_index].children() {
                            Some((left, right)) if left == index || right == index => {}
                            _ => return false,
                        }
                    }
                }
            }

            // Check leaves have valid labels
            if vertex.is_leaf()
                && vertex
                    .label()
                    .is_none_or(|l| !l.is_valid_for_tree(self.vertices.len()))
            {
                return false;
            }
        }

        // For n leaves, there are 2n-1 vertices
        leaf_count == self.vertices.len().div_ceil(2)
    }
}

impl<L> std::ops::Index<VertexIndex> for GenTree<L> {
    type Output = Vertex<L>;

    fn index(&self, index: VertexIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

// =$========================================================================$=
// ITERATORS
// =$========================================================================$=
impl<L> GenTree<L> {
    /// Returns an iterator over the tree in post-order (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_, L> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before children).
    pub fn pre_order_iter(&self) -> PreOrderIter<'_, L> {
        PreOrderIter::new(self)
    }
}

/// Iterator for post-order traversal (children before parents).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
pub struct PostOrderIter<'a, L> {
    tree: &'a GenTree<L>,
    stack: Vec<(VertexIndex, bool)>, // (index, children_visited)
}

impl<'a, L> PostOrderIter<'a, L> {
    fn new(tree: &'a GenTree<L>) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push((tree.root_index, false));
        }
        PostOrderIter { tree, stack }
    }
}

impl<'a, L> Iterator for PostOrderIter<'a, L> {
    type Item = &'a Vertex<L>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let vertex = &self.tree[index];

            if children_visited || vertex.is_leaf() {
                return Some(vertex);
            }

            self.stack.push((index, true));
            // Right first, so left is processed first
            if let Some((left, right)) = vertex.children() {
                self.stack.push((right, false));
                self.stack.push((left, false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
pub struct PreOrderIter<'a, L> {
    tree: &'a GenTree<L>,
    stack: Vec<VertexIndex>,
}

impl<'a, L> PreOrderIter<'a, L> {
    fn new(tree: &'a GenTree<L>) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push(tree.root_index);
        }
        PreOrderIter { tree, stack }
    }
}

impl<'a, L> Iterator for PreOrderIter<'a, L> {
    type Item = &'a Vertex<L>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let vertex = &self.tree[index];

        if let Some((left, right)) = vertex.children() {
            self.stack.push(right);
            self.stack.push(left);
        }

        Some(vertex)
    }
}

// =#========================================================================#=
// VALID LABEL TRAIT
// =#========================================================================T=
/// Trait for label types that can be validated in a tree context.
pub trait ValidLabel {
    /// Checks whether this label is valid on a very basic level.
    fn is_valid_for_tree(&self, num_vertices: usize) -> bool;
}

// Taxon indices point into a namespace that may hold more taxa than the tree
impl ValidLabel for TaxonIndex {
    fn is_valid_for_tree(&self, _num_vertices: usize) -> bool {
        true
    }
}

