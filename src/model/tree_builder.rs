//! Trait for constructing phylogenetic trees from compiled lineage histories.
//!
//! The [`TreeBuilder`] trait decouples the tree compiler from concrete tree
//! representations. Finalization walks a compiled tree bottom-up and calls
//! builder methods, and the builder assembles whatever tree structure it wants.
//!
//! # Label handling
//! A [`TreeBuilder`] works together with a [`LabelStorage`] to handle leaf
//! labels. The key connection is the associated type
//! [`LabelRef`](TreeBuilder::LabelRef):
//!
//! - **[LabelStorage]** gets label strings (e.g. `S3.L17`) and returns `LabelRef` values
//! - **[TreeBuilder]** receives those `LabelRef` values in
//!   [`add_leaf`](TreeBuilder::add_leaf)
//!
//! # Built-in implementations
//! * [`TaxonTreeBuilder`](crate::model::TaxonTreeBuilder) - Builds
//!   [`PhyloTree`](crate::model::PhyloTree) with taxa stored in a shared
//!   [`TaxonNamespace`](crate::model::TaxonNamespace)
//!
//! # Builder lifecycle
//! A builder can construct multiple trees sequentially:
//!
//! ```text
//! Empty ──→ init_next() ──→ Building ──→ add_* ──→ finish_tree() ──→ Empty
//!   ↑                                                                │
//!   └────────────────────────────────────────────────────────────────┘
//! ```

use crate::model::label_storage::LabelStorage;

// =#========================================================================#=
// TREE BUILDER (trait)
// =#========================================================================T=
/// Abstraction for constructing trees vertex by vertex, bottom-up.
///
/// The driver (see [`CompiledTree::build_with`](crate::compiler::CompiledTree::build_with))
/// follows this lifecycle:
///
/// 1. [`init_next`](Self::init_next) -> prepare for a new tree
/// 2. [`add_leaf`](Self::add_leaf), [`add_internal`](Self::add_internal),
///    [`add_root`](Self::add_root) or [`add_lone_leaf`](Self::add_lone_leaf)
///    -> build structure
/// 3. [`finish_tree`](Self::finish_tree) -> finalize and return the tree
pub trait TreeBuilder {
    /// The type used to reference labels within the tree.
    type LabelRef;

    /// The type used to identify vertices during construction.
    ///
    /// Returned by the `add_*` methods, then passed to subsequent calls to
    /// connect parent-child relationships.
    type VertexIdx: Copy;

    /// The tree type produced by this builder.
    type Tree;

    /// The [`LabelStorage`] type compatible with this builder.
    type Storage: LabelStorage<LabelRef = Self::LabelRef>;

    /// Prepares the builder for constructing a new tree.
    ///
    /// # Arguments
    /// * `num_leaves` — Number of leaves (hint for allocation)
    fn init_next(&mut self, num_leaves: usize);

    /// Adds a leaf vertex to the tree under construction.
    ///
    /// # Arguments
    /// * `branch_len` — Branch length to parent
    /// * `label` — Label reference obtained from the [LabelStorage]
    fn add_leaf(&mut self, branch_len: Option<f64>, label: Self::LabelRef) -> Self::VertexIdx;

    /// Adds an internal (non-root) vertex with two children.
    ///
    /// # Arguments
    /// * `children` — Indices of the left and right child vertices
    /// * `branch_len` — Branch length to parent
    fn add_internal(
        &mut self,
        children: (Self::VertexIdx, Self::VertexIdx),
        branch_len: Option<f64>,
    ) -> Self::VertexIdx;

    /// Adds the root vertex, completing the tree structure.
    ///
    /// # Arguments
    /// * `children` — Indices of the root's two child vertices
    /// * `branch_len` — Stem length above the root
    fn add_root(
        &mut self,
        children: (Self::VertexIdx, Self::VertexIdx),
        branch_len: Option<f64>,
    ) -> Self::VertexIdx;

    /// Adds the only vertex of a single-leaf tree, which acts as its root.
    fn add_lone_leaf(&mut self, branch_len: Option<f64>, label: Self::LabelRef) -> Self::VertexIdx;

    /// Finalizes the building process and returns the resulting tree.
    ///
    /// Transitions builder from a "construction" state to an "empty" state.
    /// Returns `None` if [`init_next`](Self::init_next) was not called.
    fn finish_tree(&mut self) -> Option<Self::Tree>;
}
