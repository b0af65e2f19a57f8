//! Provides the [TreeBuilder] implementation for [PhyloTree].

use crate::model::tree_builder::TreeBuilder;
use crate::model::vertex::BranchLength;
use crate::model::{PhyloTree, TaxonIndex, TaxonNamespace, VertexIndex};

/// Builder that constructs [PhyloTree] instances.
///
/// Taxa are stored externally in a [TaxonNamespace], with leaves holding
/// only [TaxonIndex] references. Lineage trees and orthospecies trees of a
/// sample are built with one builder each, since they use different namespaces.
#[derive(Debug, Default)]
pub struct TaxonTreeBuilder {
    current_tree: Option<PhyloTree>,
}

impl TaxonTreeBuilder {
    /// Creates a new builder in the empty state.
    pub fn new() -> Self {
        Self { current_tree: None }
    }

    fn tree_mut(&mut self) -> &mut PhyloTree {
        self.current_tree.as_mut().expect("init not called")
    }
}

impl TreeBuilder for TaxonTreeBuilder {
    type LabelRef = TaxonIndex;
    type VertexIdx = VertexIndex;
    type Tree = PhyloTree;
    type Storage = TaxonNamespace;

    fn init_next(&mut self, num_leaves: usize) {
        self.current_tree = Some(PhyloTree::new(num_leaves));
    }

    fn add_leaf(&mut self, branch_len: Option<f64>, label: TaxonIndex) -> Self::VertexIdx {
        self.tree_mut().add_leaf(branch_len.map(BranchLength::new), label)
    }

    fn add_internal(
        &mut self,
        children: (Self::VertexIdx, Self::VertexIdx),
        branch_len: Option<f64>,
    ) -> Self::VertexIdx {
        self.tree_mut()
            .add_internal_vertex(children, branch_len.map(BranchLength::new))
    }

    fn add_root(
        &mut self,
        children: (Self::VertexIdx, Self::VertexIdx),
        branch_len: Option<f64>,
    ) -> Self::VertexIdx {
        self.tree_mut()
            .add_root(children, branch_len.map(BranchLength::new))
    }

    fn add_lone_leaf(&mut self, branch_len: Option<f64>, label: TaxonIndex) -> Self::VertexIdx {
        self.tree_mut()
            .add_lone_leaf(branch_len.map(BranchLength::new), label)
    }

    fn finish_tree(&mut self) -> Option<Self::Tree> {
        self.current_tree.take()
    }
}
