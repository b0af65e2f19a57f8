//! Data model for binary phylogenetic trees.
//!
//! # Tree representation
//! Trees are represented by [GenTree], which uses the arena pattern to store
//! [Vertex] nodes. Each vertex is either a `Root`, `Internal`, or `Leaf`,
//! referenced by [VertexIndex]. A single-leaf tree is a lone leaf acting as root.
//!
//! Simulated samples use [PhyloTree], whose leaves hold a [TaxonIndex] into a
//! shared [TaxonNamespace].
//!
//! # Building trees
//! Trees are constructed from compiled lineage histories via the
//! [TreeBuilder] trait, which decouples the compiler from concrete tree types:
//!
//! - [TaxonTreeBuilder] → [PhyloTree]
//!
//! # Label handling
//! During finalization, labels flow through a [LabelStorage], which stores
//! label strings and returns references for tree leaves.

pub mod label_storage;
pub mod taxon_namespace;
pub mod taxon_tree_builder;
pub mod tree;
pub mod tree_builder;
pub mod vertex;

pub use label_storage::LabelStorage;
pub use taxon_namespace::{TaxonIndex, TaxonNamespace};
pub use taxon_tree_builder::TaxonTreeBuilder;
pub use tree::{GenTree, PhyloTree, VertexIndex};
pub use tree_builder::TreeBuilder;
pub use vertex::{BranchLength, Vertex};
