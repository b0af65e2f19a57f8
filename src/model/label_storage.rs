//! Trait for label storage backends used by tree builders.

use std::fmt::Debug;

// =#========================================================================#=
// LABEL STORAGE
// =#========================================================================T=
/// Backend storage for leaf labels while trees are being assembled.
///
/// A [LabelStorage] works with a [TreeBuilder](crate::model::TreeBuilder)
/// to handle leaf labels: finalization formats a label string per leaf,
/// the storage converts it into a [LabelRef](Self::LabelRef), and that
/// reference is handed to the builder.
///
/// The associated type [LabelRef](Self::LabelRef) must match
/// [`TreeBuilder::LabelRef`](crate::model::TreeBuilder::LabelRef).
///
/// # Implementations
/// * [TaxonNamespace](crate::model::TaxonNamespace):
///   returns indices into shared storage
pub trait LabelStorage: Debug {
    /// The reference type stored in tree leaves.
    type LabelRef: Clone + Debug;

    /// Stores a label (if new) and returns its reference.
    fn store_and_ref(&mut self, label: &str) -> Self::LabelRef;
}
