//! Newick string writing for simulated trees.

use crate::model::vertex::BranchLength;
use crate::model::{PhyloTree, TaxonNamespace, VertexIndex};
use crate::newick::escape::escape_label;

/// Extra buffer in Newick string length/capacity estimate
const BUFFER_CHARS: usize = 10;

/// Style for serializing tree to Newick format,
/// controlling how leaf labels are represented in the output string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewickStyle {
    /// Use full taxon labels from the TaxonNamespace
    Label,
    /// Use 0-based taxon indices (0, 1, 2, ...)
    ZeroIndexed,
    /// Use 1-based taxon indices (1, 2, 3, ...) (as in Nexus files)
    OneIndexed,
}

/// Returns the Newick representation of a tree with closing semicolon.
///
/// Branch lengths always carry a decimal point (`3.0`, not `3`). If the root
/// has a stem length, it is written after the closing parenthesis of the root.
///
/// # Arguments
/// * `style` - The [NewickStyle] used to represent leaf labels in the output
/// * `tree` - The tree to write
/// * `taxa` - [Namespace](TaxonNamespace) required when using [NewickStyle::Label],
///   otherwise can be `None`
///
/// # Returns
/// A Newick format string terminated with `;`. Returns an empty string if
/// [NewickStyle::Label] is used without providing a [TaxonNamespace].
///
/// # Example
/// ```
/// use protracted_speciation::model::{BranchLength, PhyloTree, TaxonNamespace};
/// use protracted_speciation::newick::{NewickStyle, to_newick};
///
/// let mut tree = PhyloTree::new(2);
/// let mut taxa = TaxonNamespace::new(2);
/// let a = tree.add_leaf(Some(BranchLength::new(1.0)), taxa.get_or_insert("S1"));
/// let b = tree.add_leaf(Some(BranchLength::new(1.0)), taxa.get_or_insert("S2"));
/// tree.add_root((a, b), Some(BranchLength::new(0.5)));
///
/// assert_eq!(to_newick(NewickStyle::Label, &tree, Some(&taxa)), "(S1:1.0,S2:1.0):0.5;");
/// assert_eq!(to_newick(NewickStyle::OneIndexed, &tree, None), "(1:1.0,2:1.0):0.5;");
/// ```
pub fn to_newick(style: NewickStyle, tree: &PhyloTree, taxa: Option<&TaxonNamespace>) -> String {
    // Abort right away if arguments don't match
    if matches!(style, NewickStyle::Label) && taxa.is_none() {
        return String::new();
    }
    if !tree.is_root_set() {
        return String::new();
    }

    // Helper for adding branch lengths
    fn push_branch_length(newick: &mut String, branch_length: Option<BranchLength>) {
        if let Some(branch_length) = branch_length {
            newick.push(':');
            newick.push_str(&branch_length.to_string());
        }
    }

    // Recursive helper for building the Newick string
    fn build_newick(
        tree: &PhyloTree,
        newick: &mut String,
        index: VertexIndex,
        style: NewickStyle,
        taxa: Option<&TaxonNamespace>,
    ) {
        let vertex = &tree[index];

        match (vertex.children(), vertex.label()) {
            (Some((left, right)), _) => {
                newick.push('(');
                build_newick(tree, newick, left, style, taxa);
                newick.push(',');
                build_newick(tree, newick, right, style, taxa);
                newick.push(')');
            }
            (None, Some(&taxon)) => match (style, taxa) {
                (NewickStyle::Label, Some(taxa)) => newick.push_str(&escape_label(&taxa[taxon])),
                (NewickStyle::OneIndexed, _) => newick.push_str(&(taxon + 1).to_string()),
                _ => newick.push_str(&taxon.to_string()),
            },
            (None, None) => {}
        }

        push_branch_length(newick, vertex.branch_length());
    }

    let mut newick = String::with_capacity(estimate_newick_len(style, tree, taxa));
    build_newick(tree, &mut newick, tree.root_index(), style, taxa);
    newick.push(';');

    newick
}

/// Estimates the length of a Newick string for a given tree,
/// accounting for structure, labels/indices, and branch lengths.
pub(crate) fn estimate_newick_len(
    style: NewickStyle,
    tree: &PhyloTree,
    taxa: Option<&TaxonNamespace>,
) -> usize {
    // Each internal node: "(,)"
    const INTERNAL_NODE_CHARS: usize = 3;
    // Branch lengths, e.g. ":0.009529961339106089"
    const BRANCH_LENGTH_CHARS: usize = 20;
    // Index labels, e.g. "127"
    const INDEX_CHARS: usize = 3;

    let num_internal = tree.num_vertices() - tree.num_leaves();
    let structure_capacity = num_internal * INTERNAL_NODE_CHARS;

    let label_capacity: usize = match (style, taxa) {
        (NewickStyle::Label, Some(taxa)) => tree
            .leaves()
            .filter_map(|v| v.label())
            .map(|&taxon| taxa[taxon].len())
            .sum(),
        _ => tree.num_leaves() * INDEX_CHARS,
    };

    let branch_capacity = tree.num_vertices() * BRANCH_LENGTH_CHARS;

    structure_capacity + label_capacity + branch_capacity + BUFFER_CHARS
}
