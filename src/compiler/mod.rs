//! Compiles a flat lineage history into rooted binary trees.
//!
//! The engine logs every lineage as a [Lineage] record, unordered with
//! respect to the tree that connects them. Compilation rebuilds that tree
//! bottom-up: leaves are seeded for the lineages of interest at a cutoff
//! time, then lineages are visited from youngest to oldest origin, each
//! one joining its subtree to its parent's at its time of origin.
//!
//! Two variants exist:
//! * [compile_lineage_tree] - one leaf per lineage
//! * [compile_orthospecies_tree] - one leaf per species, represented by a
//!   single lineage chosen by a [SpeciesLineageSamplingScheme]
//!
//! Both are pure: the input slice is only borrowed, and the result is a
//! [CompiledTree], a small node arena that can be turned into any tree type
//! with a [TreeBuilder].
//!
//! # Example
//! ```
//! use protracted_speciation::compiler::compile_lineage_tree;
//! use protracted_speciation::lineage::Lineage;
//!
//! let lineages = vec![
//!     Lineage::new(1, 0, None, 0.0, 1),
//!     Lineage::new(2, 1, Some(true), 4.0, 1),
//!     Lineage::new(3, 1, Some(true), 7.0, 1),
//! ];
//! let compiled = compile_lineage_tree(&lineages, 10.0, true).unwrap();
//! assert_eq!(compiled.num_leaves(), 3);
//! assert_eq!(compiled.root_node().time(), 4.0);
//! ```

use crate::error::CompileError;
use crate::lineage::queue::{LineageQueue, QueueEntry};
use crate::lineage::{Lineage, LineageId, NO_PARENT_LINEAGE_ID, SpeciesId};
use crate::model::TreeBuilder;
use crate::model::label_storage::LabelStorage;
use log::trace;
use rand::Rng;
use std::collections::BTreeMap;

/// Index of a node in a [CompiledTree].
pub type NodeId = usize;

// =#========================================================================#=
// SAMPLING SCHEME
// =#========================================================================#=
/// Rule picking the lineage that represents a species in the orthospecies tree
/// when several extant lineages share a species id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeciesLineageSamplingScheme {
    /// Lineage with the earliest origin (ties: smaller lineage id)
    Oldest,
    /// Lineage with the latest origin (ties: larger lineage id)
    Youngest,
    /// Uniformly random lineage
    #[default]
    Random,
}

// =#========================================================================#=
// COMPILED NODES
// =#========================================================================#=
/// Lineage and species of a leaf in a [CompiledTree].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafRecord {
    /// Lineage the leaf stands for
    pub lineage_id: LineageId,
    /// Species of that lineage at the cutoff time
    pub species_id: SpeciesId,
}

/// Node of a [CompiledTree].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledNode {
    time: f64,
    edge_length: Option<f64>,
    children: Option<(NodeId, NodeId)>,
    leaf: Option<LeafRecord>,
    speciation_completion_time: Option<f64>,
}

impl CompiledNode {
    fn new_leaf(time: f64, record: LeafRecord) -> Self {
        CompiledNode {
            time,
            edge_length: None,
            children: None,
            leaf: Some(record),
            speciation_completion_time: None,
        }
    }

    fn new_split(time: f64, children: (NodeId, NodeId), completion: Option<f64>) -> Self {
        CompiledNode {
            time,
            edge_length: None,
            children: Some(children),
            leaf: None,
            speciation_completion_time: completion,
        }
    }

    /// Time of the node: the cutoff (or extinction) time for leaves,
    /// the origin time of the budding lineage for splits.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Length of the edge above this node; for the root, its stem length.
    pub fn edge_length(&self) -> Option<f64> {
        self.edge_length
    }

    /// Children as (parent lineage's subtree, daughter lineage's subtree).
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.children
    }

    /// Leaf record, `None` for splits.
    pub fn leaf(&self) -> Option<&LeafRecord> {
        self.leaf.as_ref()
    }

    /// Returns `true` if this node is a seeded leaf.
    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    /// For splits, the speciation completion time of the parent lineage
    /// if it did not happen before the split.
    pub fn speciation_completion_time(&self) -> Option<f64> {
        self.speciation_completion_time
    }
}

// =#========================================================================#=
// COMPILED TREE
// =#========================================================================#=
/// Rooted binary tree compiled from a lineage collection.
///
/// Nodes are stored so that children always precede their parent; the leaves
/// come first, in the order they were seeded, and the root is the last node.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTree {
    nodes: Vec<CompiledNode>,
    num_leaves: usize,
    cutoff_time: f64,
}

impl CompiledTree {
    /// Time at which leaves were seeded.
    pub fn cutoff_time(&self) -> f64 {
        self.cutoff_time
    }

    /// Returns the number of leaves, one per seeded lineage or species.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Returns the number of nodes, leaves included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the id of the root, the last node.
    pub fn root(&self) -> NodeId {
        self.nodes.len() - 1
    }

    /// Returns the root node.
    pub fn root_node(&self) -> &CompiledNode {
        &self.nodes[self.root()]
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    pub fn node(&self, id: NodeId) -> &CompiledNode {
        &self.nodes[id]
    }

    /// Iterator over all leaf records, in seeding order.
    pub fn leaves(&self) -> impl Iterator<Item = &LeafRecord> {
        self.nodes[..self.num_leaves].iter().filter_map(|n| n.leaf())
    }

    /// Builds a concrete tree from this compiled tree.
    ///
    /// Vertices are added bottom-up through `builder`; each leaf's label is
    /// produced by `label_of` and registered in `storage`.
    ///
    /// # Returns
    /// The built tree together with the builder's vertex index of every leaf
    /// and its record, in seeding order; `None` if the builder produced no tree.
    pub fn build_with<B, F>(
        &self,
        builder: &mut B,
        storage: &mut B::Storage,
        mut label_of: F,
    ) -> Option<(B::Tree, Vec<(B::VertexIdx, LeafRecord)>)>
    where
        B: TreeBuilder,
        F: FnMut(&LeafRecord) -> String,
    {
        builder.init_next(self.num_leaves);
        let mut leaf_vertices = Vec::with_capacity(self.num_leaves);

        if self.nodes.len() == 1 {
            let node = &self.nodes[0];
            let record = *node.leaf()?;
            let label = storage.store_and_ref(&label_of(&record));
            let vertex = builder.add_lone_leaf(node.edge_length, label);
            leaf_vertices.push((vertex, record));
            return builder.finish_tree().map(|tree| (tree, leaf_vertices));
        }

        let root = self.root();
        let mut vertex_of: Vec<Option<B::VertexIdx>> = vec![None; self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate() {
            let vertex = match (node.children, node.leaf) {
                (None, Some(record)) => {
                    let label = storage.store_and_ref(&label_of(&record));
                    let vertex = builder.add_leaf(node.edge_length, label);
                    leaf_vertices.push((vertex, record));
                    vertex
                }
                (Some((left, right)), _) => {
                    let children = (vertex_of[left]?, vertex_of[right]?);
                    if id == root {
                        builder.add_root(children, node.edge_length)
                    } else {
                        builder.add_internal(children, node.edge_length)
                    }
                }
                (None, None) => return None,
            };
            vertex_of[id] = Some(vertex);
        }

        builder.finish_tree().map(|tree| (tree, leaf_vertices))
    }
}

// =#========================================================================#=
// COMPILATION
// =#========================================================================#=
/// Compiles the lineage tree of `lineages` at `cutoff_time`.
///
/// With `drop_extinct`, one leaf is seeded per lineage extant at the cutoff.
/// Otherwise every lineage that originated by the cutoff becomes a leaf, an
/// extinct one at its time of extinction.
///
/// # Errors
/// * [CompileError::NoSeedLineages] - no lineage qualifies as a leaf
/// * [CompileError::NoConnectedRoot] - seeds could not be joined
/// * [CompileError::InvariantViolation] - the collection is inconsistent
pub fn compile_lineage_tree(
    lineages: &[Lineage],
    cutoff_time: f64,
    drop_extinct: bool,
) -> Result<CompiledTree, CompileError> {
    let seeds: Vec<(&Lineage, f64)> = lineages
        .iter()
        .filter_map(|lineage| {
            if lineage.is_extant_at(cutoff_time) {
                Some((lineage, cutoff_time))
            } else if !drop_extinct && lineage.origin_time() <= cutoff_time {
                let leaf_time = lineage
                    .extinction_time()
                    .map_or(cutoff_time, |t| t.min(cutoff_time));
                Some((lineage, leaf_time))
            } else {
                None
            }
        })
        .collect();

    compile(lineages, &seeds, cutoff_time)
}

/// Compiles the orthospecies tree of `lineages` at `cutoff_time`.
///
/// Extant lineages are grouped by species id and each species is represented
/// by one lineage picked according to `scheme`. The other lineages of that
/// species are not seeded and only serve as ancestry; `lineages` itself is
/// left untouched. Leaves are seeded in ascending species id order.
///
/// # Errors
/// See [compile_lineage_tree].
pub fn compile_orthospecies_tree<R: Rng + ?Sized>(
    lineages: &[Lineage],
    cutoff_time: f64,
    scheme: SpeciesLineageSamplingScheme,
    rng: &mut R,
) -> Result<CompiledTree, CompileError> {
    let mut by_species: BTreeMap<SpeciesId, Vec<&Lineage>> = BTreeMap::new();
    for lineage in lineages.iter().filter(|l| l.is_extant_at(cutoff_time)) {
        by_species.entry(lineage.species_id()).or_default().push(lineage);
    }

    let seeds: Vec<(&Lineage, f64)> = by_species
        .values()
        .map(|members| (pick_representative(members, scheme, rng), cutoff_time))
        .collect();

    compile(lineages, &seeds, cutoff_time)
}

/// Picks one lineage of a non-empty group.
fn pick_representative<'a, R: Rng + ?Sized>(
    members: &[&'a Lineage],
    scheme: SpeciesLineageSamplingScheme,
    rng: &mut R,
) -> &'a Lineage {
    match scheme {
        SpeciesLineageSamplingScheme::Oldest => members
            .iter()
            .copied()
            .min_by(|a, b| {
                a.origin_time()
                    .total_cmp(&b.origin_time())
                    .then(a.lineage_id().cmp(&b.lineage_id()))
            })
            .unwrap_or(members[0]),
        SpeciesLineageSamplingScheme::Youngest => members
            .iter()
            .copied()
            .max_by(|a, b| {
                a.origin_time()
                    .total_cmp(&b.origin_time())
                    .then(a.lineage_id().cmp(&b.lineage_id()))
            })
            .unwrap_or(members[0]),
        SpeciesLineageSamplingScheme::Random => members[rng.gen_range(0..members.len())],
    }
}

/// Merges seeded leaves into a tree along the parent relation of `lineages`.
fn compile(
    lineages: &[Lineage],
    seeds: &[(&Lineage, f64)],
    cutoff_time: f64,
) -> Result<CompiledTree, CompileError> {
    if seeds.is_empty() {
        return Err(CompileError::NoSeedLineages { cutoff_time });
    }

    let mut nodes: Vec<CompiledNode> = seeds
        .iter()
        .map(|&(lineage, leaf_time)| {
            CompiledNode::new_leaf(
                leaf_time,
                LeafRecord {
                    lineage_id: lineage.lineage_id(),
                    species_id: lineage.species_id(),
                },
            )
        })
        .collect();
    let num_leaves = nodes.len();

    // Single leaf: its edge spans the whole history
    if num_leaves == 1 {
        nodes[0].edge_length = Some(nodes[0].time);
        return Ok(CompiledTree {
            nodes,
            num_leaves,
            cutoff_time,
        });
    }

    let mut queue = LineageQueue::with_capacity(lineages.len());
    for lineage in lineages {
        queue.register_original(lineage);
    }
    for (node, &(lineage, _)) in seeds.iter().enumerate() {
        queue.push(QueueEntry::new(lineage, node));
    }

    loop {
        let daughter = queue.pop_youngest().ok_or(CompileError::NoConnectedRoot)?;
        let split_time = daughter.origin_time;

        if let Some(parent) = queue.active_mut(daughter.parent_lineage_id) {
            let parent_node = parent.node;
            let split = nodes.len();
            nodes[parent_node].edge_length = Some(nodes[parent_node].time - split_time);
            nodes[daughter.node].edge_length = Some(nodes[daughter.node].time - split_time);
            nodes.push(CompiledNode::new_split(
                split_time,
                (parent_node, daughter.node),
                parent.speciation_completion_time,
            ));
            parent.node = split;
            trace!(
                "Joined lineage {} into parent {} at {}",
                daughter.lineage_id, daughter.parent_lineage_id, split_time
            );
        } else if daughter.parent_lineage_id == NO_PARENT_LINEAGE_ID {
            return Err(CompileError::InvariantViolation(format!(
                "reached lineage {} without parent while {} subtree(s) are pending",
                daughter.lineage_id,
                queue.len()
            )));
        } else {
            let original = queue.original(daughter.parent_lineage_id).ok_or_else(|| {
                CompileError::InvariantViolation(format!(
                    "parent {} of lineage {} is not in the collection",
                    daughter.parent_lineage_id, daughter.lineage_id
                ))
            })?;
            let mut entry = QueueEntry::new(original, daughter.node);
            entry.speciation_completion_time = original
                .speciation_completion_time()
                .filter(|&t| t >= split_time);
            queue.push(entry);
        }

        if queue.len() < 2 {
            let last = queue.pop_youngest().ok_or(CompileError::NoConnectedRoot)?;
            let root = last.node;
            // Root must be the last node, which holds whenever all seeds were joined
            if root + 1 != nodes.len() {
                return Err(CompileError::NoConnectedRoot);
            }
            nodes[root].edge_length = Some(last.origin_time);
            return Ok(CompiledTree {
                nodes,
                num_leaves,
                cutoff_time,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn worked_example() -> Vec<Lineage> {
        vec![
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 1, Some(true), 4.0, 1),
            Lineage::new(3, 1, Some(true), 7.0, 1),
        ]
    }

    #[test]
    fn test_worked_example_structure() {
        let compiled = compile_lineage_tree(&worked_example(), 10.0, true).unwrap();
        assert_eq!(compiled.num_nodes(), 5);

        let root = compiled.root_node();
        assert_eq!(root.time(), 4.0);
        assert_eq!(root.edge_length(), Some(0.0));
        let (left, right) = root.children().unwrap();

        // Left: (L1, L3) joined at 7
        let inner = compiled.node(left);
        assert_eq!(inner.time(), 7.0);
        assert_eq!(inner.edge_length(), Some(3.0));
        let (l1, l3) = inner.children().unwrap();
        assert_eq!(compiled.node(l1).leaf().unwrap().lineage_id, 1);
        assert_eq!(compiled.node(l3).leaf().unwrap().lineage_id, 3);
        assert_eq!(compiled.node(l1).edge_length(), Some(3.0));

        // Right: L2
        assert_eq!(compiled.node(right).leaf().unwrap().lineage_id, 2);
        assert_eq!(compiled.node(right).edge_length(), Some(6.0));
    }

    #[test]
    fn test_unseeded_ancestors_are_bridged() {
        // 2 goes extinct, but its daughter 3 survives
        let lineages = vec![
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 1, Some(true), 1.0, 1).with_extinction_time(5.0),
            Lineage::new(3, 2, Some(false), 3.0, 1),
        ];
        let compiled = compile_lineage_tree(&lineages, 6.0, true).unwrap();
        assert_eq!(compiled.num_leaves(), 2);
        assert_eq!(compiled.num_nodes(), 3);
        let root = compiled.root_node();
        assert_eq!(root.time(), 1.0);
        let (l1, l3) = root.children().unwrap();
        assert_eq!(compiled.node(l1).edge_length(), Some(5.0));
        assert_eq!(compiled.node(l3).edge_length(), Some(5.0));
    }

    #[test]
    fn test_extinct_leaves_retained() {
        let lineages = vec![
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 1, Some(true), 1.0, 1).with_extinction_time(5.0),
        ];
        let compiled = compile_lineage_tree(&lineages, 6.0, false).unwrap();
        assert_eq!(compiled.num_leaves(), 2);
        let (_, l2) = compiled.root_node().children().unwrap();
        assert_eq!(compiled.node(l2).time(), 5.0);
        assert_eq!(compiled.node(l2).edge_length(), Some(4.0));
    }

    #[test]
    fn test_single_seed_is_lone_leaf() {
        let lineages = vec![
            Lineage::new(1, 0, None, 0.0, 1).with_extinction_time(2.0),
            Lineage::new(2, 1, Some(true), 1.0, 1),
        ];
        let compiled = compile_lineage_tree(&lineages, 3.0, true).unwrap();
        assert_eq!(compiled.num_nodes(), 1);
        assert_eq!(compiled.root_node().edge_length(), Some(3.0));
    }

    #[test]
    fn test_no_seeds() {
        let lineages = vec![Lineage::new(1, 0, None, 0.0, 1).with_extinction_time(2.0)];
        let err = compile_lineage_tree(&lineages, 3.0, true).unwrap_err();
        assert_eq!(err, CompileError::NoSeedLineages { cutoff_time: 3.0 });
    }

    #[test]
    fn test_second_founder_is_invariant_violation() {
        // Two unrelated founders never join
        let lineages = vec![
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 0, None, 1.0, 2),
        ];
        let err = compile_lineage_tree(&lineages, 3.0, true).unwrap_err();
        assert!(matches!(err, CompileError::InvariantViolation(_)));
    }

    #[test]
    fn test_species_collision_leaves_input_unchanged() {
        // 2 and 3 are incipient lineages of species 1, 4 is its own species
        let lineages = vec![
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 1, Some(true), 2.0, 1),
            Lineage::new(3, 1, Some(true), 5.0, 1),
            Lineage::new(4, 2, Some(false), 3.0, 2).with_speciation_completion_time(4.0),
        ];
        let before = lineages.clone();
        let mut rng = StdRng::seed_from_u64(7);

        let compiled = compile_orthospecies_tree(
            &lineages,
            8.0,
            SpeciesLineageSamplingScheme::Oldest,
            &mut rng,
        )
        .unwrap();

        assert_eq!(lineages, before);
        let leaves: Vec<_> = compiled.leaves().copied().collect();
        assert_eq!(
            leaves,
            vec![
                LeafRecord { lineage_id: 1, species_id: 1 },
                LeafRecord { lineage_id: 4, species_id: 2 },
            ]
        );
        // Species 2 branches off lineage 2, which budded off lineage 1 at time 2
        assert_eq!(compiled.root_node().time(), 2.0);
    }

    #[test]
    fn test_sampling_schemes() {
        let lineages = vec![
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 1, Some(true), 2.0, 1),
            Lineage::new(3, 1, Some(true), 2.0, 1),
        ];
        let members: Vec<&Lineage> = lineages.iter().collect();
        let mut rng = StdRng::seed_from_u64(1);

        let oldest = pick_representative(&members, SpeciesLineageSamplingScheme::Oldest, &mut rng);
        assert_eq!(oldest.lineage_id(), 1);
        let youngest =
            pick_representative(&members, SpeciesLineageSamplingScheme::Youngest, &mut rng);
        assert_eq!(youngest.lineage_id(), 3);
        let random = pick_representative(&members, SpeciesLineageSamplingScheme::Random, &mut rng);
        assert!(lineages.contains(random));
    }
}
