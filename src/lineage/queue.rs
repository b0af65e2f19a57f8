//! Priority queue over lineages used while compiling trees.
//!
//! The queue keeps two things apart:
//! - the visiting order, a heap of `(origin_time, lineage_id)` keys that is
//!   fixed once a key is pushed, and
//! - the merge state, a map from lineage id to its [QueueEntry], whose node
//!   gets replaced in place whenever a daughter merges into it.
//!
//! Popping a key never removes the entry from the map, so a lineage popped
//! earlier can still be found as a parent. A third map holds every lineage of
//! the collection, seeded or not, so ancestry can be recovered for lineages
//! that never became leaves.

use crate::compiler::NodeId;
use crate::lineage::{Lineage, LineageId, SpeciesId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Heap key: largest origin time first, ties broken by the larger (younger) id.
#[derive(Debug, Clone, Copy)]
struct QueueKey {
    origin_time: f64,
    lineage_id: LineageId,
}

impl PartialEq for QueueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueKey {}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.origin_time
            .total_cmp(&other.origin_time)
            .then(self.lineage_id.cmp(&other.lineage_id))
    }
}

/// Merge state of one lineage during compilation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct QueueEntry {
    pub(crate) lineage_id: LineageId,
    pub(crate) parent_lineage_id: LineageId,
    pub(crate) origin_time: f64,
    pub(crate) species_id: SpeciesId,
    pub(crate) speciation_completion_time: Option<f64>,
    /// Node currently representing this lineage's subtree
    pub(crate) node: NodeId,
}

impl QueueEntry {
    pub(crate) fn new(lineage: &Lineage, node: NodeId) -> Self {
        QueueEntry {
            lineage_id: lineage.lineage_id(),
            parent_lineage_id: lineage.parent_lineage_id(),
            origin_time: lineage.origin_time(),
            species_id: lineage.species_id(),
            speciation_completion_time: lineage.speciation_completion_time(),
            node,
        }
    }
}

// =#========================================================================#=
// LINEAGE QUEUE
// =#========================================================================#=
#[derive(Debug)]
pub(crate) struct LineageQueue<'a> {
    heap: BinaryHeap<QueueKey>,
    active: HashMap<LineageId, QueueEntry>,
    originals: HashMap<LineageId, &'a Lineage>,
}

impl<'a> LineageQueue<'a> {
    pub(crate) fn with_capacity(num_lineages: usize) -> Self {
        LineageQueue {
            heap: BinaryHeap::with_capacity(num_lineages),
            active: HashMap::with_capacity(num_lineages),
            originals: HashMap::with_capacity(num_lineages),
        }
    }

    /// Makes a lineage findable as an ancestor, without queueing it.
    pub(crate) fn register_original(&mut self, lineage: &'a Lineage) {
        self.originals.insert(lineage.lineage_id(), lineage);
    }

    /// Returns the unmodified record of a registered lineage.
    pub(crate) fn original(&self, lineage_id: LineageId) -> Option<&'a Lineage> {
        self.originals.get(&lineage_id).copied()
    }

    /// Queues an entry; it becomes the active entry for its lineage id.
    pub(crate) fn push(&mut self, entry: QueueEntry) {
        self.heap.push(QueueKey {
            origin_time: entry.origin_time,
            lineage_id: entry.lineage_id,
        });
        self.active.insert(entry.lineage_id, entry);
    }

    /// Pops the lineage with the largest origin time and returns a copy of
    /// its active entry. The entry itself stays in the map.
    pub(crate) fn pop_youngest(&mut self) -> Option<QueueEntry> {
        let key = self.heap.pop()?;
        self.active.get(&key.lineage_id).copied()
    }

    /// Returns the active entry of a lineage, popped or not.
    pub(crate) fn active_mut(&mut self, lineage_id: LineageId) -> Option<&mut QueueEntry> {
        self.active.get_mut(&lineage_id)
    }

    /// Number of queued (not yet popped) keys.
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_youngest_first_with_id_tie_break() {
        let lineages = [
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 1, Some(true), 0.0, 2),
            Lineage::new(3, 1, Some(true), 4.0, 1),
            Lineage::new(4, 2, Some(true), 2.5, 2),
        ];
        let mut queue = LineageQueue::with_capacity(lineages.len());
        for (node, lineage) in lineages.iter().enumerate() {
            queue.push(QueueEntry::new(lineage, node));
        }

        let order: Vec<LineageId> = std::iter::from_fn(|| queue.pop_youngest())
            .map(|entry| entry.lineage_id)
            .collect();
        assert_eq!(order, vec![3, 4, 2, 1]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_active_entry_survives_pop_and_mutation() {
        let founder = Lineage::new(1, 0, None, 0.0, 1);
        let daughter = Lineage::new(2, 1, Some(true), 1.0, 1);
        let mut queue = LineageQueue::with_capacity(2);
        queue.push(QueueEntry::new(&founder, 0));
        queue.push(QueueEntry::new(&daughter, 1));

        let popped = queue.pop_youngest().unwrap();
        assert_eq!(popped.lineage_id, 2);
        queue.active_mut(1).unwrap().node = 7;

        // Popped lineage is still findable, updated lineage keeps its heap key
        assert!(queue.active_mut(2).is_some());
        assert_eq!(queue.pop_youngest().unwrap().node, 7);
    }

    #[test]
    fn test_originals_are_not_queued() {
        let extinct = Lineage::new(5, 1, Some(true), 2.0, 1).with_extinction_time(3.0);
        let mut queue = LineageQueue::with_capacity(1);
        queue.register_original(&extinct);

        assert_eq!(queue.len(), 0);
        assert!(queue.active_mut(5).is_none());
        assert_eq!(queue.original(5), Some(&extinct));
    }
}
