//! Taxon namespace for phylogenetic tree representation.
//!
//! - [TaxonNamespace]: Joined storage and lookup of taxon labels for trees
//!   sharing the same taxa.

use crate::model::label_storage::LabelStorage;
use std::collections::HashMap;
use std::fmt;

/// Index of a taxon in a [TaxonNamespace].
pub type TaxonIndex = usize;

// =#========================================================================#=
// TAXON NAMESPACE
// =#========================================================================#=
/// Maps taxon labels (strings) to unique, compact indices.
///
/// Several trees (e.g. repeated samples of the same process) can share one
/// namespace, with each leaf referencing its taxon by [TaxonIndex].
/// Labels are deduplicated automatically - inserting the same label twice
/// returns the same index, so a label identifies exactly one taxon.
///
/// # Example
/// ```
/// use protracted_speciation::model::TaxonNamespace;
///
/// let mut taxa = TaxonNamespace::new(3);
///
/// let s1 = taxa.get_or_insert("S1");   // 0
/// let s2 = taxa.get_or_insert("S2");   // 1
/// let s1_again = taxa.get_or_insert("S1"); // 0 (deduplicated)
///
/// assert_eq!(s1, s1_again);
/// assert_ne!(s1, s2);
/// assert_eq!(taxa.get_label(s2), Some("S2"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaxonNamespace {
    /// List of unique labels
    labels: Vec<String>,
    /// Map from label to its index
    map: HashMap<String, TaxonIndex>,
}

impl TaxonNamespace {
    /// Creates a new namespace with pre-allocated capacity.
    ///
    /// # Arguments
    /// * `num_taxa` - Expected number of unique taxa (a hint, not a bound)
    pub fn new(num_taxa: usize) -> Self {
        TaxonNamespace {
            labels: Vec::with_capacity(num_taxa),
            map: HashMap::with_capacity(num_taxa),
        }
    }

    /// Gets the index for a label, inserting it if it doesn't exist.
    ///
    /// # Arguments
    /// * `label` - The label string to look up or insert
    ///
    /// # Returns
    /// The index associated with this label
    pub fn get_or_insert(&mut self, label: &str) -> TaxonIndex {
        if let Some(&index) = self.map.get(label) {
            index
        } else {
            let index = self.labels.len();
            self.labels.push(label.to_string());
            self.map.insert(label.to_string(), index);
            index
        }
    }

    /// Retrieves the index for a given label, or `None` if unknown.
    pub fn get_index(&self, label: &str) -> Option<TaxonIndex> {
        self.map.get(label).copied()
    }

    /// Retrieves the label for a given index, or `None` if out of range.
    pub fn get_label(&self, index: TaxonIndex) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    /// Checks if a label exists in the namespace.
    pub fn contains_label(&self, label: &str) -> bool {
        self.map.contains_key(label)
    }

    /// Returns the number of taxa currently stored.
    pub fn num_taxa(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no taxon has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns reference to the labels in this namespace, ordered by index.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl LabelStorage for TaxonNamespace {
    type LabelRef = TaxonIndex;

    fn store_and_ref(&mut self, label: &str) -> Self::LabelRef {
        self.get_or_insert(label)
    }
}

impl fmt::Display for TaxonNamespace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "TaxonNamespace ({} taxa):", self.labels.len())?;
        for (idx, label) in self.labels.iter().enumerate() {
            writeln!(f, "  [{}] {}", idx, label)?;
        }
        Ok(())
    }
}

impl std::ops::Index<TaxonIndex> for TaxonNamespace {
    type Output = str;

    fn index(&self, index: TaxonIndex) -> &Self::Output {
        &self.labels[index]
    }
}
