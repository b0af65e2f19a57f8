//! Life history records of simulated lineages.
//!
//! A [Lineage] is one row of the evolutionary history log written by the
//! simulation engine: when the lineage budded off its parent, when (if ever)
//! it completed speciation, when (if ever) it went extinct, and which species
//! it belongs to. The [tree compiler](crate::compiler) rebuilds trees from a
//! flat slice of these records.

pub(crate) mod queue;

/// Identifier of a lineage; positive, assigned in order of creation.
pub type LineageId = usize;

/// Identifier of a (good) species group.
pub type SpeciesId = usize;

/// Parent id of the founding lineage, i.e. "no parent".
pub const NO_PARENT_LINEAGE_ID: LineageId = 0;

// =#========================================================================#=
// LINEAGE
// =#========================================================================#=
/// Record of one lineage's life history.
///
/// # Invariants
/// - `origin_time <= speciation_completion_time <= extinction_time` where set
/// - the origin time never changes once recorded; it is the priority key of
///   tree compilation
/// - the parent (if any) originated no later than this lineage
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    lineage_id: LineageId,
    parent_lineage_id: LineageId,
    is_parent_orthospecies: Option<bool>,
    origin_time: f64,
    speciation_completion_time: Option<f64>,
    extinction_time: Option<f64>,
    species_id: SpeciesId,
}

impl Lineage {
    /// Creates the record of a newly originated lineage.
    ///
    /// # Arguments
    /// * `lineage_id` - Unique, positive id
    /// * `parent_lineage_id` - Id of the parent, [NO_PARENT_LINEAGE_ID] for a founder
    /// * `is_parent_orthospecies` - Whether the parent was a good species at budding;
    ///   `None` for a founder
    /// * `origin_time` - Time of origin (non-negative)
    /// * `species_id` - Species the lineage belongs to
    ///
    /// # Panics
    /// Panics if `lineage_id` is [NO_PARENT_LINEAGE_ID] or `origin_time` is
    /// negative or not finite.
    pub fn new(
        lineage_id: LineageId,
        parent_lineage_id: LineageId,
        is_parent_orthospecies: Option<bool>,
        origin_time: f64,
        species_id: SpeciesId,
    ) -> Self {
        assert_ne!(lineage_id, NO_PARENT_LINEAGE_ID, "Lineage ids must be positive");
        assert!(
            origin_time >= 0.0 && origin_time.is_finite(),
            "Origin time must be non-negative and finite, got {}",
            origin_time
        );
        Lineage {
            lineage_id,
            parent_lineage_id,
            is_parent_orthospecies,
            origin_time,
            speciation_completion_time: None,
            extinction_time: None,
            species_id,
        }
    }

    /// Sets the speciation completion time (builder style).
    pub fn with_speciation_completion_time(mut self, time: f64) -> Self {
        self.speciation_completion_time = Some(time);
        self
    }

    /// Sets the extinction time (builder style).
    pub fn with_extinction_time(mut self, time: f64) -> Self {
        self.extinction_time = Some(time);
        self
    }

    /// Returns the id of this lineage.
    pub fn lineage_id(&self) -> LineageId {
        self.lineage_id
    }

    /// Returns the id of the parent lineage ([NO_PARENT_LINEAGE_ID] for a founder).
    pub fn parent_lineage_id(&self) -> LineageId {
        self.parent_lineage_id
    }

    /// Returns `true` unless this lineage founded the process.
    pub fn has_parent(&self) -> bool {
        self.parent_lineage_id != NO_PARENT_LINEAGE_ID
    }

    /// Returns whether the parent was a good species at budding; `None` for a founder.
    pub fn is_parent_orthospecies(&self) -> Option<bool> {
        self.is_parent_orthospecies
    }

    /// Returns the time of origin.
    pub fn origin_time(&self) -> f64 {
        self.origin_time
    }

    /// Returns the time at which speciation completed, if it did during the process.
    pub fn speciation_completion_time(&self) -> Option<f64> {
        self.speciation_completion_time
    }

    /// Returns the time of extinction, or `None` if the lineage survived.
    pub fn extinction_time(&self) -> Option<f64> {
        self.extinction_time
    }

    /// Returns the species this lineage belongs to.
    pub fn species_id(&self) -> SpeciesId {
        self.species_id
    }

    /// Returns `true` if the lineage has gone extinct.
    pub fn is_extinct(&self) -> bool {
        self.extinction_time.is_some()
    }

    /// Returns `true` if the lineage exists and is alive at `time`.
    pub fn is_extant_at(&self, time: f64) -> bool {
        self.origin_time <= time && self.extinction_time.is_none_or(|t| t > time)
    }

    pub(crate) fn complete_speciation(&mut self, time: f64, species_id: SpeciesId) {
        self.speciation_completion_time = Some(time);
        self.species_id = species_id;
    }

    pub(crate) fn go_extinct(&mut self, time: f64) {
        self.extinction_time = Some(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extant_at() {
        let lineage = Lineage::new(2, 1, Some(true), 1.0, 1).with_extinction_time(3.0);
        assert!(!lineage.is_extant_at(0.5));
        assert!(lineage.is_extant_at(1.0));
        assert!(lineage.is_extant_at(2.9));
        assert!(!lineage.is_extant_at(3.0));
        assert!(lineage.is_extinct());
        assert!(lineage.has_parent());
    }

    #[test]
    fn test_complete_speciation_reassigns_species() {
        let mut lineage = Lineage::new(3, 1, Some(false), 0.5, 1);
        lineage.complete_speciation(2.0, 7);
        assert_eq!(lineage.species_id(), 7);
        assert_eq!(lineage.speciation_completion_time(), Some(2.0));
        assert_eq!(lineage.origin_time(), 0.5);
    }

    #[test]
    #[should_panic]
    fn test_zero_lineage_id_is_rejected() {
        Lineage::new(NO_PARENT_LINEAGE_ID, 0, None, 0.0, 1);
    }
}
