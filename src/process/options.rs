//! Options of a single [`generate_sample`](crate::ProtractedSpeciationProcess::generate_sample) call.

use crate::error::SimulationError;
use crate::model::TaxonNamespace;
use std::fmt;

/// Default bound on retries after a failed or extinct run.
pub const DEFAULT_MAX_RETRIES: usize = 1000;

// =#========================================================================#=
// COUNT BOUNDS
// =#========================================================================#=
/// Exact, lower and upper bound on a number of extant lineages or species.
///
/// The exact and lower bound are targets: a count meets the bounds once it
/// reaches a target without leaving the upper bound. An upper bound alone
/// is never met and only guards the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountBounds {
    /// Required exact count
    pub num: Option<usize>,
    /// Required minimum count
    pub min: Option<usize>,
    /// Upper bound; exceeding it fails the run
    pub max: Option<usize>,
}

impl CountBounds {
    /// Returns `true` if at least one bound is set.
    pub fn is_set(&self) -> bool {
        self.num.is_some() || self.min.is_some() || self.max.is_some()
    }

    /// Returns `true` if an exact or minimum count is set.
    pub fn has_target(&self) -> bool {
        self.num.is_some() || self.min.is_some()
    }

    /// Returns `true` if a target is set and `count` meets every bound.
    pub fn is_met(&self, count: usize) -> bool {
        self.has_target() && self.is_within(count)
    }

    fn is_within(&self, count: usize) -> bool {
        self.num.is_none_or(|num| count == num)
            && self.min.is_none_or(|min| count >= min)
            && self.max.is_none_or(|max| count <= max)
    }

    /// Returns `true` if `count` is above the upper bound.
    pub fn is_exceeded(&self, count: usize) -> bool {
        self.max.is_some_and(|max| count > max)
    }

    fn validate(&self, what: &str) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidConfiguration(msg));

        if self.num == Some(0) || self.max == Some(0) {
            return invalid(format!("number of extant {what} must be positive"));
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return invalid(format!("min extant {what} ({min}) exceeds max ({max})"));
        }
        if let Some(num) = self.num
            && !self.is_within(num)
        {
            return invalid(format!("num extant {what} ({num}) is outside of min/max"));
        }
        Ok(())
    }

    fn write_bounds(&self, f: &mut fmt::Formatter<'_>, what: &str, sep: &mut &str) -> fmt::Result {
        for (kind, bound) in [("num", self.num), ("min", self.min), ("max", self.max)] {
            if let Some(bound) = bound {
                write!(f, "{sep}{kind}_extant_{what}={bound}")?;
                *sep = ", ";
            }
        }
        Ok(())
    }
}

// =#========================================================================#=
// TERMINATION CRITERIA
// =#========================================================================#=
/// When a simulation run stops.
///
/// * `max_time` - stop once the simulated time reaches the given value;
///   runs with only this criterion are conditioned on a crown (two founders)
/// * lineage bounds - stop once the number of extant lineages meets the bounds
/// * orthospecies bounds - stop once the number of species in the
///   orthospecies tree meets the bounds
///
/// If both count families have a target, both must be met at the same time.
/// Upper bounds fail the run when exceeded, up to and including the stop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerminationCriteria {
    pub max_time: Option<f64>,
    pub lineages: CountBounds,
    pub orthospecies: CountBounds,
}

impl TerminationCriteria {
    /// Returns `true` if some count criterion is set.
    pub fn has_count_criteria(&self) -> bool {
        self.lineages.is_set() || self.orthospecies.is_set()
    }

    /// Returns `true` if some count family has an exact or minimum target.
    pub fn has_count_targets(&self) -> bool {
        self.lineages.has_target() || self.orthospecies.has_target()
    }

    /// Returns `true` if `max_time` is the only criterion.
    pub fn is_time_only(&self) -> bool {
        self.max_time.is_some() && !self.has_count_criteria()
    }

    /// Checks that at least one usable criterion is set.
    ///
    /// # Errors
    /// [SimulationError::InvalidConfiguration] if neither a maximum time nor
    /// a count target is set, the maximum time is negative or not finite, or
    /// the bounds are contradictory.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.max_time.is_none() && !self.has_count_targets() {
            let msg = if self.has_count_criteria() {
                "upper bounds need a maximum time or a count target to stop the run"
            } else {
                "no termination criterion given"
            };
            return Err(SimulationError::InvalidConfiguration(String::from(msg)));
        }
        if let Some(max_time) = self.max_time
            && !(max_time.is_finite() && max_time >= 0.0)
        {
            return Err(SimulationError::InvalidConfiguration(format!(
                "max time must be non-negative and finite, got {max_time}"
            )));
        }
        self.lineages.validate("lineages")?;
        self.orthospecies.validate("orthospecies")
    }
}

impl fmt::Display for TerminationCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(max_time) = self.max_time {
            write!(f, "max_time={max_time}")?;
            sep = ", ";
        }
        self.lineages.write_bounds(f, "lineages", &mut sep)?;
        self.orthospecies.write_bounds(f, "orthospecies", &mut sep)?;
        if sep.is_empty() {
            write!(f, "no criteria")?;
        }
        Ok(())
    }
}

// =#========================================================================#=
// SAMPLE OPTIONS
// =#========================================================================#=
/// Options for generating one sample.
///
/// Start from [Default] or one of the shortcuts and chain `with_*` setters:
///
/// ```
/// use protracted_speciation::SampleOptions;
///
/// let options = SampleOptions::default()
///     .with_num_extant_orthospecies(20)
///     .with_max_extant_lineages(500)
///     .with_max_retries(Some(50));
/// assert_eq!(options.criteria().orthospecies.num, Some(20));
/// ```
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub(crate) criteria: TerminationCriteria,
    pub(crate) lineage_taxon_namespace: Option<TaxonNamespace>,
    pub(crate) species_taxon_namespace: Option<TaxonNamespace>,
    pub(crate) is_retry_on_total_extinction: bool,
    pub(crate) max_retries: Option<usize>,
    pub(crate) retain_extinct_lineages: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        SampleOptions {
            criteria: TerminationCriteria::default(),
            lineage_taxon_namespace: None,
            species_taxon_namespace: None,
            is_retry_on_total_extinction: true,
            max_retries: Some(DEFAULT_MAX_RETRIES),
            retain_extinct_lineages: false,
        }
    }
}

impl SampleOptions {
    /// Options stopping at time `max_time`.
    pub fn for_max_time(max_time: f64) -> Self {
        Self::default().with_max_time(max_time)
    }

    /// Options stopping once exactly `num` lineages are extant.
    pub fn for_num_extant_lineages(num: usize) -> Self {
        Self::default().with_num_extant_lineages(num)
    }

    /// Options stopping once exactly `num` species are extant.
    pub fn for_num_extant_orthospecies(num: usize) -> Self {
        Self::default().with_num_extant_orthospecies(num)
    }

    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.criteria.max_time = Some(max_time);
        self
    }

    pub fn with_num_extant_lineages(mut self, num: usize) -> Self {
        self.criteria.lineages.num = Some(num);
        self
    }

    pub fn with_min_extant_lineages(mut self, min: usize) -> Self {
        self.criteria.lineages.min = Some(min);
        self
    }

    pub fn with_max_extant_lineages(mut self, max: usize) -> Self {
        self.criteria.lineages.max = Some(max);
        self
    }

    pub fn with_num_extant_orthospecies(mut self, num: usize) -> Self {
        self.criteria.orthospecies.num = Some(num);
        self
    }

    pub fn with_min_extant_orthospecies(mut self, min: usize) -> Self {
        self.criteria.orthospecies.min = Some(min);
        self
    }

    pub fn with_max_extant_orthospecies(mut self, max: usize) -> Self {
        self.criteria.orthospecies.max = Some(max);
        self
    }

    /// Stores lineage tree taxa in `namespace` instead of a fresh one.
    pub fn with_lineage_taxon_namespace(mut self, namespace: TaxonNamespace) -> Self {
        self.lineage_taxon_namespace = Some(namespace);
        self
    }

    /// Stores orthospecies tree taxa in `namespace` instead of a fresh one.
    pub fn with_species_taxon_namespace(mut self, namespace: TaxonNamespace) -> Self {
        self.species_taxon_namespace = Some(namespace);
        self
    }

    /// Whether to run again when all lineages die out (default `true`).
    /// Otherwise [SimulationError::TotalExtinction] is returned.
    pub fn with_retry_on_total_extinction(mut self, retry: bool) -> Self {
        self.is_retry_on_total_extinction = retry;
        self
    }

    /// Maximum number of retries, `None` for unlimited
    /// (default `Some(`[DEFAULT_MAX_RETRIES]`)`).
    pub fn with_max_retries(mut self, max_retries: Option<usize>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Whether extinct lineages stay in the lineage tree as leaves (default `false`).
    pub fn with_retain_extinct_lineages(mut self, retain: bool) -> Self {
        self.retain_extinct_lineages = retain;
        self
    }

    pub fn criteria(&self) -> &TerminationCriteria {
        &self.criteria
    }

    pub fn is_retry_on_total_extinction(&self) -> bool {
        self.is_retry_on_total_extinction
    }

    pub fn max_retries(&self) -> Option<usize> {
        self.max_retries
    }

    pub fn retain_extinct_lineages(&self) -> bool {
        self.retain_extinct_lineages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_bounds() {
        let bounds = CountBounds { num: None, min: Some(3), max: Some(5) };
        assert!(!bounds.is_met(2));
        assert!(bounds.is_met(3));
        assert!(bounds.is_met(5));
        assert!(!bounds.is_met(6));
        assert!(bounds.is_exceeded(6));
        assert!(!CountBounds::default().is_set());
        assert!(!CountBounds::default().is_met(42));
    }

    #[test]
    fn test_upper_bound_alone_only_guards() {
        let bounds = CountBounds { num: None, min: None, max: Some(5) };
        assert!(bounds.is_set());
        assert!(!bounds.has_target());
        assert!(!bounds.is_met(1));
        assert!(!bounds.is_met(5));
        assert!(bounds.is_exceeded(6));
    }

    #[test]
    fn test_validate() {
        assert!(TerminationCriteria::default().validate().is_err());
        assert!(SampleOptions::for_max_time(-1.0).criteria().validate().is_err());
        assert!(SampleOptions::for_max_time(f64::INFINITY).criteria().validate().is_err());
        assert!(SampleOptions::for_num_extant_lineages(0).criteria().validate().is_err());
        let contradictory = SampleOptions::default()
            .with_min_extant_orthospecies(10)
            .with_max_extant_orthospecies(5);
        assert!(contradictory.criteria().validate().is_err());
        let outside = SampleOptions::default()
            .with_num_extant_lineages(10)
            .with_max_extant_lineages(5);
        assert!(outside.criteria().validate().is_err());
        assert!(SampleOptions::for_max_time(10.0).criteria().validate().is_ok());

        // Upper bounds alone never stop a run
        let guards_only = SampleOptions::default()
            .with_max_extant_lineages(50)
            .with_max_extant_orthospecies(5);
        assert!(guards_only.criteria().validate().is_err());
        assert!(guards_only.with_max_time(3.0).criteria().validate().is_ok());
        let guarded_target = SampleOptions::default()
            .with_min_extant_orthospecies(2)
            .with_max_extant_lineages(50);
        assert!(guarded_target.criteria().validate().is_ok());
    }

    #[test]
    fn test_display() {
        let options = SampleOptions::for_max_time(2.5)
            .with_max_extant_lineages(100)
            .with_num_extant_orthospecies(4);
        assert_eq!(
            options.criteria().to_string(),
            "max_time=2.5, max_extant_lineages=100, num_extant_orthospecies=4"
        );
        assert_eq!(TerminationCriteria::default().to_string(), "no criteria");
    }

    #[test]
    fn test_time_only() {
        assert!(SampleOptions::for_max_time(1.0).criteria().is_time_only());
        assert!(
            !SampleOptions::for_max_time(1.0)
                .with_max_extant_lineages(3)
                .criteria()
                .is_time_only()
        );
    }
}
