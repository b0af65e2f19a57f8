//! Event-driven simulation of one run of the protracted speciation process.
//!
//! A run keeps two live sets, orthospecies and incipient lineages, and draws
//! the time to the next event from the total rate of five competing
//! exponential clocks. Before an event is applied, the pre-event state is
//! checked against the termination criteria; the stop time is then placed
//! inside the waiting interval.

use crate::compiler::{CompiledTree, SpeciesLineageSamplingScheme, compile_orthospecies_tree};
use crate::error::ProcessError;
use crate::lineage::{Lineage, LineageId, NO_PARENT_LINEAGE_ID, SpeciesId};
use crate::process::SpeciationRates;
use crate::process::options::TerminationCriteria;
use log::{debug, trace};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand_distr::Exp;

/// Settings of the process that stay fixed over all runs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProcessConfig {
    pub(crate) rates: SpeciationRates,
    pub(crate) is_initial_lineage_orthospecies: bool,
    pub(crate) sampling_scheme: SpeciesLineageSamplingScheme,
}

/// Result of a successful run.
#[derive(Debug)]
pub(crate) struct RunOutcome {
    pub(crate) lineages: Vec<Lineage>,
    pub(crate) final_time: f64,
    /// Orthospecies tree already compiled while checking species counts
    pub(crate) orthospecies_tree: Option<CompiledTree>,
}

/// The five events, indexed as their rates in the weighted draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeciationEvent {
    InitiationFromOrthospecies,
    OrthospeciesExtinction,
    InitiationFromIncipient,
    SpeciationCompletion,
    IncipientExtinction,
}

impl SpeciationEvent {
    const ALL: [SpeciationEvent; 5] = [
        SpeciationEvent::InitiationFromOrthospecies,
        SpeciationEvent::OrthospeciesExtinction,
        SpeciationEvent::InitiationFromIncipient,
        SpeciationEvent::SpeciationCompletion,
        SpeciationEvent::IncipientExtinction,
    ];
}

/// Verdict of the termination check before an event.
enum Termination {
    Continue,
    /// Stop, with the orthospecies tree if it was compiled for the check
    Stop(Option<CompiledTree>),
}

/// Simulates one run and returns the full lineage history.
///
/// Runs with only a time criterion consist of two independent phases of the
/// same duration, one per founder of the crown; otherwise a single phase runs.
///
/// # Errors
/// * [ProcessError::TotalExtinction] - all lineages of a phase died out
/// * [ProcessError::Failed] - a bound was exceeded, the process stalled, or
///   a crown lineage left no species of its own
pub(crate) fn simulate<R: Rng + ?Sized>(
    config: &ProcessConfig,
    criteria: &TerminationCriteria,
    rng: &mut R,
) -> Result<RunOutcome, ProcessError> {
    let mut run = ProcessRun::new(config, criteria, rng);

    run.found_lineage(NO_PARENT_LINEAGE_ID);
    debug!("Phase 0 started with lineage 1");
    let mut orthospecies_tree = run.run_phase()?;

    if criteria.is_time_only() {
        // Incipient founders share a species, so phase 0 needs one of its own
        if !config.is_initial_lineage_orthospecies && !run.is_non_trivial_outcome() {
            return Err(ProcessError::failed(
                "first crown lineage left neither an orthospecies nor a completed ancestry",
            ));
        }
        run.reset_phase();
        let founder = run.found_lineage(1);
        debug!("Phase 1 started with lineage {}", founder);
        orthospecies_tree = run.run_phase()?;
        if !run.is_non_trivial_outcome() {
            return Err(ProcessError::failed(
                "second crown lineage left neither an orthospecies nor a completed ancestry",
            ));
        }
    }

    debug!(
        "Run stopped at time {} with {} lineage(s) recorded",
        run.current_time,
        run.lineages.len()
    );
    Ok(RunOutcome {
        final_time: run.current_time,
        lineages: run.lineages,
        orthospecies_tree,
    })
}

// =#========================================================================#=
// PROCESS RUN
// =#========================================================================#=
struct ProcessRun<'a, R: Rng + ?Sized> {
    config: &'a ProcessConfig,
    criteria: &'a TerminationCriteria,
    rng: &'a mut R,
    current_time: f64,
    next_species_id: SpeciesId,
    /// First lineage of the current phase; lineages of earlier phases have smaller ids
    phase_founder: LineageId,
    /// Species of lineage 1 at its origin
    founder_species_id: SpeciesId,
    orthospecies: Vec<LineageId>,
    incipient: Vec<LineageId>,
    /// Lineage with id `i` is at index `i - 1`
    lineages: Vec<Lineage>,
}

impl<'a, R: Rng + ?Sized> ProcessRun<'a, R> {
    fn new(config: &'a ProcessConfig, criteria: &'a TerminationCriteria, rng: &'a mut R) -> Self {
        ProcessRun {
            config,
            criteria,
            rng,
            current_time: 0.0,
            next_species_id: 1,
            phase_founder: NO_PARENT_LINEAGE_ID,
            founder_species_id: 0,
            orthospecies: Vec::new(),
            incipient: Vec::new(),
            lineages: Vec::new(),
        }
    }

    fn lineage(&self, id: LineageId) -> &Lineage {
        &self.lineages[id - 1]
    }

    fn lineage_mut(&mut self, id: LineageId) -> &mut Lineage {
        &mut self.lineages[id - 1]
    }

    fn new_species_id(&mut self) -> SpeciesId {
        let id = self.next_species_id;
        self.next_species_id += 1;
        id
    }

    /// Clears the live sets and the clock, keeping the recorded history.
    fn reset_phase(&mut self) {
        self.current_time = 0.0;
        self.orthospecies.clear();
        self.incipient.clear();
    }

    /// Adds a founding lineage at time 0, either the first lineage or
    /// (with `parent` set) its crown sibling.
    ///
    /// An incipient sibling joins the species lineage 1 had at time 0, not
    /// one lineage 1 may have completed into during its own phase.
    fn found_lineage(&mut self, parent: LineageId) -> LineageId {
        let id = self.lineages.len() + 1;
        let is_orthospecies = self.config.is_initial_lineage_orthospecies;

        let (species_id, is_parent_orthospecies) = if parent == NO_PARENT_LINEAGE_ID {
            let species_id = self.new_species_id();
            self.founder_species_id = species_id;
            (species_id, None)
        } else if is_orthospecies {
            (self.new_species_id(), Some(is_orthospecies))
        } else {
            (self.founder_species_id, Some(is_orthospecies))
        };
        self.phase_founder = id;

        self.lineages.push(Lineage::new(
            id,
            parent,
            is_parent_orthospecies,
            self.current_time,
            species_id,
        ));
        if is_orthospecies {
            self.orthospecies.push(id);
        } else {
            self.incipient.push(id);
        }
        id
    }

    /// Buds an incipient daughter off `parent` at the current time.
    fn bud_lineage(&mut self, parent: LineageId, is_parent_orthospecies: bool) -> LineageId {
        let id = self.lineages.len() + 1;
        let species_id = self.lineage(parent).species_id();
        self.lineages.push(Lineage::new(
            id,
            parent,
            Some(is_parent_orthospecies),
            self.current_time,
            species_id,
        ));
        self.incipient.push(id);
        id
    }

    /// Runs events until a termination criterion is met.
    fn run_phase(&mut self) -> Result<Option<CompiledTree>, ProcessError> {
        let rates = self.config.rates;
        loop {
            let num_orthospecies = self.orthospecies.len();
            let num_incipient = self.incipient.len();
            if num_orthospecies + num_incipient == 0 {
                debug!("Total extinction at time {}", self.current_time);
                return Err(ProcessError::TotalExtinction { time: self.current_time });
            }

            let n_o = num_orthospecies as f64;
            let n_i = num_incipient as f64;
            let event_rates = [
                rates.speciation_initiation_from_orthospecies_rate * n_o,
                rates.orthospecies_extinction_rate * n_o,
                rates.speciation_initiation_from_incipient_species_rate * n_i,
                rates.speciation_completion_rate * n_i,
                rates.incipient_species_extinction_rate * n_i,
            ];
            let total_rate: f64 = event_rates.iter().sum();

            let waiting_time = if total_rate > 0.0 {
                Exp::new(total_rate)
                    .map_err(|e| ProcessError::invariant(format!("exponential rate: {e}")))?
                    .sample(self.rng)
            } else {
                f64::INFINITY
            };

            if let Termination::Stop(tree) = self.check_termination(waiting_time, total_rate)? {
                return Ok(tree);
            }

            let dist = WeightedIndex::new(event_rates)
                .map_err(|e| ProcessError::invariant(format!("event weights: {e}")))?;
            let event = SpeciationEvent::ALL[dist.sample(self.rng)];
            self.current_time += waiting_time;
            self.apply_event(event);
        }
    }

    /// Checks the pre-event state against the termination criteria.
    ///
    /// On [Termination::Stop] the current time is set to the stop time.
    fn check_termination(
        &mut self,
        waiting_time: f64,
        total_rate: f64,
    ) -> Result<Termination, ProcessError> {
        let criteria = self.criteria;

        let reached_max_time = criteria
            .max_time
            .filter(|&max_time| self.current_time + waiting_time > max_time);
        if reached_max_time.is_none() {
            if !criteria.has_count_criteria() {
                return Ok(Termination::Continue);
            }
            if total_rate <= 0.0 {
                return Err(ProcessError::failed(format!(
                    "process stalled at time {} with all rates zero",
                    self.current_time
                )));
            }
        }

        let num_lineages = self.orthospecies.len() + self.incipient.len();
        if criteria.lineages.is_exceeded(num_lineages) {
            return Err(ProcessError::failed(format!(
                "{num_lineages} extant lineages exceed the maximum"
            )));
        }
        let lineages_met =
            !criteria.lineages.has_target() || criteria.lineages.is_met(num_lineages);

        let stop_time = match reached_max_time {
            Some(max_time) => max_time,
            None => self.current_time + self.rng.r#gen::<f64>() * waiting_time,
        };

        let mut orthospecies_tree = None;
        let mut orthospecies_met = true;
        if criteria.orthospecies.is_set() {
            match compile_orthospecies_tree(
                &self.lineages,
                stop_time,
                self.config.sampling_scheme,
                self.rng,
            ) {
                Ok(tree) => {
                    let num_species = tree.num_leaves();
                    if criteria.orthospecies.is_exceeded(num_species) {
                        return Err(ProcessError::failed(format!(
                            "{num_species} extant orthospecies exceed the maximum"
                        )));
                    }
                    orthospecies_met = !criteria.orthospecies.has_target()
                        || criteria.orthospecies.is_met(num_species);
                    orthospecies_tree = Some(tree);
                }
                Err(err) => {
                    trace!("Speculative orthospecies tree failed: {}", err);
                    orthospecies_met = false;
                }
            }
        }

        if reached_max_time.is_some() {
            self.current_time = stop_time;
            return Ok(Termination::Stop(orthospecies_tree));
        }
        if criteria.has_count_targets() && lineages_met && orthospecies_met {
            debug!(
                "Count criteria met at time {} with {} extant lineage(s)",
                stop_time, num_lineages
            );
            self.current_time = stop_time;
            return Ok(Termination::Stop(orthospecies_tree));
        }
        Ok(Termination::Continue)
    }

    fn apply_event(&mut self, event: SpeciationEvent) {
        let time = self.current_time;
        match event {
            SpeciationEvent::InitiationFromOrthospecies => {
                let parent = self.orthospecies[self.rng.gen_range(0..self.orthospecies.len())];
                let child = self.bud_lineage(parent, true);
                trace!("{time}: lineage {child} initiated from orthospecies lineage {parent}");
            }
            SpeciationEvent::OrthospeciesExtinction => {
                let index = self.rng.gen_range(0..self.orthospecies.len());
                let id = self.orthospecies.swap_remove(index);
                self.lineage_mut(id).go_extinct(time);
                trace!("{time}: orthospecies lineage {id} went extinct");
            }
            SpeciationEvent::InitiationFromIncipient => {
                let parent = self.incipient[self.rng.gen_range(0..self.incipient.len())];
                let child = self.bud_lineage(parent, false);
                trace!("{time}: lineage {child} initiated from incipient lineage {parent}");
            }
            SpeciationEvent::SpeciationCompletion => {
                let index = self.rng.gen_range(0..self.incipient.len());
                let id = self.incipient.swap_remove(index);
                let species_id = self.new_species_id();
                self.lineage_mut(id).complete_speciation(time, species_id);
                self.orthospecies.push(id);
                trace!("{time}: lineage {id} completed speciation as species {species_id}");
            }
            SpeciationEvent::IncipientExtinction => {
                let index = self.rng.gen_range(0..self.incipient.len());
                let id = self.incipient.swap_remove(index);
                self.lineage_mut(id).go_extinct(time);
                trace!("{time}: incipient lineage {id} went extinct");
            }
        }
    }

    /// Returns `true` if the phase left a live orthospecies, or a live
    /// incipient lineage with an ancestor that completed speciation before
    /// the lineage originated. Only ancestors of the current phase count.
    fn is_non_trivial_outcome(&self) -> bool {
        if !self.orthospecies.is_empty() {
            return true;
        }
        self.incipient.iter().any(|&id| {
            let origin = self.lineage(id).origin_time();
            let mut ancestor = self.lineage(id).parent_lineage_id();
            while ancestor >= self.phase_founder {
                let lineage = self.lineage(ancestor);
                if lineage.speciation_completion_time().is_some_and(|t| t < origin) {
                    return true;
                }
                ancestor = lineage.parent_lineage_id();
            }
            false
        })
    }
}
