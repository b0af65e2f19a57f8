//! The protracted speciation process and its configuration.
//!
//! # Overview
//! Under the protracted speciation process every lineage is either a good
//! species (orthospecies) or an incipient species. Five events act on them:
//! - an orthospecies or an incipient lineage buds off a new incipient lineage
//!   (speciation initiation),
//! - an incipient lineage turns into a new good species (speciation completion),
//! - an orthospecies or an incipient lineage goes extinct.
//!
//! Each event type has a per-lineage rate, collected in [SpeciationRates].
//!
//! # Usage
//! Configure a [ProtractedSpeciationProcess] with its builder, then draw
//! samples with [generate_sample](ProtractedSpeciationProcess::generate_sample):
//!
//! ```
//! use protracted_speciation::{ProtractedSpeciationProcess, SampleOptions, SpeciationRates};
//!
//! let rates = SpeciationRates::new(0.5, 0.5, 0.3, 0.05, 0.05);
//! let mut process = ProtractedSpeciationProcess::builder(rates)
//!     .with_seed(42)
//!     .build()?;
//!
//! let sample = process.generate_sample(SampleOptions::for_num_extant_lineages(10))?;
//! assert_eq!(sample.lineage_tree().num_leaves(), 10);
//! # Ok::<(), protracted_speciation::SimulationError>(())
//! ```

pub(crate) mod engine;
pub mod options;

use crate::compiler::{
    CompiledTree, SpeciesLineageSamplingScheme, compile_lineage_tree, compile_orthospecies_tree,
};
use crate::error::{ProcessError, SimulationError};
use crate::process::engine::{ProcessConfig, RunOutcome, simulate};
use crate::process::options::{SampleOptions, TerminationCriteria};
use crate::sample::{LabelTemplates, SpeciationSample};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Placeholder of the lineage id in label templates.
pub const LINEAGE_ID_PLACEHOLDER: &str = "{lineage_id}";
/// Placeholder of the species id in label templates.
pub const SPECIES_ID_PLACEHOLDER: &str = "{species_id}";
/// Default label template for lineage tree leaves, e.g. `S3.L17`.
pub const DEFAULT_LINEAGE_LABEL_TEMPLATE: &str = "S{species_id}.L{lineage_id}";
/// Default label template for orthospecies tree leaves, e.g. `S3`.
pub const DEFAULT_SPECIES_LABEL_TEMPLATE: &str = "S{species_id}";

// =#========================================================================#=
// RATES
// =#========================================================================#=
/// Per-lineage rates of the five events of the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciationRates {
    /// Rate at which an orthospecies buds off an incipient lineage
    pub speciation_initiation_from_orthospecies_rate: f64,
    /// Rate at which an incipient lineage buds off an incipient lineage
    pub speciation_initiation_from_incipient_species_rate: f64,
    /// Rate at which an incipient lineage becomes a good species
    pub speciation_completion_rate: f64,
    /// Extinction rate of orthospecies
    pub orthospecies_extinction_rate: f64,
    /// Extinction rate of incipient lineages
    pub incipient_species_extinction_rate: f64,
}

impl SpeciationRates {
    pub fn new(
        speciation_initiation_from_orthospecies_rate: f64,
        speciation_initiation_from_incipient_species_rate: f64,
        speciation_completion_rate: f64,
        orthospecies_extinction_rate: f64,
        incipient_species_extinction_rate: f64,
    ) -> Self {
        SpeciationRates {
            speciation_initiation_from_orthospecies_rate,
            speciation_initiation_from_incipient_species_rate,
            speciation_completion_rate,
            orthospecies_extinction_rate,
            incipient_species_extinction_rate,
        }
    }

    /// Checks that all rates are non-negative and finite.
    ///
    /// # Errors
    /// [SimulationError::InvalidConfiguration] naming the first offending rate.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let named = [
            ("speciation initiation from orthospecies", self.speciation_initiation_from_orthospecies_rate),
            ("speciation initiation from incipient species", self.speciation_initiation_from_incipient_species_rate),
            ("speciation completion", self.speciation_completion_rate),
            ("orthospecies extinction", self.orthospecies_extinction_rate),
            ("incipient species extinction", self.incipient_species_extinction_rate),
        ];
        match named.iter().find(|(_, rate)| !(rate.is_finite() && *rate >= 0.0)) {
            Some((name, rate)) => Err(SimulationError::InvalidConfiguration(format!(
                "{name} rate must be non-negative and finite, got {rate}"
            ))),
            None => Ok(()),
        }
    }
}

// =#========================================================================#=
// BUILDER
// =#========================================================================#=
/// Builder for configuring and creating a [ProtractedSpeciationProcess].
///
/// Optional settings:
/// * [with_initial_lineage_orthospecies()](Self::with_initial_lineage_orthospecies)
///   - type of the founding lineages (default: orthospecies)
/// * [with_species_lineage_sampling_scheme()](Self::with_species_lineage_sampling_scheme)
///   - which lineage represents a species (default: random)
/// * [with_lineage_label_template()](Self::with_lineage_label_template),
///   [with_species_label_template()](Self::with_species_label_template)
///   - leaf labels, using the placeholders `{lineage_id}` and `{species_id}`
/// * [with_rng()](Self::with_rng) or [with_seed()](Self::with_seed)
///   - random source (default: [StdRng] seeded from entropy)
#[derive(Debug, Clone)]
pub struct ProtractedSpeciationProcessBuilder<R: Rng = StdRng> {
    rates: SpeciationRates,
    is_initial_lineage_orthospecies: bool,
    sampling_scheme: SpeciesLineageSamplingScheme,
    lineage_label_template: String,
    species_label_template: String,
    rng: R,
}

impl ProtractedSpeciationProcessBuilder<StdRng> {
    /// Creates a new builder with the given rates and default settings.
    pub fn new(rates: SpeciationRates) -> Self {
        ProtractedSpeciationProcessBuilder {
            rates,
            is_initial_lineage_orthospecies: true,
            sampling_scheme: SpeciesLineageSamplingScheme::default(),
            lineage_label_template: String::from(DEFAULT_LINEAGE_LABEL_TEMPLATE),
            species_label_template: String::from(DEFAULT_SPECIES_LABEL_TEMPLATE),
            rng: StdRng::from_entropy(),
        }
    }

    /// Uses a [StdRng] seeded with `seed`, making samples reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl<R: Rng> ProtractedSpeciationProcessBuilder<R> {
    /// Whether the founding lineages are orthospecies (`true`) or incipient.
    pub fn with_initial_lineage_orthospecies(mut self, is_orthospecies: bool) -> Self {
        self.is_initial_lineage_orthospecies = is_orthospecies;
        self
    }

    pub fn with_species_lineage_sampling_scheme(
        mut self,
        scheme: SpeciesLineageSamplingScheme,
    ) -> Self {
        self.sampling_scheme = scheme;
        self
    }

    /// Label template for lineage tree leaves; must contain `{lineage_id}`.
    pub fn with_lineage_label_template<S: Into<String>>(mut self, template: S) -> Self {
        self.lineage_label_template = template.into();
        self
    }

    /// Label template for orthospecies tree leaves; must contain `{species_id}`.
    pub fn with_species_label_template<S: Into<String>>(mut self, template: S) -> Self {
        self.species_label_template = template.into();
        self
    }

    /// Replaces the random source.
    pub fn with_rng<S: Rng>(self, rng: S) -> ProtractedSpeciationProcessBuilder<S> {
        ProtractedSpeciationProcessBuilder {
            rates: self.rates,
            is_initial_lineage_orthospecies: self.is_initial_lineage_orthospecies,
            sampling_scheme: self.sampling_scheme,
            lineage_label_template: self.lineage_label_template,
            species_label_template: self.species_label_template,
            rng,
        }
    }

    /// Validates the configuration and creates the process.
    ///
    /// # Errors
    /// [SimulationError::InvalidConfiguration] if a rate is negative or not
    /// finite, or a template lacks its placeholder.
    pub fn build(self) -> Result<ProtractedSpeciationProcess<R>, SimulationError> {
        self.rates.validate()?;
        if !self.lineage_label_template.contains(LINEAGE_ID_PLACEHOLDER) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "lineage label template '{}' lacks {}",
                self.lineage_label_template, LINEAGE_ID_PLACEHOLDER
            )));
        }
        if !self.species_label_template.contains(SPECIES_ID_PLACEHOLDER) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "species label template '{}' lacks {}",
                self.species_label_template, SPECIES_ID_PLACEHOLDER
            )));
        }

        Ok(ProtractedSpeciationProcess {
            config: ProcessConfig {
                rates: self.rates,
                is_initial_lineage_orthospecies: self.is_initial_lineage_orthospecies,
                sampling_scheme: self.sampling_scheme,
            },
            templates: LabelTemplates {
                lineage: self.lineage_label_template,
                species: self.species_label_template,
            },
            rng: self.rng,
        })
    }
}

// =#========================================================================#=
// PROCESS
// =#========================================================================#=
/// Simulator of the protracted speciation process.
///
/// Owns its random source; consecutive samples continue the same stream.
#[derive(Debug)]
pub struct ProtractedSpeciationProcess<R: Rng = StdRng> {
    config: ProcessConfig,
    templates: LabelTemplates,
    rng: R,
}

impl ProtractedSpeciationProcess<StdRng> {
    /// Returns a builder with the given rates, see [ProtractedSpeciationProcessBuilder].
    pub fn builder(rates: SpeciationRates) -> ProtractedSpeciationProcessBuilder<StdRng> {
        ProtractedSpeciationProcessBuilder::new(rates)
    }
}

impl<R: Rng> ProtractedSpeciationProcess<R> {
    pub fn rates(&self) -> &SpeciationRates {
        &self.config.rates
    }

    pub fn is_initial_lineage_orthospecies(&self) -> bool {
        self.config.is_initial_lineage_orthospecies
    }

    pub fn species_lineage_sampling_scheme(&self) -> SpeciesLineageSamplingScheme {
        self.config.sampling_scheme
    }

    /// Simulates the process until the termination criteria of `options`
    /// are met and returns the correlated lineage and orthospecies trees.
    ///
    /// Runs that go totally extinct or fail (a maximum exceeded, a stalled
    /// process, a degenerate crown) are repeated, up to the retry limit.
    ///
    /// # Errors
    /// * [SimulationError::InvalidConfiguration] - no or invalid termination criteria
    /// * [SimulationError::TotalExtinction] - all lineages died out and
    ///   retrying on total extinction is disabled
    /// * [SimulationError::NotConverged] - the retry limit was exceeded
    /// * [SimulationError::InvariantViolation] - a logic defect, never retried
    pub fn generate_sample(
        &mut self,
        options: SampleOptions,
    ) -> Result<SpeciationSample, SimulationError> {
        options.criteria.validate()?;

        let SampleOptions {
            criteria,
            mut lineage_taxon_namespace,
            mut species_taxon_namespace,
            is_retry_on_total_extinction,
            max_retries,
            retain_extinct_lineages,
        } = options;

        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!("Attempt {} for {}", attempts, criteria);

            let result = self.attempt(&criteria, retain_extinct_lineages).and_then(
                |(outcome, lineage_tree, orthospecies_tree)| {
                    SpeciationSample::assemble(
                        outcome,
                        &lineage_tree,
                        &orthospecies_tree,
                        &self.templates,
                        lineage_taxon_namespace.take().unwrap_or_default(),
                        species_taxon_namespace.take().unwrap_or_default(),
                    )
                },
            );

            let err = match result {
                Ok(sample) => return Ok(sample),
                Err(ProcessError::InvariantViolation(msg)) => {
                    return Err(SimulationError::InvariantViolation(msg));
                }
                Err(ProcessError::TotalExtinction { time }) if !is_retry_on_total_extinction => {
                    return Err(SimulationError::TotalExtinction { time });
                }
                Err(err) => err,
            };

            debug!("Attempt {} failed: {}", attempts, err);
            if max_retries.is_some_and(|max| attempts > max) {
                warn!("Giving up after {} attempt(s) for {}", attempts, criteria);
                return Err(SimulationError::NotConverged {
                    attempts,
                    criteria,
                    last_failure: err.to_string(),
                });
            }
        }
    }

    /// One simulation run followed by compilation of both trees.
    fn attempt(
        &mut self,
        criteria: &TerminationCriteria,
        retain_extinct_lineages: bool,
    ) -> Result<(RunOutcome, CompiledTree, CompiledTree), ProcessError> {
        let mut outcome = simulate(&self.config, criteria, &mut self.rng)?;
        let final_time = outcome.final_time;

        let lineage_tree =
            compile_lineage_tree(&outcome.lineages, final_time, !retain_extinct_lineages)?;
        let orthospecies_tree = match outcome.orthospecies_tree.take() {
            Some(tree) => tree,
            None => compile_orthospecies_tree(
                &outcome.lineages,
                final_time,
                self.config.sampling_scheme,
                &mut self.rng,
            )?,
        };

        Ok((outcome, lineage_tree, orthospecies_tree))
    }
}
