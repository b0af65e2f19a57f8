//! Simulator for the protracted speciation process.
//!
//! Under the protracted speciation process, good species (orthospecies) do
//! not arise instantly: a lineage first buds off as an incipient species and
//! only later completes speciation, if it does not go extinct first.
//! Core functionality provided:
//! - Simulation: event-driven simulation with five competing exponential
//!   clocks (initiation from orthospecies or incipient lineages, completion,
//!   extinction of either type), stopping at a maximum time or once the
//!   number of extant lineages or species meets given bounds.
//! - Compilation: rebuild rooted binary trees from the flat lineage history,
//!   as a lineage tree (one leaf per lineage) and an orthospecies tree (one
//!   leaf per species), see [crate::compiler].
//! - Correlation: both trees of a [SpeciationSample] are labelled through
//!   [TaxonNamespace]s and linked leaf by leaf through their species.
//! - Output: Newick strings via [crate::newick].
//! - Tree model: arena based [PhyloTree], see [crate::model].
//!
//! Limitations:
//! - Only binary trees
//! - Single-threaded; one process owns one random source
//!
//! # Usage
//! Configure a process with its rates, then draw samples:
//! ```
//! use protracted_speciation::{ProtractedSpeciationProcess, SampleOptions, SpeciationRates};
//!
//! let rates = SpeciationRates::new(0.4, 0.4, 0.2, 0.05, 0.05);
//! let mut process = ProtractedSpeciationProcess::builder(rates)
//!     .with_seed(2024)
//!     .build()?;
//!
//! let sample = process.generate_sample(SampleOptions::for_max_time(5.0))?;
//! assert!(sample.lineage_tree().is_ultrametric());
//! println!("{}", sample.orthospecies_newick());
//! # Ok::<(), protracted_speciation::SimulationError>(())
//! ```
//!
//! Termination criteria can be combined:
//! ```
//! use protracted_speciation::{ProtractedSpeciationProcess, SampleOptions, SpeciationRates};
//! use protracted_speciation::compiler::SpeciesLineageSamplingScheme;
//!
//! let rates = SpeciationRates::new(0.5, 0.5, 0.5, 0.0, 0.0);
//! let mut process = ProtractedSpeciationProcess::builder(rates)
//!     .with_species_lineage_sampling_scheme(SpeciesLineageSamplingScheme::Oldest)
//!     .with_lineage_label_template("L{lineage_id}")
//!     .with_seed(7)
//!     .build()?;
//!
//! let options = SampleOptions::for_num_extant_orthospecies(4).with_max_extant_lineages(200);
//! let sample = process.generate_sample(options)?;
//! assert_eq!(sample.orthospecies_tree().num_leaves(), 4);
//! # Ok::<(), protracted_speciation::SimulationError>(())
//! ```

pub mod compiler;
pub mod error;
pub mod lineage;
pub mod model;
pub mod newick;
pub mod process;
pub mod sample;

pub use crate::compiler::{CompiledTree, LeafRecord, SpeciesLineageSamplingScheme};
pub use crate::error::{CompileError, SimulationError};
pub use crate::lineage::Lineage;
pub use crate::model::{PhyloTree, TaxonNamespace};
pub use crate::process::options::{SampleOptions, TerminationCriteria};
pub use crate::process::{
    ProtractedSpeciationProcess, ProtractedSpeciationProcessBuilder, SpeciationRates,
};
pub use crate::sample::SpeciationSample;
