//! Error types for simulating the protracted speciation process.
//!
//! [SimulationError] is what callers see. Inside a run, [ProcessError]
//! distinguishes the recoverable sampling outcomes (total extinction,
//! failed process) from logic defects; the retry loop of
//! [`generate_sample`](crate::ProtractedSpeciationProcess::generate_sample)
//! maps one onto the other.

use crate::process::options::TerminationCriteria;

// =#========================================================================#=
// SIMULATION ERROR
// =#========================================================================$=
/// Error returned by the simulator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// All lineages died before a termination condition was reached,
    /// and retrying on total extinction was disabled.
    #[error("Total extinction of all lineages at time {time}")]
    TotalExtinction {
        /// Simulated time at which the last lineage went extinct
        time: f64,
    },

    /// No attempt produced a valid sample within the allowed number of retries.
    #[error("Simulation could not converge after {attempts} attempt(s) for {criteria} - last failure: {last_failure}")]
    NotConverged {
        /// Number of attempts made
        attempts: usize,
        /// Termination criteria requested by the caller
        criteria: TerminationCriteria,
        /// Description of the failure of the last attempt
        last_failure: String,
    },

    /// A logic defect, e.g. the root sentinel was reached mid-compilation.
    #[error("Invariant violated - {0}")]
    InvariantViolation(String),

    /// Rates, templates or options are not usable.
    #[error("Invalid configuration - {0}")]
    InvalidConfiguration(String),
}

// =#========================================================================#=
// COMPILE ERROR
// =#========================================================================$=
/// Error returned when a lineage collection cannot be compiled into a tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// No lineage qualified as a leaf at the cutoff time.
    #[error("No lineage to seed a leaf at time {cutoff_time}")]
    NoSeedLineages {
        /// The requested cutoff time
        cutoff_time: f64,
    },

    /// Merging ran out of queued lineages before a single root remained.
    #[error("Lineages could not be joined under a single root")]
    NoConnectedRoot,

    /// The collection is inconsistent, e.g. a lineage without parent is
    /// reached while other subtrees are still pending.
    #[error("Invariant violated - {0}")]
    InvariantViolation(String),
}

// =#========================================================================#=
// PROCESS ERROR (crate internal)
// =#========================================================================$=
/// Outcome of a single failed simulation attempt or compilation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub(crate) enum ProcessError {
    /// No live lineage is left.
    #[error("total extinction at time {time}")]
    TotalExtinction { time: f64 },

    /// A structural precondition was not met (bound exceeded, no connected
    /// root, degenerate outcome). Recoverable by running again.
    #[error("process failed - {0}")]
    Failed(String),

    /// Logic defect, never retried.
    #[error("{0}")]
    InvariantViolation(String),
}

impl From<CompileError> for ProcessError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::InvariantViolation(msg) => ProcessError::InvariantViolation(msg),
            other => ProcessError::Failed(other.to_string()),
        }
    }
}

impl ProcessError {
    pub(crate) fn failed<S: Into<String>>(msg: S) -> Self {
        ProcessError::Failed(msg.into())
    }

    pub(crate) fn invariant<S: Into<String>>(msg: S) -> Self {
        ProcessError::InvariantViolation(msg.into())
    }
}
