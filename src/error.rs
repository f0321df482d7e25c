//! Error taxonomy for the evolutionary engine.
//!
//! Every error aborts the run at the point of occurrence. Nothing from the
//! failing generation is committed to the population or the history.

/// Errors raised while configuring or running an evolutionary algorithm.
#[derive(Debug, thiserror::Error)]
pub enum EaError {
    /// Invalid construction parameters or a strategy that broke its
    /// size contract (wrong parent count, wrong survivor count, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A crossover or mutation operator received a genotype it cannot handle.
    #[error("representation error{}: {reason}", generation_suffix(.generation))]
    Representation {
        /// Generation being produced when the error surfaced, if known.
        generation: Option<usize>,
        /// What was wrong with the genotype.
        reason: String,
    },

    /// The fitness function failed or returned an unusable value.
    #[error("evaluation error in generation {generation}, individual {index}: {source}")]
    Evaluation {
        /// Generation being evaluated (0 is initialization).
        generation: usize,
        /// Position of the genotype within the evaluated batch.
        index: usize,
        /// The rejected evaluation.
        #[source]
        source: EvaluationFailure,
    },
}

/// Why a single fitness evaluation was rejected.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationFailure {
    /// The fitness function returned an error.
    #[error("fitness function failed: {0}")]
    Failed(#[from] anyhow::Error),

    /// The fitness function returned NaN or an infinity.
    #[error("fitness must be finite, got {0}")]
    NonFinite(f64),
}

impl EaError {
    /// Creates a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Creates a representation error without generation context.
    ///
    /// The engine attaches the generation index when the error surfaces
    /// from a reproduction step.
    pub fn representation(reason: impl Into<String>) -> Self {
        Self::Representation {
            generation: None,
            reason: reason.into(),
        }
    }

    /// Attaches a generation index to errors that do not carry one yet.
    pub(crate) fn in_generation(self, generation: usize) -> Self {
        match self {
            Self::Representation {
                generation: None,
                reason,
            } => Self::Representation {
                generation: Some(generation),
                reason,
            },
            Self::Configuration(reason) => {
                Self::Configuration(format!("generation {generation}: {reason}"))
            }
            other => other,
        }
    }
}

fn generation_suffix(generation: &Option<usize>) -> String {
    match generation {
        Some(g) => format!(" in generation {g}"),
        None => String::new(),
    }
}
