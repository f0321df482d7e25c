//! Engine configuration.
//!
//! [`EaConfig`] holds the parameters that control the generational loop.
//! Strategy-specific parameters (tournament size, operator rates, ...)
//! live on the strategy objects themselves.

use super::types::Objective;
use crate::error::EaError;

/// Configuration for the evolutionary engine.
///
/// # Defaults
///
/// ```
/// use u_evolve::ea::{EaConfig, Objective};
///
/// let config = EaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.objective, Objective::Maximize);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::ea::{EaConfig, Objective};
///
/// let config = EaConfig::default()
///     .with_population_size(50)
///     .with_objective(Objective::Minimize)
///     .with_stagnation_limit(30)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EaConfig {
    /// Number of individuals kept at every generation boundary.
    pub population_size: usize,

    /// Number of parents requested from parent selection each generation.
    ///
    /// `None` requests `population_size` parents.
    pub parent_count: Option<usize>,

    /// Optimization direction shared by every strategy.
    pub objective: Objective,

    /// Number of generations without improvement of the best-ever fitness
    /// before stopping.
    ///
    /// Set to 0 to disable stagnation-based termination.
    pub stagnation_limit: usize,

    /// Stop as soon as the best-ever fitness reaches this value
    /// (`>=` when maximizing, `<=` when minimizing).
    pub target_fitness: Option<f64>,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked at generation boundaries, so a run may exceed the limit by
    /// one generation's worth of work.
    pub time_limit_ms: Option<u64>,

    /// Random seed for reproducibility.
    ///
    /// `None` draws a random seed. Ignored when the builder is given an
    /// explicit random source.
    pub seed: Option<u64>,
}

impl Default for EaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            parent_count: None,
            objective: Objective::Maximize,
            stagnation_limit: 0,
            target_fitness: None,
            time_limit_ms: None,
            seed: None,
        }
    }
}

impl EaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of parents selected per generation.
    pub fn with_parent_count(mut self, n: usize) -> Self {
        self.parent_count = Some(n);
        self
    }

    /// Sets the optimization direction.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Sets the fitness at which the run stops early.
    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = Some(target);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of parents requested each generation.
    pub fn effective_parent_count(&self) -> usize {
        self.parent_count.unwrap_or(self.population_size)
    }

    /// Returns `true` when `fitness` satisfies the configured target.
    pub fn target_reached(&self, fitness: f64) -> bool {
        match self.target_fitness {
            Some(target) => match self.objective {
                Objective::Maximize => fitness >= target,
                Objective::Minimize => fitness <= target,
            },
            None => false,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), EaError> {
        if self.population_size == 0 {
            return Err(EaError::configuration("population_size must be at least 1"));
        }
        if self.parent_count == Some(0) {
            return Err(EaError::configuration("parent_count must be at least 1"));
        }
        if let Some(target) = self.target_fitness {
            if !target.is_finite() {
                return Err(EaError::configuration(format!(
                    "target_fitness must be finite, got {target}"
                )));
            }
        }
        if self.time_limit_ms == Some(0) {
            return Err(EaError::configuration("time_limit_ms must be positive or None"));
        }
        Ok(())
    }
}
