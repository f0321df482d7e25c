//! Per-generation statistics.

use super::types::{Individual, Objective};

/// Summary statistics of one completed generation.
///
/// Generation 0 describes the initial population. "Best" and "worst"
/// follow the run's [`Objective`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationRecord {
    /// Generation index.
    pub generation: usize,
    /// Best fitness in the population.
    pub best_fitness: f64,
    /// Mean fitness of the population.
    pub mean_fitness: f64,
    /// Population standard deviation (divides by n) of the fitness.
    pub std_fitness: f64,
    /// Worst fitness in the population.
    pub worst_fitness: f64,
    /// Age of the best individual in the population.
    pub best_age: usize,
}

impl GenerationRecord {
    /// Computes the statistics of a population.
    ///
    /// Returns `None` for an empty population.
    pub fn from_population<G>(
        generation: usize,
        population: &[Individual<G>],
        objective: Objective,
    ) -> Option<Self> {
        let best = objective.best_of(population)?;
        let worst = objective.worst_of(population)?;

        let n = population.len() as f64;
        let mean = population.iter().map(|i| i.fitness()).sum::<f64>() / n;
        let variance = population
            .iter()
            .map(|i| (i.fitness() - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            generation,
            best_fitness: best.fitness(),
            mean_fitness: mean,
            std_fitness: variance.sqrt(),
            worst_fitness: worst.fitness(),
            best_age: best.age(),
        })
    }
}

/// Append-only sequence of [`GenerationRecord`]s, one per completed
/// generation, starting with generation 0.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct History {
    records: Vec<GenerationRecord>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: GenerationRecord) {
        self.records.push(record);
    }

    /// All records in generation order.
    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    /// Number of recorded generations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&GenerationRecord> {
        self.records.last()
    }

    /// Best fitness of every generation, for convergence plots.
    pub fn best_fitness_series(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.best_fitness).collect()
    }

    /// Mean fitness of every generation.
    pub fn mean_fitness_series(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.mean_fitness).collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a GenerationRecord;
    type IntoIter = std::slice::Iter<'a, GenerationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
