//! Survivor selection policies.
//!
//! After reproduction the engine holds the current population (already
//! aged by one generation) and the freshly evaluated offspring (age 0).
//! A [`SurvivorSelection`] decides which `population_size` of them form
//! the next generation.
//!
//! | Policy | Pool | Notes |
//! |--------|------|-------|
//! | [`PlusSelection`] | parents ∪ offspring | (μ+λ), elitist |
//! | [`CommaSelection`] | offspring only | (μ,λ), requires λ ≥ μ |
//! | [`AgeBasedSelection`] | youngest parents + first offspring | generational gap |
//! | [`PlusAgeBasedSelection`] | (μ+λ) among individuals under an age limit | |
//!
//! Ties are resolved by a stable sort, so current-population members come
//! before offspring of equal fitness, each in their original order.

use super::types::{Individual, Objective};
use crate::error::EaError;

/// Chooses the next generation.
pub trait SurvivorSelection<G> {
    /// Returns exactly `population_size` individuals drawn from
    /// `parents` (the aged current population) and `offspring`.
    fn select_survivors(
        &self,
        parents: Vec<Individual<G>>,
        offspring: Vec<Individual<G>>,
        population_size: usize,
        objective: Objective,
    ) -> Result<Vec<Individual<G>>, EaError>;
}

/// (μ+λ) selection: the best `population_size` of parents and offspring.
///
/// The best individual found so far can never be lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlusSelection;

impl<G> SurvivorSelection<G> for PlusSelection {
    fn select_survivors(
        &self,
        mut parents: Vec<Individual<G>>,
        offspring: Vec<Individual<G>>,
        population_size: usize,
        objective: Objective,
    ) -> Result<Vec<Individual<G>>, EaError> {
        parents.extend(offspring);
        if parents.len() < population_size {
            return Err(EaError::configuration(format!(
                "plus selection needs {population_size} candidates, got {}",
                parents.len()
            )));
        }
        Ok(truncate_best(parents, population_size, objective))
    }
}

/// (μ,λ) selection: the best `population_size` offspring; parents die.
///
/// Not elitist. Fails if fewer offspring than `population_size` exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommaSelection;

impl<G> SurvivorSelection<G> for CommaSelection {
    fn select_survivors(
        &self,
        _parents: Vec<Individual<G>>,
        offspring: Vec<Individual<G>>,
        population_size: usize,
        objective: Objective,
    ) -> Result<Vec<Individual<G>>, EaError> {
        if offspring.len() < population_size {
            return Err(EaError::configuration(format!(
                "comma selection needs at least {population_size} offspring, got {}",
                offspring.len()
            )));
        }
        Ok(truncate_best(offspring, population_size, objective))
    }
}

/// Generational-gap replacement by age.
///
/// Each generation `round(generational_gap * population_size)` of the
/// oldest parents are replaced by offspring, taken in the order
/// reproduction produced them. Fitness plays no role, so the policy is
/// not elitist.
///
/// A gap of 1.0 replaces the whole population (a simple generational GA).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeBasedSelection {
    generational_gap: f64,
}

impl AgeBasedSelection {
    /// Creates the policy.
    ///
    /// # Errors
    /// [`EaError::Configuration`] unless `0 < generational_gap <= 1`.
    pub fn new(generational_gap: f64) -> Result<Self, EaError> {
        if !(generational_gap > 0.0 && generational_gap <= 1.0) {
            return Err(EaError::configuration(format!(
                "generational_gap must be in (0, 1], got {generational_gap}"
            )));
        }
        Ok(Self { generational_gap })
    }

    /// Fraction of the population replaced each generation.
    pub fn generational_gap(&self) -> f64 {
        self.generational_gap
    }

    /// Number of parents replaced for a population of `population_size`.
    pub fn replaced(&self, population_size: usize) -> usize {
        let replaced = (self.generational_gap * population_size as f64).round() as usize;
        replaced.clamp(1, population_size.max(1))
    }
}

impl<G> SurvivorSelection<G> for AgeBasedSelection {
    fn select_survivors(
        &self,
        mut parents: Vec<Individual<G>>,
        offspring: Vec<Individual<G>>,
        population_size: usize,
        _objective: Objective,
    ) -> Result<Vec<Individual<G>>, EaError> {
        if population_size == 0 {
            return Err(EaError::configuration(
                "age-based selection needs a population size of at least 1",
            ));
        }
        let replaced = self.replaced(population_size);
        let kept = population_size - replaced;

        if offspring.len() < replaced {
            return Err(EaError::configuration(format!(
                "age-based selection replaces {replaced} individuals but only {} offspring were produced",
                offspring.len()
            )));
        }
        if parents.len() < kept {
            return Err(EaError::configuration(format!(
                "age-based selection keeps {kept} parents but only {} are available",
                parents.len()
            )));
        }

        // Youngest first; stable, so equal ages keep population order
        parents.sort_by_key(|ind| ind.age());
        parents.truncate(kept);
        parents.extend(offspring.into_iter().take(replaced));
        Ok(parents)
    }
}

/// (μ+λ) selection restricted to individuals no older than `max_age`.
///
/// If fewer than `population_size` candidates are young enough, the gap
/// is filled with the best over-age individuals so the population size
/// never shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlusAgeBasedSelection {
    max_age: usize,
}

impl PlusAgeBasedSelection {
    /// Creates the policy.
    pub fn new(max_age: usize) -> Self {
        Self { max_age }
    }

    /// Maximum age an individual may reach and still compete normally.
    pub fn max_age(&self) -> usize {
        self.max_age
    }
}

impl<G> SurvivorSelection<G> for PlusAgeBasedSelection {
    fn select_survivors(
        &self,
        parents: Vec<Individual<G>>,
        offspring: Vec<Individual<G>>,
        population_size: usize,
        objective: Objective,
    ) -> Result<Vec<Individual<G>>, EaError> {
        let total = parents.len() + offspring.len();
        if total < population_size {
            return Err(EaError::configuration(format!(
                "plus age-based selection needs {population_size} candidates, got {total}"
            )));
        }

        let (young, old): (Vec<_>, Vec<_>) = parents
            .into_iter()
            .chain(offspring)
            .partition(|ind| ind.age() <= self.max_age);

        let mut survivors = truncate_best(young, population_size, objective);
        if survivors.len() < population_size {
            let missing = population_size - survivors.len();
            survivors.extend(truncate_best(old, missing, objective));
        }
        Ok(survivors)
    }
}

/// Stable best-first sort, then truncation to `n`.
fn truncate_best<G>(
    mut pool: Vec<Individual<G>>,
    n: usize,
    objective: Objective,
) -> Vec<Individual<G>> {
    pool.sort_by(|a, b| objective.cmp_best_first(a.fitness(), b.fitness()));
    pool.truncate(n);
    pool
}
