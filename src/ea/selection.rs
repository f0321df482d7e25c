//! Parent selection strategies.
//!
//! Selection determines which individuals reproduce. Different strategies
//! provide different selection pressure; the engine is indifferent to
//! which one is plugged in.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::types::{EvolutionContext, Individual, Objective};
use crate::error::EaError;
use rand::seq::index;
use rand::{Rng, RngCore};

/// Chooses the parents of the next batch of offspring.
///
/// Implementations return exactly `count` individuals (duplicates allowed)
/// and never mutate the population.
pub trait ParentSelection<G> {
    /// Selects `count` parents from an evaluated population.
    fn select(
        &self,
        population: &[Individual<G>],
        count: usize,
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<Individual<G>>, EaError>;
}

fn ensure_non_empty<G>(population: &[Individual<G>]) -> Result<(), EaError> {
    if population.is_empty() {
        return Err(EaError::configuration("cannot select from empty population"));
    }
    Ok(())
}

/// Tournament selection: draw `k` contenders, keep the best.
///
/// Higher `k` = stronger selection pressure.
/// - k=2: light pressure (good for diversity)
/// - k=3-5: moderate pressure (typical default)
/// - k>5: strong pressure (risk of premature convergence)
///
/// By default the contenders of one tournament are distinct individuals
/// (`k` is clamped to the population size), so `k == population_size`
/// always selects the best individual. [`with_replacement`] draws the
/// contenders independently instead.
///
/// # Complexity
/// O(k) per selected parent
///
/// [`with_replacement`]: TournamentSelection::with_replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSelection {
    k: usize,
    replacement: bool,
}

impl TournamentSelection {
    /// Creates a tournament of size `k`.
    ///
    /// Returns [`EaError::Configuration`] if `k < 2`.
    pub fn new(k: usize) -> Result<Self, EaError> {
        if k < 2 {
            return Err(EaError::configuration(format!(
                "tournament size must be at least 2, got {k}"
            )));
        }
        Ok(Self {
            k,
            replacement: false,
        })
    }

    /// Samples tournament contenders with replacement.
    pub fn with_replacement(mut self) -> Self {
        self.replacement = true;
        self
    }

    /// Tournament size.
    pub fn k(&self) -> usize {
        self.k
    }

    fn run_tournament<G>(
        &self,
        population: &[Individual<G>],
        objective: Objective,
        rng: &mut dyn RngCore,
    ) -> usize {
        let n = population.len();
        if n == 1 {
            return 0;
        }

        let better = |a: usize, b: usize| {
            if objective.is_better(population[a].fitness(), population[b].fitness()) {
                a
            } else {
                b
            }
        };

        if self.replacement {
            let mut best_idx = rng.random_range(0..n);
            for _ in 1..self.k {
                best_idx = better(rng.random_range(0..n), best_idx);
            }
            best_idx
        } else {
            let contenders = index::sample(rng, n, self.k.min(n));
            let mut iter = contenders.iter();
            let first = iter.next().unwrap_or(0);
            iter.fold(first, |best, idx| better(idx, best))
        }
    }
}

impl<G: Clone> ParentSelection<G> for TournamentSelection {
    fn select(
        &self,
        population: &[Individual<G>],
        count: usize,
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<Individual<G>>, EaError> {
        ensure_non_empty(population)?;
        Ok((0..count)
            .map(|_| {
                let idx = self.run_tournament(population, ctx.objective, &mut *ctx.rng);
                population[idx].clone()
            })
            .collect())
    }
}

/// Uniform selection with replacement: every individual is equally likely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformSelection;

impl<G: Clone> ParentSelection<G> for UniformSelection {
    fn select(
        &self,
        population: &[Individual<G>],
        count: usize,
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<Individual<G>>, EaError> {
        ensure_non_empty(population)?;
        let n = population.len();
        Ok((0..count)
            .map(|_| population[ctx.rng.random_range(0..n)].clone())
            .collect())
    }
}

/// Fitness-proportionate (roulette wheel) selection.
///
/// Fitness is shifted so that the worst individual gets a weight of
/// `epsilon` and better individuals proportionally more, which works for
/// both optimization directions and for negative fitness values.
///
/// **Warning**: Susceptible to super-individual dominance when
/// fitness variance is high.
///
/// # Complexity
/// O(n) per generation to build weights, O(n) per selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouletteSelection;

impl RouletteSelection {
    const EPSILON: f64 = 1e-10;

    fn weights<G>(population: &[Individual<G>], objective: Objective) -> Vec<f64> {
        let fitnesses = population.iter().map(|ind| ind.fitness());
        match objective {
            Objective::Maximize => {
                let min = fitnesses.clone().fold(f64::INFINITY, f64::min);
                fitnesses.map(|f| (f - min).max(0.0) + Self::EPSILON).collect()
            }
            Objective::Minimize => {
                let max = fitnesses.clone().fold(f64::NEG_INFINITY, f64::max);
                fitnesses.map(|f| (max - f).max(0.0) + Self::EPSILON).collect()
            }
        }
    }
}

impl<G: Clone> ParentSelection<G> for RouletteSelection {
    fn select(
        &self,
        population: &[Individual<G>],
        count: usize,
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<Individual<G>>, EaError> {
        ensure_non_empty(population)?;
        let weights = Self::weights(population, ctx.objective);
        Ok((0..count)
            .map(|_| population[spin(&weights, &mut *ctx.rng)].clone())
            .collect())
    }
}

/// Rank-based selection.
///
/// Individuals are sorted by fitness and selection probability is
/// proportional to rank position, not raw fitness value. This avoids
/// the scaling problems of roulette wheel selection.
///
/// Linear ranking: the best of `n` individuals gets weight `n`, the
/// worst gets weight 1.
///
/// Reference: Baker (1985), "Adaptive Selection Methods for Genetic
/// Algorithms"
///
/// # Complexity
/// O(n log n) per generation (sort), O(n) per selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankSelection;

impl<G: Clone> ParentSelection<G> for RankSelection {
    fn select(
        &self,
        population: &[Individual<G>],
        count: usize,
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<Individual<G>>, EaError> {
        ensure_non_empty(population)?;
        let n = population.len();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            ctx.objective
                .cmp_best_first(population[a].fitness(), population[b].fitness())
        });
        let weights: Vec<f64> = (0..n).map(|rank| (n - rank) as f64).collect();

        Ok((0..count)
            .map(|_| population[order[spin(&weights, &mut *ctx.rng)]].clone())
            .collect())
    }
}

/// Draws an index with probability proportional to `weights`.
fn spin(weights: &[f64], rng: &mut dyn RngCore) -> usize {
    let n = weights.len();
    if n == 1 {
        return 0;
    }

    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}
