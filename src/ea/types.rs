//! Core type definitions for the evolutionary engine.
//!
//! [`Individual`] ties a genotype to the fitness the engine computed for it.
//! [`FitnessFunction`] and [`Initializer`] are the two problem-side
//! contracts, and [`Problem`] bundles both on one object; [`EvolutionContext`]
//! carries the per-call state every stochastic strategy receives.

use rand::RngCore;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Optimization direction.
///
/// Configured once per run and passed to every strategy call, so
/// selection and survival always agree on what "better" means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Objective {
    /// Higher fitness is better.
    #[default]
    Maximize,
    /// Lower fitness is better.
    Minimize,
}

impl Objective {
    /// Returns `true` if fitness `a` is strictly better than `b`.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Objective::Maximize => a > b,
            Objective::Minimize => a < b,
        }
    }

    /// Total order placing the better fitness first.
    ///
    /// Suitable for `sort_by`; equal fitnesses compare `Equal`, so a
    /// stable sort keeps their original order.
    pub fn cmp_best_first(self, a: f64, b: f64) -> Ordering {
        match self {
            Objective::Maximize => b.total_cmp(&a),
            Objective::Minimize => a.total_cmp(&b),
        }
    }

    /// Returns the best individual of a slice, first one on ties.
    pub fn best_of<G>(self, population: &[Individual<G>]) -> Option<&Individual<G>> {
        population.iter().reduce(|best, ind| {
            if self.is_better(ind.fitness, best.fitness) {
                ind
            } else {
                best
            }
        })
    }

    /// Returns the worst individual of a slice, first one on ties.
    pub fn worst_of<G>(self, population: &[Individual<G>]) -> Option<&Individual<G>> {
        population.iter().reduce(|worst, ind| {
            if self.is_better(worst.fitness, ind.fitness) {
                ind
            } else {
                worst
            }
        })
    }
}

/// A candidate solution in the population.
///
/// An `Individual` always carries the fitness the engine computed for its
/// genotype. Candidates that have not been evaluated yet are plain
/// genotypes (what reproduction returns), so no selection code can read a
/// missing fitness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Individual<G> {
    genotype: G,
    fitness: f64,
    age: usize,
}

impl<G> Individual<G> {
    /// Creates a newborn (age 0) individual with an evaluated fitness.
    pub fn new(genotype: G, fitness: f64) -> Self {
        Self {
            genotype,
            fitness,
            age: 0,
        }
    }

    /// Sets the age. Mostly useful for tests and custom survivor policies.
    pub fn with_age(mut self, age: usize) -> Self {
        self.age = age;
        self
    }

    /// Returns the genotype.
    pub fn genotype(&self) -> &G {
        &self.genotype
    }

    /// Consumes the individual and returns its genotype.
    pub fn into_genotype(self) -> G {
        self.genotype
    }

    /// Returns the fitness computed for this genotype.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Number of generations this individual has survived.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Returns this individual one generation older.
    pub fn aged(mut self) -> Self {
        self.age += 1;
        self
    }
}

/// Problem-side fitness contract.
///
/// Called exactly once per genotype at each evaluation point. Implemented
/// for every `Fn(&G) -> f64`; use [`try_fitness`] for fallible functions.
pub trait FitnessFunction<G> {
    /// Computes the fitness of a genotype.
    fn evaluate(&self, genotype: &G) -> anyhow::Result<f64>;
}

impl<G, F> FitnessFunction<G> for F
where
    F: Fn(&G) -> f64,
{
    fn evaluate(&self, genotype: &G) -> anyhow::Result<f64> {
        Ok(self(genotype))
    }
}

/// Adapter for fitness functions that can fail.
///
/// Created by [`try_fitness`].
pub struct TryFitness<F>(F);

/// Wraps a fallible closure as a [`FitnessFunction`].
///
/// ```
/// use u_evolve::ea::try_fitness;
///
/// let f = try_fitness(|x: &Vec<f64>| {
///     anyhow::ensure!(!x.is_empty(), "empty genotype");
///     Ok(x.iter().sum())
/// });
/// # let _ = f;
/// ```
pub fn try_fitness<G, F>(f: F) -> TryFitness<F>
where
    F: Fn(&G) -> anyhow::Result<f64>,
{
    TryFitness(f)
}

impl<G, F> FitnessFunction<G> for TryFitness<F>
where
    F: Fn(&G) -> anyhow::Result<f64>,
{
    fn evaluate(&self, genotype: &G) -> anyhow::Result<f64> {
        (self.0)(genotype)
    }
}

/// Problem-side initialization contract.
///
/// Called exactly `population_size` times at generation 0. Each call must
/// be an independent draw from the supplied random source.
pub trait Initializer<G> {
    /// Creates a new genotype.
    fn create(&self, rng: &mut dyn RngCore) -> G;
}

impl<G, F> Initializer<G> for F
where
    F: Fn(&mut dyn RngCore) -> G,
{
    fn create(&self, rng: &mut dyn RngCore) -> G {
        self(rng)
    }
}

/// A problem definition: how to create genotypes and how to score them.
///
/// Bundles the [`Initializer`] and [`FitnessFunction`] contracts for
/// problems that keep shared data (distance matrices, instance files) on
/// one object. Register it with [`EaBuilder::problem`](super::EaBuilder::problem).
///
/// # Examples
///
/// ```
/// use rand::{Rng, RngCore};
/// use u_evolve::ea::Problem;
///
/// struct OneMax {
///     len: usize,
/// }
///
/// impl Problem<Vec<bool>> for OneMax {
///     fn create(&self, rng: &mut dyn RngCore) -> Vec<bool> {
///         (0..self.len).map(|_| rng.random_bool(0.5)).collect()
///     }
///
///     fn evaluate(&self, genotype: &Vec<bool>) -> anyhow::Result<f64> {
///         Ok(genotype.iter().filter(|&&b| b).count() as f64)
///     }
/// }
///
/// let problem = OneMax { len: 4 };
/// assert_eq!(problem.evaluate(&vec![true, false, true, true]).unwrap(), 3.0);
/// ```
pub trait Problem<G> {
    /// Creates a new random genotype.
    fn create(&self, rng: &mut dyn RngCore) -> G;

    /// Computes the fitness of a genotype.
    fn evaluate(&self, genotype: &G) -> anyhow::Result<f64>;
}

/// Per-call state handed to stochastic strategies.
///
/// The engine owns the only random source of a run; every draw a
/// strategy makes goes through `rng`, which makes a seeded run exactly
/// reproducible.
pub struct EvolutionContext<'a> {
    /// Index of the generation being produced (1-based; 0 is initialization).
    pub generation: usize,
    /// Optimization direction of the run.
    pub objective: Objective,
    /// The run's random source.
    pub rng: &'a mut dyn RngCore,
}

impl<'a> EvolutionContext<'a> {
    /// Creates a context.
    pub fn new(generation: usize, objective: Objective, rng: &'a mut dyn RngCore) -> Self {
        Self {
            generation,
            objective,
            rng,
        }
    }
}

/// A probability that may change with the generation index.
///
/// # Examples
///
/// ```
/// use u_evolve::ea::Rate;
///
/// let fixed = Rate::from(0.9);
/// assert_eq!(fixed.at(100), 0.9);
///
/// // Mutation rate halving over the first generations
/// let decay = Rate::scheduled(|gen| 0.5 / (gen as f64 + 1.0));
/// assert_eq!(decay.at(1), 0.25);
/// ```
#[derive(Clone)]
pub enum Rate {
    /// The same probability every generation.
    Constant(f64),
    /// Probability computed from the generation index.
    Scheduled(Arc<dyn Fn(usize) -> f64 + Send + Sync>),
}

impl Rate {
    /// Creates a generation-dependent rate.
    pub fn scheduled(f: impl Fn(usize) -> f64 + Send + Sync + 'static) -> Self {
        Rate::Scheduled(Arc::new(f))
    }

    /// Resolves the probability for a generation, clamped to `[0, 1]`.
    ///
    /// A NaN schedule output resolves to 0.
    pub fn at(&self, generation: usize) -> f64 {
        let p = match self {
            Rate::Constant(p) => *p,
            Rate::Scheduled(f) => f(generation),
        };
        if p.is_nan() {
            0.0
        } else {
            p.clamp(0.0, 1.0)
        }
    }
}

impl From<f64> for Rate {
    fn from(p: f64) -> Self {
        Rate::Constant(p)
    }
}

impl fmt::Debug for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Constant(p) => f.debug_tuple("Constant").field(p).finish(),
            Rate::Scheduled(_) => f.write_str("Scheduled(..)"),
        }
    }
}
