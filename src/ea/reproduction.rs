//! Reproduction strategies.
//!
//! A reproduction strategy turns the selected parents into offspring
//! genotypes by composing a [`Crossover`] and a [`Mutation`] operator
//! under a fixed policy:
//!
//! - [`StandardReproduction`]: crossover with some probability, then
//!   mutation with some probability
//! - [`ExclusiveReproduction`]: crossover *or* mutation, never both
//! - [`MutationOnlyReproduction`]: every offspring is a mutated parent copy
//!
//! Parents are consumed in consecutive pairs `(0, 1), (2, 3), ...`. An odd
//! trailing parent has no partner; it is copied through and still subject
//! to mutation where the policy mutates.

use super::operators::{Crossover, Mutation};
use super::types::{EvolutionContext, Individual, Rate};
use crate::error::EaError;
use rand::Rng;

/// Produces offspring genotypes from a sequence of parents.
///
/// Offspring are returned unevaluated; the engine computes their fitness.
pub trait Reproduction<G> {
    /// Creates the offspring of one generation.
    fn reproduce(
        &self,
        parents: &[Individual<G>],
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<G>, EaError>;
}

/// Crossover with probability `crossover_rate`, then mutation of every
/// child with probability `mutation_rate`.
///
/// When crossover is skipped, the two parents are copied unchanged.
///
/// # Examples
///
/// ```
/// use u_evolve::ea::{OrderCrossover, Rate, StandardReproduction, SwapMutation};
///
/// let reproduction = StandardReproduction::new(OrderCrossover, SwapMutation)
///     .with_crossover_rate(0.8)
///     .with_mutation_rate(Rate::scheduled(|gen| 0.3 / (gen as f64 + 1.0)));
/// # let _ = reproduction;
/// ```
#[derive(Debug, Clone)]
pub struct StandardReproduction<C, M> {
    crossover: C,
    mutation: M,
    crossover_rate: Rate,
    mutation_rate: Rate,
}

impl<C, M> StandardReproduction<C, M> {
    /// Creates the strategy with crossover rate 0.9 and mutation rate 0.1.
    pub fn new(crossover: C, mutation: M) -> Self {
        Self {
            crossover,
            mutation,
            crossover_rate: Rate::Constant(0.9),
            mutation_rate: Rate::Constant(0.1),
        }
    }

    /// Sets the probability that a parent pair undergoes crossover.
    pub fn with_crossover_rate(mut self, rate: impl Into<Rate>) -> Self {
        self.crossover_rate = rate.into();
        self
    }

    /// Sets the probability that a child is mutated.
    pub fn with_mutation_rate(mut self, rate: impl Into<Rate>) -> Self {
        self.mutation_rate = rate.into();
        self
    }
}

impl<G, C, M> Reproduction<G> for StandardReproduction<C, M>
where
    G: Clone,
    C: Crossover<G>,
    M: Mutation<G>,
{
    fn reproduce(
        &self,
        parents: &[Individual<G>],
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<G>, EaError> {
        let crossover_rate = self.crossover_rate.at(ctx.generation);
        let mutation_rate = self.mutation_rate.at(ctx.generation);
        let mut offspring = Vec::with_capacity(parents.len());

        for pair in parents.chunks(2) {
            let children = match pair {
                [p1, p2] if ctx.rng.random_range(0.0..1.0) < crossover_rate => {
                    self.crossover
                        .crossover(p1.genotype(), p2.genotype(), &mut *ctx.rng)?
                }
                _ => copy_genotypes(pair),
            };

            for mut child in children {
                if ctx.rng.random_range(0.0..1.0) < mutation_rate {
                    self.mutation.mutate(&mut child, &mut *ctx.rng)?;
                }
                offspring.push(child);
            }
        }

        Ok(offspring)
    }
}

/// Crossover with probability `crossover_share`, otherwise mutation of
/// both parent copies. No offspring is ever both recombined and mutated,
/// which isolates the marginal contribution of each operator.
#[derive(Debug, Clone)]
pub struct ExclusiveReproduction<C, M> {
    crossover: C,
    mutation: M,
    crossover_share: Rate,
}

impl<C, M> ExclusiveReproduction<C, M> {
    /// Creates the strategy with an even split between the two operators.
    pub fn new(crossover: C, mutation: M) -> Self {
        Self {
            crossover,
            mutation,
            crossover_share: Rate::Constant(0.5),
        }
    }

    /// Sets the probability that a pair goes through crossover rather
    /// than mutation.
    pub fn with_crossover_share(mut self, share: impl Into<Rate>) -> Self {
        self.crossover_share = share.into();
        self
    }
}

impl<G, C, M> Reproduction<G> for ExclusiveReproduction<C, M>
where
    G: Clone,
    C: Crossover<G>,
    M: Mutation<G>,
{
    fn reproduce(
        &self,
        parents: &[Individual<G>],
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<G>, EaError> {
        let share = self.crossover_share.at(ctx.generation);
        let mut offspring = Vec::with_capacity(parents.len());

        for pair in parents.chunks(2) {
            match pair {
                [p1, p2] if ctx.rng.random_range(0.0..1.0) < share => {
                    offspring.extend(self.crossover.crossover(
                        p1.genotype(),
                        p2.genotype(),
                        &mut *ctx.rng,
                    )?);
                }
                _ => {
                    for mut child in copy_genotypes(pair) {
                        self.mutation.mutate(&mut child, &mut *ctx.rng)?;
                        offspring.push(child);
                    }
                }
            }
        }

        Ok(offspring)
    }
}

/// Skips crossover entirely: every offspring is a mutated copy of one
/// parent, so the offspring count equals the parent count.
#[derive(Debug, Clone)]
pub struct MutationOnlyReproduction<M> {
    mutation: M,
}

impl<M> MutationOnlyReproduction<M> {
    /// Creates the strategy.
    pub fn new(mutation: M) -> Self {
        Self { mutation }
    }
}

impl<G, M> Reproduction<G> for MutationOnlyReproduction<M>
where
    G: Clone,
    M: Mutation<G>,
{
    fn reproduce(
        &self,
        parents: &[Individual<G>],
        ctx: &mut EvolutionContext<'_>,
    ) -> Result<Vec<G>, EaError> {
        parents
            .iter()
            .map(|parent| {
                let mut child = parent.genotype().clone();
                self.mutation.mutate(&mut child, &mut *ctx.rng)?;
                Ok(child)
            })
            .collect()
    }
}

fn copy_genotypes<G: Clone>(parents: &[Individual<G>]) -> Vec<G> {
    parents.iter().map(|p| p.genotype().clone()).collect()
}
