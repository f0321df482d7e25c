//! Evolutionary algorithm framework.
//!
//! A generic, domain-agnostic evolutionary engine assembled from
//! interchangeable strategies. The user supplies a genotype type `G`, a
//! [`FitnessFunction`] and an [`Initializer`] (or a [`Problem`] providing
//! both); every other step of the generational loop is a pluggable strategy.
//!
//! # Core Traits
//!
//! - [`ParentSelection`]: chooses who reproduces
//! - [`Reproduction`]: composes a [`Crossover`] and a [`Mutation`] into offspring
//! - [`SurvivorSelection`]: chooses the next generation
//! - [`GenerationLogger`]: observes a run
//!
//! # Key Types
//!
//! - [`EaConfig`]: Loop parameters (population size, direction, stop criteria)
//! - [`EvolutionaryAlgorithm`]: Executes the generational loop
//! - [`EaResult`]: Best individual, history and termination reason
//! - [`History`]: Per-generation statistics
//!
//! # Submodules
//!
//! - [`operators`]: Permutation crossover (OX, PMX, CX) and mutation operators
//!
//! # References
//!
//! - Eiben & Smith (2015), *Introduction to Evolutionary Computing*
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
mod history;
mod logger;
pub mod operators;
mod reproduction;
mod runner;
mod selection;
mod survivor;
mod types;

pub use config::EaConfig;
pub use history::{GenerationRecord, History};
pub use logger::{GenerationLogger, LogLevel, RunInfo, StreamLogger, TracingLogger};
pub use operators::{
    Crossover, CycleCrossover, IdentityCrossover, InsertMutation, InversionMutation, Mutation,
    OrderCrossover, PartiallyMappedCrossover, SwapMutation,
};
pub use reproduction::{
    ExclusiveReproduction, MutationOnlyReproduction, Reproduction, StandardReproduction,
};
pub use runner::{EaBuilder, EaResult, EvolutionaryAlgorithm, Termination};
pub use selection::{
    ParentSelection, RankSelection, RouletteSelection, TournamentSelection, UniformSelection,
};
pub use survivor::{
    AgeBasedSelection, CommaSelection, PlusAgeBasedSelection, PlusSelection, SurvivorSelection,
};
pub use types::{
    try_fitness, EvolutionContext, FitnessFunction, Individual, Initializer, Objective, Problem,
    Rate, TryFitness,
};
