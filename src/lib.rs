//! Domain-agnostic evolutionary computation framework.
//!
//! Provides a generational evolutionary algorithm whose every step is a
//! pluggable strategy:
//!
//! - **Parent selection**: tournament, roulette, rank, uniform
//! - **Reproduction**: standard (crossover then mutation), exclusive,
//!   mutation-only, driven by constant or generation-scheduled rates
//! - **Survivor selection**: (μ+λ), (μ,λ), age-based generational gap,
//!   age-limited (μ+λ)
//! - **Operators**: permutation crossover (OX, PMX, CX) and mutation
//!   (swap, insert, inversion)
//!
//! Runs are reproducible from a single seed, report per-generation
//! statistics, and stop on generation count, stagnation, target fitness,
//! time limit, a user predicate, or external cancellation.
//!
//! # Architecture
//!
//! The crate contains no domain-specific concepts: genotypes are any
//! `G: Clone`, and problems are defined by a fitness function and an
//! initializer supplied by the consumer.

pub mod ea;
pub mod error;

pub use error::EaError;
