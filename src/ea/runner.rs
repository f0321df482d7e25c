//! The generational loop.
//!
//! [`EvolutionaryAlgorithm`] orchestrates one run:
//! initialization → evaluation → parent selection → reproduction →
//! offspring evaluation → survivor selection → record → repeat.
//!
//! Every step is delegated to a pluggable strategy; the engine owns the
//! population, the history, the best individual found so far and the
//! single random source of the run.

use super::config::EaConfig;
use super::history::{GenerationRecord, History};
use super::logger::{GenerationLogger, RunInfo};
use super::reproduction::Reproduction;
use super::selection::ParentSelection;
use super::survivor::SurvivorSelection;
use super::types::{EvolutionContext, FitnessFunction, Individual, Initializer, Problem};
use crate::error::{EaError, EvaluationFailure};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::any::type_name;
use std::sync::atomic::{AtomicBool, Ordering};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// All requested generations were produced.
    Completed,
    /// The cancellation flag was set.
    Cancelled,
    /// The stop predicate returned `true`.
    StopPredicate,
    /// The best fitness did not improve for `stagnation_limit` generations.
    Stagnated,
    /// The best fitness reached `target_fitness`.
    TargetReached,
    /// `time_limit_ms` elapsed.
    TimeLimit,
}

/// Result of an evolutionary run.
#[derive(Debug, Clone)]
pub struct EaResult<G> {
    /// Best individual evaluated during the run, including offspring that
    /// did not survive.
    pub best: Individual<G>,

    /// Statistics of every completed generation, starting at generation 0.
    pub history: History,

    /// Number of generations produced after initialization.
    pub generations: usize,

    /// Why the run stopped.
    pub termination: Termination,
}

impl<G> EaResult<G> {
    /// Best fitness (same as `best.fitness()`).
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness()
    }
}

type StopPredicate = Box<dyn Fn(&GenerationRecord) -> bool>;

/// Names of the plugged strategies, reported to loggers.
#[derive(Debug, Clone, Copy)]
struct StrategyNames {
    parent_selection: &'static str,
    reproduction: &'static str,
    survivor_selection: &'static str,
}

/// A configured evolutionary algorithm.
///
/// # Examples
///
/// ```
/// use rand::Rng;
/// use u_evolve::ea::{
///     EaConfig, EvolutionaryAlgorithm, Objective, PlusSelection,
///     MutationOnlyReproduction, SwapMutation, TournamentSelection,
/// };
///
/// // Sort ten numbers by minimizing the number of out-of-order pairs
/// let mut ea = EvolutionaryAlgorithm::builder()
///     .config(
///         EaConfig::default()
///             .with_population_size(30)
///             .with_objective(Objective::Minimize)
///             .with_target_fitness(0.0)
///             .with_seed(7),
///     )
///     .initializer(|rng: &mut dyn rand::RngCore| {
///         let mut v: Vec<usize> = (0..10).collect();
///         for i in (1..v.len()).rev() {
///             v.swap(i, rng.random_range(0..=i));
///         }
///         v
///     })
///     .fitness(|v: &Vec<usize>| {
///         v.windows(2).filter(|w| w[0] > w[1]).count() as f64
///     })
///     .parent_selection(TournamentSelection::new(3).unwrap())
///     .reproduction(MutationOnlyReproduction::new(SwapMutation))
///     .survivor_selection(PlusSelection)
///     .build()
///     .unwrap();
///
/// let result = ea.run(500).unwrap();
/// assert_eq!(result.history.len(), result.generations + 1);
/// assert!(result.best_fitness() <= result.history.records()[0].best_fitness);
/// ```
pub struct EvolutionaryAlgorithm<G> {
    config: EaConfig,
    fitness: Box<dyn FitnessFunction<G>>,
    initializer: Box<dyn Initializer<G>>,
    parent_selection: Box<dyn ParentSelection<G>>,
    reproduction: Box<dyn Reproduction<G>>,
    survivor_selection: Box<dyn SurvivorSelection<G>>,
    logger: Option<Box<dyn GenerationLogger<G>>>,
    stop_when: Option<StopPredicate>,
    rng: Box<dyn RngCore>,
    seed: Option<u64>,
    names: StrategyNames,
    population: Vec<Individual<G>>,
    history: History,
    best: Option<Individual<G>>,
}

impl<G> EvolutionaryAlgorithm<G> {
    /// Starts building an engine.
    pub fn builder() -> EaBuilder<G> {
        EaBuilder::default()
    }

    /// Current population (empty before the first run).
    pub fn population(&self) -> &[Individual<G>] {
        &self.population
    }

    /// Statistics of the last run's completed generations.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Best individual evaluated during the last run.
    pub fn best(&self) -> Option<&Individual<G>> {
        self.best.as_ref()
    }

    /// Engine configuration.
    pub fn config(&self) -> &EaConfig {
        &self.config
    }
}

impl<G: Clone> EvolutionaryAlgorithm<G> {
    /// Runs the algorithm for up to `generations` generations.
    ///
    /// Every call starts a new run from a freshly initialized population;
    /// the random source keeps its state between calls.
    ///
    /// # Errors
    /// Any [`EaError`] raised by a strategy, the fitness function, or a
    /// broken size contract aborts the run. The population and history
    /// keep the state of the last completed generation.
    pub fn run(&mut self, generations: usize) -> Result<EaResult<G>, EaError> {
        self.run_with_cancel(generations, None)
    }

    /// Runs the algorithm with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the run stops
    /// before the next generation starts and returns the best individual
    /// found so far.
    #[tracing::instrument(
        level = "info",
        skip(self, cancel),
        fields(
            population_size = self.config.population_size,
            objective = ?self.config.objective,
            seed = ?self.seed
        )
    )]
    pub fn run_with_cancel(
        &mut self,
        generations: usize,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<EaResult<G>, EaError> {
        let started = Instant::now();
        let objective = self.config.objective;

        let info = RunInfo {
            generations,
            population_size: self.config.population_size,
            parent_count: self.config.effective_parent_count(),
            objective,
            seed: self.seed,
            parent_selection: self.names.parent_selection,
            reproduction: self.names.reproduction,
            survivor_selection: self.names.survivor_selection,
        };
        self.notify("on_start", |logger| logger.on_start(&info));

        self.initialize()?;

        let mut stagnation = 0usize;
        let mut completed = 0usize;
        let mut termination = self.early_stop(stagnation, started);

        if termination.is_none() {
            for generation in 1..=generations {
                if cancel
                    .as_ref()
                    .is_some_and(|flag| flag.load(Ordering::Relaxed))
                {
                    termination = Some(Termination::Cancelled);
                    break;
                }

                let improved = self.step(generation)?;
                completed = generation;
                stagnation = if improved { 0 } else { stagnation + 1 };

                termination = self.early_stop(stagnation, started);
                if termination.is_some() {
                    break;
                }
            }
        }

        let termination = termination.unwrap_or(Termination::Completed);
        let best = self
            .best
            .clone()
            .ok_or_else(|| EaError::configuration("run finished without a best individual"))?;

        tracing::info!(
            ?termination,
            generations = completed,
            best_fitness = best.fitness(),
            "Run finished"
        );
        self.notify("on_end", |logger| logger.on_end(&best, completed));

        Ok(EaResult {
            best,
            history: self.history.clone(),
            generations: completed,
            termination,
        })
    }

    /// Creates and evaluates generation 0, replacing any previous run.
    fn initialize(&mut self) -> Result<(), EaError> {
        let size = self.config.population_size;
        let objective = self.config.objective;

        let mut population = Vec::with_capacity(size);
        for index in 0..size {
            let genotype = self.initializer.create(&mut *self.rng);
            population.push(self.evaluate(genotype, 0, index)?);
        }

        let record = GenerationRecord::from_population(0, &population, objective)
            .ok_or_else(|| EaError::configuration("initial population is empty"))?;
        let best = objective.best_of(&population).cloned();

        self.population = population;
        self.best = best;
        self.history = History::new();
        self.commit_record(record);
        Ok(())
    }

    /// Produces one generation. Returns `true` if the best-ever fitness
    /// improved.
    fn step(&mut self, generation: usize) -> Result<bool, EaError> {
        let objective = self.config.objective;
        let population_size = self.config.population_size;
        let parent_count = self.config.effective_parent_count();

        let offspring = {
            let mut ctx = EvolutionContext::new(generation, objective, &mut *self.rng);

            let parents = self
                .parent_selection
                .select(&self.population, parent_count, &mut ctx)
                .map_err(|e| e.in_generation(generation))?;
            if parents.len() != parent_count {
                return Err(EaError::configuration(format!(
                    "generation {generation}: parent selection returned {} parents, expected {parent_count}",
                    parents.len()
                )));
            }

            self.reproduction
                .reproduce(&parents, &mut ctx)
                .map_err(|e| e.in_generation(generation))?
        };

        if offspring.is_empty() {
            return Err(EaError::configuration(format!(
                "generation {generation}: reproduction produced no offspring"
            )));
        }

        let offspring = offspring
            .into_iter()
            .enumerate()
            .map(|(index, genotype)| self.evaluate(genotype, generation, index))
            .collect::<Result<Vec<_>, _>>()?;

        let challenger = objective
            .best_of(&offspring)
            .filter(|candidate| match &self.best {
                Some(best) => objective.is_better(candidate.fitness(), best.fitness()),
                None => true,
            })
            .cloned();

        let aged: Vec<Individual<G>> = self
            .population
            .iter()
            .cloned()
            .map(Individual::aged)
            .collect();
        let offspring_count = offspring.len();
        let survivors = self
            .survivor_selection
            .select_survivors(aged, offspring, population_size, objective)
            .map_err(|e| e.in_generation(generation))?;
        if survivors.len() != population_size {
            return Err(EaError::configuration(format!(
                "generation {generation}: survivor selection returned {} individuals, expected {population_size}",
                survivors.len()
            )));
        }

        let record = GenerationRecord::from_population(generation, &survivors, objective)
            .ok_or_else(|| EaError::configuration("survivor population is empty"))?;

        let improved = challenger.is_some();
        self.population = survivors;
        if let Some(challenger) = challenger {
            self.best = Some(challenger);
        }

        tracing::debug!(
            generation,
            offspring = offspring_count,
            best = record.best_fitness,
            mean = record.mean_fitness,
            improved,
            "Generation completed"
        );
        self.commit_record(record);
        Ok(improved)
    }

    /// Evaluates one genotype. The only place fitness values are produced.
    fn evaluate(
        &self,
        genotype: G,
        generation: usize,
        index: usize,
    ) -> Result<Individual<G>, EaError> {
        let failure = |source| EaError::Evaluation {
            generation,
            index,
            source,
        };
        let fitness = self
            .fitness
            .evaluate(&genotype)
            .map_err(|e| failure(EvaluationFailure::Failed(e)))?;
        if !fitness.is_finite() {
            return Err(failure(EvaluationFailure::NonFinite(fitness)));
        }
        Ok(Individual::new(genotype, fitness))
    }

    fn commit_record(&mut self, record: GenerationRecord) {
        if let (Some(logger), Some(best)) = (
            self.logger.as_mut(),
            self.config.objective.best_of(&self.population),
        ) {
            if let Err(err) = logger.on_generation(&record, best) {
                tracing::warn!(
                    generation = record.generation,
                    error = %err,
                    "Generation logger failed in on_generation"
                );
            }
        }
        self.history.push(record);
    }

    fn early_stop(&self, stagnation: usize, started: Instant) -> Option<Termination> {
        let record = self.history.last()?;
        let best_fitness = self.best.as_ref()?.fitness();

        if self.config.target_reached(best_fitness) {
            return Some(Termination::TargetReached);
        }
        if self.stop_when.as_ref().is_some_and(|stop| stop(record)) {
            return Some(Termination::StopPredicate);
        }
        if self.config.stagnation_limit > 0 && stagnation >= self.config.stagnation_limit {
            return Some(Termination::Stagnated);
        }
        if let Some(limit) = self.config.time_limit_ms {
            if started.elapsed().as_millis() >= u128::from(limit) {
                return Some(Termination::TimeLimit);
            }
        }
        None
    }

    fn notify(
        &mut self,
        event: &'static str,
        call: impl FnOnce(&mut dyn GenerationLogger<G>) -> anyhow::Result<()>,
    ) {
        if let Some(logger) = self.logger.as_mut() {
            if let Err(err) = call(logger.as_mut()) {
                tracing::warn!(event, error = %err, "Generation logger failed");
            }
        }
    }
}

/// Shares one [`Problem`] between the fitness and initializer slots.
struct SharedProblem<P>(Rc<P>);

impl<G, P: Problem<G>> FitnessFunction<G> for SharedProblem<P> {
    fn evaluate(&self, genotype: &G) -> anyhow::Result<f64> {
        self.0.evaluate(genotype)
    }
}

impl<G, P: Problem<G>> Initializer<G> for SharedProblem<P> {
    fn create(&self, rng: &mut dyn RngCore) -> G {
        self.0.create(rng)
    }
}

/// Builder for [`EvolutionaryAlgorithm`].
///
/// Fitness, initializer and the three strategies are required; everything
/// else has a default. [`problem`](Self::problem) supplies fitness and
/// initializer together.
pub struct EaBuilder<G> {
    config: EaConfig,
    fitness: Option<Box<dyn FitnessFunction<G>>>,
    initializer: Option<Box<dyn Initializer<G>>>,
    parent_selection: Option<(Box<dyn ParentSelection<G>>, &'static str)>,
    reproduction: Option<(Box<dyn Reproduction<G>>, &'static str)>,
    survivor_selection: Option<(Box<dyn SurvivorSelection<G>>, &'static str)>,
    logger: Option<Box<dyn GenerationLogger<G>>>,
    stop_when: Option<StopPredicate>,
    rng: Option<Box<dyn RngCore>>,
}

impl<G> Default for EaBuilder<G> {
    fn default() -> Self {
        Self {
            config: EaConfig::default(),
            fitness: None,
            initializer: None,
            parent_selection: None,
            reproduction: None,
            survivor_selection: None,
            logger: None,
            stop_when: None,
            rng: None,
        }
    }
}

impl<G> EaBuilder<G> {
    /// Sets the engine configuration.
    pub fn config(mut self, config: EaConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the fitness function.
    pub fn fitness(mut self, fitness: impl FitnessFunction<G> + 'static) -> Self {
        self.fitness = Some(Box::new(fitness));
        self
    }

    /// Sets the genotype initializer.
    pub fn initializer(mut self, initializer: impl Initializer<G> + 'static) -> Self {
        self.initializer = Some(Box::new(initializer));
        self
    }

    /// Sets fitness function and initializer from one problem definition.
    ///
    /// Replaces anything set earlier through [`fitness`](Self::fitness) or
    /// [`initializer`](Self::initializer).
    pub fn problem(mut self, problem: impl Problem<G> + 'static) -> Self {
        let problem = Rc::new(problem);
        self.fitness = Some(Box::new(SharedProblem(Rc::clone(&problem))));
        self.initializer = Some(Box::new(SharedProblem(problem)));
        self
    }

    /// Sets the parent selection strategy.
    pub fn parent_selection<S: ParentSelection<G> + 'static>(mut self, strategy: S) -> Self {
        self.parent_selection = Some((Box::new(strategy), type_name::<S>()));
        self
    }

    /// Sets the reproduction strategy.
    pub fn reproduction<R: Reproduction<G> + 'static>(mut self, strategy: R) -> Self {
        self.reproduction = Some((Box::new(strategy), type_name::<R>()));
        self
    }

    /// Sets the survivor selection strategy.
    pub fn survivor_selection<S: SurvivorSelection<G> + 'static>(mut self, strategy: S) -> Self {
        self.survivor_selection = Some((Box::new(strategy), type_name::<S>()));
        self
    }

    /// Attaches a run observer.
    pub fn logger(mut self, logger: impl GenerationLogger<G> + 'static) -> Self {
        self.logger = Some(Box::new(logger));
        self
    }

    /// Stops the run as soon as `predicate` returns `true` for a newly
    /// recorded generation.
    pub fn stop_when(mut self, predicate: impl Fn(&GenerationRecord) -> bool + 'static) -> Self {
        self.stop_when = Some(Box::new(predicate));
        self
    }

    /// Uses `rng` as the run's random source instead of seeding one from
    /// the configuration.
    pub fn rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Validates the configuration and assembles the engine.
    ///
    /// # Errors
    /// [`EaError::Configuration`] if a required part is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<EvolutionaryAlgorithm<G>, EaError> {
        self.config.validate()?;

        let fitness = self.fitness.ok_or_else(|| missing("fitness function"))?;
        let initializer = self.initializer.ok_or_else(|| missing("initializer"))?;
        let (parent_selection, parent_name) = self
            .parent_selection
            .ok_or_else(|| missing("parent selection strategy"))?;
        let (reproduction, reproduction_name) = self
            .reproduction
            .ok_or_else(|| missing("reproduction strategy"))?;
        let (survivor_selection, survivor_name) = self
            .survivor_selection
            .ok_or_else(|| missing("survivor selection strategy"))?;

        let (rng, seed): (Box<dyn RngCore>, Option<u64>) = match self.rng {
            Some(rng) => (rng, None),
            None => {
                let seed = self.config.seed.unwrap_or_else(rand::random);
                (Box::new(StdRng::seed_from_u64(seed)), Some(seed))
            }
        };

        Ok(EvolutionaryAlgorithm {
            config: self.config,
            fitness,
            initializer,
            parent_selection,
            reproduction,
            survivor_selection,
            logger: self.logger,
            stop_when: self.stop_when,
            rng,
            seed,
            names: StrategyNames {
                parent_selection: parent_name,
                reproduction: reproduction_name,
                survivor_selection: survivor_name,
            },
            population: Vec::new(),
            history: History::new(),
            best: None,
        })
    }
}

fn missing(part: &str) -> EaError {
    EaError::configuration(format!("missing {part}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ea::operators::{IdentityCrossover, Mutation, OrderCrossover, SwapMutation};
    use crate::ea::reproduction::{MutationOnlyReproduction, StandardReproduction};
    use crate::ea::selection::TournamentSelection;
    use crate::ea::survivor::{AgeBasedSelection, CommaSelection, PlusSelection};
    use crate::ea::types::{try_fitness, Objective};
    use rand::Rng;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Adds a random step in `-1..=1` to an integer genotype.
    struct Step;

    impl Mutation<i64> for Step {
        fn mutate(&self, g: &mut i64, rng: &mut dyn RngCore) -> Result<(), EaError> {
            *g += rng.random_range(-1..=1);
            Ok(())
        }
    }

    /// Adds a fixed amount to an integer genotype.
    struct Add(i64);

    impl Mutation<i64> for Add {
        fn mutate(&self, g: &mut i64, _rng: &mut dyn RngCore) -> Result<(), EaError> {
            *g += self.0;
            Ok(())
        }
    }

    /// Survivor policy that ignores offspring entirely.
    struct KeepParents;

    impl SurvivorSelection<i64> for KeepParents {
        fn select_survivors(
            &self,
            parents: Vec<Individual<i64>>,
            _offspring: Vec<Individual<i64>>,
            _population_size: usize,
            _objective: Objective,
        ) -> Result<Vec<Individual<i64>>, EaError> {
            Ok(parents)
        }
    }

    /// Survivor policy that breaks the size contract.
    struct DropOne;

    impl SurvivorSelection<i64> for DropOne {
        fn select_survivors(
            &self,
            mut parents: Vec<Individual<i64>>,
            _offspring: Vec<Individual<i64>>,
            _population_size: usize,
            _objective: Objective,
        ) -> Result<Vec<Individual<i64>>, EaError> {
            parents.pop();
            Ok(parents)
        }
    }

    /// Parent selection that always returns a single parent.
    struct OnlyFirst;

    impl ParentSelection<i64> for OnlyFirst {
        fn select(
            &self,
            population: &[Individual<i64>],
            _count: usize,
            _ctx: &mut EvolutionContext<'_>,
        ) -> Result<Vec<Individual<i64>>, EaError> {
            Ok(population[..1].to_vec())
        }
    }

    /// Yields 1, 2, 3, ... on successive calls.
    fn counting_initializer() -> impl Fn(&mut dyn RngCore) -> i64 {
        let next = Cell::new(0);
        move |_rng: &mut dyn RngCore| {
            next.set(next.get() + 1);
            next.get()
        }
    }

    fn random_initializer(rng: &mut dyn RngCore) -> i64 {
        rng.random_range(-50..=50)
    }

    /// Integer hill-climbing engine: maximize -|x - 17|.
    fn hill_climber(config: EaConfig) -> EaBuilder<i64> {
        EvolutionaryAlgorithm::builder()
            .config(config)
            .initializer(random_initializer)
            .fitness(|x: &i64| -((x - 17).abs() as f64))
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(
                StandardReproduction::new(IdentityCrossover, Step)
                    .with_crossover_rate(0.5)
                    .with_mutation_rate(0.8),
            )
            .survivor_selection(PlusSelection)
    }

    #[test]
    fn test_elitist_end_to_end() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(4).with_seed(1))
            .initializer(counting_initializer())
            .fitness(|x: &i64| *x as f64)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(
                StandardReproduction::new(IdentityCrossover, Step)
                    .with_crossover_rate(1.0)
                    .with_mutation_rate(0.0),
            )
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();

        let result = ea.run(1).unwrap();
        assert_eq!(result.generations, 1);
        assert_eq!(result.termination, Termination::Completed);
        assert_eq!(*result.best.genotype(), 4);
        assert_eq!(result.best_fitness(), 4.0);
        assert!(ea.population().iter().any(|i| *i.genotype() == 4));
        assert_eq!(ea.population().len(), 4);

        let records = result.history.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].best_fitness, 4.0);
        assert_eq!(records[0].worst_fitness, 1.0);
        assert_eq!(records[0].mean_fitness, 2.5);
        assert_eq!(records[1].best_fitness, 4.0);
    }

    #[test]
    fn test_population_size_invariant() {
        for size in [1, 2, 7, 20] {
            let mut ea = hill_climber(EaConfig::default().with_population_size(size).with_seed(3))
                .build()
                .unwrap();
            let result = ea.run(15).unwrap();
            assert_eq!(ea.population().len(), size);
            assert_eq!(result.history.len(), 16);
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = EaConfig::default().with_population_size(12).with_seed(2024);
        let a = hill_climber(config.clone()).build().unwrap().run(30).unwrap();
        let b = hill_climber(config).build().unwrap().run(30).unwrap();
        assert_eq!(a.history, b.history);
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn test_explicit_rng_matches_seed() {
        let config = EaConfig::default().with_population_size(10);
        let seeded = hill_climber(config.clone().with_seed(5))
            .build()
            .unwrap()
            .run(10)
            .unwrap();
        let explicit = hill_climber(config)
            .rng(StdRng::seed_from_u64(5))
            .build()
            .unwrap()
            .run(10)
            .unwrap();
        assert_eq!(seeded.history, explicit.history);
    }

    #[test]
    fn test_zero_generations() {
        let mut ea = hill_climber(EaConfig::default().with_population_size(6).with_seed(0))
            .build()
            .unwrap();
        let result = ea.run(0).unwrap();
        assert_eq!(result.generations, 0);
        assert_eq!(result.termination, Termination::Completed);
        assert_eq!(result.history.len(), 1);
        assert_eq!(result.history.records()[0].generation, 0);
        assert_eq!(ea.population().len(), 6);
    }

    #[test]
    fn test_hill_climber_converges() {
        let mut ea = hill_climber(EaConfig::default().with_population_size(20).with_seed(42))
            .build()
            .unwrap();
        let result = ea.run(200).unwrap();
        assert_eq!(*result.best.genotype(), 17);
        assert_eq!(result.best_fitness(), 0.0);
    }

    #[test]
    fn test_best_fitness_never_worsens_with_plus() {
        let mut ea = hill_climber(EaConfig::default().with_population_size(8).with_seed(9))
            .build()
            .unwrap();
        let result = ea.run(50).unwrap();
        let series = result.history.best_fitness_series();
        assert!(series.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_minimize_direction() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(
                EaConfig::default()
                    .with_population_size(10)
                    .with_objective(Objective::Minimize)
                    .with_seed(8),
            )
            .initializer(random_initializer)
            .fitness(|x: &i64| (x * x) as f64)
            .parent_selection(TournamentSelection::new(3).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let result = ea.run(300).unwrap();
        assert_eq!(result.best_fitness(), 0.0);
        assert_eq!(ea.best().unwrap().fitness(), 0.0);
    }

    #[test]
    fn test_best_tracks_non_surviving_offspring() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(3).with_seed(0))
            .initializer(|_: &mut dyn RngCore| 0i64)
            .fitness(|x: &i64| *x as f64)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Add(10)))
            .survivor_selection(KeepParents)
            .build()
            .unwrap();
        let result = ea.run(3).unwrap();
        assert_eq!(result.best_fitness(), 10.0);
        assert!(ea.population().iter().all(|i| i.fitness() == 0.0));
        assert_eq!(result.history.last().unwrap().best_fitness, 0.0);
    }

    #[test]
    fn test_survivors_age() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(3).with_seed(0))
            .initializer(|_: &mut dyn RngCore| 0i64)
            .fitness(|x: &i64| *x as f64)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Add(0)))
            .survivor_selection(KeepParents)
            .build()
            .unwrap();
        ea.run(4).unwrap();
        assert!(ea.population().iter().all(|i| i.age() == 4));
        assert_eq!(ea.history().last().unwrap().best_age, 4);
    }

    #[test]
    fn test_generational_replacement() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(5).with_seed(0))
            .initializer(|_: &mut dyn RngCore| 0i64)
            .fitness(|x: &i64| *x as f64)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Add(1)))
            .survivor_selection(AgeBasedSelection::new(1.0).unwrap())
            .build()
            .unwrap();
        ea.run(3).unwrap();
        assert!(ea.population().iter().all(|i| *i.genotype() == 3 && i.age() == 0));
    }

    fn bumpy(x: &i64) -> f64 {
        -((x - 17).abs() as f64) + x.rem_euclid(3) as f64 * 0.25
    }

    #[test]
    fn test_population_fitness_matches_fitness_function() {
        let policies: Vec<Box<dyn Fn(EaBuilder<i64>) -> EaBuilder<i64>>> = vec![
            Box::new(|b| b.survivor_selection(PlusSelection)),
            Box::new(|b| b.survivor_selection(AgeBasedSelection::new(0.5).unwrap())),
        ];
        for with_survivors in policies {
            let builder = EvolutionaryAlgorithm::builder()
                .config(EaConfig::default().with_population_size(12).with_seed(5))
                .initializer(random_initializer)
                .fitness(bumpy)
                .parent_selection(TournamentSelection::new(3).unwrap())
                .reproduction(
                    StandardReproduction::new(IdentityCrossover, Step).with_mutation_rate(0.9),
                );
            let mut ea = with_survivors(builder).build().unwrap();
            let result = ea.run(20).unwrap();

            assert_eq!(ea.population().len(), 12);
            assert!(ea
                .population()
                .iter()
                .all(|i| i.fitness() == bumpy(i.genotype())));
            assert_eq!(result.best_fitness(), bumpy(result.best.genotype()));
        }
    }

    /// Problem whose initializer and fitness share one target.
    struct Target(i64);

    impl Problem<i64> for Target {
        fn create(&self, rng: &mut dyn RngCore) -> i64 {
            self.0 + rng.random_range(-20..=20)
        }

        fn evaluate(&self, genotype: &i64) -> anyhow::Result<f64> {
            Ok(-((genotype - self.0).abs() as f64))
        }
    }

    #[test]
    fn test_problem_fills_fitness_and_initializer() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(10).with_seed(2))
            .fitness(|_: &i64| f64::NAN)
            .problem(Target(40))
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let result = ea.run(60).unwrap();

        assert!(ea.history().records()[0].best_fitness >= -20.0);
        assert_eq!(result.best_fitness(), -((result.best.genotype() - 40).abs() as f64));
        assert!(result.best_fitness() > -3.0);
    }

    #[test]
    fn test_initializer_and_fitness_call_counts() {
        let init_calls = Rc::new(Cell::new(0usize));
        let eval_calls = Rc::new(Cell::new(0usize));
        let (ic, ec) = (Rc::clone(&init_calls), Rc::clone(&eval_calls));

        let mut ea = EvolutionaryAlgorithm::builder()
            .config(
                EaConfig::default()
                    .with_population_size(6)
                    .with_parent_count(4)
                    .with_seed(1),
            )
            .initializer(move |rng: &mut dyn RngCore| {
                ic.set(ic.get() + 1);
                random_initializer(rng)
            })
            .fitness(move |x: &i64| {
                ec.set(ec.get() + 1);
                *x as f64
            })
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        ea.run(5).unwrap();

        assert_eq!(init_calls.get(), 6);
        // 6 initial evaluations + 4 offspring per generation
        assert_eq!(eval_calls.get(), 6 + 5 * 4);
    }

    #[test]
    fn test_missing_parts_rejected() {
        let err = EvolutionaryAlgorithm::<i64>::builder()
            .initializer(random_initializer)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, EaError::Configuration(ref m) if m.contains("fitness")));

        let err = EvolutionaryAlgorithm::<i64>::builder()
            .fitness(|x: &i64| *x as f64)
            .initializer(random_initializer)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, EaError::Configuration(ref m) if m.contains("survivor")));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = hill_climber(EaConfig::default().with_population_size(0)).build();
        assert!(matches!(result, Err(EaError::Configuration(_))));
    }

    #[test]
    fn test_non_finite_fitness_rejected() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(4).with_seed(0))
            .initializer(counting_initializer())
            .fitness(|x: &i64| if *x == 3 { f64::NAN } else { *x as f64 })
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let err = ea.run(5).unwrap_err();
        match err {
            EaError::Evaluation {
                generation,
                index,
                source: EvaluationFailure::NonFinite(v),
            } => {
                assert_eq!(generation, 0);
                assert_eq!(index, 2);
                assert!(v.is_nan());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ea.population().is_empty());
        assert!(ea.history().is_empty());
    }

    #[test]
    fn test_fallible_fitness_error() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(4).with_seed(0))
            .initializer(|_: &mut dyn RngCore| 0i64)
            .fitness(try_fitness(|x: &i64| {
                anyhow::ensure!(*x < 5, "genotype {x} out of range");
                Ok(*x as f64)
            }))
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Add(1)))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let err = ea.run(10).unwrap_err();
        assert!(matches!(
            err,
            EaError::Evaluation {
                generation: 5,
                index: 0,
                source: EvaluationFailure::Failed(_)
            }
        ));
        // Generations 0..=4 completed and stay committed
        assert_eq!(ea.history().len(), 5);
        assert_eq!(ea.population().len(), 4);
        assert_eq!(ea.best().unwrap().fitness(), 4.0);
    }

    #[test]
    fn test_survivor_size_contract() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(4).with_seed(0))
            .initializer(random_initializer)
            .fitness(|x: &i64| *x as f64)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(DropOne)
            .build()
            .unwrap();
        let snapshot = {
            let err = ea.run(3).unwrap_err();
            assert!(matches!(err, EaError::Configuration(ref m) if m.contains("generation 1")));
            ea.population().to_vec()
        };
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.iter().all(|i| i.age() == 0));
        assert_eq!(ea.history().len(), 1);
    }

    #[test]
    fn test_parent_count_contract() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(4).with_seed(0))
            .initializer(random_initializer)
            .fitness(|x: &i64| *x as f64)
            .parent_selection(OnlyFirst)
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let err = ea.run(1).unwrap_err();
        assert!(matches!(err, EaError::Configuration(ref m) if m.contains("parent")));
    }

    #[test]
    fn test_comma_with_too_few_offspring() {
        let mut ea = hill_climber(
            EaConfig::default()
                .with_population_size(6)
                .with_parent_count(4)
                .with_seed(0),
        )
        .survivor_selection(CommaSelection)
        .build()
        .unwrap();
        assert!(matches!(ea.run(1), Err(EaError::Configuration(_))));
    }

    #[test]
    fn test_representation_error_carries_generation() {
        // Alternating genotype lengths; constant fitness keeps both lengths around
        let next = Cell::new(0usize);
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(EaConfig::default().with_population_size(4).with_seed(0))
            .initializer(move |_: &mut dyn RngCore| {
                next.set(next.get() + 1);
                (0..2 + next.get() % 2).collect::<Vec<usize>>()
            })
            .fitness(|_: &Vec<usize>| 1.0)
            .parent_selection(TournamentSelection::new(2).unwrap().with_replacement())
            .reproduction(
                StandardReproduction::new(OrderCrossover, SwapMutation).with_crossover_rate(1.0),
            )
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let err = ea.run(50).unwrap_err();
        assert!(matches!(
            err,
            EaError::Representation {
                generation: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_cancellation() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut ea = hill_climber(EaConfig::default().with_population_size(5).with_seed(0))
            .build()
            .unwrap();
        let result = ea.run_with_cancel(100, Some(flag)).unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.history.len(), 1);
    }

    #[test]
    fn test_stop_predicate() {
        let mut ea = hill_climber(EaConfig::default().with_population_size(5).with_seed(0))
            .stop_when(|record| record.generation >= 3)
            .build()
            .unwrap();
        let result = ea.run(100).unwrap();
        assert_eq!(result.termination, Termination::StopPredicate);
        assert_eq!(result.generations, 3);
        assert_eq!(result.history.len(), 4);
    }

    #[test]
    fn test_stagnation() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(
                EaConfig::default()
                    .with_population_size(4)
                    .with_stagnation_limit(5)
                    .with_seed(0),
            )
            .initializer(|_: &mut dyn RngCore| 1i64)
            .fitness(|_: &i64| 1.0)
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let result = ea.run(100).unwrap();
        assert_eq!(result.termination, Termination::Stagnated);
        assert_eq!(result.generations, 5);
    }

    #[test]
    fn test_target_fitness() {
        let mut ea = hill_climber(
            EaConfig::default()
                .with_population_size(10)
                .with_target_fitness(-2.0)
                .with_seed(4),
        )
        .build()
        .unwrap();
        let result = ea.run(1_000).unwrap();
        assert_eq!(result.termination, Termination::TargetReached);
        assert!(result.best_fitness() >= -2.0);
        assert!(result.generations < 1_000);
    }

    #[test]
    fn test_time_limit() {
        let mut ea = EvolutionaryAlgorithm::builder()
            .config(
                EaConfig::default()
                    .with_population_size(2)
                    .with_time_limit_ms(1)
                    .with_seed(0),
            )
            .initializer(random_initializer)
            .fitness(|x: &i64| {
                std::thread::sleep(std::time::Duration::from_millis(2));
                *x as f64
            })
            .parent_selection(TournamentSelection::new(2).unwrap())
            .reproduction(MutationOnlyReproduction::new(Step))
            .survivor_selection(PlusSelection)
            .build()
            .unwrap();
        let result = ea.run(100).unwrap();
        assert_eq!(result.termination, Termination::TimeLimit);
        assert_eq!(result.generations, 0);
    }

    #[test]
    fn test_rerun_starts_fresh() {
        let mut ea = hill_climber(EaConfig::default().with_population_size(5).with_seed(11))
            .build()
            .unwrap();
        ea.run(10).unwrap();
        let second = ea.run(4).unwrap();
        assert_eq!(second.history.len(), 5);
        assert_eq!(ea.history().len(), 5);
    }

    struct Events(Rc<RefCell<Vec<String>>>);

    impl GenerationLogger<i64> for Events {
        fn on_start(&mut self, info: &RunInfo) -> anyhow::Result<()> {
            self.0.borrow_mut().push(format!("start {}", info.generations));
            Ok(())
        }

        fn on_generation(
            &mut self,
            record: &GenerationRecord,
            best: &Individual<i64>,
        ) -> anyhow::Result<()> {
            assert_eq!(best.fitness(), record.best_fitness);
            self.0.borrow_mut().push(format!("gen {}", record.generation));
            Ok(())
        }

        fn on_end(&mut self, _best: &Individual<i64>, generations: usize) -> anyhow::Result<()> {
            self.0.borrow_mut().push(format!("end {generations}"));
            Ok(())
        }
    }

    #[test]
    fn test_logger_callbacks() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut ea = hill_climber(EaConfig::default().with_population_size(4).with_seed(0))
            .logger(Events(Rc::clone(&events)))
            .build()
            .unwrap();
        ea.run(2).unwrap();
        assert_eq!(
            *events.borrow(),
            vec!["start 2", "gen 0", "gen 1", "gen 2", "end 2"]
        );
    }

    struct Broken;

    impl GenerationLogger<i64> for Broken {
        fn on_generation(
            &mut self,
            _record: &GenerationRecord,
            _best: &Individual<i64>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_logger_failure_does_not_abort() {
        let mut ea = hill_climber(EaConfig::default().with_population_size(4).with_seed(0))
            .logger(Broken)
            .build()
            .unwrap();
        let result = ea.run(3).unwrap();
        assert_eq!(result.termination, Termination::Completed);
        assert_eq!(result.history.len(), 4);
    }
}
