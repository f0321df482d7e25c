//! Run observers.
//!
//! The engine reports progress through a [`GenerationLogger`]: once at the
//! start of a run, once per completed generation, and once at the end.
//! Logger failures never abort a run; the engine reports them with
//! `tracing::warn!` and carries on.
//!
//! Two implementations are provided:
//!
//! - [`TracingLogger`]: emits `tracing` events
//! - [`StreamLogger`]: writes formatted text lines to any [`Write`]r
//!   (stdout, stderr, a file, a `Vec<u8>`)

use super::history::GenerationRecord;
use super::types::{Individual, Objective};
use std::fmt;
use std::io::Write;

/// Static description of a run, passed to [`GenerationLogger::on_start`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    /// Number of generations requested.
    pub generations: usize,
    /// Population size.
    pub population_size: usize,
    /// Parents selected per generation.
    pub parent_count: usize,
    /// Optimization direction.
    pub objective: Objective,
    /// Seed of the run's random source, if it was seeded from the config.
    pub seed: Option<u64>,
    /// Type name of the parent selection strategy.
    pub parent_selection: &'static str,
    /// Type name of the reproduction strategy.
    pub reproduction: &'static str,
    /// Type name of the survivor selection strategy.
    pub survivor_selection: &'static str,
}

/// Observer of an evolutionary run.
///
/// All methods default to doing nothing.
pub trait GenerationLogger<G> {
    /// Called once before generation 0 is created.
    fn on_start(&mut self, _info: &RunInfo) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after every completed generation, including generation 0.
    ///
    /// `best_in_generation` is the best member of the new population, not
    /// necessarily the best individual of the run.
    fn on_generation(
        &mut self,
        _record: &GenerationRecord,
        _best_in_generation: &Individual<G>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the run stops without error.
    fn on_end(&mut self, _best: &Individual<G>, _generations: usize) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Verbosity of the built-in loggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogLevel {
    /// Start and end summaries only.
    #[default]
    Info,
    /// Summaries plus a line every `every_n` generations.
    Verbose,
}

impl LogLevel {
    fn reports(self, generation: usize, every_n: usize) -> bool {
        self == LogLevel::Verbose && generation % every_n == 0
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => f.write_str("INFO"),
            LogLevel::Verbose => f.write_str("VERBOSE"),
        }
    }
}

/// Genotypes longer than this are shortened in end-of-run summaries.
const GENOTYPE_PREVIEW: usize = 75;

fn preview<G: fmt::Debug>(genotype: &G) -> String {
    let text = format!("{genotype:?}");
    if text.chars().count() > GENOTYPE_PREVIEW {
        let head: String = text.chars().take(GENOTYPE_PREVIEW - 5).collect();
        format!("{head}...")
    } else {
        text
    }
}

/// Logger emitting `tracing` events.
///
/// Start and end summaries are `info` events; per-generation lines (at
/// [`LogLevel::Verbose`]) are `debug` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingLogger {
    level: LogLevel,
    every_n: usize,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl TracingLogger {
    /// Creates a logger reporting every 10th generation when verbose.
    pub fn new(level: LogLevel) -> Self {
        Self { level, every_n: 10 }
    }

    /// Sets how often generation lines are emitted (minimum 1).
    pub fn every_n(mut self, n: usize) -> Self {
        self.every_n = n.max(1);
        self
    }
}

impl<G: fmt::Debug> GenerationLogger<G> for TracingLogger {
    fn on_start(&mut self, info: &RunInfo) -> anyhow::Result<()> {
        tracing::info!(
            generations = info.generations,
            population_size = info.population_size,
            parent_count = info.parent_count,
            objective = ?info.objective,
            seed = ?info.seed,
            parent_selection = info.parent_selection,
            reproduction = info.reproduction,
            survivor_selection = info.survivor_selection,
            "Evolutionary algorithm started"
        );
        Ok(())
    }

    fn on_generation(
        &mut self,
        record: &GenerationRecord,
        _best_in_generation: &Individual<G>,
    ) -> anyhow::Result<()> {
        if self.level.reports(record.generation, self.every_n) {
            tracing::debug!(
                generation = record.generation,
                best = record.best_fitness,
                mean = record.mean_fitness,
                std = record.std_fitness,
                worst = record.worst_fitness,
                "Generation completed"
            );
        }
        Ok(())
    }

    fn on_end(&mut self, best: &Individual<G>, generations: usize) -> anyhow::Result<()> {
        tracing::info!(
            generations,
            best_fitness = best.fitness(),
            best_age = best.age(),
            best_genotype = %preview(best.genotype()),
            "Evolution finished"
        );
        Ok(())
    }
}

/// Logger writing human-readable lines to a writer.
///
/// # Examples
///
/// ```
/// use u_evolve::ea::{LogLevel, StreamLogger};
///
/// let to_stdout = StreamLogger::new(std::io::stdout(), LogLevel::Verbose).every_n(5);
/// let to_buffer = StreamLogger::new(Vec::new(), LogLevel::Info);
/// assert!(to_buffer.into_inner().is_empty());
/// # let _ = to_stdout;
/// ```
#[derive(Debug)]
pub struct StreamLogger<W> {
    writer: W,
    level: LogLevel,
    every_n: usize,
}

impl<W: Write> StreamLogger<W> {
    /// Creates a logger reporting every 10th generation when verbose.
    pub fn new(writer: W, level: LogLevel) -> Self {
        Self {
            writer,
            level,
            every_n: 10,
        }
    }

    /// Sets how often generation lines are written (minimum 1).
    pub fn every_n(mut self, n: usize) -> Self {
        self.every_n = n.max(1);
        self
    }

    /// Consumes the logger and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<G: fmt::Debug, W: Write> GenerationLogger<G> for StreamLogger<W> {
    fn on_start(&mut self, info: &RunInfo) -> anyhow::Result<()> {
        let w = &mut self.writer;
        writeln!(w, "--- Evolutionary Algorithm Started ---")?;
        writeln!(w, "  Level: {}", self.level)?;
        writeln!(w, "  Generations: {}", info.generations)?;
        writeln!(w, "  Population Size: {}", info.population_size)?;
        writeln!(w, "  Parent Count: {}", info.parent_count)?;
        writeln!(w, "  Objective: {:?}", info.objective)?;
        if let Some(seed) = info.seed {
            writeln!(w, "  Seed: {seed}")?;
        }
        writeln!(w, "  Parent Selection: {}", info.parent_selection)?;
        writeln!(w, "  Reproduction: {}", info.reproduction)?;
        writeln!(w, "  Survivor Selection: {}", info.survivor_selection)?;
        writeln!(w, "------------------------------------------")?;
        w.flush()?;
        Ok(())
    }

    fn on_generation(
        &mut self,
        record: &GenerationRecord,
        _best_in_generation: &Individual<G>,
    ) -> anyhow::Result<()> {
        if self.level.reports(record.generation, self.every_n) {
            writeln!(
                self.writer,
                "Gen {:<5} | Best: {:<10.4} | Mean: {:<10.4} (± {:<8.2}) | Worst: {:<10.4}",
                record.generation,
                record.best_fitness,
                record.mean_fitness,
                record.std_fitness,
                record.worst_fitness
            )?;
            self.writer.flush()?;
        }
        Ok(())
    }

    fn on_end(&mut self, best: &Individual<G>, generations: usize) -> anyhow::Result<()> {
        let w = &mut self.writer;
        writeln!(w, "--- Evolution Finished ---")?;
        writeln!(w, "  Total Generations: {generations}")?;
        writeln!(w, "  Best Fitness: {:.4}", best.fitness())?;
        writeln!(w, "  Best Individual Age: {}", best.age())?;
        writeln!(w, "  Best Genotype: {}", preview(best.genotype()))?;
        writeln!(w, "--------------------------------")?;
        w.flush()?;
        Ok(())
    }
}
