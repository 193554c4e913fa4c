//! Population search drivers.
//!
//! [`SearchDriver`] is the seam between the job loop and a concrete search
//! strategy. Two strategies ship: [`ElitistFihcDriver`] (truncation
//! selection with an exhaustive first-improvement hill-climbing pass per
//! individual) and [`RandomSearchDriver`] (pure random restarts, the
//! baseline any real strategy must beat). Which one runs is decided once,
//! at [`build_driver`].
//!
//! # Example
//!
//! ```
//! use evoplan::evaluator::Evaluator;
//! use evoplan::ga::{build_driver, Algorithm, SearchConfig};
//! use evoplan::models::{Constraints, ProblemInput};
//! use evoplan::problem::ProblemModel;
//!
//! let input = ProblemInput::new(Constraints {
//!     timeslots_per_day: vec![3],
//!     groups_per_subject: vec![1, 1],
//!     groups_soft_capacity: vec![2, 2],
//!     students_subjects: vec![vec![0], vec![1]],
//!     teachers_groups: vec![vec![0, 1]],
//!     rooms_unavailability_timeslots: vec![vec![]],
//! });
//! let model = ProblemModel::new(input).unwrap();
//! let evaluator = Evaluator::new(&model, 42).unwrap();
//!
//! let mut driver = build_driver(Algorithm::ElitistFihc, SearchConfig::default());
//! driver.init(evaluator, 42);
//! let best = driver.run_iteration(0).unwrap();
//! assert_eq!(best.genotype.len(), 6);
//! ```
//!
//! # References
//! - Eiben & Smith (2015), "Introduction to Evolutionary Computing", 2nd ed.
//! - Hoos & Stützle (2005), "Stochastic Local Search: Foundations and
//!   Applications", Ch. 2 (iterative improvement)

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::evaluator::Evaluator;
use crate::models::Solution;

mod elitist;
mod individual;
mod random;

pub use elitist::{fihc_pass, ElitistFihcDriver};
pub use individual::Individual;
pub use random::RandomSearchDriver;

/// Population sizing for a search driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Individuals kept alive between iterations.
    pub population_size: usize,
    /// Individuals surviving truncation selection.
    pub elite_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            population_size: 10,
            elite_size: 5,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        SearchConfig::default()
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_elite_size(mut self, elite_size: usize) -> Self {
        self.elite_size = elite_size;
        self
    }
}

/// Available search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Truncation selection plus per-individual FIHC.
    ElitistFihc,
    /// Fresh random population every iteration; keeps the best ever seen.
    RandomSearch,
}

/// Iterative search over timetable genotypes.
///
/// Lifecycle: `init` once, then any number of `run_iteration` calls. Every
/// other operation before `init` fails with a not-initialized error.
pub trait SearchDriver<'a>: Send + Sync + Debug {
    /// Takes ownership of the evaluator (and with it the model binding),
    /// seeds the driver's random source, and builds the starting
    /// population plus the initial best individual.
    fn init(&mut self, evaluator: Evaluator<'a>, seed: u64);

    /// Runs one optimization iteration and returns a copy of the best
    /// individual found so far.
    fn run_iteration(&mut self, iteration: usize) -> Result<Individual, SolverError>;

    /// Best individual found so far.
    fn best(&self) -> Result<&Individual, SolverError>;

    /// Reporting view of the best individual.
    fn best_solution(&self) -> Result<Solution, SolverError>;
}

/// The single dispatch point between algorithm variants.
pub fn build_driver<'a>(algorithm: Algorithm, config: SearchConfig) -> Box<dyn SearchDriver<'a> + 'a> {
    match algorithm {
        Algorithm::ElitistFihc => Box::new(ElitistFihcDriver::new(config)),
        Algorithm::RandomSearch => Box::new(RandomSearchDriver::new(config)),
    }
}
