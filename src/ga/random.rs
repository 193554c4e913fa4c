//! Random-restart baseline search.

use log::debug;

use super::{Individual, SearchConfig, SearchDriver};
use crate::error::SolverError;
use crate::evaluator::Evaluator;
use crate::models::Solution;

/// Draws a fresh random population every iteration and keeps the best
/// individual ever seen. The baseline any informed strategy must beat.
#[derive(Debug)]
pub struct RandomSearchDriver<'a> {
    config: SearchConfig,
    evaluator: Option<Evaluator<'a>>,
    population: Vec<Individual>,
    best: Individual,
}

impl<'a> RandomSearchDriver<'a> {
    pub fn new(config: SearchConfig) -> Self {
        RandomSearchDriver {
            config,
            evaluator: None,
            population: Vec::new(),
            best: Individual::new(),
        }
    }

    /// Current population; replaced wholesale every iteration.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }
}

impl<'a> SearchDriver<'a> for RandomSearchDriver<'a> {
    /// The evaluator's own random source drives all seeding, so the extra
    /// seed is unused here.
    fn init(&mut self, mut evaluator: Evaluator<'a>, _seed: u64) {
        let mut best = Individual::new();
        evaluator.init_random(&mut best);
        debug!("Start fitness: {}", best.fitness);

        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let mut fresh = Individual::new();
            evaluator.init_random(&mut fresh);
            population.push(fresh);
        }

        self.best = best;
        self.population = population;
        self.evaluator = Some(evaluator);
    }

    fn run_iteration(&mut self, iteration: usize) -> Result<Individual, SolverError> {
        let evaluator = self
            .evaluator
            .as_mut()
            .ok_or_else(|| SolverError::not_initialized("run_iteration called before init"))?;

        for individual in &mut self.population {
            evaluator.init_random(individual);
        }

        if let Some(champion) = self
            .population
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
        {
            if champion.fitness > self.best.fitness {
                self.best = champion.clone();
                debug!("New best fitness: {}", self.best.fitness);
            }
        }

        debug!("Iteration {}: best fitness {}", iteration, self.best.fitness);
        Ok(self.best.clone())
    }

    fn best(&self) -> Result<&Individual, SolverError> {
        if self.evaluator.is_none() {
            return Err(SolverError::not_initialized("best called before init"));
        }
        Ok(&self.best)
    }

    fn best_solution(&self) -> Result<Solution, SolverError> {
        match &self.evaluator {
            Some(evaluator) => evaluator.solution(&self.best),
            None => Err(SolverError::not_initialized(
                "best_solution called before init",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverErrorKind;
    use crate::models::{Constraints, Preferences, ProblemInput, StudentPreferences};
    use crate::problem::ProblemModel;

    fn sample_model() -> ProblemModel {
        let constraints = Constraints {
            timeslots_per_day: vec![3, 3],
            groups_per_subject: vec![2, 1],
            groups_soft_capacity: vec![2, 2, 3],
            students_subjects: vec![vec![0, 1], vec![1], vec![0]],
            teachers_groups: vec![vec![0, 1], vec![2]],
            rooms_unavailability_timeslots: vec![vec![5], vec![]],
        };
        let preferences = Preferences::default()
            .with_student(StudentPreferences::new().with_free_day(0, 8.0));
        ProblemModel::new(ProblemInput::new(constraints).with_preferences(preferences)).unwrap()
    }

    #[test]
    fn test_operations_require_init() {
        let mut driver = RandomSearchDriver::new(SearchConfig::default());

        let err = driver.run_iteration(0).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::NotInitialized);
        let err = driver.best().unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::NotInitialized);
        let err = driver.best_solution().unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::NotInitialized);
    }

    #[test]
    fn test_population_redrawn_within_bounds() {
        let model = sample_model();
        let evaluator = Evaluator::new(&model, 42).unwrap();
        let total_genes = evaluator.total_genes();
        let max_values: Vec<usize> = (0..total_genes).map(|i| evaluator.max_gene_value(i)).collect();

        let mut driver = RandomSearchDriver::new(SearchConfig::new().with_population_size(4));
        driver.init(evaluator, 42);

        for iteration in 0..3 {
            driver.run_iteration(iteration).unwrap();
            assert_eq!(driver.population().len(), 4);
            for individual in driver.population() {
                assert_eq!(individual.genotype.len(), total_genes);
                for (index, &gene) in individual.genotype.iter().enumerate() {
                    assert!(gene <= max_values[index]);
                }
            }
        }
    }

    #[test]
    fn test_best_dominates_population() {
        let model = sample_model();
        let evaluator = Evaluator::new(&model, 42).unwrap();

        let mut driver = RandomSearchDriver::new(SearchConfig::default());
        driver.init(evaluator, 42);

        let mut previous = driver.best().unwrap().fitness;
        for iteration in 0..5 {
            let best = driver.run_iteration(iteration).unwrap();
            assert!(best.fitness >= previous);
            for individual in driver.population() {
                assert!(best.fitness >= individual.fitness);
            }
            previous = best.fitness;
        }
    }
}
