//! Elitist truncation search with per-individual local refinement.

use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{Individual, SearchConfig, SearchDriver};
use crate::error::SolverError;
use crate::evaluator::Evaluator;
use crate::models::Solution;

/// One exhaustive hill-climbing pass over a genotype.
///
/// Gene positions are visited in a fresh random permutation. At each
/// position every legal value other than the current one is tried in
/// ascending order against the full genotype; a candidate is adopted as the
/// running best only when its fitness strictly beats it, and after the scan
/// the gene is set to the best value found with that fitness cached.
/// Positions are never revisited within a pass, so the result is a per-gene
/// local optimum, not a global one.
pub fn fihc_pass<R: Rng>(individual: &mut Individual, evaluator: &mut Evaluator<'_>, rng: &mut R) {
    let mut positions: Vec<usize> = (0..evaluator.total_genes()).collect();
    positions.shuffle(rng);

    for position in positions {
        let original = individual.genotype[position];
        let mut best_value = original;
        let mut best_fitness = individual.fitness;
        for value in 0..=evaluator.max_gene_value(position) {
            if value == original {
                continue;
            }
            individual.genotype[position] = value;
            let fitness = evaluator.evaluate(individual);
            if fitness > best_fitness {
                best_value = value;
                best_fitness = fitness;
            }
        }
        individual.genotype[position] = best_value;
        individual.fitness = best_fitness;
    }
}

/// Truncation selection plus FIHC, the production search strategy.
///
/// Each iteration climbs every individual to a per-gene local optimum,
/// keeps the `elite_size` fittest, and refills the population with fresh
/// random individuals.
#[derive(Debug)]
pub struct ElitistFihcDriver<'a> {
    config: SearchConfig,
    evaluator: Option<Evaluator<'a>>,
    rng: SmallRng,
    population: Vec<Individual>,
    best: Individual,
}

impl<'a> ElitistFihcDriver<'a> {
    pub fn new(config: SearchConfig) -> Self {
        ElitistFihcDriver {
            config,
            evaluator: None,
            rng: SmallRng::seed_from_u64(0),
            population: Vec::new(),
            best: Individual::new(),
        }
    }

    /// Current population; sorted by fitness only right after selection.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }
}

impl<'a> SearchDriver<'a> for ElitistFihcDriver<'a> {
    fn init(&mut self, mut evaluator: Evaluator<'a>, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);

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
            fihc_pass(individual, evaluator, &mut self.rng);
        }

        self.population
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        let elite = self.config.elite_size.min(self.config.population_size);
        self.population.truncate(elite);
        while self.population.len() < self.config.population_size {
            let mut fresh = Individual::new();
            evaluator.init_random(&mut fresh);
            self.population.push(fresh);
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
    use crate::evaluator::FitnessWeights;
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
            .with_student(StudentPreferences::new().with_free_day(1, 10.0))
            .with_student(StudentPreferences::new().with_no_gaps(5.0));
        ProblemModel::new(ProblemInput::new(constraints).with_preferences(preferences)).unwrap()
    }

    #[test]
    fn test_operations_require_init() {
        let mut driver = ElitistFihcDriver::new(SearchConfig::default());

        let err = driver.run_iteration(0).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::NotInitialized);
        let err = driver.best().unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::NotInitialized);
        let err = driver.best_solution().unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::NotInitialized);
    }

    #[test]
    fn test_init_builds_full_population() {
        let model = sample_model();
        let evaluator = Evaluator::new(&model, 42).unwrap();
        let total_genes = evaluator.total_genes();

        let mut driver = ElitistFihcDriver::new(SearchConfig::default());
        driver.init(evaluator, 42);

        assert_eq!(driver.population().len(), 10);
        for individual in driver.population() {
            assert_eq!(individual.genotype.len(), total_genes);
        }
        assert_eq!(driver.best().unwrap().genotype.len(), total_genes);
    }

    #[test]
    fn test_population_size_survives_iterations() {
        let model = sample_model();
        let evaluator = Evaluator::new(&model, 42).unwrap();
        let config = SearchConfig::new().with_population_size(6).with_elite_size(3);

        let mut driver = ElitistFihcDriver::new(config);
        driver.init(evaluator, 42);
        for iteration in 0..3 {
            driver.run_iteration(iteration).unwrap();
            assert_eq!(driver.population().len(), 6);
        }
    }

    #[test]
    fn test_best_fitness_never_regresses() {
        let model = sample_model();
        let evaluator = Evaluator::new(&model, 42).unwrap();

        let mut driver = ElitistFihcDriver::new(SearchConfig::default());
        driver.init(evaluator, 42);

        let mut previous = driver.best().unwrap().fitness;
        for iteration in 0..3 {
            let best = driver.run_iteration(iteration).unwrap();
            assert!(best.fitness >= previous);
            previous = best.fitness;
        }
    }

    #[test]
    fn test_selection_keeps_sorted_elite() {
        let model = sample_model();
        let evaluator = Evaluator::new(&model, 42).unwrap();
        let config = SearchConfig::new().with_population_size(6).with_elite_size(3);

        let mut driver = ElitistFihcDriver::new(config);
        driver.init(evaluator, 42);
        driver.run_iteration(0).unwrap();

        let elite = &driver.population()[..3];
        assert!(elite[0].fitness >= elite[1].fitness);
        assert!(elite[1].fitness >= elite[2].fitness);
    }

    #[test]
    fn test_fihc_pass_never_regresses() {
        let model = sample_model();
        let mut evaluator = Evaluator::new(&model, 42).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        let mut individual = Individual::new();
        evaluator.init_random(&mut individual);
        let before = individual.fitness;

        fihc_pass(&mut individual, &mut evaluator, &mut rng);
        assert!(individual.fitness >= before);
    }

    #[test]
    fn test_fihc_pass_finds_preferred_timeslot() {
        // One student, one group, one room: only the group's timeslot gene
        // has candidates, and exactly one of them satisfies the student.
        let constraints = Constraints {
            timeslots_per_day: vec![3],
            groups_per_subject: vec![1],
            groups_soft_capacity: vec![5],
            students_subjects: vec![vec![0]],
            teachers_groups: vec![vec![0]],
            rooms_unavailability_timeslots: vec![vec![]],
        };
        let preferences = Preferences::default()
            .with_student(StudentPreferences::new().with_preferred_timeslot(2, 10.0));
        let model =
            ProblemModel::new(ProblemInput::new(constraints).with_preferences(preferences))
                .unwrap();
        let mut evaluator = Evaluator::new(&model, 42)
            .unwrap()
            .with_weights(FitnessWeights::new().with_deterministic(true));
        let mut rng = SmallRng::seed_from_u64(42);

        let mut individual = Individual {
            genotype: vec![0, 0, 0],
            fitness: 0.0,
        };
        individual.fitness = evaluator.evaluate(&individual);

        fihc_pass(&mut individual, &mut evaluator, &mut rng);
        assert_eq!(individual.genotype, vec![0, 2, 0]);
        assert_eq!(individual.fitness, 1.0);
    }

    #[test]
    fn test_best_solution_shape() {
        let model = sample_model();
        let evaluator = Evaluator::new(&model, 42).unwrap();
        let total_genes = evaluator.total_genes();

        let mut driver = ElitistFihcDriver::new(SearchConfig::default());
        driver.init(evaluator, 42);
        driver.run_iteration(0).unwrap();

        let solution = driver.best_solution().unwrap();
        assert_eq!(solution.genotype.len(), total_genes);
        assert_eq!(solution.by_student.len(), 3);
        assert_eq!(solution.by_group.len(), 3);
        assert_eq!(solution.fitness, driver.best().unwrap().fitness);
    }
}
