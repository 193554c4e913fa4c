//! Job loop: model construction through final result emission.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use log::{error, info};

use crate::evaluator::{Evaluator, FitnessWeights};
use crate::ga::{build_driver, Algorithm, SearchConfig};
use crate::io::{JobSource, ProgressSink};
use crate::models::{Job, Progress, Solution};
use crate::problem::ProblemModel;

/// Everything a job run needs beyond the job itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub algorithm: Algorithm,
    /// Outer iteration count; the wall-clock budget on the job may stop the
    /// run earlier.
    pub iterations: usize,
    pub search: SearchConfig,
    pub weights: FitnessWeights,
    pub seed: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            algorithm: Algorithm::ElitistFihc,
            iterations: 50,
            search: SearchConfig::default(),
            weights: FitnessWeights::default(),
            seed: 42,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        RunOptions::default()
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// How one job ended.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub job_id: String,
    pub iterations_run: usize,
    pub cancelled: bool,
    pub best: Solution,
}

/// Runs one job end to end: model, evaluator, driver, iterations, result.
///
/// Emits one progress record per completed iteration and the final result
/// through the sink. Stops early on a cancellation marker or when the job's
/// wall-clock budget runs out; both still emit the final result. Invalid or
/// infeasible input fails the whole job.
pub fn run_job(
    job: &Job,
    options: &RunOptions,
    source: &dyn JobSource,
    sink: &mut dyn ProgressSink,
) -> Result<JobOutcome> {
    let model = ProblemModel::new(job.problem_data.clone()).map_err(|errors| {
        let details: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        anyhow!("Invalid problem input: {}", details.join("; "))
    })?;
    let evaluator = Evaluator::new(&model, options.seed)?.with_weights(options.weights.clone());

    let mut driver = build_driver(options.algorithm, options.search.clone());
    driver.init(evaluator, options.seed);

    let deadline = Instant::now() + Duration::from_secs(job.max_execution_time);
    let mut iterations_run = 0;
    let mut cancelled = false;
    for iteration in 0..options.iterations {
        if source.is_cancelled(&job.job_id) {
            info!(
                "Job {} cancelled after {} iterations",
                job.job_id, iterations_run
            );
            cancelled = true;
            break;
        }
        if Instant::now() >= deadline {
            info!(
                "Job {} hit its {}s budget after {} iterations",
                job.job_id, job.max_execution_time, iterations_run
            );
            break;
        }

        let best = driver.run_iteration(iteration)?;
        iterations_run += 1;
        info!("Iteration {}, fitness: {}", iteration, best.fitness);
        sink.send_progress(&Progress::new(
            &job.job_id,
            iteration,
            driver.best_solution()?,
        ))?;
    }

    let best = driver.best_solution()?;
    sink.send_result(&job.job_id, &best)?;

    Ok(JobOutcome {
        job_id: job.job_id.clone(),
        iterations_run,
        cancelled,
        best,
    })
}

/// Drains the source, running every job it hands out.
///
/// A failed job is logged and skipped; the loop continues with the next
/// one. Only a failing source stops the drain.
pub fn process_jobs(
    source: &mut dyn JobSource,
    sink: &mut dyn ProgressSink,
    options: &RunOptions,
) -> Result<Vec<JobOutcome>> {
    let mut outcomes = Vec::new();
    while let Some(job) = source.receive()? {
        info!("Processing job {}", job.job_id);
        match run_job(&job, options, source, sink) {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => error!("Job {} failed: {err:#}", job.job_id),
        }
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::{Constraints, ProblemInput};

    #[derive(Debug, Default)]
    struct TestSource {
        jobs: VecDeque<Job>,
        cancel_after: Option<usize>,
        polls: AtomicUsize,
    }

    impl TestSource {
        fn with_jobs(jobs: Vec<Job>) -> Self {
            TestSource {
                jobs: jobs.into(),
                cancel_after: None,
                polls: AtomicUsize::new(0),
            }
        }
    }

    impl JobSource for TestSource {
        fn receive(&mut self) -> Result<Option<Job>> {
            Ok(self.jobs.pop_front())
        }

        fn is_cancelled(&self, _job_id: &str) -> bool {
            let poll = self.polls.fetch_add(1, Ordering::Relaxed);
            self.cancel_after.map(|n| poll >= n).unwrap_or(false)
        }
    }

    #[derive(Debug, Default)]
    struct TestSink {
        progress: Vec<Progress>,
        results: Vec<(String, Solution)>,
    }

    impl ProgressSink for TestSink {
        fn send_progress(&mut self, progress: &Progress) -> Result<()> {
            self.progress.push(progress.clone());
            Ok(())
        }

        fn send_result(&mut self, job_id: &str, solution: &Solution) -> Result<()> {
            self.results.push((job_id.to_string(), solution.clone()));
            Ok(())
        }
    }

    fn sample_job(job_id: &str) -> Job {
        Job::new(
            job_id,
            ProblemInput::new(Constraints {
                timeslots_per_day: vec![3],
                groups_per_subject: vec![1, 1],
                groups_soft_capacity: vec![2, 2],
                students_subjects: vec![vec![0], vec![1]],
                teachers_groups: vec![vec![0, 1]],
                rooms_unavailability_timeslots: vec![vec![]],
            }),
        )
    }

    fn quick_options() -> RunOptions {
        RunOptions::new()
            .with_iterations(3)
            .with_search(SearchConfig::new().with_population_size(4).with_elite_size(2))
    }

    #[test]
    fn test_run_job_completes_requested_iterations() {
        let source = TestSource::default();
        let mut sink = TestSink::default();
        let job = sample_job("job_ok");

        let outcome = run_job(&job, &quick_options(), &source, &mut sink).unwrap();
        assert_eq!(outcome.job_id, "job_ok");
        assert_eq!(outcome.iterations_run, 3);
        assert!(!outcome.cancelled);

        assert_eq!(sink.progress.len(), 3);
        for (iteration, progress) in sink.progress.iter().enumerate() {
            assert_eq!(progress.job_id, "job_ok");
            assert_eq!(progress.iteration, iteration);
        }
        assert_eq!(sink.results.len(), 1);
        assert_eq!(sink.results[0].0, "job_ok");
        assert_eq!(sink.results[0].1, outcome.best);
    }

    #[test]
    fn test_run_job_rejects_invalid_references() {
        let source = TestSource::default();
        let mut sink = TestSink::default();
        let mut job = sample_job("job_bad");
        job.problem_data.constraints.students_subjects = vec![vec![9]];

        let err = run_job(&job, &quick_options(), &source, &mut sink).unwrap_err();
        assert!(err.to_string().contains("unknown subject"));
        assert!(sink.results.is_empty());
    }

    #[test]
    fn test_run_job_rejects_infeasible_problem() {
        let source = TestSource::default();
        let mut sink = TestSink::default();
        let mut job = sample_job("job_full");
        // Two students enrolled in a subject with a single seat.
        job.problem_data.constraints.groups_soft_capacity = vec![1, 2];
        job.problem_data.constraints.students_subjects = vec![vec![0], vec![0]];

        assert!(run_job(&job, &quick_options(), &source, &mut sink).is_err());
        assert!(sink.results.is_empty());
    }

    #[test]
    fn test_run_job_honors_cancellation() {
        let mut source = TestSource::default();
        source.cancel_after = Some(2);
        let mut sink = TestSink::default();
        let job = sample_job("job_cancel");

        let options = quick_options().with_iterations(10);
        let outcome = run_job(&job, &options, &source, &mut sink).unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.iterations_run, 2);
        assert_eq!(sink.progress.len(), 2);
        // The best found so far is still reported.
        assert_eq!(sink.results.len(), 1);
    }

    #[test]
    fn test_run_job_stops_on_exhausted_budget() {
        let source = TestSource::default();
        let mut sink = TestSink::default();
        let job = sample_job("job_budget").with_max_execution_time(0);

        let outcome = run_job(&job, &quick_options(), &source, &mut sink).unwrap();
        assert_eq!(outcome.iterations_run, 0);
        assert!(!outcome.cancelled);
        assert!(sink.progress.is_empty());
        assert_eq!(sink.results.len(), 1);
    }

    #[test]
    fn test_process_jobs_skips_failed_jobs() {
        let mut bad = sample_job("job_bad");
        bad.problem_data.constraints.students_subjects = vec![vec![9]];
        let mut source = TestSource::with_jobs(vec![bad, sample_job("job_good")]);
        let mut sink = TestSink::default();

        let outcomes = process_jobs(&mut source, &mut sink, &quick_options()).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].job_id, "job_good");
        assert_eq!(sink.results.len(), 1);
    }
}
