//! Command-line front end: solve job files, generate test instances.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;

use evoplan::ga::{Algorithm, SearchConfig};
use evoplan::generator::{GeneratorConfig, InstanceGenerator};
use evoplan::io::{FileJobSource, FileProgressSink};
use evoplan::runner::{process_jobs, RunOptions};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize every job found at the input path.
    Solve {
        /// Job file, or directory of job files.
        #[arg(long)]
        input: PathBuf,
        /// Directory receiving progress and result files.
        #[arg(long, default_value = "out")]
        output_dir: PathBuf,
        /// Outer iterations per job.
        #[arg(long, default_value_t = 50)]
        iterations: usize,
        /// Population size.
        #[arg(long, default_value_t = 10)]
        population: usize,
        /// Individuals kept by selection each iteration.
        #[arg(long, default_value_t = 5)]
        elite: usize,
        /// Random seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Search algorithm.
        #[arg(long, value_enum, default_value_t = AlgorithmArg::Elitist)]
        algorithm: AlgorithmArg,
    },
    /// Generate a random problem instance and write it as a job file.
    Generate {
        /// Destination job file.
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 100)]
        students: usize,
        #[arg(long, default_value_t = 3)]
        subjects: usize,
        #[arg(long, default_value_t = 9)]
        groups: usize,
        #[arg(long, default_value_t = 1)]
        rooms: usize,
        #[arg(long, default_value_t = 1)]
        teachers: usize,
        /// Weekly timeslot total.
        #[arg(long, default_value_t = 25)]
        timeslots: usize,
        /// Seat total across all groups.
        #[arg(long, default_value_t = 260)]
        capacity: usize,
        /// Time budget recorded in the job, in seconds.
        #[arg(long, default_value_t = 300)]
        max_execution_time: u64,
        /// Random seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AlgorithmArg {
    /// Elitist selection with first-improvement hill climbing.
    Elitist,
    /// Independent resampling baseline.
    Random,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Elitist => Algorithm::ElitistFihc,
            AlgorithmArg::Random => Algorithm::RandomSearch,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Solve {
            input,
            output_dir,
            iterations,
            population,
            elite,
            seed,
            algorithm,
        } => {
            let mut source = FileJobSource::new(&input)?;
            let mut sink = FileProgressSink::new(&output_dir)?;
            let options = RunOptions::new()
                .with_algorithm(algorithm.into())
                .with_iterations(iterations)
                .with_search(
                    SearchConfig::new()
                        .with_population_size(population)
                        .with_elite_size(elite),
                )
                .with_seed(seed);

            let outcomes = process_jobs(&mut source, &mut sink, &options)?;
            info!("Processed {} jobs", outcomes.len());
        }
        Command::Generate {
            output,
            students,
            subjects,
            groups,
            rooms,
            teachers,
            timeslots,
            capacity,
            max_execution_time,
            seed,
        } => {
            let config = GeneratorConfig::new()
                .with_students(students)
                .with_subjects(subjects)
                .with_groups(groups)
                .with_rooms(rooms)
                .with_teachers(teachers)
                .with_timeslots(timeslots)
                .with_capacity(capacity);
            let job = InstanceGenerator::new(config, seed)
                .generate_job("test_job")
                .with_max_execution_time(max_execution_time);

            let encoded = serde_json::to_string_pretty(&job).context("Failed to serialize job")?;
            fs::write(&output, encoded)
                .with_context(|| format!("Failed to write job file: {}", output.display()))?;
            info!("Wrote job file {}", output.display());
        }
    }
    Ok(())
}
