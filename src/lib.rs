//! University course timetabling optimizer.
//!
//! Takes a problem statement — subjects split into groups, student
//! enrollments, teacher assignments, rooms with unavailable timeslots, and
//! weighted preferences from students, teachers, and management — and
//! searches for the timetable maximizing aggregate satisfaction.
//!
//! # Modules
//!
//! - **`models`**: Wire types — `ProblemInput`, `Constraints`, `Preferences`,
//!   `Job`, `Progress`, `Solution`
//! - **`validation`**: Input integrity checks (length mismatches, dangling
//!   references, duplicate enrollments)
//! - **`problem`**: Read-only indexed model built from validated input
//! - **`error`**: Solver error type shared by evaluator and drivers
//! - **`evaluator`**: Genotype decoding, repair, and weighted fitness
//! - **`ga`**: Search drivers — elitist selection with first-improvement
//!   hill climbing, and a random-resampling baseline
//! - **`runner`**: Job execution loop wiring sources, drivers, and sinks
//! - **`io`**: File-based job source and progress sink
//! - **`generator`**: Random test-instance generation
//!
//! # Architecture
//!
//! Data flows one way: a `ProblemInput` is validated into a `ProblemModel`,
//! the `Evaluator` borrows the model to score genotypes, and a
//! `SearchDriver` owns the evaluator for the length of one job. The runner
//! is the only place where transport and search meet, so drivers stay
//! testable without any filesystem.
//!
//! # References
//!
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"
//! - Schaerf (1999), "A survey of automated timetabling"
//! - Lewis (2008), "A survey of metaheuristic-based techniques for university timetabling problems"

pub mod error;
pub mod evaluator;
pub mod ga;
pub mod generator;
pub mod io;
pub mod models;
pub mod problem;
pub mod runner;
pub mod validation;
