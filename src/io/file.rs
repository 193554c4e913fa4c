//! File-based job transport.
//!
//! Jobs are JSON files in a directory, handed out in name order.
//! Cancellation is signalled by dropping a `{job_id}.cancel` marker next to
//! the job files. Progress and results are written as JSON files into an
//! output directory.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{JobSource, ProgressSink};
use crate::models::{Job, Progress, Solution};

/// Reads jobs from a directory of `*.json` files, or from a single file.
#[derive(Debug)]
pub struct FileJobSource {
    /// Directory consulted for `{job_id}.cancel` markers.
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
}

impl FileJobSource {
    /// Accepts either a job file or a directory of job files. For a
    /// directory, every `*.json` entry becomes one job, in name order.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("Failed to read job directory: {}", path.display()))?;
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
                .collect();
            files.sort();
            Ok(FileJobSource {
                dir: path.to_path_buf(),
                pending: files.into(),
            })
        } else {
            let dir = match path.parent() {
                Some(parent) if parent != Path::new("") => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            Ok(FileJobSource {
                dir,
                pending: VecDeque::from(vec![path.to_path_buf()]),
            })
        }
    }
}

impl JobSource for FileJobSource {
    fn receive(&mut self) -> Result<Option<Job>> {
        let path = match self.pending.pop_front() {
            Some(path) => path,
            None => return Ok(None),
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read job file: {}", path.display()))?;
        let job: Job = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse job file: {}", path.display()))?;
        Ok(Some(job))
    }

    fn is_cancelled(&self, job_id: &str) -> bool {
        self.dir.join(format!("{job_id}.cancel")).exists()
    }
}

/// Writes `{job_id}_iter_{n}.json` progress files and a final
/// `{job_id}_result.json` into one output directory.
#[derive(Debug)]
pub struct FileProgressSink {
    dir: PathBuf,
}

impl FileProgressSink {
    /// Creates the output directory if it does not exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(FileProgressSink { dir })
    }
}

impl ProgressSink for FileProgressSink {
    fn send_progress(&mut self, progress: &Progress) -> Result<()> {
        let path = self
            .dir
            .join(format!("{}_iter_{}.json", progress.job_id, progress.iteration));
        let content =
            serde_json::to_string_pretty(progress).context("Failed to serialize progress")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write progress file: {}", path.display()))?;
        Ok(())
    }

    fn send_result(&mut self, job_id: &str, solution: &Solution) -> Result<()> {
        let path = self.dir.join(format!("{job_id}_result.json"));
        let content =
            serde_json::to_string_pretty(solution).context("Failed to serialize result")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write result file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Constraints, ProblemInput};

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("evoplan_io_{}_{}", std::process::id(), tag));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_job(job_id: &str) -> Job {
        Job::new(
            job_id,
            ProblemInput::new(Constraints {
                timeslots_per_day: vec![2],
                groups_per_subject: vec![1],
                groups_soft_capacity: vec![4],
                students_subjects: vec![vec![0]],
                teachers_groups: vec![vec![0]],
                rooms_unavailability_timeslots: vec![vec![]],
            }),
        )
    }

    #[test]
    fn test_directory_source_in_name_order() {
        let dir = scratch_dir("dir_order");
        fs::write(
            dir.join("b.json"),
            serde_json::to_string(&sample_job("job_b")).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.join("a.json"),
            serde_json::to_string(&sample_job("job_a")).unwrap(),
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "not a job").unwrap();

        let mut source = FileJobSource::new(&dir).unwrap();
        assert_eq!(source.receive().unwrap().unwrap().job_id, "job_a");
        assert_eq!(source.receive().unwrap().unwrap().job_id, "job_b");
        assert!(source.receive().unwrap().is_none());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_single_file_source() {
        let dir = scratch_dir("single");
        let path = dir.join("only.json");
        fs::write(&path, serde_json::to_string(&sample_job("job_only")).unwrap()).unwrap();

        let mut source = FileJobSource::new(&path).unwrap();
        assert_eq!(source.receive().unwrap().unwrap().job_id, "job_only");
        assert!(source.receive().unwrap().is_none());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cancellation_marker() {
        let dir = scratch_dir("cancel");
        fs::write(
            dir.join("j.json"),
            serde_json::to_string(&sample_job("job_c")).unwrap(),
        )
        .unwrap();

        let source = FileJobSource::new(&dir).unwrap();
        assert!(!source.is_cancelled("job_c"));

        fs::write(dir.join("job_c.cancel"), "").unwrap();
        assert!(source.is_cancelled("job_c"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_job_file_is_an_error() {
        let dir = scratch_dir("malformed");
        let path = dir.join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let mut source = FileJobSource::new(&path).unwrap();
        assert!(source.receive().is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sink_writes_progress_and_result() {
        let dir = scratch_dir("sink");
        let out = dir.join("out");
        let mut sink = FileProgressSink::new(&out).unwrap();

        let solution = Solution {
            genotype: vec![0, 1, 0],
            fitness: 0.5,
            by_student: vec![vec![0]],
            by_group: vec![[1, 0]],
            student_fitnesses: vec![0.5],
            teacher_fitnesses: vec![],
            management_fitness: 0.0,
        };
        let progress = Progress::new("job_s", 3, solution.clone());
        sink.send_progress(&progress).unwrap();
        sink.send_result("job_s", &solution).unwrap();

        let raw = fs::read_to_string(out.join("job_s_iter_3.json")).unwrap();
        let decoded: Progress = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded, progress);

        let raw = fs::read_to_string(out.join("job_s_result.json")).unwrap();
        let decoded: Solution = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded, solution);

        fs::remove_dir_all(&dir).ok();
    }
}
