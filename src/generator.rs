//! Synthetic problem-instance generation.
//!
//! Produces random but structurally valid timetabling instances for testing
//! and benchmarking: every reference is in range, every parallel array has
//! the right length, and all random splits sum exactly to the requested
//! totals. Feasibility is not guaranteed for arbitrary dimension choices;
//! a tight capacity against a skewed group split can still starve one
//! subject.
//!
//! Preference weights follow a discrete logarithmic distribution,
//! P(k) proportional to 1/(k+1) for k in 0..100, so small weights dominate
//! and the occasional strong opinion stands out.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};
use rand::distr::weighted::WeightedIndex;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::models::{
    Constraints, Job, ManagementPreferences, OverflowAllowance, Preferences, ProblemInput,
    RoomTimeslotPreference, StudentPreferences, TeacherPreferences,
};

const DAYS: usize = 7;
const MAX_WEIGHT: usize = 100;
/// Higher means more management room-timeslot preferences.
const MGMT_PREFERENCE_DENSITY_FACTOR: usize = 10;

/// Instance dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub students: usize,
    pub subjects: usize,
    pub groups: usize,
    pub rooms: usize,
    pub teachers: usize,
    /// Weekly timeslot total, spread over the teaching days.
    pub timeslots: usize,
    /// Seat total, split across all groups.
    pub capacity: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            students: 100,
            subjects: 3,
            groups: 9,
            rooms: 1,
            teachers: 1,
            timeslots: 25,
            capacity: 260,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        GeneratorConfig::default()
    }

    pub fn with_students(mut self, students: usize) -> Self {
        self.students = students;
        self
    }

    pub fn with_subjects(mut self, subjects: usize) -> Self {
        self.subjects = subjects;
        self
    }

    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_rooms(mut self, rooms: usize) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_teachers(mut self, teachers: usize) -> Self {
        self.teachers = teachers;
        self
    }

    pub fn with_timeslots(mut self, timeslots: usize) -> Self {
        self.timeslots = timeslots;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Seeded generator of random timetabling instances.
#[derive(Debug)]
pub struct InstanceGenerator {
    config: GeneratorConfig,
    rng: SmallRng,
    weight_index: WeightedIndex<f64>,
}

impl InstanceGenerator {
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        let harmonic: Vec<f64> = (0..MAX_WEIGHT).map(|k| 1.0 / (k as f64 + 1.0)).collect();
        InstanceGenerator {
            config,
            rng: SmallRng::seed_from_u64(seed),
            weight_index: WeightedIndex::new(&harmonic).unwrap(),
        }
    }

    /// Generates one problem instance with the configured dimensions.
    pub fn generate(&mut self) -> ProblemInput {
        let config = self.config.clone();
        info!(
            "Generating instance: {} students, {} subjects, {} groups, {} rooms, {} teachers, {} timeslots, capacity {}",
            config.students,
            config.subjects,
            config.groups,
            config.rooms,
            config.teachers,
            config.timeslots,
            config.capacity
        );

        // Half the instances keep the weekend class-free.
        let weekend_free = self.rng.random_bool(0.5);
        let teaching_days = if weekend_free { 5 } else { DAYS };
        let mut timeslots_per_day = vec![0usize; DAYS];
        let split = self.split_normal(
            config.timeslots,
            teaching_days,
            0,
            third(config.timeslots, teaching_days),
        );
        timeslots_per_day[..teaching_days].copy_from_slice(&split);

        let groups_per_subject = self.split_normal(config.groups, config.subjects, 1, 1.0);
        let groups_total: usize = groups_per_subject.iter().sum();
        let groups_soft_capacity =
            self.split_normal(config.capacity, groups_total, 1, third(config.capacity, groups_total));

        let mut students_subjects = Vec::with_capacity(config.students);
        for _ in 0..config.students {
            let take = if config.subjects == 0 {
                0
            } else {
                self.rng.random_range(1..=config.subjects)
            };
            let mut subjects: Vec<usize> = (0..config.subjects).collect();
            subjects.shuffle(&mut self.rng);
            subjects.truncate(take);
            students_subjects.push(subjects);
        }

        let teachers_groups = self.assign_teachers(groups_total);

        let mut rooms_unavailability_timeslots = Vec::with_capacity(config.rooms);
        for _ in 0..config.rooms {
            let count = self.rng.random_range(0..=config.timeslots / 4);
            let mut timeslots: Vec<usize> = (0..config.timeslots).collect();
            timeslots.shuffle(&mut self.rng);
            timeslots.truncate(count);
            timeslots.sort_unstable();
            rooms_unavailability_timeslots.push(timeslots);
        }

        let mut students = Vec::with_capacity(config.students);
        for student in 0..config.students {
            let mut prefs = StudentPreferences::new();
            self.fill_day_preferences(&mut prefs.free_days, &mut prefs.busy_days);
            prefs.no_gaps = self.log_weight();

            for &subject in &students_subjects[student] {
                let start: usize = groups_per_subject[..subject].iter().sum();
                let count = groups_per_subject[subject];
                let mut groups: Vec<usize> = (start..start + count).collect();

                let preferred = self.rng.random_range(0..=count);
                groups.shuffle(&mut self.rng);
                for index in 0..preferred {
                    let weight = self.log_weight();
                    if weight > 0.0 {
                        prefs.preferred_groups.insert(groups[index], weight);
                    }
                }
                let avoided = self.rng.random_range(0..=count);
                groups.shuffle(&mut self.rng);
                for index in 0..avoided {
                    let weight = self.log_weight();
                    if weight > 0.0 {
                        prefs.avoid_groups.insert(groups[index], weight);
                    }
                }
            }

            for _ in 0..students_subjects[student].len() {
                self.fill_timeslot_preferences(
                    &mut prefs.preferred_timeslots,
                    &mut prefs.avoid_timeslots,
                );
            }
            students.push(prefs);
        }

        let mut teachers = Vec::with_capacity(config.teachers);
        for teacher in 0..config.teachers {
            let mut prefs = TeacherPreferences::new();
            self.fill_day_preferences(&mut prefs.free_days, &mut prefs.busy_days);
            prefs.no_gaps = self.log_weight();

            for _ in 0..teachers_groups[teacher].len() {
                self.fill_timeslot_preferences(
                    &mut prefs.preferred_timeslots,
                    &mut prefs.avoid_timeslots,
                );
            }
            teachers.push(prefs);
        }

        let mut management = ManagementPreferences::new();
        if config.rooms > 0 && config.timeslots > 0 {
            let ceiling = config.rooms * config.timeslots / MGMT_PREFERENCE_DENSITY_FACTOR;
            let preferred = self.rng.random_range(0..=ceiling);
            for _ in 0..preferred {
                let pref = self.random_cell_preference();
                if pref.weight > 0.0 {
                    management.preferred_room_timeslots.push(pref);
                }
            }
            let avoided = self.rng.random_range(0..=ceiling);
            for _ in 0..avoided {
                let pref = self.random_cell_preference();
                if pref.weight > 0.0 {
                    management.avoid_room_timeslots.push(pref);
                }
            }
        }
        management.group_max_overflow =
            OverflowAllowance::new(self.rng.random_range(0..=10), self.log_weight());

        debug!(
            "Generated instance: {} groups over {} subjects, weekend free: {}",
            groups_total, config.subjects, weekend_free
        );

        ProblemInput::new(Constraints {
            timeslots_per_day,
            groups_per_subject,
            groups_soft_capacity,
            students_subjects,
            teachers_groups,
            rooms_unavailability_timeslots,
        })
        .with_preferences(Preferences {
            students,
            teachers,
            management,
        })
    }

    /// Wraps a generated instance in a job with a unique id.
    pub fn generate_job(&mut self, id_prefix: &str) -> Job {
        let input = self.generate();
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let job_id = format!("{}_{}_{}", id_prefix, epoch, self.rng.random_range(1000..=9999));
        info!("Generated job {job_id}");
        Job::new(job_id, input)
    }

    /// Splits `total` into `parts` shares that sum to `total` exactly, each
    /// at least `minimum` when the total allows it, drawn around the even
    /// share.
    fn split_normal(
        &mut self,
        total: usize,
        parts: usize,
        minimum: usize,
        stddev: f64,
    ) -> Vec<usize> {
        if parts == 0 {
            return Vec::new();
        }
        let minimum = if minimum * parts > total { 0 } else { minimum };
        let normal = Normal::new(total as f64 / parts as f64, stddev).unwrap();

        let mut shares = Vec::with_capacity(parts);
        let mut remaining = total;
        for index in 0..parts - 1 {
            let parts_left = parts - 1 - index;
            let ceiling = remaining - minimum * parts_left;
            let draw = normal.sample(&mut self.rng).round();
            let share = (draw.max(minimum as f64) as usize).min(ceiling);
            shares.push(share);
            remaining -= share;
        }
        shares.push(remaining);
        shares
    }

    /// Deals groups to teachers in contiguous chunks of normal-drawn size;
    /// the last teacher takes whatever remains.
    fn assign_teachers(&mut self, groups_total: usize) -> Vec<Vec<usize>> {
        let teachers = self.config.teachers;
        let mut assignments: Vec<Vec<usize>> = vec![Vec::new(); teachers];
        if teachers == 0 {
            return assignments;
        }

        let normal = Normal::new(groups_total as f64 / teachers as f64, 1.0).unwrap();
        let mut next = 0usize;
        for teacher in 0..teachers {
            let chunk = if teacher == teachers - 1 {
                groups_total - next
            } else {
                let draw = normal.sample(&mut self.rng).round();
                (draw.max(1.0) as usize).min(groups_total - next)
            };
            for _ in 0..chunk {
                assignments[teacher].push(next);
                next += 1;
            }
        }
        assignments
    }

    /// Per day: a coin flip for having an opinion at all, then another for
    /// whether the day should be free or busy.
    fn fill_day_preferences(&mut self, free_days: &mut Vec<f64>, busy_days: &mut Vec<f64>) {
        free_days.resize(DAYS, 0.0);
        busy_days.resize(DAYS, 0.0);
        for day in 0..DAYS {
            if self.rng.random_bool(0.5) {
                let weight = self.log_weight();
                if self.rng.random_bool(0.5) {
                    free_days[day] = weight;
                } else {
                    busy_days[day] = weight;
                }
            }
        }
    }

    /// Sprinkles weighted timeslot preferences over up to half the week.
    fn fill_timeslot_preferences(
        &mut self,
        preferred: &mut BTreeMap<usize, f64>,
        avoided: &mut BTreeMap<usize, f64>,
    ) {
        let timeslots = self.config.timeslots;
        let half = (timeslots / 2).max(1);
        let mut all: Vec<usize> = (0..timeslots).collect();

        let count = self.rng.random_range(0..=timeslots) % half;
        all.shuffle(&mut self.rng);
        for index in 0..count {
            let weight = self.log_weight();
            if weight > 0.0 {
                preferred.insert(all[index], weight);
            }
        }

        let count = self.rng.random_range(0..=timeslots) % half;
        all.shuffle(&mut self.rng);
        for index in 0..count {
            let weight = self.log_weight();
            if weight > 0.0 {
                avoided.insert(all[index], weight);
            }
        }
    }

    fn random_cell_preference(&mut self) -> RoomTimeslotPreference {
        RoomTimeslotPreference::new(
            self.rng.random_range(0..self.config.rooms),
            self.rng.random_range(0..self.config.timeslots),
            self.log_weight(),
        )
    }

    fn log_weight(&mut self) -> f64 {
        self.weight_index.sample(&mut self.rng) as f64
    }
}

fn third(total: usize, parts: usize) -> f64 {
    if parts == 0 {
        0.0
    } else {
        total as f64 / parts as f64 / 3.0
    }
}
