//! Fitness evaluation.
//!
//! The [`Evaluator`] binds to one [`ProblemModel`] and derives the per-gene
//! legal-value bound table from it. It seeds new individuals, repairs
//! capacity violations, and scores genotypes.
//!
//! # Fitness model
//!
//! Three sectors, each in `[0, 1]` before penalties:
//! - Student: satisfied preference weight over declared weight, per student,
//!   averaged over all students.
//! - Teacher: the same free/busy/gaps/timeslot logic over taught groups.
//! - Management: satisfied room-timeslot preference weight, minus a penalty
//!   per hard conflict (shared room-timeslot cell, placement in an
//!   unavailable room, one person needed in two places at once) and a
//!   penalty per seat beyond soft capacity plus the declared overflow
//!   allowance.
//!
//! Sectors are combined by [`FitnessWeights`]; default penalties are sized
//! so one hard conflict outweighs any preference gain. Maximization
//! objective, no fixed range.
//!
//! # Reference
//! Lewis (2008), "A survey of metaheuristic-based techniques for University
//! Timetabling problems", OR Spectrum 30(1)

use std::collections::HashMap;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::ga::Individual;
use crate::models::Solution;
use crate::problem::ProblemModel;

/// Sector weights and penalty sizes for the fitness scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub student_weight: f64,
    pub teacher_weight: f64,
    pub management_weight: f64,
    /// Subtracted once per hard conflict occurrence.
    pub conflict_penalty: f64,
    /// Multiplier on the declared overflow weight, per excess seat.
    pub overflow_penalty: f64,
    /// Disables the tie-break perturbation so identical genotypes evaluate
    /// bit-identically.
    pub deterministic: bool,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            student_weight: 1.0,
            teacher_weight: 1.0,
            management_weight: 1.0,
            conflict_penalty: 10.0,
            overflow_penalty: 1.0,
            deterministic: false,
        }
    }
}

impl FitnessWeights {
    pub fn new() -> Self {
        FitnessWeights::default()
    }

    pub fn with_student_weight(mut self, weight: f64) -> Self {
        self.student_weight = weight;
        self
    }

    pub fn with_teacher_weight(mut self, weight: f64) -> Self {
        self.teacher_weight = weight;
        self
    }

    pub fn with_management_weight(mut self, weight: f64) -> Self {
        self.management_weight = weight;
        self
    }

    pub fn with_conflict_penalty(mut self, penalty: f64) -> Self {
        self.conflict_penalty = penalty;
        self
    }

    pub fn with_overflow_penalty(mut self, penalty: f64) -> Self {
        self.overflow_penalty = penalty;
        self
    }

    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }
}

/// Decomposed sector values behind one scalar fitness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitnessBreakdown {
    pub student_fitnesses: Vec<f64>,
    pub teacher_fitnesses: Vec<f64>,
    pub management_fitness: f64,
}

/// Scores genotypes against one problem model.
///
/// Construction refuses an infeasible model, so every other operation may
/// assume per-subject capacity covers enrollment and every group fits some
/// room-timeslot cell.
#[derive(Debug)]
pub struct Evaluator<'a> {
    model: &'a ProblemModel,
    weights: FitnessWeights,
    /// Inclusive per-gene upper bound; gene minimums are always 0.
    max_values: Vec<usize>,
    /// Owning student per student-subject slot.
    slot_student: Vec<usize>,
    /// Subject per student-subject slot.
    slot_subject: Vec<usize>,
    /// Prefix sums of timeslots per day, length `days + 1`.
    day_offset: Vec<usize>,
    rng: SmallRng,
    last_breakdown: FitnessBreakdown,
}

impl<'a> Evaluator<'a> {
    /// Builds the bound table and slot lookup tables.
    ///
    /// Fails with an infeasible-problem error when the model's upfront
    /// feasibility check failed; this is the gate that keeps infeasible
    /// instances out of the search.
    pub fn new(model: &'a ProblemModel, seed: u64) -> Result<Self, SolverError> {
        if !model.is_feasible() {
            return Err(SolverError::infeasible_problem(
                "model failed the capacity/cell feasibility check",
            ));
        }

        let total_genes = model.total_student_subject_slots() + model.groups_total() * 2;
        let mut max_values = Vec::with_capacity(total_genes);
        let mut slot_student = Vec::with_capacity(model.total_student_subject_slots());
        let mut slot_subject = Vec::with_capacity(model.total_student_subject_slots());
        for student in 0..model.students() {
            for &subject in model.student_subjects(student) {
                max_values.push(model.groups_per_subject()[subject] - 1);
                slot_student.push(student);
                slot_subject.push(subject);
            }
        }
        for _ in 0..model.groups_total() {
            max_values.push(model.total_timeslots() - 1);
            max_values.push(model.rooms() - 1);
        }

        let mut day_offset = Vec::with_capacity(model.days() + 1);
        day_offset.push(0);
        for &count in model.timeslots_per_day() {
            day_offset.push(day_offset[day_offset.len() - 1] + count);
        }

        debug!(
            "Evaluator ready: {} genes ({} student slots, {} groups)",
            max_values.len(),
            slot_subject.len(),
            model.groups_total()
        );

        Ok(Evaluator {
            model,
            weights: FitnessWeights::default(),
            max_values,
            slot_student,
            slot_subject,
            day_offset,
            rng: SmallRng::seed_from_u64(seed),
            last_breakdown: FitnessBreakdown::default(),
        })
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    #[inline]
    pub fn model(&self) -> &'a ProblemModel {
        self.model
    }

    #[inline]
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Length of a valid genotype.
    #[inline]
    pub fn total_genes(&self) -> usize {
        self.max_values.len()
    }

    /// Inclusive upper bound for one gene position.
    #[inline]
    pub fn max_gene_value(&self, index: usize) -> usize {
        self.max_values[index]
    }

    /// Sector values recorded by the most recent `evaluate` call.
    #[inline]
    pub fn last_breakdown(&self) -> &FitnessBreakdown {
        &self.last_breakdown
    }

    /// Fills the genotype with independent uniform draws within the bound
    /// table, repairs it, then evaluates and caches fitness. The sole
    /// seeding path for new individuals.
    pub fn init_random(&mut self, individual: &mut Individual) {
        individual.genotype.clear();
        individual.genotype.reserve(self.max_values.len());
        for index in 0..self.max_values.len() {
            let max = self.max_values[index];
            individual.genotype.push(self.rng.random_range(0..=max));
        }

        let (was_repaired, repaired) = self.repair(individual);
        if was_repaired {
            debug!("Seed genotype exceeded group capacity; repaired");
        }
        *individual = repaired;
        individual.fitness = self.evaluate(individual);
    }

    /// Detects groups filled beyond their soft capacity and reassigns the
    /// excess to sibling groups of the same subject.
    ///
    /// Deterministic: excess students move in slot order, always into the
    /// least-filled sibling with spare seats (lowest group id on ties).
    /// Never changes genotype length, gene bounds, or which subjects a
    /// student takes. Returns whether a violation was found together with
    /// the repaired copy.
    pub fn repair(&self, individual: &Individual) -> (bool, Individual) {
        debug_assert_eq!(individual.genotype.len(), self.max_values.len());

        let offsets = self.model.cumulative_group_offset();
        let capacity = self.model.groups_soft_capacity();
        let mut repaired = individual.clone();

        let mut occupancy = vec![0usize; self.model.groups_total()];
        for slot in 0..self.slot_subject.len() {
            occupancy[offsets[self.slot_subject[slot]] + repaired.genotype[slot]] += 1;
        }

        let mut was_repaired = false;
        for subject in 0..self.model.subjects() {
            let start = offsets[subject];
            let end = offsets[subject + 1];
            for group in start..end {
                while occupancy[group] > capacity[group] {
                    // Feasibility guarantees a sibling with spare seats.
                    let target = (start..end)
                        .filter(|&g| occupancy[g] < capacity[g])
                        .min_by_key(|&g| occupancy[g]);
                    let target = match target {
                        Some(g) => g,
                        None => break,
                    };
                    let slot = (0..self.slot_subject.len()).find(|&slot| {
                        self.slot_subject[slot] == subject
                            && start + repaired.genotype[slot] == group
                    });
                    let slot = match slot {
                        Some(s) => s,
                        None => break,
                    };
                    repaired.genotype[slot] = target - start;
                    occupancy[group] -= 1;
                    occupancy[target] += 1;
                    was_repaired = true;
                }
            }
        }

        (was_repaired, repaired)
    }

    /// Scores a genotype. Records the sector decomposition for reporting.
    ///
    /// Unless the weights are deterministic, a tiny perturbation from the
    /// evaluator's own random source breaks exact ties between candidates.
    pub fn evaluate(&mut self, individual: &Individual) -> f64 {
        let (core, breakdown) = self.compute(individual);
        self.last_breakdown = breakdown;
        if self.weights.deterministic {
            core
        } else {
            core + self.rng.random_range(-1e-9..=1e-9)
        }
    }

    /// Sector decomposition of a genotype, without the tie-break
    /// perturbation and without touching evaluator state.
    pub fn breakdown(&self, individual: &Individual) -> FitnessBreakdown {
        self.compute(individual).1
    }

    /// Decodes an individual into the reporting shape: per-student absolute
    /// groups, per-group placements, and the sector decomposition.
    pub fn solution(&self, individual: &Individual) -> Result<Solution, SolverError> {
        if individual.genotype.len() != self.max_values.len() {
            return Err(SolverError::index_out_of_range(format!(
                "genotype has {} genes, expected {}",
                individual.genotype.len(),
                self.max_values.len()
            )));
        }

        let model = self.model;
        let mut by_student = Vec::with_capacity(model.students());
        let mut slot = 0;
        for student in 0..model.students() {
            let mut groups = Vec::with_capacity(model.student_subjects(student).len());
            for _ in model.student_subjects(student) {
                groups.push(model.absolute_group_index(slot, individual.genotype[slot])?);
                slot += 1;
            }
            by_student.push(groups);
        }

        let region = model.total_student_subject_slots();
        let mut by_group = Vec::with_capacity(model.groups_total());
        for group in 0..model.groups_total() {
            by_group.push([
                individual.genotype[region + 2 * group],
                individual.genotype[region + 2 * group + 1],
            ]);
        }

        let breakdown = self.breakdown(individual);
        Ok(Solution {
            genotype: individual.genotype.clone(),
            fitness: individual.fitness,
            by_student,
            by_group,
            student_fitnesses: breakdown.student_fitnesses,
            teacher_fitnesses: breakdown.teacher_fitnesses,
            management_fitness: breakdown.management_fitness,
        })
    }

    // ======================== Scoring ========================

    fn compute(&self, individual: &Individual) -> (f64, FitnessBreakdown) {
        debug_assert_eq!(individual.genotype.len(), self.max_values.len());

        let model = self.model;
        let offsets = model.cumulative_group_offset();
        let region = self.slot_subject.len();
        let groups_total = model.groups_total();

        let mut group_timeslot = vec![0usize; groups_total];
        let mut group_room = vec![0usize; groups_total];
        for group in 0..groups_total {
            group_timeslot[group] = individual.genotype[region + 2 * group];
            group_room[group] = individual.genotype[region + 2 * group + 1];
        }

        let mut student_groups: Vec<Vec<usize>> = vec![Vec::new(); model.students()];
        let mut occupancy = vec![0usize; groups_total];
        for slot in 0..region {
            let group = offsets[self.slot_subject[slot]] + individual.genotype[slot];
            student_groups[self.slot_student[slot]].push(group);
            occupancy[group] += 1;
        }

        let mut student_fitnesses = Vec::with_capacity(model.students());
        for student in 0..model.students() {
            let value = match model.student_preferences(student) {
                Some(prefs) if model.student_weight_sum(student) > 0.0 => {
                    let occupied: Vec<usize> = student_groups[student]
                        .iter()
                        .map(|&g| group_timeslot[g])
                        .collect();
                    let mut satisfied = self.timeslot_satisfaction(
                        &prefs.free_days,
                        &prefs.busy_days,
                        prefs.no_gaps,
                        &prefs.preferred_timeslots,
                        &prefs.avoid_timeslots,
                        &occupied,
                    );
                    for (&group, &weight) in &prefs.preferred_groups {
                        if student_groups[student].contains(&group) {
                            satisfied += weight;
                        }
                    }
                    for (&group, &weight) in &prefs.avoid_groups {
                        if !student_groups[student].contains(&group) {
                            satisfied += weight;
                        }
                    }
                    satisfied / model.student_weight_sum(student)
                }
                _ => 0.0,
            };
            student_fitnesses.push(value);
        }

        let mut teacher_fitnesses = Vec::with_capacity(model.teachers());
        for teacher in 0..model.teachers() {
            let value = match model.teacher_preferences(teacher) {
                Some(prefs) if model.teacher_weight_sum(teacher) > 0.0 => {
                    let occupied: Vec<usize> = model
                        .teacher_groups(teacher)
                        .iter()
                        .map(|&g| group_timeslot[g])
                        .collect();
                    let satisfied = self.timeslot_satisfaction(
                        &prefs.free_days,
                        &prefs.busy_days,
                        prefs.no_gaps,
                        &prefs.preferred_timeslots,
                        &prefs.avoid_timeslots,
                        &occupied,
                    );
                    satisfied / model.teacher_weight_sum(teacher)
                }
                _ => 0.0,
            };
            teacher_fitnesses.push(value);
        }

        let management = model.management_preferences();
        let mut declared = 0.0;
        let mut satisfied = 0.0;
        for pref in &management.preferred_room_timeslots {
            declared += pref.weight;
            if cell_occupied(&group_timeslot, &group_room, pref.timeslot, pref.room) {
                satisfied += pref.weight;
            }
        }
        for pref in &management.avoid_room_timeslots {
            declared += pref.weight;
            if !cell_occupied(&group_timeslot, &group_room, pref.timeslot, pref.room) {
                satisfied += pref.weight;
            }
        }
        let mut management_fitness = if declared > 0.0 { satisfied / declared } else { 0.0 };

        let conflicts = self.count_conflicts(&group_timeslot, &group_room, &student_groups);
        management_fitness -= self.weights.conflict_penalty * conflicts as f64;

        let allowance = &management.group_max_overflow;
        let capacity = model.groups_soft_capacity();
        let mut excess = 0usize;
        for group in 0..groups_total {
            let limit = capacity[group] + allowance.value;
            if occupancy[group] > limit {
                excess += occupancy[group] - limit;
            }
        }
        management_fitness -= self.weights.overflow_penalty * allowance.weight * excess as f64;

        let core = self.weights.student_weight * mean(&student_fitnesses)
            + self.weights.teacher_weight * mean(&teacher_fitnesses)
            + self.weights.management_weight * management_fitness;

        (
            core,
            FitnessBreakdown {
                student_fitnesses,
                teacher_fitnesses,
                management_fitness,
            },
        )
    }

    /// Satisfied weight from the day, gap, and timeslot preferences shared
    /// by students and teachers, given that person's occupied timeslots.
    fn timeslot_satisfaction(
        &self,
        free_days: &[f64],
        busy_days: &[f64],
        no_gaps: f64,
        preferred_timeslots: &std::collections::BTreeMap<usize, f64>,
        avoid_timeslots: &std::collections::BTreeMap<usize, f64>,
        occupied: &[usize],
    ) -> f64 {
        let days = self.day_offset.len() - 1;
        let mut day_has_class = vec![false; days];
        for &timeslot in occupied {
            if let Some(day) = self.model.day_of_timeslot(timeslot) {
                day_has_class[day] = true;
            }
        }

        let mut satisfied = 0.0;
        for (day, &weight) in free_days.iter().enumerate() {
            if !day_has_class[day] {
                satisfied += weight;
            }
        }
        for (day, &weight) in busy_days.iter().enumerate() {
            if day_has_class[day] {
                satisfied += weight;
            }
        }
        if !self.has_gaps(occupied) {
            satisfied += no_gaps;
        }
        for (&timeslot, &weight) in preferred_timeslots {
            if occupied.contains(&timeslot) {
                satisfied += weight;
            }
        }
        for (&timeslot, &weight) in avoid_timeslots {
            if !occupied.contains(&timeslot) {
                satisfied += weight;
            }
        }
        satisfied
    }

    /// A day has a gap when its occupied slots are not contiguous.
    fn has_gaps(&self, occupied: &[usize]) -> bool {
        for day in 0..self.day_offset.len() - 1 {
            let start = self.day_offset[day];
            let end = self.day_offset[day + 1];
            let mut slots: Vec<usize> = occupied
                .iter()
                .filter(|&&t| t >= start && t < end)
                .copied()
                .collect();
            slots.sort_unstable();
            slots.dedup();
            if slots.len() >= 2 && slots[slots.len() - 1] - slots[0] + 1 > slots.len() {
                return true;
            }
        }
        false
    }

    fn count_conflicts(
        &self,
        group_timeslot: &[usize],
        group_room: &[usize],
        student_groups: &[Vec<usize>],
    ) -> usize {
        let model = self.model;
        let mut conflicts = 0;

        let mut cell_load: HashMap<(usize, usize), usize> = HashMap::new();
        for group in 0..group_timeslot.len() {
            *cell_load
                .entry((group_timeslot[group], group_room[group]))
                .or_insert(0) += 1;
        }
        conflicts += cell_load
            .values()
            .filter(|&&load| load > 1)
            .map(|&load| load - 1)
            .sum::<usize>();

        for group in 0..group_timeslot.len() {
            if model.is_room_unavailable(group_room[group], group_timeslot[group]) {
                conflicts += 1;
            }
        }

        for groups in student_groups {
            conflicts += double_booked(groups.iter().map(|&g| group_timeslot[g]));
        }
        for teacher in 0..model.teachers() {
            conflicts += double_booked(
                model
                    .teacher_groups(teacher)
                    .iter()
                    .map(|&g| group_timeslot[g]),
            );
        }

        conflicts
    }
}

fn cell_occupied(group_timeslot: &[usize], group_room: &[usize], timeslot: usize, room: usize) -> bool {
    (0..group_timeslot.len()).any(|g| group_timeslot[g] == timeslot && group_room[g] == room)
}

/// Timeslot multiplicity beyond one, summed; each extra booking is one
/// conflict.
fn double_booked(timeslots: impl Iterator<Item = usize>) -> usize {
    let mut seen: Vec<usize> = timeslots.collect();
    let total = seen.len();
    seen.sort_unstable();
    seen.dedup();
    total - seen.len()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
