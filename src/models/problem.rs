//! Problem input shapes: hard constraints and weighted preferences.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete problem statement for one optimization job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemInput {
    pub constraints: Constraints,
    #[serde(default)]
    pub preferences: Preferences,
}

impl ProblemInput {
    pub fn new(constraints: Constraints) -> Self {
        ProblemInput {
            constraints,
            preferences: Preferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }
}

/// Hard structure of the timetabling instance.
///
/// Groups are numbered globally: subject 0 owns groups
/// `0..groups_per_subject[0]`, subject 1 the next block, and so on. All
/// preference maps refer to these absolute group ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Teaching slots per day; the sum is the global timeslot count and
    /// timeslot ids run day by day in this order.
    pub timeslots_per_day: Vec<usize>,
    pub groups_per_subject: Vec<usize>,
    /// Nominal seat count per group, indexed by absolute group id.
    pub groups_soft_capacity: Vec<usize>,
    /// Subjects taken by each student; the order fixes that student's gene
    /// layout.
    pub students_subjects: Vec<Vec<usize>>,
    /// Groups taught by each teacher, as absolute group ids.
    pub teachers_groups: Vec<Vec<usize>>,
    /// Timeslots during which each room cannot be used.
    pub rooms_unavailability_timeslots: Vec<Vec<usize>>,
}

/// Weighted soft preferences of everyone involved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub students: Vec<StudentPreferences>,
    #[serde(default)]
    pub teachers: Vec<TeacherPreferences>,
    #[serde(default)]
    pub management: ManagementPreferences,
}

impl Preferences {
    pub fn with_student(mut self, student: StudentPreferences) -> Self {
        self.students.push(student);
        self
    }

    pub fn with_teacher(mut self, teacher: TeacherPreferences) -> Self {
        self.teachers.push(teacher);
        self
    }

    pub fn with_management(mut self, management: ManagementPreferences) -> Self {
        self.management = management;
        self
    }
}

/// One student's preference weights. A weight of zero means no preference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentPreferences {
    /// Per-day weight for keeping that day class-free, indexed by day.
    /// Shorter vectors imply zero weight for the remaining days.
    #[serde(default)]
    pub free_days: Vec<f64>,
    /// Per-day weight for having at least one class that day.
    #[serde(default)]
    pub busy_days: Vec<f64>,
    /// Weight for a timetable without idle slots between classes on any day.
    #[serde(default)]
    pub no_gaps: f64,
    /// Absolute group id -> weight for being assigned to that group.
    #[serde(default)]
    pub preferred_groups: BTreeMap<usize, f64>,
    #[serde(default)]
    pub avoid_groups: BTreeMap<usize, f64>,
    /// Global timeslot id -> weight for having a class in that slot.
    #[serde(default)]
    pub preferred_timeslots: BTreeMap<usize, f64>,
    #[serde(default)]
    pub avoid_timeslots: BTreeMap<usize, f64>,
}

impl StudentPreferences {
    pub fn new() -> Self {
        StudentPreferences::default()
    }

    pub fn with_free_day(mut self, day: usize, weight: f64) -> Self {
        set_day_weight(&mut self.free_days, day, weight);
        self
    }

    pub fn with_busy_day(mut self, day: usize, weight: f64) -> Self {
        set_day_weight(&mut self.busy_days, day, weight);
        self
    }

    pub fn with_no_gaps(mut self, weight: f64) -> Self {
        self.no_gaps = weight;
        self
    }

    pub fn with_preferred_group(mut self, group: usize, weight: f64) -> Self {
        self.preferred_groups.insert(group, weight);
        self
    }

    pub fn with_avoid_group(mut self, group: usize, weight: f64) -> Self {
        self.avoid_groups.insert(group, weight);
        self
    }

    pub fn with_preferred_timeslot(mut self, timeslot: usize, weight: f64) -> Self {
        self.preferred_timeslots.insert(timeslot, weight);
        self
    }

    pub fn with_avoid_timeslot(mut self, timeslot: usize, weight: f64) -> Self {
        self.avoid_timeslots.insert(timeslot, weight);
        self
    }
}

/// One teacher's preference weights; like a student's, without group maps
/// (teachers do not choose their groups).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherPreferences {
    #[serde(default)]
    pub free_days: Vec<f64>,
    #[serde(default)]
    pub busy_days: Vec<f64>,
    #[serde(default)]
    pub no_gaps: f64,
    #[serde(default)]
    pub preferred_timeslots: BTreeMap<usize, f64>,
    #[serde(default)]
    pub avoid_timeslots: BTreeMap<usize, f64>,
}

impl TeacherPreferences {
    pub fn new() -> Self {
        TeacherPreferences::default()
    }

    pub fn with_free_day(mut self, day: usize, weight: f64) -> Self {
        set_day_weight(&mut self.free_days, day, weight);
        self
    }

    pub fn with_busy_day(mut self, day: usize, weight: f64) -> Self {
        set_day_weight(&mut self.busy_days, day, weight);
        self
    }

    pub fn with_no_gaps(mut self, weight: f64) -> Self {
        self.no_gaps = weight;
        self
    }

    pub fn with_preferred_timeslot(mut self, timeslot: usize, weight: f64) -> Self {
        self.preferred_timeslots.insert(timeslot, weight);
        self
    }

    pub fn with_avoid_timeslot(mut self, timeslot: usize, weight: f64) -> Self {
        self.avoid_timeslots.insert(timeslot, weight);
        self
    }
}

/// Institution-level preferences, independent of any one person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagementPreferences {
    /// Weighted (room, timeslot) cells that should host some group.
    #[serde(default)]
    pub preferred_room_timeslots: Vec<RoomTimeslotPreference>,
    /// Weighted (room, timeslot) cells that should stay empty.
    #[serde(default)]
    pub avoid_room_timeslots: Vec<RoomTimeslotPreference>,
    #[serde(default)]
    pub group_max_overflow: OverflowAllowance,
}

impl ManagementPreferences {
    pub fn new() -> Self {
        ManagementPreferences::default()
    }

    pub fn with_preferred_room_timeslot(mut self, pref: RoomTimeslotPreference) -> Self {
        self.preferred_room_timeslots.push(pref);
        self
    }

    pub fn with_avoid_room_timeslot(mut self, pref: RoomTimeslotPreference) -> Self {
        self.avoid_room_timeslots.push(pref);
        self
    }

    pub fn with_overflow(mut self, allowance: OverflowAllowance) -> Self {
        self.group_max_overflow = allowance;
        self
    }
}

/// A weighted (room, timeslot) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTimeslotPreference {
    pub room: usize,
    pub timeslot: usize,
    pub weight: f64,
}

impl RoomTimeslotPreference {
    pub fn new(room: usize, timeslot: usize, weight: f64) -> Self {
        RoomTimeslotPreference {
            room,
            timeslot,
            weight,
        }
    }
}

/// Seats a group may exceed its soft capacity by before the weighted
/// penalty applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverflowAllowance {
    #[serde(default)]
    pub value: usize,
    #[serde(default)]
    pub weight: f64,
}

impl OverflowAllowance {
    pub fn new(value: usize, weight: f64) -> Self {
        OverflowAllowance { value, weight }
    }
}

fn set_day_weight(days: &mut Vec<f64>, day: usize, weight: f64) {
    if day >= days.len() {
        days.resize(day + 1, 0.0);
    }
    days[day] = weight;
}
