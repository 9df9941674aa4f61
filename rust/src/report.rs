//! Final report: the timetable mapping, run statistics and a conflict audit.
//!
//! Built once from the complete placement set after the placer finishes.

use chrono::{Timelike, Weekday};
use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::expander::Expansion;
use crate::grid::{day_name, SlotGrid, Span};
use crate::models::{Course, Placement, SessionType};
use crate::scheduler::{EntityKind, PlacementOutcome};

/// Overall quality band derived from the mean placement cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
}

impl QualityRating {
    /// Mean cost ≤ 3 is EXCELLENT, ≤ 5 is GOOD, anything else FAIR.
    pub fn from_mean_cost(mean_cost: f64) -> Self {
        if mean_cost <= 3.0 {
            Self::Excellent
        } else if mean_cost <= 5.0 {
            Self::Good
        } else {
            Self::Fair
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
        }
    }
}

impl fmt::Display for QualityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the timetable shows for one placed session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSummary {
    pub course: String,
    pub faculty: String,
    pub room: String,
    pub duration: u32,
    pub session_type: SessionType,
    pub occurrence: u32,
}

impl PlacementSummary {
    fn new(course: &Course, occurrence: u32) -> Self {
        Self {
            course: course.name.clone(),
            faculty: course.faculty.clone(),
            room: course.room.clone(),
            duration: course.duration_hours,
            session_type: course.session_type,
            occurrence,
        }
    }
}

/// Sessions occupying one slot of one day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotEntry {
    pub index: u8,
    /// "HH:MM-HH:MM"
    pub label: String,
    pub sessions: Vec<PlacementSummary>,
}

/// One grid day of the timetable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaySchedule {
    pub day: Weekday,
    pub slots: Vec<SlotEntry>,
}

/// Day → slot label → sessions, with every grid day and slot present.
///
/// Serializes as nested maps keyed by full day name and slot label, in grid
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timetable {
    pub days: Vec<DaySchedule>,
}

impl Timetable {
    /// Sessions in a slot, looked up by day and slot label.
    pub fn sessions(&self, day: Weekday, label: &str) -> Option<&[PlacementSummary]> {
        self.days
            .iter()
            .find(|d| d.day == day)?
            .slots
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.sessions.as_slice())
    }

    /// Total (slot, session) entries across the week.
    pub fn entry_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.slots.iter())
            .map(|s| s.sessions.len())
            .sum()
    }
}

struct DaySlots<'a>(&'a [SlotEntry]);

impl Serialize for DaySlots<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for slot in self.0 {
            map.serialize_entry(&slot.label, &slot.sessions)?;
        }
        map.end()
    }
}

impl Serialize for Timetable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for day in &self.days {
            map.serialize_entry(day_name(day.day), &DaySlots(&day.slots))?;
        }
        map.end()
    }
}

/// Requested vs scheduled occurrences of one course.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCoverage {
    pub course: String,
    pub requested: u32,
    pub scheduled: u32,
}

/// Occupancy of one grid day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLoad {
    pub day: Weekday,
    /// Sessions placed on the day
    pub sessions: usize,
    /// Slot-hours those sessions cover
    pub slots: usize,
}

/// Summary numbers for a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_requested: usize,
    pub scheduled_count: usize,
    pub unplaced_count: usize,
    /// Percent of requested sessions placed (100.0 when nothing was requested)
    pub coverage_percentage: f64,
    /// Mean cost of committed placements (0.0 when none)
    pub mean_cost: f64,
    pub quality_rating: QualityRating,
    /// Sessions that were only placed by the relaxed retry pass
    pub retried_sessions: usize,
    pub conflicts_detected: usize,
    pub skipped_fragments: usize,
    pub defaulted_availability: usize,
    pub day_load: Vec<DayLoad>,
    pub courses: Vec<CourseCoverage>,
    pub penalties: PenaltyBreakdown,
}

/// Penalty points per soft-constraint violation.
pub const PENALTY_VERY_LATE_LECTURE: u32 = 3;
pub const PENALTY_LUNCH_HOUR: u32 = 1;
pub const PENALTY_MULTIPLE_COURSE_PER_DAY: u32 = 1;
pub const PENALTY_CONSECUTIVE_SAME_COURSE: u32 = 1;
pub const PENALTY_LECTURE_LAB_SAME_DAY: u32 = 2;
pub const PENALTY_OVERLOADED_DAY: u32 = 2;
pub const PENALTY_UNBALANCED_DAYS: u32 = 1;

/// Slot-hours above which a day is overloaded.
pub const OVERLOADED_DAY_SLOTS: usize = 7;
/// Busiest minus quietest day, in slot-hours, above which load is unbalanced.
pub const MAX_DAY_LOAD_SPREAD: usize = 3;

/// Soft-constraint violations of a finished timetable, in penalty points.
///
/// "Same course" compares names without a parenthesised suffix, so
/// "Physics" and "Physics (Lab)" count as one course.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    /// Lecture hours starting at 17:00 or later
    pub very_late_lectures: u32,
    /// Session hours in the lunch slot
    pub lunch_hour_sessions: u32,
    /// Extra sessions of a course beyond the first on a day
    pub multiple_course_per_day: u32,
    /// Separate lectures of a course in back-to-back slots
    pub consecutive_same_course: u32,
    /// Days holding both a lecture and a lab of a course
    pub lecture_lab_same_day: u32,
    pub overloaded_days: u32,
    pub daily_imbalance: u32,
    pub total_penalty: u32,
}

impl PenaltyBreakdown {
    fn with_total(mut self) -> Self {
        self.total_penalty = self.very_late_lectures
            + self.lunch_hour_sessions
            + self.multiple_course_per_day
            + self.consecutive_same_course
            + self.lecture_lab_same_day
            + self.overloaded_days
            + self.daily_imbalance;
        self
    }
}

/// "Physics (Lab)" -> "Physics".
fn base_course_name(name: &str) -> &str {
    name.split('(').next().unwrap_or(name).trim()
}

/// A faculty member or room booked more than once in the same slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    pub kind: EntityKind,
    pub entity: String,
    pub day: Weekday,
    pub slot_index: u8,
    /// Courses sharing the slot, in placement order
    pub courses: Vec<String>,
}

/// Re-check a placement set for faculty and room double-booking.
///
/// Records are ordered by kind, entity, day and slot.
pub fn audit_conflicts(courses: &[Course], placements: &[Placement]) -> Vec<ConflictRecord> {
    let mut bookings: BTreeMap<(EntityKind, &str, u32, u8), (Weekday, Vec<String>)> =
        BTreeMap::new();
    for placement in placements {
        let course = &courses[placement.course_index];
        for slot in placement.slots() {
            let day = slot.day.num_days_from_monday();
            for (kind, entity) in [
                (EntityKind::Faculty, course.faculty.as_str()),
                (EntityKind::Room, course.room.as_str()),
            ] {
                bookings
                    .entry((kind, entity, day, slot.index))
                    .or_insert_with(|| (slot.day, Vec::new()))
                    .1
                    .push(course.name.clone());
            }
        }
    }

    bookings
        .into_iter()
        .filter(|(_, (_, names))| names.len() > 1)
        .map(|((kind, entity, _, slot_index), (day, names))| ConflictRecord {
            kind,
            entity: entity.to_string(),
            day,
            slot_index,
            courses: names,
        })
        .collect()
}

/// Assembles the timetable and statistics for a finished run.
pub struct ReportBuilder<'a> {
    grid: &'a SlotGrid,
    courses: &'a [Course],
}

impl<'a> ReportBuilder<'a> {
    pub fn new(grid: &'a SlotGrid, courses: &'a [Course]) -> Self {
        Self { grid, courses }
    }

    /// Fold placements into the day → slot mapping, in commit order.
    ///
    /// A multi-slot placement is listed under every slot its span covers.
    pub fn timetable(&self, placements: &[Placement]) -> Timetable {
        let mut days: Vec<DaySchedule> = self
            .grid
            .days()
            .iter()
            .map(|&day| DaySchedule {
                day,
                slots: (1..=self.grid.slots_per_day())
                    .map(|index| SlotEntry {
                        index,
                        label: self.grid.slot_label(index).unwrap_or_default(),
                        sessions: Vec::new(),
                    })
                    .collect(),
            })
            .collect();

        for placement in placements {
            let Some(position) = self.grid.day_position(placement.day) else {
                continue;
            };
            let summary = PlacementSummary::new(
                &self.courses[placement.course_index],
                placement.occurrence,
            );
            for index in placement.span.indices() {
                if let Some(entry) = days[position].slots.get_mut(index as usize - 1) {
                    entry.sessions.push(summary.clone());
                }
            }
        }

        Timetable { days }
    }

    /// Coverage, quality and diagnostic counts for a run.
    pub fn statistics(&self, expansion: &Expansion, outcome: &PlacementOutcome) -> Statistics {
        let placements = &outcome.placements;
        let total_requested = expansion.total_requested();
        let scheduled_count = placements.len();
        let unplaced_count = expansion.unplaced.len() + outcome.unplaced.len();

        let coverage_percentage = if total_requested == 0 {
            100.0
        } else {
            scheduled_count as f64 / total_requested as f64 * 100.0
        };

        let (mean_cost, quality_rating) = if placements.is_empty() {
            (0.0, QualityRating::Fair)
        } else {
            let mean = placements.iter().map(|p| p.cost).sum::<f64>() / scheduled_count as f64;
            (mean, QualityRating::from_mean_cost(mean))
        };

        let retried_sessions = outcome
            .decisions
            .iter()
            .filter(|d| d.retried && d.state.is_placed())
            .count();

        let mut scheduled_per_course: FxHashMap<usize, u32> = FxHashMap::default();
        for placement in placements {
            *scheduled_per_course.entry(placement.course_index).or_insert(0) += 1;
        }
        let courses = self
            .courses
            .iter()
            .enumerate()
            .map(|(i, course)| CourseCoverage {
                course: course.name.clone(),
                requested: course.weekly_count,
                scheduled: scheduled_per_course.get(&i).copied().unwrap_or(0),
            })
            .collect();

        let day_load = self.day_load(placements);
        let penalties = self.penalties(placements, &day_load);

        Statistics {
            total_requested,
            scheduled_count,
            unplaced_count,
            coverage_percentage,
            mean_cost,
            quality_rating,
            retried_sessions,
            conflicts_detected: audit_conflicts(self.courses, placements).len(),
            skipped_fragments: expansion.availability.iter().map(|a| a.skipped.len()).sum(),
            defaulted_availability: expansion.availability.iter().filter(|a| a.defaulted).count(),
            day_load,
            courses,
            penalties,
        }
    }

    /// Sessions and slot-hours per grid day.
    pub fn day_load(&self, placements: &[Placement]) -> Vec<DayLoad> {
        self.grid
            .days()
            .iter()
            .map(|&day| {
                let on_day = placements.iter().filter(|p| p.day == day);
                DayLoad {
                    day,
                    sessions: on_day.clone().count(),
                    slots: on_day.map(|p| p.span.len as usize).sum(),
                }
            })
            .collect()
    }

    fn is_late(&self, index: u8) -> bool {
        self.grid
            .slot_range(index)
            .is_some_and(|(start, _)| start.hour() >= 17)
    }

    /// Score soft-constraint violations of a placement set.
    pub fn penalties(&self, placements: &[Placement], day_load: &[DayLoad]) -> PenaltyBreakdown {
        let mut breakdown = PenaltyBreakdown::default();

        for placement in placements {
            let is_lecture =
                self.courses[placement.course_index].session_type == SessionType::Lecture;
            for index in placement.span.indices() {
                if self.grid.is_lunch(index) {
                    breakdown.lunch_hour_sessions += PENALTY_LUNCH_HOUR;
                }
                if is_lecture && self.is_late(index) {
                    breakdown.very_late_lectures += PENALTY_VERY_LATE_LECTURE;
                }
            }
        }

        for &day in self.grid.days() {
            let on_day: Vec<&Placement> = placements.iter().filter(|p| p.day == day).collect();

            // base name -> (sessions, has lecture, has lab)
            let mut per_course: BTreeMap<&str, (u32, bool, bool)> = BTreeMap::new();
            for placement in &on_day {
                let course = &self.courses[placement.course_index];
                let entry = per_course
                    .entry(base_course_name(&course.name))
                    .or_default();
                entry.0 += 1;
                entry.1 |= course.session_type == SessionType::Lecture;
                entry.2 |= course.session_type == SessionType::Lab;
            }
            for &(sessions, lecture, lab) in per_course.values() {
                breakdown.multiple_course_per_day +=
                    sessions.saturating_sub(1) * PENALTY_MULTIPLE_COURSE_PER_DAY;
                if lecture && lab {
                    breakdown.lecture_lab_same_day += PENALTY_LECTURE_LAB_SAME_DAY;
                }
            }

            for first in &on_day {
                let first_course = &self.courses[first.course_index];
                if first_course.session_type != SessionType::Lecture {
                    continue;
                }
                // The last slot of `first` and the next one must be back-to-back
                if !self.grid.span_fits(Span::new(first.span.end(), 2)) {
                    continue;
                }
                for second in &on_day {
                    let second_course = &self.courses[second.course_index];
                    if second.span.start == first.span.end() + 1
                        && second_course.session_type == SessionType::Lecture
                        && base_course_name(&second_course.name)
                            == base_course_name(&first_course.name)
                    {
                        breakdown.consecutive_same_course += PENALTY_CONSECUTIVE_SAME_COURSE;
                    }
                }
            }
        }

        let overloaded = day_load
            .iter()
            .filter(|load| load.slots > OVERLOADED_DAY_SLOTS)
            .count() as u32;
        breakdown.overloaded_days = overloaded * PENALTY_OVERLOADED_DAY;

        let busiest = day_load.iter().map(|load| load.slots).max();
        let quietest = day_load.iter().map(|load| load.slots).min();
        if let (Some(max), Some(min)) = (busiest, quietest) {
            if max - min > MAX_DAY_LOAD_SPREAD {
                breakdown.daily_imbalance = PENALTY_UNBALANCED_DAYS;
            }
        }

        breakdown.with_total()
    }
}
