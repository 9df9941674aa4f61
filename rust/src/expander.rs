//! Session expansion: courses → independent per-occurrence placement requests.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::availability::{AvailabilityParser, ParsedAvailability};
use crate::grid::{slot_bit, SlotGrid, SlotMask, Span, TimeSlot};
use crate::models::{Course, SessionRequest, UnplacedReason, UnplacedSession};
use crate::{log_changes, log_checks};

/// Output of expanding a course list.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Requests that have at least one anchor, in input order
    pub requests: Vec<SessionRequest>,
    /// Occurrences of courses with no anchor for their duration
    pub unplaced: Vec<UnplacedSession>,
    /// Parsed availability per course, parallel to the input list
    pub availability: Vec<ParsedAvailability>,
}

impl Expansion {
    /// Number of session requests the course list asked for.
    pub fn total_requested(&self) -> usize {
        self.requests.len() + self.unplaced.len()
    }
}

/// Slots from which a `duration`-slot span lies entirely inside `available`
/// on one day, with no clock gap between its slots.
pub fn anchor_slots(grid: &SlotGrid, available: &BTreeSet<TimeSlot>, duration: u32) -> Vec<TimeSlot> {
    let slots_per_day = grid.slots_per_day() as u32;
    if duration == 0 || duration > slots_per_day {
        return Vec::new();
    }
    let len = duration as u8;

    let mut anchors = Vec::new();
    for &day in grid.days() {
        let day_mask: SlotMask = available
            .iter()
            .filter(|slot| slot.day == day)
            .fold(0, |mask, slot| mask | slot_bit(slot.index));
        for start in 1..=(grid.slots_per_day() - len + 1) {
            let span = Span::new(start, len);
            if !grid.span_fits(span) {
                continue;
            }
            let span_mask = span.mask();
            if day_mask & span_mask == span_mask {
                anchors.push(TimeSlot::new(day, start));
            }
        }
    }
    anchors
}

/// Turns courses into session requests.
pub struct SessionExpander<'a> {
    grid: &'a SlotGrid,
    verbosity: u8,
}

impl<'a> SessionExpander<'a> {
    pub fn new(grid: &'a SlotGrid, verbosity: u8) -> Self {
        Self { grid, verbosity }
    }

    /// Expand every course into `weekly_count` requests sharing one anchor set.
    ///
    /// Courses without any anchor go straight to `unplaced` with
    /// `InsufficientAvailability`, one entry per occurrence.
    pub fn expand(&self, courses: &[Course]) -> Expansion {
        let parser = AvailabilityParser::new(self.grid);
        let mut expansion = Expansion::default();

        for (course_index, course) in courses.iter().enumerate() {
            let parsed = parser.parse(&course.availability);
            for skipped in &parsed.skipped {
                log_checks!(
                    self.verbosity,
                    "  {}: skipped availability {:?} ({})",
                    course.name,
                    skipped.fragment,
                    skipped.reason
                );
            }

            let anchors = anchor_slots(self.grid, &parsed.slots, course.duration_hours);
            if anchors.is_empty() {
                log_changes!(
                    self.verbosity,
                    "  {}: no {}-slot run in availability, {} session(s) unplaceable",
                    course.name,
                    course.duration_hours,
                    course.weekly_count
                );
                expansion.unplaced.extend((0..course.weekly_count).map(|occurrence| {
                    UnplacedSession::new(course, occurrence, UnplacedReason::InsufficientAvailability)
                }));
            } else {
                let candidate_slots: Arc<[TimeSlot]> = anchors.into();
                expansion
                    .requests
                    .extend((0..course.weekly_count).map(|occurrence| SessionRequest {
                        course_index,
                        occurrence,
                        duration: course.duration_hours as u8,
                        candidate_slots: Arc::clone(&candidate_slots),
                    }));
            }

            expansion.availability.push(parsed);
        }

        expansion
    }
}
