//! Live faculty and room occupancy for one scheduling run.

use chrono::Weekday;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::grid::{slot_bit, SlotMask, Span, TimeSlot};
use crate::interner::{EntityId, EntityInterner};

/// Which kind of entity a busy mask belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Faculty,
    Room,
}

/// Owner of the run's occupancy state and the single authority on whether a
/// placement is legal.
///
/// Invariant: a slot is marked busy for a faculty or room exactly when some
/// committed span covers it. Each run builds its own tracker; nothing here is
/// shared across runs.
#[derive(Clone, Debug, Default)]
pub struct ConflictTracker {
    faculty: EntityInterner,
    rooms: EntityInterner,
    /// (kind, entity, day) -> busy slots
    busy: FxHashMap<(EntityKind, EntityId, Weekday), SlotMask>,
}

impl ConflictTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn interner(&self, kind: EntityKind) -> &EntityInterner {
        match kind {
            EntityKind::Faculty => &self.faculty,
            EntityKind::Room => &self.rooms,
        }
    }

    fn busy_mask(&self, kind: EntityKind, entity: &str, day: Weekday) -> SlotMask {
        self.interner(kind)
            .get(entity)
            .and_then(|id| self.busy.get(&(kind, id, day)).copied())
            .unwrap_or(0)
    }

    /// Whether every slot of `span` on `day` is unoccupied for the entity.
    pub fn is_free(&self, kind: EntityKind, entity: &str, day: Weekday, span: Span) -> bool {
        self.busy_mask(kind, entity, day) & span.mask() == 0
    }

    /// Whether the span is free for both the faculty member and the room.
    pub fn is_span_free(&self, faculty: &str, room: &str, day: Weekday, span: Span) -> bool {
        self.is_free(EntityKind::Faculty, faculty, day, span)
            && self.is_free(EntityKind::Room, room, day, span)
    }

    /// Mark the span busy for both the faculty member and the room.
    ///
    /// Callers commit each request at most once and only after `is_span_free`;
    /// overlapping commits are not detected here.
    pub fn commit(&mut self, faculty: &str, room: &str, day: Weekday, span: Span) {
        let mask = span.mask();
        let faculty_id = self.faculty.intern(faculty);
        let room_id = self.rooms.intern(room);
        *self
            .busy
            .entry((EntityKind::Faculty, faculty_id, day))
            .or_insert(0) |= mask;
        *self.busy.entry((EntityKind::Room, room_id, day)).or_insert(0) |= mask;
    }

    pub fn is_occupied(&self, kind: EntityKind, entity: &str, slot: TimeSlot) -> bool {
        self.busy_mask(kind, entity, slot.day) & slot_bit(slot.index) != 0
    }

    /// Number of busy slots for the entity on `day`.
    pub fn occupied_slots(&self, kind: EntityKind, entity: &str, day: Weekday) -> u32 {
        self.busy_mask(kind, entity, day).count_ones()
    }

    /// Distinct faculty members and rooms seen so far.
    pub fn entity_counts(&self) -> (usize, usize) {
        (self.faculty.len(), self.rooms.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_is_free() {
        let tracker = ConflictTracker::new();
        assert!(tracker.is_span_free("Dr. A", "R1", Weekday::Mon, Span::new(1, 8)));
        assert_eq!(tracker.occupied_slots(EntityKind::Faculty, "Dr. A", Weekday::Mon), 0);
    }

    #[test]
    fn test_commit_blocks_faculty_and_room() {
        let mut tracker = ConflictTracker::new();
        tracker.commit("Dr. A", "R1", Weekday::Tue, Span::new(3, 2));

        assert!(!tracker.is_free(EntityKind::Faculty, "Dr. A", Weekday::Tue, Span::new(4, 1)));
        assert!(!tracker.is_free(EntityKind::Room, "R1", Weekday::Tue, Span::new(2, 2)));
        assert!(tracker.is_free(EntityKind::Faculty, "Dr. A", Weekday::Tue, Span::new(5, 2)));
        assert!(tracker.is_free(EntityKind::Faculty, "Dr. A", Weekday::Wed, Span::new(3, 2)));

        // Another faculty member in the same room still conflicts
        assert!(!tracker.is_span_free("Dr. B", "R1", Weekday::Tue, Span::new(3, 1)));
        // Same faculty member in a different room still conflicts
        assert!(!tracker.is_span_free("Dr. A", "R2", Weekday::Tue, Span::new(4, 1)));
        assert!(tracker.is_span_free("Dr. B", "R2", Weekday::Tue, Span::new(3, 2)));
    }

    #[test]
    fn test_occupancy_matches_commits() {
        let mut tracker = ConflictTracker::new();
        tracker.commit("Dr. A", "R1", Weekday::Fri, Span::new(1, 1));
        tracker.commit("Dr. A", "R2", Weekday::Fri, Span::new(5, 3));

        assert_eq!(tracker.occupied_slots(EntityKind::Faculty, "Dr. A", Weekday::Fri), 4);
        assert_eq!(tracker.occupied_slots(EntityKind::Room, "R2", Weekday::Fri), 3);
        for index in 1..=8 {
            let slot = TimeSlot::new(Weekday::Fri, index);
            let expected = index == 1 || (5..=7).contains(&index);
            assert_eq!(tracker.is_occupied(EntityKind::Faculty, "Dr. A", slot), expected);
        }
        assert_eq!(tracker.entity_counts(), (1, 2));
    }

    #[test]
    fn test_faculty_and_room_namespaces_are_separate() {
        let mut tracker = ConflictTracker::new();
        tracker.commit("Shared", "Other", Weekday::Mon, Span::new(1, 1));
        assert!(tracker.is_free(EntityKind::Room, "Shared", Weekday::Mon, Span::new(1, 1)));
    }
}
