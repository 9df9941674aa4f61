//! The weekly slot grid: working days × fixed one-hour slots.
//!
//! Slots are 1-based within a day and totally ordered by index. A span is a
//! contiguous run of slot indices on a single day; spans never wrap across days.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Bitmask over the slots of one day (bit `i - 1` is slot `i`).
pub type SlotMask = u32;

/// Upper bound on slots per day, set by the width of `SlotMask`.
pub const MAX_SLOTS_PER_DAY: usize = 32;

/// Full English day names, indexed by `Weekday::num_days_from_monday()`.
const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Full English name of a weekday ("Monday", ...).
pub fn day_name(day: Weekday) -> &'static str {
    DAY_NAMES[day.num_days_from_monday() as usize]
}

/// Errors raised when constructing a custom grid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Grid must have between 1 and 7 days, got {0}")]
    InvalidDayCount(usize),
    #[error("Day {0} appears more than once in the grid")]
    DuplicateDay(Weekday),
    #[error("Grid must have between 1 and 32 slots per day, got {0}")]
    InvalidSlotCount(usize),
    #[error("Slot {index} does not end after it starts ({start}-{end})")]
    EmptySlot {
        index: u8,
        start: NaiveTime,
        end: NaiveTime,
    },
    #[error("Slot {0} starts before the previous slot ends")]
    OverlappingSlot(u8),
    #[error("Lunch slot {0} is outside the grid")]
    LunchOutOfRange(u8),
}

/// One fixed slot of the weekly grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: Weekday,
    /// 1-based slot index within the day
    pub index: u8,
}

impl TimeSlot {
    pub fn new(day: Weekday, index: u8) -> Self {
        Self { day, index }
    }
}

impl Ord for TimeSlot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.day
            .num_days_from_monday()
            .cmp(&other.day.num_days_from_monday())
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for TimeSlot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.day, self.index)
    }
}

/// A contiguous run of slots within one day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// First slot index (1-based)
    pub start: u8,
    /// Number of slots covered
    pub len: u8,
}

impl Span {
    pub fn new(start: u8, len: u8) -> Self {
        Self { start, len }
    }

    /// Last slot index covered by the span (inclusive).
    pub fn end(&self) -> u8 {
        self.start + self.len.saturating_sub(1)
    }

    /// Slot indices covered, in order.
    pub fn indices(&self) -> impl Iterator<Item = u8> {
        self.start..self.start + self.len
    }

    pub fn contains(&self, index: u8) -> bool {
        index >= self.start && index <= self.end()
    }

    /// Bitmask of the covered slots.
    pub fn mask(&self) -> SlotMask {
        self.indices().fold(0, |mask, i| mask | slot_bit(i))
    }
}

/// Bit for a single 1-based slot index.
#[inline]
pub fn slot_bit(index: u8) -> SlotMask {
    1 << (index - 1)
}

/// The canonical day × slot universe for a scheduling run.
///
/// Fixed for the lifetime of a run. A different grid means constructing a new
/// `SlotGrid`; there is no mutation API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSlotGrid")]
pub struct SlotGrid {
    days: Vec<Weekday>,
    /// Clock range of each slot; slot `i` is `slots[i - 1]`
    slots: Vec<(NaiveTime, NaiveTime)>,
    lunch_index: u8,
}

/// Unvalidated grid fields as they appear in serialized form.
#[derive(Deserialize)]
struct RawSlotGrid {
    days: Vec<Weekday>,
    slots: Vec<(NaiveTime, NaiveTime)>,
    lunch_index: u8,
}

impl TryFrom<RawSlotGrid> for SlotGrid {
    type Error = GridError;

    fn try_from(raw: RawSlotGrid) -> Result<Self, Self::Error> {
        SlotGrid::new(raw.days, raw.slots, raw.lunch_index)
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("literal slot time is valid")
}

impl Default for SlotGrid {
    /// Monday-Friday, eight one-hour slots 09:00-18:00, lunch at slot 4.
    ///
    /// 13:00-14:00 is not a slot, so slot 5 starts at 14:00.
    fn default() -> Self {
        Self {
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            slots: vec![
                (hm(9, 0), hm(10, 0)),
                (hm(10, 0), hm(11, 0)),
                (hm(11, 0), hm(12, 0)),
                (hm(12, 0), hm(13, 0)),
                (hm(14, 0), hm(15, 0)),
                (hm(15, 0), hm(16, 0)),
                (hm(16, 0), hm(17, 0)),
                (hm(17, 0), hm(18, 0)),
            ],
            lunch_index: 4,
        }
    }
}

impl SlotGrid {
    /// Build a custom grid, validating its bounds.
    pub fn new(
        days: Vec<Weekday>,
        slots: Vec<(NaiveTime, NaiveTime)>,
        lunch_index: u8,
    ) -> Result<Self, GridError> {
        if days.is_empty() || days.len() > 7 {
            return Err(GridError::InvalidDayCount(days.len()));
        }
        for (i, day) in days.iter().enumerate() {
            if days[..i].contains(day) {
                return Err(GridError::DuplicateDay(*day));
            }
        }
        if slots.is_empty() || slots.len() > MAX_SLOTS_PER_DAY {
            return Err(GridError::InvalidSlotCount(slots.len()));
        }
        let mut previous_end: Option<NaiveTime> = None;
        for (i, &(start, end)) in slots.iter().enumerate() {
            let index = (i + 1) as u8;
            if end <= start {
                return Err(GridError::EmptySlot { index, start, end });
            }
            if previous_end.is_some_and(|prev| start < prev) {
                return Err(GridError::OverlappingSlot(index));
            }
            previous_end = Some(end);
        }
        if lunch_index == 0 || lunch_index as usize > slots.len() {
            return Err(GridError::LunchOutOfRange(lunch_index));
        }
        Ok(Self {
            days,
            slots,
            lunch_index,
        })
    }

    /// Working days in grid order.
    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    pub fn contains_day(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// Position of a day in grid order.
    pub fn day_position(&self, day: Weekday) -> Option<usize> {
        self.days.iter().position(|d| *d == day)
    }

    pub fn slots_per_day(&self) -> u8 {
        self.slots.len() as u8
    }

    pub fn lunch_index(&self) -> u8 {
        self.lunch_index
    }

    pub fn is_lunch(&self, index: u8) -> bool {
        index == self.lunch_index
    }

    /// Clock range of a slot index, if it exists.
    pub fn slot_range(&self, index: u8) -> Option<(NaiveTime, NaiveTime)> {
        if index == 0 {
            return None;
        }
        self.slots.get(index as usize - 1).copied()
    }

    /// "HH:MM-HH:MM" label of a slot.
    pub fn slot_label(&self, index: u8) -> Option<String> {
        self.slot_range(index).map(|(start, end)| {
            format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
        })
    }

    /// Index of the slot starting exactly at `time`.
    pub fn slot_starting_at(&self, time: NaiveTime) -> Option<u8> {
        self.slots
            .iter()
            .position(|(start, _)| *start == time)
            .map(|i| (i + 1) as u8)
    }

    /// Whether slot `index` ends exactly when slot `index + 1` starts.
    pub fn slots_adjacent(&self, index: u8) -> bool {
        let Some(next) = index.checked_add(1) else {
            return false;
        };
        match (self.slot_range(index), self.slot_range(next)) {
            (Some((_, end)), Some((next_start, _))) => end == next_start,
            _ => false,
        }
    }

    /// Whether `span` lies inside one day of this grid as one unbroken
    /// block of clock time.
    pub fn span_fits(&self, span: Span) -> bool {
        span.start >= 1
            && span.len >= 1
            && span.end() <= self.slots_per_day()
            && (span.start..span.end()).all(|i| self.slots_adjacent(i))
    }

    /// Mask with every slot of a day set.
    pub fn full_day_mask(&self) -> SlotMask {
        Span::new(1, self.slots_per_day()).mask()
    }

    /// All slots of one day, in index order.
    pub fn day_slots(&self, day: Weekday) -> impl Iterator<Item = TimeSlot> + '_ {
        (1..=self.slots_per_day()).map(move |i| TimeSlot::new(day, i))
    }

    /// Every slot of the grid, day-major.
    pub fn all_slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.days.iter().flat_map(move |&day| self.day_slots(day))
    }

    pub fn total_slots(&self) -> usize {
        self.days.len() * self.slots.len()
    }
}
