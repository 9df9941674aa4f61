//! Availability parsing.
//!
//! Normalizes the accepted availability notations into canonical slot sets.
//! Each comma-separated fragment is tried against, in order:
//! - legacy slot codes: `Mon1` .. `Fri8`
//! - explicit time ranges: `Friday 16:00-17:00`
//! - bare day names: `Monday`, `tue`, `Thurs`
//!
//! Unrecognized fragments are skipped and reported; they never abort the
//! string. An empty result falls back to every slot of the grid.

use chrono::{NaiveTime, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::grid::{day_name, SlotGrid, TimeSlot};

/// Why an availability fragment was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[error("unrecognized availability notation")]
    Unrecognized,
    #[error("{0} is not a working day of the grid")]
    DayOutsideGrid(Weekday),
    #[error("slot {0} does not exist in the grid")]
    SlotOutOfRange(u32),
    #[error("time range does not start before it ends")]
    EmptyRange,
    #[error("time range is not aligned to slot boundaries")]
    UnalignedRange,
}

/// A fragment that contributed nothing to the parsed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFragment {
    pub fragment: String,
    pub reason: SkipReason,
}

/// Result of parsing one availability string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAvailability {
    pub slots: BTreeSet<TimeSlot>,
    pub skipped: Vec<SkippedFragment>,
    /// True when nothing parsed and the permissive all-slots default applied
    pub defaulted: bool,
}

impl ParsedAvailability {
    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.slots.contains(slot)
    }
}

/// Resolve a day token: a case-insensitive prefix of at least 3 characters of
/// a full day name.
pub fn parse_day_name(token: &str) -> Option<Weekday> {
    let token = token.trim().to_ascii_lowercase();
    if token.len() < 3 {
        return None;
    }
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
    .into_iter()
    .find(|&day| day_name(day).to_ascii_lowercase().starts_with(&token))
}

/// Parser bound to one grid.
#[derive(Clone, Copy, Debug)]
pub struct AvailabilityParser<'a> {
    grid: &'a SlotGrid,
}

impl<'a> AvailabilityParser<'a> {
    pub fn new(grid: &'a SlotGrid) -> Self {
        Self { grid }
    }

    /// Parse a raw availability string. Never fails.
    pub fn parse(&self, raw: &str) -> ParsedAvailability {
        let mut result = ParsedAvailability::default();

        for fragment in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match self.parse_fragment(fragment) {
                Ok(slots) => result.slots.extend(slots),
                Err(reason) => result.skipped.push(SkippedFragment {
                    fragment: fragment.to_string(),
                    reason,
                }),
            }
        }

        if result.slots.is_empty() {
            result.slots.extend(self.grid.all_slots());
            result.defaulted = true;
        }

        result
    }

    fn parse_fragment(&self, fragment: &str) -> Result<Vec<TimeSlot>, SkipReason> {
        if let Some(parsed) = self.parse_legacy_code(fragment) {
            return parsed;
        }
        if let Some(parsed) = self.parse_time_range(fragment) {
            return parsed;
        }
        if let Some(parsed) = self.parse_bare_day(fragment) {
            return parsed;
        }
        Err(SkipReason::Unrecognized)
    }

    fn grid_day(&self, day: Weekday) -> Result<Weekday, SkipReason> {
        if self.grid.contains_day(day) {
            Ok(day)
        } else {
            Err(SkipReason::DayOutsideGrid(day))
        }
    }

    /// `Mon3`: a three-letter day abbreviation followed by a slot number.
    fn parse_legacy_code(&self, fragment: &str) -> Option<Result<Vec<TimeSlot>, SkipReason>> {
        let split = fragment.find(|c: char| c.is_ascii_digit())?;
        let (day_part, number_part) = fragment.split_at(split);
        if day_part.len() != 3 || !number_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let day = parse_day_name(day_part)?;
        let index: u32 = number_part.parse().ok()?;

        Some(self.grid_day(day).and_then(|day| {
            if index >= 1 && index <= self.grid.slots_per_day() as u32 {
                Ok(vec![TimeSlot::new(day, index as u8)])
            } else {
                Err(SkipReason::SlotOutOfRange(index))
            }
        }))
    }

    /// `Friday 16:00-17:00`: must be tiled exactly by consecutive grid slots.
    fn parse_time_range(&self, fragment: &str) -> Option<Result<Vec<TimeSlot>, SkipReason>> {
        let (day_part, range_part) = fragment.split_once(char::is_whitespace)?;
        let day = parse_day_name(day_part)?;
        let (start_text, end_text) = range_part.trim().split_once('-')?;
        let start = parse_clock(start_text)?;
        let end = parse_clock(end_text)?;

        Some(self.grid_day(day).and_then(|day| {
            if start >= end {
                return Err(SkipReason::EmptyRange);
            }
            let mut slots = Vec::new();
            let mut cursor = start;
            while cursor < end {
                let index = self
                    .grid
                    .slot_starting_at(cursor)
                    .ok_or(SkipReason::UnalignedRange)?;
                let (_, slot_end) = self
                    .grid
                    .slot_range(index)
                    .ok_or(SkipReason::UnalignedRange)?;
                if slot_end > end {
                    return Err(SkipReason::UnalignedRange);
                }
                slots.push(TimeSlot::new(day, index));
                cursor = slot_end;
            }
            Ok(slots)
        }))
    }

    /// `Monday`: every slot of the day.
    fn parse_bare_day(&self, fragment: &str) -> Option<Result<Vec<TimeSlot>, SkipReason>> {
        let day = parse_day_name(fragment)?;
        Some(
            self.grid_day(day)
                .map(|day| self.grid.day_slots(day).collect()),
        )
    }
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedAvailability {
        let grid = SlotGrid::default();
        AvailabilityParser::new(&grid).parse(raw)
    }

    fn slot(day: Weekday, index: u8) -> TimeSlot {
        TimeSlot::new(day, index)
    }

    #[test]
    fn test_legacy_codes() {
        let parsed = parse("Mon1,Wed1,Fri1");
        assert!(!parsed.defaulted);
        assert!(parsed.skipped.is_empty());
        let expected: BTreeSet<TimeSlot> = [
            slot(Weekday::Mon, 1),
            slot(Weekday::Wed, 1),
            slot(Weekday::Fri, 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(parsed.slots, expected);
    }

    #[test]
    fn test_mixed_notation() {
        let parsed = parse("Monday,Tue3,Friday 16:00-17:00");
        assert!(!parsed.defaulted);
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.slots.len(), 10);
        for index in 1..=8 {
            assert!(parsed.contains(&slot(Weekday::Mon, index)));
        }
        assert!(parsed.contains(&slot(Weekday::Tue, 3)));
        assert!(parsed.contains(&slot(Weekday::Fri, 7)));
    }

    #[test]
    fn test_multi_slot_time_range() {
        let parsed = parse("wed 09:00-12:00");
        let indices: Vec<u8> = parsed.slots.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_unaligned_range_rejected() {
        let parsed = parse("Tue 09:30-10:30,Mon2");
        assert_eq!(parsed.slots.len(), 1);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].reason, SkipReason::UnalignedRange);
        assert_eq!(parsed.skipped[0].fragment, "Tue 09:30-10:30");
    }

    #[test]
    fn test_range_across_missing_hour_rejected() {
        // 13:00-14:00 is not a grid slot
        let parsed = parse("Thu 12:00-15:00,Thu1");
        assert_eq!(parsed.skipped[0].reason, SkipReason::UnalignedRange);
        assert_eq!(parsed.slots.len(), 1);
    }

    #[test]
    fn test_empty_range_rejected() {
        let parsed = parse("Mon 11:00-10:00,Mon1");
        assert_eq!(parsed.skipped[0].reason, SkipReason::EmptyRange);
    }

    #[test]
    fn test_day_abbreviations() {
        assert_eq!(parse_day_name("Tue"), Some(Weekday::Tue));
        assert_eq!(parse_day_name("THURS"), Some(Weekday::Thu));
        assert_eq!(parse_day_name("wednesday"), Some(Weekday::Wed));
        assert_eq!(parse_day_name("mo"), None);
        assert_eq!(parse_day_name("mondays"), None);
    }

    #[test]
    fn test_slot_out_of_range_skipped() {
        let parsed = parse("Mon9,Mon0,Tue2");
        assert_eq!(parsed.slots.len(), 1);
        assert_eq!(
            parsed
                .skipped
                .iter()
                .map(|s| s.reason.clone())
                .collect::<Vec<_>>(),
            vec![SkipReason::SlotOutOfRange(9), SkipReason::SlotOutOfRange(0)]
        );
    }

    #[test]
    fn test_day_outside_grid_skipped() {
        let parsed = parse("Saturday,Sun3,Fri8");
        assert_eq!(parsed.slots.len(), 1);
        assert_eq!(
            parsed.skipped[0].reason,
            SkipReason::DayOutsideGrid(Weekday::Sat)
        );
        assert_eq!(
            parsed.skipped[1].reason,
            SkipReason::DayOutsideGrid(Weekday::Sun)
        );
    }

    #[test]
    fn test_empty_defaults_to_all_slots() {
        let parsed = parse("");
        assert!(parsed.defaulted);
        assert_eq!(parsed.slots.len(), 40);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_all_garbage_defaults_and_counts() {
        let parsed = parse("whenever, Mon-Fri ,  ,9am");
        assert!(parsed.defaulted);
        assert_eq!(parsed.slots.len(), 40);
        assert_eq!(parsed.skipped.len(), 3);
        assert!(parsed
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::Unrecognized));
    }

    #[test]
    fn test_day_with_bad_time_is_not_whole_day() {
        let parsed = parse("Monday 9am,Tue1");
        assert_eq!(parsed.slots.len(), 1);
        assert_eq!(parsed.skipped[0].reason, SkipReason::Unrecognized);
    }
}
