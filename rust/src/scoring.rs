//! Cost of placing a session on a candidate span (lower is better).
//!
//! Cost = mean slot desirability over the span
//!      + day-spread penalty × occurrences of the same course already on that day
//!      + deterministic jitter in `[0, jitter_scale)`.

use chrono::{Timelike, Weekday};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use crate::config::SchedulingConfig;
use crate::grid::{SlotGrid, Span};

/// Breakdown of a candidate's cost.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpanCost {
    pub base: f64,
    pub spread: f64,
    pub jitter: f64,
}

impl SpanCost {
    pub fn total(&self) -> f64 {
        self.base + self.spread + self.jitter
    }
}

/// Time-of-day desirability of one slot.
///
/// 10:00 → 1, 11:00 → 2, 09:00 and other mornings → 3, 14:00 → 4, lunch → 6,
/// 17:00 and later → 8, remaining afternoon slots → 5.
pub fn slot_desirability(grid: &SlotGrid, index: u8) -> f64 {
    if grid.is_lunch(index) {
        return 6.0;
    }
    let hour = match grid.slot_range(index) {
        Some((start, _)) => start.hour(),
        None => return 8.0,
    };
    match hour {
        10 => 1.0,
        11 => 2.0,
        14 => 4.0,
        h if h >= 17 => 8.0,
        h if h >= 12 => 5.0,
        _ => 3.0,
    }
}

/// Scores candidate spans for the placer.
#[derive(Clone, Debug)]
pub struct QualityScorer<'a> {
    grid: &'a SlotGrid,
    day_spread_penalty: f64,
    jitter_scale: f64,
    seed: u64,
}

impl<'a> QualityScorer<'a> {
    pub fn new(grid: &'a SlotGrid, config: &SchedulingConfig) -> Self {
        Self {
            grid,
            day_spread_penalty: config.day_spread_penalty,
            jitter_scale: config.jitter_scale,
            seed: config.seed,
        }
    }

    /// Mean desirability of the slots in `span`.
    pub fn base_cost(&self, span: Span) -> f64 {
        if span.len == 0 {
            return 0.0;
        }
        let sum: f64 = span
            .indices()
            .map(|i| slot_desirability(self.grid, i))
            .sum();
        sum / span.len as f64
    }

    /// Score a candidate span.
    ///
    /// `same_course_on_day` counts occurrences of this course already committed
    /// on `day`. With `relaxed` the day-spread penalty is dropped.
    pub fn score(
        &self,
        course_name: &str,
        occurrence: u32,
        day: Weekday,
        span: Span,
        same_course_on_day: u32,
        relaxed: bool,
    ) -> SpanCost {
        let spread = if relaxed {
            0.0
        } else {
            self.day_spread_penalty * same_course_on_day as f64
        };
        SpanCost {
            base: self.base_cost(span),
            spread,
            jitter: self.jitter(course_name, occurrence, day, span.start),
        }
    }

    /// Input-derived pseudo-random value in `[0, jitter_scale)`.
    ///
    /// It only separates candidates whose other costs differ by less than
    /// `jitter_scale`; see `SchedulingConfig::validate_for_grid`.
    ///
    /// Depends only on the seed, the course, the occurrence and the candidate,
    /// never on ambient entropy.
    pub fn jitter(&self, course_name: &str, occurrence: u32, day: Weekday, start: u8) -> f64 {
        if self.jitter_scale == 0.0 {
            return 0.0;
        }
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        course_name.hash(&mut hasher);
        occurrence.hash(&mut hasher);
        day.num_days_from_monday().hash(&mut hasher);
        start.hash(&mut hasher);
        let unit = (hasher.finish() >> 11) as f64 / (1u64 << 53) as f64;
        unit * self.jitter_scale
    }
}
