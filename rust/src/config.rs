//! Configuration types for the timetabling engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::grid::SlotGrid;

/// Errors raised by configuration validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown tie-break strategy: {0}")]
    UnknownTieBreak(String),
    #[error("Day-spread penalty must be finite and non-negative, got {0}")]
    InvalidDaySpreadPenalty(f64),
    #[error("Jitter scale must be in [0, 0.1), got {0}")]
    InvalidJitterScale(f64),
    #[error("Jitter scale {scale} is too coarse for this grid, must be below {limit}")]
    JitterTooCoarse { scale: f64, limit: f64 },
    #[error("Faculty daily cap must be at least 1")]
    ZeroFacultyDailyCap,
}

/// Final tie-break between requests with equal constrainedness and duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Course order of the input list, then occurrence
    #[default]
    InputOrder,
    /// Course name, then input order
    CourseName,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputOrder => "input_order",
            Self::CourseName => "course_name",
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreak {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input_order" => Ok(Self::InputOrder),
            "course_name" => Ok(Self::CourseName),
            other => Err(ConfigError::UnknownTieBreak(other.to_string())),
        }
    }
}

/// Configuration for ranking, scoring and placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Tie-break applied after candidate count and duration
    pub tie_break: TieBreak,
    /// Cost added per occurrence of the same course already on a day
    pub day_spread_penalty: f64,
    /// Upper bound of the deterministic tie-breaking jitter
    ///
    /// Mean span costs on a grid of `n` slots per day can differ by as little
    /// as `1 / n`; `validate_for_grid` keeps the jitter below half of that.
    pub jitter_scale: f64,
    /// Caller-supplied seed mixed into the jitter; same seed, same timetable
    pub seed: u64,
    /// Soft cap on occupied slots per faculty per day, relaxed on retry
    pub faculty_daily_cap: Option<u32>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug
    pub verbosity: u8,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::InputOrder,
            day_spread_penalty: 3.0,
            jitter_scale: 0.01,
            seed: 0,
            faculty_daily_cap: Some(5),
            verbosity: 0,
        }
    }
}

impl SchedulingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.day_spread_penalty.is_finite() || self.day_spread_penalty < 0.0 {
            return Err(ConfigError::InvalidDaySpreadPenalty(
                self.day_spread_penalty,
            ));
        }
        if !(0.0..0.1).contains(&self.jitter_scale) {
            return Err(ConfigError::InvalidJitterScale(self.jitter_scale));
        }
        if self.faculty_daily_cap == Some(0) {
            return Err(ConfigError::ZeroFacultyDailyCap);
        }
        Ok(())
    }

    /// `validate`, plus the jitter bound implied by the grid's day length.
    pub fn validate_for_grid(&self, grid: &SlotGrid) -> Result<(), ConfigError> {
        self.validate()?;
        let limit = 1.0 / (2.0 * grid.slots_per_day() as f64);
        if self.jitter_scale >= limit {
            return Err(ConfigError::JitterTooCoarse {
                scale: self.jitter_scale,
                limit,
            });
        }
        Ok(())
    }
}
