//! Core data types for the timetabling engine.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::grid::{Span, TimeSlot};

/// Kind of teaching session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Lecture,
    Lab,
    Tutorial,
    Seminar,
    Other,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lecture => "lecture",
            Self::Lab => "lab",
            Self::Tutorial => "tutorial",
            Self::Seminar => "seminar",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "lecture" => Ok(Self::Lecture),
            "lab" => Ok(Self::Lab),
            "tutorial" => Ok(Self::Tutorial),
            "seminar" => Ok(Self::Seminar),
            "other" => Ok(Self::Other),
            other => Err(CourseError::UnknownSessionType(other.to_string())),
        }
    }
}

/// A course record rejected before it reaches the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CourseError {
    #[error("Course is missing required field: {0}")]
    MissingField(&'static str),
    #[error("Course {0:?} must have a duration of at least 1 hour")]
    ZeroDuration(String),
    #[error("Course {0:?} must occur at least once per week")]
    ZeroWeeklyCount(String),
    #[error("Unknown session type: {0}")]
    UnknownSessionType(String),
}

/// A course to be timetabled.
///
/// Immutable for the duration of a scheduling run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub faculty: String,
    pub room: String,
    pub duration_hours: u32,
    pub weekly_count: u32,
    #[serde(default)]
    pub session_type: SessionType,
    /// Raw availability text; empty means "any slot"
    #[serde(default)]
    pub availability: String,
}

impl Course {
    /// A one-hour, once-a-week lecture with no availability restriction.
    pub fn new(name: impl Into<String>, faculty: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faculty: faculty.into(),
            room: room.into(),
            duration_hours: 1,
            weekly_count: 1,
            session_type: SessionType::default(),
            availability: String::new(),
        }
    }

    pub fn with_duration(mut self, hours: u32) -> Self {
        self.duration_hours = hours;
        self
    }

    pub fn with_weekly_count(mut self, count: u32) -> Self {
        self.weekly_count = count;
        self
    }

    pub fn with_session_type(mut self, session_type: SessionType) -> Self {
        self.session_type = session_type;
        self
    }

    pub fn with_availability(mut self, availability: impl Into<String>) -> Self {
        self.availability = availability.into();
        self
    }

    /// Check the fields the engine relies on.
    ///
    /// Input readers call this before handing records to the engine.
    pub fn validate(&self) -> Result<(), CourseError> {
        if self.name.trim().is_empty() {
            return Err(CourseError::MissingField("name"));
        }
        if self.faculty.trim().is_empty() {
            return Err(CourseError::MissingField("faculty"));
        }
        if self.room.trim().is_empty() {
            return Err(CourseError::MissingField("room"));
        }
        if self.duration_hours == 0 {
            return Err(CourseError::ZeroDuration(self.name.clone()));
        }
        if self.weekly_count == 0 {
            return Err(CourseError::ZeroWeeklyCount(self.name.clone()));
        }
        Ok(())
    }
}

/// One weekly occurrence of a course awaiting placement.
#[derive(Clone, Debug)]
pub struct SessionRequest {
    /// Index of the course in the run's input list
    pub course_index: usize,
    /// 0-based occurrence within the week
    pub occurrence: u32,
    pub duration: u8,
    /// Slots that can anchor a full-duration span, sorted; shared by all
    /// occurrences of the same course
    pub candidate_slots: Arc<[TimeSlot]>,
}

impl SessionRequest {
    pub fn candidate_count(&self) -> usize {
        self.candidate_slots.len()
    }
}

/// A committed placement of one session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub course_index: usize,
    pub occurrence: u32,
    pub day: Weekday,
    pub span: Span,
    /// Quality cost at commit time (lower is better)
    pub cost: f64,
}

impl Placement {
    pub fn start_index(&self) -> u8 {
        self.span.start
    }

    /// Slots covered by this placement.
    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.span.indices().map(move |i| TimeSlot::new(self.day, i))
    }
}

/// Why a session could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// The course's availability has no contiguous run long enough for its duration
    InsufficientAvailability,
    /// Every candidate span was taken by earlier commits
    AllCandidatesConflicted,
}

impl UnplacedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientAvailability => "insufficient_availability",
            Self::AllCandidatesConflicted => "all_candidates_conflicted",
        }
    }
}

impl fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session that ended the run without a placement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnplacedSession {
    pub course: String,
    pub faculty: String,
    pub room: String,
    pub occurrence: u32,
    pub duration: u32,
    pub reason: UnplacedReason,
}

impl UnplacedSession {
    pub fn new(course: &Course, occurrence: u32, reason: UnplacedReason) -> Self {
        Self {
            course: course.name.clone(),
            faculty: course.faculty.clone(),
            room: course.room.clone(),
            occurrence,
            duration: course.duration_hours,
            reason,
        }
    }
}
