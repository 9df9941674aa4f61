//! Python bindings for the timetabling engine.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::availability::AvailabilityParser;
use crate::config::{SchedulingConfig, TieBreak};
use crate::grid::{day_name, SlotGrid};
use crate::models::{Course, SessionType, UnplacedSession};
use crate::{schedule_with_config, ScheduleResult};

fn value_error(e: impl ToString) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Course record (PyO3 wrapper).
#[pyclass(name = "Course")]
#[derive(Clone, Debug)]
pub struct PyCourse {
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub faculty: String,
    #[pyo3(get, set)]
    pub room: String,
    #[pyo3(get, set)]
    pub duration_hours: u32,
    #[pyo3(get, set)]
    pub weekly_count: u32,
    #[pyo3(get, set)]
    pub session_type: String,
    #[pyo3(get, set)]
    pub availability: String,
}

#[pymethods]
impl PyCourse {
    #[new]
    #[pyo3(signature = (name, faculty, room, duration_hours=1, weekly_count=1, session_type="lecture".to_string(), availability=String::new()))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        name: String,
        faculty: String,
        room: String,
        duration_hours: u32,
        weekly_count: u32,
        session_type: String,
        availability: String,
    ) -> Self {
        Self {
            name,
            faculty,
            room,
            duration_hours,
            weekly_count,
            session_type,
            availability,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Course(name={:?}, faculty={:?}, room={:?}, duration_hours={}, weekly_count={})",
            self.name, self.faculty, self.room, self.duration_hours, self.weekly_count
        )
    }
}

impl PyCourse {
    /// Convert and validate, rejecting malformed records before the engine.
    fn to_course(&self) -> PyResult<Course> {
        let session_type: SessionType = self.session_type.parse().map_err(value_error)?;
        let course = Course::new(&self.name, &self.faculty, &self.room)
            .with_duration(self.duration_hours)
            .with_weekly_count(self.weekly_count)
            .with_session_type(session_type)
            .with_availability(&self.availability);
        course.validate().map_err(value_error)?;
        Ok(course)
    }
}

/// Scheduling configuration (PyO3 wrapper).
#[pyclass(name = "SchedulingConfig")]
#[derive(Clone, Debug)]
pub struct PySchedulingConfig {
    #[pyo3(get, set)]
    pub tie_break: String,
    #[pyo3(get, set)]
    pub day_spread_penalty: f64,
    #[pyo3(get, set)]
    pub jitter_scale: f64,
    #[pyo3(get, set)]
    pub seed: u64,
    #[pyo3(get, set)]
    pub faculty_daily_cap: Option<u32>,
    #[pyo3(get, set)]
    pub verbosity: u8,
}

#[pymethods]
impl PySchedulingConfig {
    #[new]
    #[pyo3(signature = (tie_break="input_order".to_string(), day_spread_penalty=3.0, jitter_scale=0.01, seed=0, faculty_daily_cap=Some(5), verbosity=0))]
    fn new(
        tie_break: String,
        day_spread_penalty: f64,
        jitter_scale: f64,
        seed: u64,
        faculty_daily_cap: Option<u32>,
        verbosity: u8,
    ) -> Self {
        Self {
            tie_break,
            day_spread_penalty,
            jitter_scale,
            seed,
            faculty_daily_cap,
            verbosity,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulingConfig(tie_break={:?}, day_spread_penalty={}, jitter_scale={}, seed={})",
            self.tie_break, self.day_spread_penalty, self.jitter_scale, self.seed
        )
    }
}

impl PySchedulingConfig {
    fn to_config(&self) -> PyResult<SchedulingConfig> {
        let tie_break: TieBreak = self.tie_break.parse().map_err(value_error)?;
        Ok(SchedulingConfig {
            tie_break,
            day_spread_penalty: self.day_spread_penalty,
            jitter_scale: self.jitter_scale,
            seed: self.seed,
            faculty_daily_cap: self.faculty_daily_cap,
            verbosity: self.verbosity,
        })
    }
}

/// A session left out of the timetable.
#[pyclass(name = "UnplacedSession", frozen)]
#[derive(Clone, Debug)]
pub struct PyUnplacedSession {
    #[pyo3(get)]
    pub course: String,
    #[pyo3(get)]
    pub faculty: String,
    #[pyo3(get)]
    pub room: String,
    #[pyo3(get)]
    pub occurrence: u32,
    #[pyo3(get)]
    pub duration: u32,
    #[pyo3(get)]
    pub reason: String,
}

impl From<&UnplacedSession> for PyUnplacedSession {
    fn from(u: &UnplacedSession) -> Self {
        Self {
            course: u.course.clone(),
            faculty: u.faculty.clone(),
            room: u.room.clone(),
            occurrence: u.occurrence,
            duration: u.duration,
            reason: u.reason.to_string(),
        }
    }
}

/// Result of `generate_timetable`.
#[pyclass(name = "ScheduleResult", frozen)]
pub struct PyScheduleResult {
    inner: ScheduleResult,
}

#[pymethods]
impl PyScheduleResult {
    #[getter]
    fn coverage_percentage(&self) -> f64 {
        self.inner.statistics.coverage_percentage
    }

    #[getter]
    fn quality_rating(&self) -> &'static str {
        self.inner.statistics.quality_rating.as_str()
    }

    #[getter]
    fn scheduled_count(&self) -> usize {
        self.inner.statistics.scheduled_count
    }

    #[getter]
    fn total_requested(&self) -> usize {
        self.inner.statistics.total_requested
    }

    #[getter]
    fn unplaced(&self) -> Vec<PyUnplacedSession> {
        self.inner.unplaced.iter().map(PyUnplacedSession::from).collect()
    }

    /// Timetable as JSON: `{day: {slot_label: [session, ...]}}`.
    fn timetable_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner.timetable).map_err(value_error)
    }

    fn statistics_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner.statistics).map_err(value_error)
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleResult(scheduled={}/{}, coverage={:.1}%, rating={})",
            self.inner.statistics.scheduled_count,
            self.inner.statistics.total_requested,
            self.inner.statistics.coverage_percentage,
            self.inner.statistics.quality_rating
        )
    }
}

/// Build a weekly timetable on the default Mon-Fri grid.
///
/// # Raises
/// * ValueError if a course record or the config is invalid
#[pyfunction]
#[pyo3(signature = (courses, config=None))]
fn generate_timetable(
    courses: Vec<PyCourse>,
    config: Option<PySchedulingConfig>,
) -> PyResult<PyScheduleResult> {
    let courses: Vec<Course> = courses
        .iter()
        .map(PyCourse::to_course)
        .collect::<PyResult<_>>()?;
    let config = match config {
        Some(c) => c.to_config()?,
        None => SchedulingConfig::default(),
    };
    let inner =
        schedule_with_config(&courses, &SlotGrid::default(), &config).map_err(value_error)?;
    Ok(PyScheduleResult { inner })
}

/// Parse an availability string against the default grid.
///
/// Returns `(slots, skipped)` where `slots` is a sorted list of
/// `(day_name, slot_index)` and `skipped` describes ignored fragments.
#[pyfunction]
fn parse_availability(raw: &str) -> (Vec<(String, u8)>, Vec<String>) {
    let grid = SlotGrid::default();
    let parsed = AvailabilityParser::new(&grid).parse(raw);
    let slots = parsed
        .slots
        .iter()
        .map(|slot| (day_name(slot.day).to_string(), slot.index))
        .collect();
    let skipped = parsed
        .skipped
        .iter()
        .map(|s| format!("{}: {}", s.fragment, s.reason))
        .collect();
    (slots, skipped)
}

#[pymodule]
fn timetable_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCourse>()?;
    m.add_class::<PySchedulingConfig>()?;
    m.add_class::<PyUnplacedSession>()?;
    m.add_class::<PyScheduleResult>()?;

    m.add_function(wrap_pyfunction!(generate_timetable, m)?)?;
    m.add_function(wrap_pyfunction!(parse_availability, m)?)?;

    Ok(())
}
