//! Weekly course timetabling engine.
//!
//! Turns a list of courses into a conflict-free weekly timetable on a fixed
//! grid of days × one-hour slots. Placement is greedy and most-constrained
//! first; sessions that cannot be placed are reported with a reason rather
//! than failing the run.

pub mod availability;
pub mod config;
pub mod expander;
pub mod grid;
pub mod interner;
pub mod logging;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod sorting;

#[cfg(feature = "python")]
mod python;

use serde::Serialize;

pub use availability::{AvailabilityParser, ParsedAvailability, SkipReason, SkippedFragment};
pub use config::{ConfigError, SchedulingConfig, TieBreak};
pub use expander::{Expansion, SessionExpander};
pub use grid::{GridError, SlotGrid, Span, TimeSlot};
pub use models::{
    Course, CourseError, Placement, SessionRequest, SessionType, UnplacedReason, UnplacedSession,
};
pub use report::{
    audit_conflicts, ConflictRecord, CourseCoverage, PenaltyBreakdown, QualityRating,
    ReportBuilder, Statistics, Timetable,
};
pub use scheduler::{ConflictTracker, Placer};
pub use sorting::rank_requests;

/// Everything a run produces.
#[derive(Clone, Debug, Serialize)]
pub struct ScheduleResult {
    pub timetable: Timetable,
    pub statistics: Statistics,
    /// Structurally unplaceable sessions in input order, then conflicted
    /// sessions in placement order
    pub unplaced: Vec<UnplacedSession>,
    /// Committed placements in commit order
    pub placements: Vec<Placement>,
}

/// Schedule courses on the default Mon-Fri grid with the default config.
///
/// Never fails: every session either lands in the timetable or in `unplaced`.
pub fn schedule(courses: &[Course]) -> ScheduleResult {
    run(courses, &SlotGrid::default(), &SchedulingConfig::default())
}

/// Schedule courses on a custom grid with a custom config.
///
/// # Errors
/// * `ConfigError` if the config fails validation, including a jitter scale
///   too coarse for the grid's day length
pub fn schedule_with_config(
    courses: &[Course],
    grid: &SlotGrid,
    config: &SchedulingConfig,
) -> Result<ScheduleResult, ConfigError> {
    config.validate_for_grid(grid)?;
    Ok(run(courses, grid, config))
}

fn run(courses: &[Course], grid: &SlotGrid, config: &SchedulingConfig) -> ScheduleResult {
    let verbosity = config.verbosity;
    log_changes!(
        verbosity,
        "Scheduling {} course(s) on {} day(s) × {} slot(s)",
        courses.len(),
        grid.days().len(),
        grid.slots_per_day()
    );

    let expansion = SessionExpander::new(grid, verbosity).expand(courses);
    let ranked = rank_requests(expansion.requests.clone(), courses, config.tie_break);

    let outcome = Placer::new(grid, courses, config).run(&ranked);

    let report = ReportBuilder::new(grid, courses);
    let timetable = report.timetable(&outcome.placements);
    let statistics = report.statistics(&expansion, &outcome);

    log_changes!(
        verbosity,
        "Coverage {:.1}% ({} of {}), rating {}",
        statistics.coverage_percentage,
        statistics.scheduled_count,
        statistics.total_requested,
        statistics.quality_rating
    );

    let mut unplaced = expansion.unplaced;
    unplaced.extend(outcome.unplaced);

    ScheduleResult {
        timetable,
        statistics,
        unplaced,
        placements: outcome.placements,
    }
}
