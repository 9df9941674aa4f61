//! Greedy placement with one relaxed retry pass.
//!
//! # Algorithm
//!
//! For each request in ranked order:
//! 1. Collect the request's anchors whose span is free for its faculty and
//!    room and keeps the faculty under the daily cap.
//! 2. If none, retry once ignoring the daily cap and the day-spread penalty.
//! 3. If still none, the request is unplaced (`all_candidates_conflicted`).
//! 4. Otherwise commit the lowest-cost candidate.
//!
//! Earlier commits are never undone, so each request is processed exactly once.
//!
//! # Complexity
//! O(r * a) where r = requests and a = anchors per request (≤ days × slots).

use chrono::Weekday;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

use crate::config::SchedulingConfig;
use crate::grid::{SlotGrid, Span};
use crate::models::{Course, Placement, SessionRequest, UnplacedReason, UnplacedSession};
use crate::scoring::{QualityScorer, SpanCost};
use crate::{log_changes, log_checks, log_debug};

use super::occupancy::{ConflictTracker, EntityKind};
use super::state::{PlacementDecision, SessionState};

/// Which constraints a candidate scan honours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    /// Faculty daily cap and day-spread penalty apply
    Preferred,
    /// Only hard conflicts apply
    Relaxed,
}

/// A free span with its cost.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    day: Weekday,
    day_position: usize,
    span: Span,
    cost: SpanCost,
}

/// Compare f64 values for sorting, treating NaN as equal.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Result of a placement run.
#[derive(Clone, Debug, Default)]
pub struct PlacementOutcome {
    /// Committed placements in commit order
    pub placements: Vec<Placement>,
    /// Requests that lost every candidate to earlier commits
    pub unplaced: Vec<UnplacedSession>,
    /// One decision per request, in processing order
    pub decisions: Vec<PlacementDecision>,
}

impl PlacementOutcome {
    pub fn retry_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.retried).count()
    }
}

/// The greedy placer for one scheduling run.
///
/// Owns the run's `ConflictTracker`; construct a fresh placer per run.
pub struct Placer<'a> {
    grid: &'a SlotGrid,
    courses: &'a [Course],
    config: &'a SchedulingConfig,
    scorer: QualityScorer<'a>,
    tracker: ConflictTracker,
    /// (course_index, day) -> occurrences already committed
    course_day_counts: FxHashMap<(usize, Weekday), u32>,
}

impl<'a> Placer<'a> {
    pub fn new(grid: &'a SlotGrid, courses: &'a [Course], config: &'a SchedulingConfig) -> Self {
        Self {
            grid,
            courses,
            config,
            scorer: QualityScorer::new(grid, config),
            tracker: ConflictTracker::new(),
            course_day_counts: FxHashMap::default(),
        }
    }

    /// Occupancy as committed so far.
    pub fn tracker(&self) -> &ConflictTracker {
        &self.tracker
    }

    /// Place every request in the given order.
    pub fn run(&mut self, ranked: &[SessionRequest]) -> PlacementOutcome {
        let verbosity = self.config.verbosity;
        let mut outcome = PlacementOutcome::default();

        for request in ranked {
            let decision = self.place(request);
            match &decision.state {
                SessionState::Placed(placement) => outcome.placements.push(placement.clone()),
                SessionState::Unplaced(reason) => {
                    outcome.unplaced.push(UnplacedSession::new(
                        &self.courses[request.course_index],
                        request.occurrence,
                        *reason,
                    ));
                }
                // place() always returns a terminal state
                SessionState::Pending => {}
            }
            outcome.decisions.push(decision);
        }

        log_changes!(
            verbosity,
            "Placed {} of {} sessions ({} retried)",
            outcome.placements.len(),
            ranked.len(),
            outcome.retry_count()
        );

        outcome
    }

    /// Resolve one request to a terminal state, committing on success.
    fn place(&mut self, request: &SessionRequest) -> PlacementDecision {
        let verbosity = self.config.verbosity;
        let course = &self.courses[request.course_index];

        log_checks!(
            verbosity,
            "  Considering {} #{} (duration={}, anchors={})",
            course.name,
            request.occurrence,
            request.duration,
            request.candidate_count()
        );

        let mut candidates = self.candidates(request, Pass::Preferred);
        let free_candidates = candidates.len();
        let mut retried = false;

        if candidates.is_empty() {
            retried = true;
            log_checks!(
                verbosity,
                "    No preferred span for {} #{}, retrying relaxed",
                course.name,
                request.occurrence
            );
            candidates = self.candidates(request, Pass::Relaxed);
        }

        let state = match Self::best(&candidates) {
            Some(best) => {
                self.tracker
                    .commit(&course.faculty, &course.room, best.day, best.span);
                *self
                    .course_day_counts
                    .entry((request.course_index, best.day))
                    .or_insert(0) += 1;

                let placement = Placement {
                    course_index: request.course_index,
                    occurrence: request.occurrence,
                    day: best.day,
                    span: best.span,
                    cost: best.cost.total(),
                };
                log_changes!(
                    verbosity,
                    "  Placed {} #{} on {} slots {}-{} (cost={:.2})",
                    course.name,
                    request.occurrence,
                    best.day,
                    best.span.start,
                    best.span.end(),
                    placement.cost
                );
                SessionState::Pending.resolve(SessionState::Placed(placement))
            }
            None => {
                log_changes!(
                    verbosity,
                    "  Unplaced {} #{}: {}",
                    course.name,
                    request.occurrence,
                    UnplacedReason::AllCandidatesConflicted
                );
                SessionState::Pending
                    .resolve(SessionState::Unplaced(UnplacedReason::AllCandidatesConflicted))
            }
        };

        PlacementDecision {
            course_index: request.course_index,
            occurrence: request.occurrence,
            candidate_count: request.candidate_count(),
            free_candidates,
            retried,
            state,
        }
    }

    /// Legal spans for a request under the given pass, with their costs.
    fn candidates(&self, request: &SessionRequest, pass: Pass) -> Vec<Candidate> {
        let verbosity = self.config.verbosity;
        let course = &self.courses[request.course_index];
        let relaxed = pass == Pass::Relaxed;

        let mut candidates = Vec::new();
        for anchor in request.candidate_slots.iter() {
            let span = Span::new(anchor.index, request.duration);
            if !self
                .tracker
                .is_span_free(&course.faculty, &course.room, anchor.day, span)
            {
                continue;
            }
            if !relaxed && !self.within_faculty_cap(&course.faculty, anchor.day, span) {
                continue;
            }
            let Some(day_position) = self.grid.day_position(anchor.day) else {
                continue;
            };

            let same_course_on_day = self
                .course_day_counts
                .get(&(request.course_index, anchor.day))
                .copied()
                .unwrap_or(0);
            let cost = self.scorer.score(
                &course.name,
                request.occurrence,
                anchor.day,
                span,
                same_course_on_day,
                relaxed,
            );
            log_debug!(
                verbosity,
                "    {} {}-{}: base={:.2} spread={:.1} jitter={:.4}",
                anchor.day,
                span.start,
                span.end(),
                cost.base,
                cost.spread,
                cost.jitter
            );

            candidates.push(Candidate {
                day: anchor.day,
                day_position,
                span,
                cost,
            });
        }
        candidates
    }

    fn within_faculty_cap(&self, faculty: &str, day: Weekday, span: Span) -> bool {
        match self.config.faculty_daily_cap {
            Some(cap) => {
                self.tracker
                    .occupied_slots(EntityKind::Faculty, faculty, day)
                    + span.len as u32
                    <= cap
            }
            None => true,
        }
    }

    /// Lowest cost; exact ties go to the earliest day, then the earliest start.
    fn best(candidates: &[Candidate]) -> Option<Candidate> {
        candidates.iter().copied().min_by(|a, b| {
            cmp_f64(a.cost.total(), b.cost.total())
                .then(a.day_position.cmp(&b.day_position))
                .then(a.span.start.cmp(&b.span.start))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::SessionExpander;
    use crate::sorting::rank_requests;

    fn run_with(courses: &[Course], config: &SchedulingConfig) -> PlacementOutcome {
        let grid = SlotGrid::default();
        let expansion = SessionExpander::new(&grid, 0).expand(courses);
        let ranked = rank_requests(expansion.requests, courses, config.tie_break);
        Placer::new(&grid, courses, config).run(&ranked)
    }

    fn run(courses: &[Course]) -> PlacementOutcome {
        run_with(courses, &SchedulingConfig::default())
    }

    #[test]
    fn test_prefers_ten_oclock() {
        let courses = vec![Course::new("Maths", "Dr. A", "R1").with_availability("Monday")];
        let outcome = run(&courses);
        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.placements[0].day, Weekday::Mon);
        assert_eq!(outcome.placements[0].span, Span::new(2, 1));
    }

    #[test]
    fn test_repeats_spread_across_days() {
        let courses = vec![Course::new("Maths", "Dr. A", "R1")
            .with_weekly_count(3)
            .with_availability("Monday,Tuesday,Wednesday")];
        let outcome = run(&courses);
        let mut days: Vec<Weekday> = outcome.placements.iter().map(|p| p.day).collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        assert_eq!(days.len(), 3);
        assert!(outcome.placements.iter().all(|p| p.span.start == 2));
    }

    #[test]
    fn test_shared_faculty_single_slot_conflict() {
        let courses = vec![
            Course::new("Maths", "Dr. A", "R1").with_availability("Mon1"),
            Course::new("Physics", "Dr. A", "R2").with_availability("Mon1"),
        ];
        let outcome = run(&courses);
        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.placements[0].course_index, 0);
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.unplaced[0].course, "Physics");
        assert_eq!(
            outcome.unplaced[0].reason,
            UnplacedReason::AllCandidatesConflicted
        );
        assert!(outcome.decisions[1].retried);
    }

    #[test]
    fn test_shared_room_conflict_pushes_to_next_slot() {
        let courses = vec![
            Course::new("Maths", "Dr. A", "R1").with_availability("Mon1,Mon2"),
            Course::new("Physics", "Dr. B", "R1").with_availability("Mon1,Mon2"),
        ];
        let outcome = run(&courses);
        assert_eq!(outcome.placements.len(), 2);
        let starts: Vec<u8> = outcome.placements.iter().map(|p| p.span.start).collect();
        assert_eq!(starts, vec![2, 1]);
    }

    #[test]
    fn test_multi_hour_span_is_committed_whole() {
        let courses = vec![
            Course::new("Lab", "Dr. A", "L1")
                .with_duration(3)
                .with_availability("Tue 09:00-12:00"),
            Course::new("Tutorial", "Dr. A", "R2").with_availability("Tue2,Tue3,Tue4"),
        ];
        let outcome = run(&courses);
        assert_eq!(outcome.placements.len(), 2);
        let lab = outcome
            .placements
            .iter()
            .find(|p| p.course_index == 0)
            .unwrap();
        assert_eq!(lab.span, Span::new(1, 3));
        let tutorial = outcome
            .placements
            .iter()
            .find(|p| p.course_index == 1)
            .unwrap();
        assert_eq!(tutorial.span, Span::new(4, 1));
    }

    #[test]
    fn test_faculty_cap_is_soft() {
        let config = SchedulingConfig {
            faculty_daily_cap: Some(1),
            ..Default::default()
        };
        let courses = vec![
            Course::new("Maths", "Dr. A", "R1").with_availability("Mon1,Tue1"),
            Course::new("Physics", "Dr. A", "R2").with_availability("Mon2,Tue2"),
            Course::new("Chemistry", "Dr. A", "R3").with_availability("Mon3"),
        ];
        let outcome = run_with(&courses, &config);
        assert_eq!(outcome.placements.len(), 3);
        // Chemistry (fewest anchors) goes first, then Maths avoids Monday
        let days: Vec<Weekday> = outcome.placements.iter().map(|p| p.day).collect();
        assert_eq!(days[0], Weekday::Mon);
        assert_eq!(days[1], Weekday::Tue);
        // Physics only fits by relaxing the cap
        assert!(!outcome.decisions[1].retried);
        assert!(outcome.decisions[2].retried);
        assert_eq!(outcome.decisions[2].free_candidates, 0);
    }

    #[test]
    fn test_every_request_reaches_terminal_state() {
        let courses = vec![
            Course::new("A", "F1", "R1").with_weekly_count(4).with_availability("Mon1,Tue1"),
            Course::new("B", "F2", "R1").with_weekly_count(2),
        ];
        let outcome = run(&courses);
        assert_eq!(outcome.decisions.len(), 6);
        assert!(outcome.decisions.iter().all(|d| d.state.is_terminal()));
        assert_eq!(outcome.placements.len() + outcome.unplaced.len(), 6);
    }

    #[test]
    fn test_tracker_reflects_commits() {
        let grid = SlotGrid::default();
        let config = SchedulingConfig::default();
        let courses = vec![Course::new("Maths", "Dr. A", "R1").with_availability("Wed5")];
        let expansion = SessionExpander::new(&grid, 0).expand(&courses);
        let mut placer = Placer::new(&grid, &courses, &config);
        placer.run(&expansion.requests);
        assert!(!placer
            .tracker()
            .is_span_free("Dr. A", "R9", Weekday::Wed, Span::new(5, 1)));
    }
}
