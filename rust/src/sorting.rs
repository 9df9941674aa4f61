//! Request ranking for the placer.
//!
//! Most-constrained-first: requests with the fewest candidate anchors are
//! placed earliest, longer sessions before shorter ones at equal
//! constrainedness, then a configurable tie-break:
//! - `input_order`: course position in the input list, then occurrence
//! - `course_name`: course name, then input order
//!
//! The ranking is computed once before placement and never revisited as
//! commits shrink the remaining candidates.

use std::cmp::Ordering;

use crate::config::TieBreak;
use crate::models::{Course, SessionRequest};

/// Sort key for a session request (lower = placed earlier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// (candidates, -duration, course_index, occurrence)
    InputOrder {
        candidates: usize,
        duration: u8,
        course_index: usize,
        occurrence: u32,
    },
    /// (candidates, -duration, course_name, course_index, occurrence)
    CourseName {
        candidates: usize,
        duration: u8,
        course_name: String,
        course_index: usize,
        occurrence: u32,
    },
}

impl SortKey {
    pub fn new(request: &SessionRequest, course: &Course, tie_break: TieBreak) -> Self {
        match tie_break {
            TieBreak::InputOrder => Self::InputOrder {
                candidates: request.candidate_count(),
                duration: request.duration,
                course_index: request.course_index,
                occurrence: request.occurrence,
            },
            TieBreak::CourseName => Self::CourseName {
                candidates: request.candidate_count(),
                duration: request.duration,
                course_name: course.name.clone(),
                course_index: request.course_index,
                occurrence: request.occurrence,
            },
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Self::InputOrder {
                    candidates: c1,
                    duration: d1,
                    course_index: i1,
                    occurrence: o1,
                },
                Self::InputOrder {
                    candidates: c2,
                    duration: d2,
                    course_index: i2,
                    occurrence: o2,
                },
            ) => c1
                .cmp(c2)
                .then(d2.cmp(d1))
                .then(i1.cmp(i2))
                .then(o1.cmp(o2)),

            (
                Self::CourseName {
                    candidates: c1,
                    duration: d1,
                    course_name: n1,
                    course_index: i1,
                    occurrence: o1,
                },
                Self::CourseName {
                    candidates: c2,
                    duration: d2,
                    course_name: n2,
                    course_index: i2,
                    occurrence: o2,
                },
            ) => c1
                .cmp(c2)
                .then(d2.cmp(d1))
                .then(n1.cmp(n2))
                .then(i1.cmp(i2))
                .then(o1.cmp(o2)),

            // Keys of one run always share a variant
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order requests for placement.
///
/// `courses` is the input list the requests' `course_index` refers to.
pub fn rank_requests(
    requests: Vec<SessionRequest>,
    courses: &[Course],
    tie_break: TieBreak,
) -> Vec<SessionRequest> {
    let mut keyed: Vec<(SortKey, SessionRequest)> = requests
        .into_iter()
        .map(|request| {
            let key = SortKey::new(&request, &courses[request.course_index], tie_break);
            (key, request)
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    keyed.into_iter().map(|(_, request)| request).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TimeSlot;
    use chrono::Weekday;
    use std::sync::Arc;

    fn request(course_index: usize, occurrence: u32, duration: u8, candidates: u8) -> SessionRequest {
        let slots: Vec<TimeSlot> = (1..=candidates)
            .map(|i| TimeSlot::new(Weekday::Mon, i))
            .collect();
        SessionRequest {
            course_index,
            occurrence,
            duration,
            candidate_slots: slots.into(),
        }
    }

    fn courses(names: &[&str]) -> Vec<Course> {
        names.iter().map(|n| Course::new(*n, "F", "R")).collect()
    }

    fn order(ranked: &[SessionRequest]) -> Vec<(usize, u32)> {
        ranked
            .iter()
            .map(|r| (r.course_index, r.occurrence))
            .collect()
    }

    #[test]
    fn test_fewest_candidates_first() {
        let courses = courses(&["A", "B", "C"]);
        let ranked = rank_requests(
            vec![request(0, 0, 1, 5), request(1, 0, 1, 2), request(2, 0, 1, 8)],
            &courses,
            TieBreak::InputOrder,
        );
        assert_eq!(order(&ranked), vec![(1, 0), (0, 0), (2, 0)]);
    }

    #[test]
    fn test_longer_duration_breaks_ties() {
        let courses = courses(&["A", "B"]);
        let ranked = rank_requests(
            vec![request(0, 0, 1, 4), request(1, 0, 2, 4)],
            &courses,
            TieBreak::InputOrder,
        );
        assert_eq!(order(&ranked), vec![(1, 0), (0, 0)]);
    }

    #[test]
    fn test_input_order_tie_break() {
        let courses = courses(&["Zoology", "Art"]);
        let ranked = rank_requests(
            vec![request(1, 1, 1, 3), request(0, 0, 1, 3), request(1, 0, 1, 3)],
            &courses,
            TieBreak::InputOrder,
        );
        assert_eq!(order(&ranked), vec![(0, 0), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_course_name_tie_break() {
        let courses = courses(&["Zoology", "Art"]);
        let ranked = rank_requests(
            vec![request(0, 0, 1, 3), request(1, 0, 1, 3)],
            &courses,
            TieBreak::CourseName,
        );
        assert_eq!(order(&ranked), vec![(1, 0), (0, 0)]);
    }

    #[test]
    fn test_shared_candidates_are_not_cloned() {
        let courses = courses(&["A"]);
        let shared: Arc<[TimeSlot]> = vec![TimeSlot::new(Weekday::Fri, 1)].into();
        let make = |occurrence| SessionRequest {
            course_index: 0,
            occurrence,
            duration: 1,
            candidate_slots: Arc::clone(&shared),
        };
        let ranked = rank_requests(vec![make(1), make(0)], &courses, TieBreak::InputOrder);
        assert_eq!(order(&ranked), vec![(0, 0), (0, 1)]);
        assert!(Arc::ptr_eq(&ranked[0].candidate_slots, &shared));
    }
}
