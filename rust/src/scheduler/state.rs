//! Per-request placement state machine.
//!
//! `Pending -> Placed` or `Pending -> Unplaced(reason)`; both outcomes are
//! terminal and a request never re-enters `Pending`.

use crate::models::{Placement, UnplacedReason};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Pending,
    Placed(Placement),
    Unplaced(UnplacedReason),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed(_))
    }

    /// Move a pending request to a terminal state.
    ///
    /// Terminal states absorb further transitions unchanged.
    pub fn resolve(self, outcome: SessionState) -> SessionState {
        match self {
            Self::Pending => outcome,
            terminal => terminal,
        }
    }
}

/// Record of how one request was resolved, in processing order.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementDecision {
    pub course_index: usize,
    pub occurrence: u32,
    /// Candidate anchors the request started with
    pub candidate_count: usize,
    /// Free spans found on the first pass
    pub free_candidates: usize,
    /// Whether the relaxed retry pass ran
    pub retried: bool,
    pub state: SessionState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Span;
    use chrono::Weekday;

    fn placement() -> Placement {
        Placement {
            course_index: 0,
            occurrence: 0,
            day: Weekday::Mon,
            span: Span::new(2, 1),
            cost: 1.0,
        }
    }

    #[test]
    fn test_pending_resolves_once() {
        let state = SessionState::default();
        assert!(!state.is_terminal());

        let placed = state.resolve(SessionState::Placed(placement()));
        assert!(placed.is_terminal());

        let still_placed = placed
            .clone()
            .resolve(SessionState::Unplaced(UnplacedReason::AllCandidatesConflicted));
        assert_eq!(still_placed, placed);
    }

    #[test]
    fn test_unplaced_is_terminal() {
        let state = SessionState::Pending
            .resolve(SessionState::Unplaced(UnplacedReason::AllCandidatesConflicted));
        assert!(state.is_terminal());
        assert_eq!(
            state.clone().resolve(SessionState::Pending),
            SessionState::Unplaced(UnplacedReason::AllCandidatesConflicted)
        );
    }
}
