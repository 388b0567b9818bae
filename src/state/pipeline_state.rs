/// Pipeline state definitions for tracking run progress
///
/// This module defines every state a pipeline run can be in and which moves
/// between them are legal.
use crate::HarvestError;
use std::fmt;

/// Represents the current state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    // ===== Active States =====
    /// Nothing has happened yet
    Idle,

    /// The source session is being opened or is open
    Connected,

    /// Member lists are being pulled from the source
    Scraping,

    /// Records are being written through the persist workers
    Persisting,

    /// Stored rows are being written to export files
    Exporting,

    // ===== Terminal States =====
    /// The run finished; export may still have reported an error
    Done,

    /// The run aborted before exporting
    Failed,
}

impl PipelineState {
    /// Returns true if `next` is a legal successor of this state
    ///
    /// The happy path is strictly linear. Scraping and persisting alternate
    /// once per target. Only a connected run can fail, and only before
    /// exporting starts.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, next),
            (Idle, Connected)
                | (Connected, Scraping)
                | (Connected, Exporting)
                | (Scraping, Persisting)
                | (Persisting, Scraping)
                | (Persisting, Exporting)
                | (Exporting, Done)
                | (Connected | Scraping | Persisting, Failed)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineState)` - The new state
    /// * `Err(HarvestError::InvalidTransition)` - `next` is not reachable from here
    pub fn transition(self, next: PipelineState) -> Result<PipelineState, HarvestError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connected => "connected",
            Self::Scraping => "scraping",
            Self::Persisting => "persisting",
            Self::Exporting => "exporting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = PipelineState::Idle
            .transition(PipelineState::Connected)
            .and_then(|s| s.transition(PipelineState::Scraping))
            .and_then(|s| s.transition(PipelineState::Persisting))
            .and_then(|s| s.transition(PipelineState::Scraping))
            .and_then(|s| s.transition(PipelineState::Persisting))
            .and_then(|s| s.transition(PipelineState::Exporting))
            .and_then(|s| s.transition(PipelineState::Done))
            .unwrap();

        assert_eq!(state, PipelineState::Done);
    }

    #[test]
    fn test_failure_reachable_before_export() {
        for state in [
            PipelineState::Connected,
            PipelineState::Scraping,
            PipelineState::Persisting,
        ] {
            assert!(state.can_transition_to(PipelineState::Failed), "{}", state);
        }

        assert!(!PipelineState::Idle.can_transition_to(PipelineState::Failed));
        assert!(!PipelineState::Exporting.can_transition_to(PipelineState::Failed));
        assert!(!PipelineState::Done.can_transition_to(PipelineState::Failed));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        assert!(matches!(
            PipelineState::Idle.transition(PipelineState::Scraping),
            Err(HarvestError::InvalidTransition { .. })
        ));
        assert!(PipelineState::Done
            .transition(PipelineState::Idle)
            .is_err());
        assert!(PipelineState::Scraping
            .transition(PipelineState::Exporting)
            .is_err());
    }

    #[test]
    fn test_finished_states_have_no_successors() {
        let every = [
            PipelineState::Idle,
            PipelineState::Connected,
            PipelineState::Scraping,
            PipelineState::Persisting,
            PipelineState::Exporting,
            PipelineState::Done,
            PipelineState::Failed,
        ];

        for from in [PipelineState::Done, PipelineState::Failed] {
            for to in every {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PipelineState::Persisting), "persisting");
    }
}
