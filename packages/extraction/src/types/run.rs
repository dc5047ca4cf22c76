use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a [`DiscoveryRun`].
///
/// Ordered: transitions must be monotonically forward. `rank()` gives the
/// partial order `pending < searching < extracting < (completed | failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Searching,
    Extracting,
    Completed,
    Failed,
}

impl RunStatus {
    fn rank(self) -> u8 {
        match self {
            RunStatus::Pending => 0,
            RunStatus::Searching => 1,
            RunStatus::Extracting => 2,
            RunStatus::Completed => 3,
            RunStatus::Failed => 3,
        }
    }

    /// Whether this run has reached an immutable terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the monotonic order.
    /// A terminal status can never transition again, even to itself at the
    /// adapter layer (callers treat a repeat `complete` call as a no-op,
    /// not a transition).
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.rank() >= self.rank()
    }
}

/// The unit of work: a single discovery invocation with its inputs, status,
/// and aggregate result count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRun {
    pub id: Uuid,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub status: RunStatus,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub results_count: u32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(RunStatus::Pending.can_transition_to(RunStatus::Searching));
        assert!(RunStatus::Searching.can_transition_to(RunStatus::Extracting));
        assert!(RunStatus::Extracting.can_transition_to(RunStatus::Completed));
        assert!(RunStatus::Pending.can_transition_to(RunStatus::Completed));
    }

    #[test]
    fn backward_transitions_rejected() {
        assert!(!RunStatus::Extracting.can_transition_to(RunStatus::Searching));
        assert!(!RunStatus::Completed.can_transition_to(RunStatus::Extracting));
    }

    #[test]
    fn terminal_states_are_immutable() {
        assert!(!RunStatus::Completed.can_transition_to(RunStatus::Completed));
        assert!(!RunStatus::Failed.can_transition_to(RunStatus::Completed));
    }
}
