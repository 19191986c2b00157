//! Request lifecycle types.

use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::camera::AnimationKind;

/// Why a request stopped before fetching everything it planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// A newer movement request took over.
    Superseded,
    /// The host reported the end of the camera movement.
    MovementEnded,
    /// The scheduler was shut down or dropped.
    Shutdown,
    /// The caller cancelled through its [`PrefetchHandle`](super::PrefetchHandle).
    Aborted,
}

impl CancelReason {
    pub fn name(&self) -> &'static str {
        match self {
            CancelReason::Superseded => "superseded",
            CancelReason::MovementEnded => "movement ended",
            CancelReason::Shutdown => "shutdown",
            CancelReason::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle state of a prefetch request.
///
/// ```text
/// Created ──► Resolving ──► Fetching ──┬──► Completed
///                 │             │      ├──► Cancelled(reason)
///                 └─────────────┴──────┴──► TimedOut
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Created,
    Resolving,
    Fetching,
    Completed,
    Cancelled(CancelReason),
    TimedOut,
}

impl RequestState {
    /// True once the request can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Cancelled(_) | RequestState::TimedOut
        )
    }

    /// True while the request is resolving or fetching.
    pub fn is_active(&self) -> bool {
        matches!(self, RequestState::Resolving | RequestState::Fetching)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Created => f.write_str("created"),
            RequestState::Resolving => f.write_str("resolving"),
            RequestState::Fetching => f.write_str("fetching"),
            RequestState::Completed => f.write_str("completed"),
            RequestState::Cancelled(reason) => write!(f, "cancelled ({})", reason),
            RequestState::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Final account of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchReport {
    pub request_id: Uuid,
    pub kind: AnimationKind,
    pub state: RequestState,
    /// Camera poses sampled along the path (including the end pose)
    pub poses: usize,
    /// Unique fetches planned
    pub total: usize,
    /// Leading share of `total` that covers the final view
    pub end_tiles: usize,
    /// Fetches actually started
    pub issued: usize,
    /// Fetches that succeeded before the request ended
    pub loaded: usize,
    /// Fetches that failed before the request ended
    pub failed: usize,
    pub elapsed: Duration,
}

impl PrefetchReport {
    /// Started fetches whose outcome was discarded.
    pub fn aborted(&self) -> usize {
        self.issued.saturating_sub(self.loaded + self.failed)
    }

    /// Planned fetches that were never started.
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RequestState::Created.is_terminal());
        assert!(!RequestState::Fetching.is_terminal());
        assert!(RequestState::Fetching.is_active());
        assert!(RequestState::Completed.is_terminal());
        assert!(RequestState::TimedOut.is_terminal());
        assert!(RequestState::Cancelled(CancelReason::Superseded).is_terminal());
        assert!(!RequestState::Cancelled(CancelReason::Shutdown).is_active());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            RequestState::Cancelled(CancelReason::MovementEnded).to_string(),
            "cancelled (movement ended)"
        );
        assert_eq!(RequestState::TimedOut.to_string(), "timed out");
    }

    #[test]
    fn test_report_derived_counts() {
        let report = PrefetchReport {
            request_id: Uuid::new_v4(),
            kind: AnimationKind::Ease,
            state: RequestState::TimedOut,
            poses: 61,
            total: 40,
            end_tiles: 12,
            issued: 30,
            loaded: 20,
            failed: 2,
            elapsed: Duration::from_secs(5),
        };
        assert_eq!(report.aborted(), 8);
        assert_eq!(report.skipped(), 10);
    }
}
