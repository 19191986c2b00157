//! Caller-side handle to a prefetch request.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::PrefetchError;

use super::registry::RequestControl;
use super::request::{CancelReason, PrefetchReport, RequestState};

/// Handle returned by [`PrefetchScheduler::request_prefetch`](super::PrefetchScheduler::request_prefetch).
///
/// Cheap to clone. Dropping it does not cancel the request.
#[derive(Clone)]
pub struct PrefetchHandle {
    control: Arc<RequestControl>,
    state: watch::Receiver<RequestState>,
    report: Arc<Mutex<Option<PrefetchReport>>>,
}

impl PrefetchHandle {
    pub(crate) fn new(
        control: Arc<RequestControl>,
        state: watch::Receiver<RequestState>,
        report: Arc<Mutex<Option<PrefetchReport>>>,
    ) -> Self {
        Self {
            control,
            state,
            report,
        }
    }

    pub fn id(&self) -> Uuid {
        self.control.id()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RequestState {
        *self.state.borrow()
    }

    /// The final report, once the request is terminal.
    pub fn report(&self) -> Option<PrefetchReport> {
        self.report.lock().clone()
    }

    /// Waits until the request reaches a terminal state.
    ///
    /// # Errors
    ///
    /// [`PrefetchError::Runtime`] if the request task ended without
    /// producing a report (for example because its runtime shut down).
    pub async fn wait(&self) -> Result<PrefetchReport, PrefetchError> {
        let mut state = self.state.clone();
        let _ = state.wait_for(RequestState::is_terminal).await;
        self.report().ok_or_else(|| {
            PrefetchError::Runtime(format!("request {} ended without a report", self.id()))
        })
    }

    /// Cancels the request, aborting its in-flight fetches.
    pub fn cancel(&self) {
        self.control.cancel(CancelReason::Aborted);
    }
}

impl std::fmt::Debug for PrefetchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
