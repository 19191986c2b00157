//! Cancellation registry for live requests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::request::CancelReason;

/// Cancellation controls of one request.
///
/// `cancel` aborts in-flight fetches. `end_movement` only stops new fetches
/// from being issued; fetches already started keep running.
#[derive(Debug)]
pub(crate) struct RequestControl {
    id: Uuid,
    token: CancellationToken,
    movement_ended: CancellationToken,
    reason: Mutex<Option<CancelReason>>,
}

impl RequestControl {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            token: CancellationToken::new(),
            movement_ended: CancellationToken::new(),
            reason: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the request. The first reason given wins.
    pub fn cancel(&self, reason: CancelReason) {
        {
            let mut current = self.reason.lock();
            if current.is_none() {
                *current = Some(reason);
            }
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        *self.reason.lock()
    }

    pub fn end_movement(&self) {
        self.movement_ended.cancel();
    }

    pub fn movement_ended(&self) -> bool {
        self.movement_ended.is_cancelled()
    }
}

/// Live requests of one scheduler, keyed by request id.
#[derive(Debug, Default)]
pub(crate) struct RequestRegistry {
    live: Mutex<HashMap<Uuid, Arc<RequestControl>>>,
    last_finished: Mutex<Option<Instant>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every live request with `reason` and registers `control`,
    /// all under one lock. Returns how many requests were cancelled.
    ///
    /// After this returns, `control` is the only live request that is not
    /// cancelled, however many callers admit concurrently.
    pub fn admit(&self, control: Arc<RequestControl>, reason: CancelReason) -> usize {
        let mut live = self.live.lock();
        let mut cancelled = 0;
        for existing in live.values() {
            if !existing.is_cancelled() {
                existing.cancel(reason);
                cancelled += 1;
            }
        }
        live.insert(control.id(), control);
        cancelled
    }

    /// Drops a finished request and records when it finished.
    pub fn finish(&self, id: Uuid) {
        self.live.lock().remove(&id);
        *self.last_finished.lock() = Some(Instant::now());
    }

    /// Cancels every live request. Returns how many were cancelled.
    pub fn cancel_all(&self, reason: CancelReason) -> usize {
        let live = self.live.lock();
        let mut cancelled = 0;
        for control in live.values() {
            if !control.is_cancelled() {
                control.cancel(reason);
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Signals the end of the movement to every live request.
    pub fn end_movement_all(&self) -> usize {
        let live = self.live.lock();
        for control in live.values() {
            control.end_movement();
        }
        live.len()
    }

    pub fn len(&self) -> usize {
        self.live.lock().len()
    }

    pub fn last_finished(&self) -> Option<Instant> {
        *self.last_finished.lock()
    }
}
