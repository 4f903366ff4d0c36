use crate::api::types::{JobId, JobResult};
use dashmap::DashMap;
use tokio::sync::oneshot;

/// Maps in-flight job ids to the single-use channel that wakes the
/// waiting submit handler.
///
/// This is what lets a synchronous `/query` call block on work completed
/// by an asynchronous worker round-trip. The posting side never blocks:
/// `notify` completes a oneshot and returns. When the handler has already
/// left (deadline or disconnect) the result is dropped with a log line on
/// the caller's side, not an error.
pub struct ResultRendezvous {
    slots: DashMap<JobId, oneshot::Sender<JobResult>>,
}

impl ResultRendezvous {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Creates the slot for a job and returns the receiving end.
    ///
    /// Job ids are fresh UUIDs; registering the same id twice means the
    /// caller is broken, and there is no sane recovery.
    pub fn register(&self, id: JobId) -> oneshot::Receiver<JobResult> {
        let (tx, rx) = oneshot::channel();
        let previous = self.slots.insert(id, tx);
        assert!(previous.is_none(), "rendezvous slot registered twice");
        rx
    }

    /// Completes the slot for `id` with `result`.
    ///
    /// Returns false when no slot exists, i.e. the submitting handler
    /// already gave up on the job and deregistered.
    pub fn notify(&self, id: &JobId, result: JobResult) -> bool {
        match self.slots.remove(id) {
            Some((_, tx)) => {
                // A dropped receiver just discards the result; the submit
                // handler deregisters on its way out either way.
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    /// Drops the slot for `id`, if any. Called on every submit exit path.
    pub fn deregister(&self, id: &JobId) {
        self.slots.remove(id);
    }

    /// Number of submit handlers currently waiting on a result.
    pub fn pending(&self) -> usize {
        self.slots.len()
    }
}

impl Default for ResultRendezvous {
    fn default() -> Self {
        Self::new()
    }
}
