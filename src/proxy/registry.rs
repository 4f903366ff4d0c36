use crate::api::types::{Job, WorkerId};
use crate::proxy::queue::JobQueue;
use crate::settings::{REAPER_INTERVAL, STALE_WORKER_TIMEOUT, WORKER_SEND_TIMEOUT};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

/// Why a dispatch attempt did not place the job with a worker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Every registered worker was either not ready or failed its send.
    #[error("no workers available to dispatch job")]
    NoWorkersAvailable,
    /// The caller's dispatch deadline expired mid-attempt.
    #[error("dispatch deadline expired")]
    DeadlineExpired,
}

/// Readiness and liveness, guarded together behind one small lock.
struct HandleState {
    ready: bool,
    last_heartbeat: Instant,
}

/// The proxy's view of one registered worker.
///
/// The mailbox is a single-slot channel. The dispatcher only sends while
/// the worker's long poll is parked on the receiving side (`ready`), and
/// the long-poll exit sequence drains the slot one last time to close the
/// window where a send lands just as the poll gives up. A send can still
/// race past a deregistration; that leaks at most the one slot.
pub struct WorkerHandle {
    pub id: WorkerId,
    job_tx: mpsc::Sender<Job>,
    job_rx: tokio::sync::Mutex<mpsc::Receiver<Job>>,
    state: RwLock<HandleState>,
}

impl WorkerHandle {
    fn new() -> Arc<Self> {
        let (job_tx, job_rx) = mpsc::channel(1);
        Arc::new(Self {
            id: WorkerId::new(),
            job_tx,
            job_rx: tokio::sync::Mutex::new(job_rx),
            state: RwLock::new(HandleState {
                ready: false,
                last_heartbeat: Instant::now(),
            }),
        })
    }

    /// Whether the worker is currently parked in a long poll.
    pub fn is_ready(&self) -> bool {
        self.state.read().ready
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.write().ready = ready;
    }

    pub fn update_heartbeat(&self) {
        self.state.write().last_heartbeat = Instant::now();
    }

    /// Whether the worker has gone quiet for longer than the stale threshold.
    pub fn is_stale(&self) -> bool {
        self.state.read().last_heartbeat.elapsed() > STALE_WORKER_TIMEOUT
    }

    /// Locks the mailbox for one long poll and enters the ready state.
    pub async fn open_mailbox<'a>(&'a self, queue: &'a JobQueue) -> MailboxSlot<'a> {
        let rx = self.job_rx.lock().await;
        self.set_ready(true);
        MailboxSlot {
            handle: self,
            queue,
            rx,
            finished: false,
        }
    }

    #[cfg(test)]
    pub fn rewind_heartbeat(&self, by: Duration) {
        let mut state = self.state.write();
        state.last_heartbeat -= by;
    }
}

/// Exclusive hold on a worker's mailbox for the duration of one long poll.
///
/// However the poll ends, the exit sequence runs: readiness is cleared
/// first, then the slot is drained once so a job sent by a dispatcher
/// racing the timeout is never stranded. When the poll is aborted outright
/// (connection gone mid-await) the drop glue parks any rescued job back in
/// the fallback queue, since nobody is left to carry it.
pub struct MailboxSlot<'a> {
    handle: &'a WorkerHandle,
    queue: &'a JobQueue,
    rx: tokio::sync::MutexGuard<'a, mpsc::Receiver<Job>>,
    finished: bool,
}

impl MailboxSlot<'_> {
    /// Waits for a dispatched job until the long-poll deadline.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<Job> {
        tokio::select! {
            job = self.rx.recv() => job,
            _ = tokio::time::sleep(timeout) => None,
        }
    }

    /// Runs the exit sequence and yields the job this poll ends with.
    ///
    /// `received` is whatever the mailbox wait produced; when it is `None`
    /// the drain below is the last-minute catch for a job that slipped in
    /// while the poll was timing out.
    pub fn finish(mut self, received: Option<Job>) -> Option<Job> {
        self.handle.set_ready(false);
        self.finished = true;
        match received {
            Some(job) => Some(job),
            None => match self.rx.try_recv() {
                Ok(job) => {
                    tracing::info!(
                        job_id = %job.id.0,
                        worker_id = %self.handle.id.0,
                        "last-minute catch, mailbox not empty, dispatching job anyway"
                    );
                    Some(job)
                }
                Err(_) => None,
            },
        }
    }
}

impl Drop for MailboxSlot<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.handle.set_ready(false);
        if let Ok(job) = self.rx.try_recv() {
            tracing::warn!(
                job_id = %job.id.0,
                worker_id = %self.handle.id.0,
                "long poll aborted with a job in the mailbox, requeueing"
            );
            self.queue.add(job);
        }
    }
}

/// Tracks the live worker fleet and hands jobs to ready workers.
pub struct WorkerRegistry {
    workers: DashMap<WorkerId, Arc<WorkerHandle>>,
}

impl WorkerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            workers: DashMap::new(),
        })
    }

    /// Spawns the background reaper that expires stale workers.
    pub fn start(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(REAPER_INTERVAL);
            // The first tick completes immediately; the sweep starts one
            // full interval in.
            interval.tick().await;
            loop {
                interval.tick().await;
                self.reap_stale();
            }
        });
    }

    /// One reaper pass: removes every handle whose heartbeat went stale.
    pub fn reap_stale(&self) {
        tracing::info!("running worker cleanup");
        self.workers.retain(|id, handle| {
            let stale = handle.is_stale();
            if stale {
                tracing::info!(worker_id = %id.0, "removed stale worker");
            }
            !stale
        });
    }

    /// Creates a handle for a new worker and adds it to the fleet.
    pub fn register(&self) -> Arc<WorkerHandle> {
        let handle = WorkerHandle::new();
        self.workers.insert(handle.id.clone(), handle.clone());
        tracing::info!(worker_id = %handle.id.0, "worker registered");
        handle
    }

    /// Removes a worker from the fleet. In-flight mailbox sends are not
    /// interrupted; the handle itself lives on until the last reference
    /// drops.
    pub fn deregister(&self, id: &WorkerId) {
        self.workers.remove(id);
        tracing::info!(worker_id = %id.0, "worker deregistered");
    }

    pub fn get(&self, id: &WorkerId) -> Option<Arc<WorkerHandle>> {
        self.workers.get(id).map(|entry| entry.value().clone())
    }

    /// Updates the heartbeat for `id`; false when the worker is unknown.
    pub fn heartbeat(&self, id: &WorkerId) -> bool {
        match self.get(id) {
            Some(handle) => {
                handle.update_heartbeat();
                true
            }
            None => false,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn ready_count(&self) -> usize {
        self.workers
            .iter()
            .filter(|entry| entry.value().is_ready())
            .count()
    }

    /// Attempts to place `job` in the mailbox of one ready worker.
    ///
    /// Handles are snapshotted up front and walked without the map lock,
    /// so registrations and removals happening mid-dispatch cannot corrupt
    /// the iteration; a removed handle simply fails its send and the walk
    /// moves on. Each send attempt is bounded by the per-worker send
    /// timeout, the whole walk by the caller's deadline.
    pub async fn dispatch(
        &self,
        job: &Job,
        deadline: tokio::time::Instant,
    ) -> Result<(), DispatchError> {
        let handles: Vec<Arc<WorkerHandle>> = self
            .workers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for handle in handles {
            if !handle.is_ready() {
                continue;
            }

            tokio::select! {
                outcome = handle.job_tx.send_timeout(job.clone(), WORKER_SEND_TIMEOUT) => {
                    match outcome {
                        Ok(()) => {
                            tracing::info!(
                                job_id = %job.id.0,
                                worker_id = %handle.id.0,
                                "job dispatched to worker"
                            );
                            return Ok(());
                        }
                        Err(SendTimeoutError::Timeout(_)) => {
                            tracing::warn!(
                                worker_id = %handle.id.0,
                                "timed out sending job to worker, trying next"
                            );
                        }
                        Err(SendTimeoutError::Closed(_)) => {
                            tracing::warn!(
                                worker_id = %handle.id.0,
                                "worker mailbox closed, trying next"
                            );
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(DispatchError::DeadlineExpired);
                }
            }
        }

        Err(DispatchError::NoWorkersAvailable)
    }
}
