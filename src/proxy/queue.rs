use crate::api::types::{Job, JobId};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// FIFO parking lot for jobs that found no ready worker at submission time.
///
/// This is the slow path; under normal load every job goes straight into a
/// worker mailbox and the queue stays empty. Parked jobs are drained by the
/// fast path of the worker long poll, strictly in insertion order. Priority
/// is metadata only and plays no part here.
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a job to the tail.
    pub fn add(&self, job: Job) {
        tracing::info!(job_id = %job.id.0, user_id = %job.user_id, "query queued");
        self.jobs.lock().push_back(job);
    }

    /// Pops the head, or `None` when the queue is empty. Never blocks.
    pub fn get(&self) -> Option<Job> {
        self.jobs.lock().pop_front()
    }

    /// Removes a job by id; returns whether it was found.
    ///
    /// Called by the submit handler when its client went away before a
    /// worker drained the job.
    pub fn remove(&self, id: &JobId) -> bool {
        let mut jobs = self.jobs.lock();
        match jobs.iter().position(|job| &job.id == id) {
            Some(index) => {
                jobs.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
