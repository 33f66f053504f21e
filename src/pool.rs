//! Worker pool that runs trials off the orchestrating thread.
//!
//! Jobs go to a fixed-size rayon pool; each worker sends its result back
//! over a channel. The orchestrator keeps the set of outstanding job ids
//! and retires each one exactly once as its message arrives, in whatever
//! order workers finish. A wait longer than the configured timeout, or a
//! panic inside a trial, is fatal.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use aiq_core::{StratumId, TrialResult};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::AiqError;
use crate::trial::{run_trial, TrialJob};

/// Identifier of a submitted job, unique for the pool's lifetime.
pub type JobId = u64;

/// A job that has been retired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub id: JobId,
    pub result: TrialResult,
}

enum Message {
    Done { id: JobId, result: TrialResult },
    Panicked { id: JobId, message: String },
}

/// Fixed-size pool of trial workers.
pub struct WorkerPool {
    pool: ThreadPool,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    outstanding: BTreeMap<JobId, StratumId>,
    next_id: JobId,
    timeout: Duration,
}

impl WorkerPool {
    /// Start `threads` workers (0 = host parallelism).
    pub fn new(threads: usize, timeout: Duration) -> Result<Self, AiqError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("aiq-worker-{i}"))
            .build()?;
        let (sender, receiver) = mpsc::channel();

        Ok(Self {
            pool,
            sender,
            receiver,
            outstanding: BTreeMap::new(),
            next_id: 0,
            timeout,
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Jobs submitted but not yet retired.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Queue a trial.
    pub fn submit(&mut self, job: TrialJob) -> JobId {
        let stratum = job.sample.stratum;
        self.submit_with(stratum, move || run_trial(&job))
    }

    /// Queue an arbitrary task producing a trial result for `stratum`.
    pub fn submit_with<F>(&mut self, stratum: StratumId, task: F) -> JobId
    where
        F: FnOnce() -> TrialResult + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.outstanding.insert(id, stratum);

        let sender = self.sender.clone();
        self.pool.spawn(move || {
            let message = match catch_unwind(AssertUnwindSafe(task)) {
                Ok(result) => Message::Done { id, result },
                Err(payload) => Message::Panicked {
                    id,
                    message: panic_message(payload.as_ref()),
                },
            };
            // The receiver only goes away when the run has already been abandoned.
            let _ = sender.send(message);
        });
        id
    }

    /// Block until the next outstanding job resolves.
    ///
    /// Returns `Ok(None)` once nothing is outstanding.
    pub fn next_completion(&mut self) -> Result<Option<Completion>, AiqError> {
        loop {
            let Some((&oldest, &stratum)) = self.outstanding.first_key_value() else {
                return Ok(None);
            };

            let message = match self.receiver.recv_timeout(self.timeout) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    tracing::debug!(job = oldest, "worker timeout");
                    return Err(AiqError::WorkerTimeout {
                        stratum,
                        waited: self.timeout,
                        outstanding: self.outstanding.len(),
                    });
                }
            };

            match message {
                Message::Done { id, result } => {
                    // Ignore anything already retired.
                    if self.outstanding.remove(&id).is_some() {
                        return Ok(Some(Completion { id, result }));
                    }
                }
                Message::Panicked { id, message } => {
                    let stratum = self.outstanding.remove(&id).unwrap_or(stratum);
                    return Err(AiqError::WorkerPanicked { stratum, message });
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .field("outstanding", &self.outstanding.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
