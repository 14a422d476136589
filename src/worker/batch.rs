//! One bounded batch of search work for a single job.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info};

use crate::crypto::KeypairSource;
use crate::job::{Commit, SearchJob};

/// Whether a job needs another tick after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running, schedule the next batch
    Again,
    /// Terminal (or evicted), drop the job from the schedule
    Done,
}

/// Generates and tests keypairs for a job, a batch at a time.
#[derive(Clone)]
pub struct BatchWorker {
    /// Where candidates come from
    source: Arc<dyn KeypairSource>,
    /// Upper bound on candidates per batch
    batch_size: u64,
}

impl BatchWorker {
    pub fn new(source: Arc<dyn KeypairSource>, batch_size: u64) -> Self {
        Self { source, batch_size }
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Runs one batch against `job`.
    ///
    /// The batch ends early on a match, on a stop, or on a source failure.
    /// A batch never draws more candidates than the job has budget left.
    pub fn run_batch(&self, job: &SearchJob) -> Tick {
        if job.cancel_token().is_cancelled() {
            return Tick::Done;
        }

        let budget = job.remaining_attempts().min(self.batch_size);
        for _ in 0..budget {
            if job.cancel_token().is_cancelled() {
                return Tick::Done;
            }

            let drawn = panic::catch_unwind(AssertUnwindSafe(|| self.source.generate()));
            let candidate = match drawn {
                Ok(Ok(candidate)) => candidate,
                Ok(Err(e)) => {
                    self.fault(job, format!("keypair source failed: {}", e));
                    return Tick::Done;
                }
                Err(payload) => {
                    self.fault(
                        job,
                        format!("keypair source panicked: {}", panic_message(&*payload)),
                    );
                    return Tick::Done;
                }
            };

            match job.commit(candidate) {
                Commit::Continue => {}
                Commit::Matched => {
                    info!(
                        job_id = %job.id(),
                        attempts = job.attempts(),
                        "vanity address found"
                    );
                    return Tick::Done;
                }
                Commit::Halted => return Tick::Done,
            }
        }

        if job.finish_if_exhausted() {
            info!(
                job_id = %job.id(),
                attempts = job.attempts(),
                "search job exhausted its budget"
            );
            return Tick::Done;
        }

        if job.is_running() {
            Tick::Again
        } else {
            Tick::Done
        }
    }

    fn fault(&self, job: &SearchJob, reason: String) {
        error!(job_id = %job.id(), attempts = job.attempts(), %reason, "search job failed");
        job.fail(reason);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
