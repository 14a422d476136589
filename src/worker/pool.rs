//! Tick scheduling for running jobs.
//!
//! A single timer thread keeps a min-heap of due ticks. When a tick comes
//! due, its batch is handed to a fixed rayon pool; when the batch finishes
//! and the job is still running, the batch re-arms the job's next tick. Each
//! job therefore has its own cadence, and a long queue of jobs shares the
//! pool in FIFO order instead of one loop running them back to back.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::error::SetupError;
use crate::job::SearchJob;

use super::batch::{BatchWorker, Tick};

enum Command {
    Arm { due: Instant, job: Arc<SearchJob> },
    Shutdown,
}

/// A pending tick. Ordered so that `BinaryHeap` pops the earliest first.
struct Timer {
    due: Instant,
    seq: u64,
    job: Arc<SearchJob>,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Drives running jobs forward in bounded batches.
pub struct Scheduler {
    /// Number of pool threads
    num_workers: usize,
    /// Delay between the end of one batch and the start of the next
    tick_interval: Duration,
    /// Timer thread inbox
    commands: Sender<Command>,
    /// Timer thread handle (Option to allow taking during shutdown)
    timer: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Starts the timer thread and a pool of `num_workers` batch threads.
    pub fn new(
        worker: BatchWorker,
        num_workers: usize,
        tick_interval: Duration,
    ) -> Result<Self, SetupError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|id| format!("vanity-worker-{}", id))
            .build()?;

        let (commands, inbox) = unbounded();
        let rearm = commands.clone();

        let timer = thread::Builder::new()
            .name("vanity-timer".into())
            .spawn(move || run_timer(inbox, rearm, pool, worker, tick_interval))?;

        Ok(Self {
            num_workers,
            tick_interval,
            commands,
            timer: Some(timer),
        })
    }

    /// Arms the first tick of `job` after `delay`.
    ///
    /// Returns false if the scheduler has shut down.
    pub fn schedule(&self, job: Arc<SearchJob>, delay: Duration) -> bool {
        let due = Instant::now() + delay;
        self.commands.send(Command::Arm { due, job }).is_ok()
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Stops the timer. Pending ticks are dropped; batches already on the
    /// pool run to completion but are not re-armed.
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.timer.take() {
            let _ = self.commands.send(Command::Shutdown);
            if timer.join().is_err() {
                warn!("scheduler timer thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_timer(
    inbox: Receiver<Command>,
    rearm: Sender<Command>,
    pool: ThreadPool,
    worker: BatchWorker,
    tick_interval: Duration,
) {
    let mut timers = BinaryHeap::new();
    let mut seq = 0u64;

    loop {
        let command = match timers.peek() {
            Some(Timer { due, .. }) => match inbox.recv_deadline(*due) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match inbox.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        match command {
            Some(Command::Arm { due, job }) => {
                timers.push(Timer { due, seq, job });
                seq += 1;
            }
            Some(Command::Shutdown) => break,
            None => {}
        }

        let now = Instant::now();
        while let Some(timer) = timers.pop() {
            if timer.due > now {
                timers.push(timer);
                break;
            }

            let job = timer.job;
            if job.cancel_token().is_cancelled() {
                debug!(job_id = %job.id(), "dropping tick for finished job");
                continue;
            }

            let worker = worker.clone();
            let rearm = rearm.clone();
            pool.spawn(move || {
                if worker.run_batch(&job) == Tick::Again {
                    let due = Instant::now() + tick_interval;
                    // Fails only after shutdown
                    let _ = rearm.send(Command::Arm { due, job });
                }
            });
        }
    }

    debug!(pending = timers.len(), "scheduler timer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Candidate, KeypairSource, SourceError};
    use crate::job::{JobId, JobState};
    use crate::matcher::Pattern;

    struct NeverMatches;

    impl KeypairSource for NeverMatches {
        fn generate(&self) -> Result<Candidate, SourceError> {
            Ok(Candidate::new("zzzz", "pk"))
        }

        fn alphabet(&self) -> &'static str {
            "z"
        }
    }

    fn make_job(max_attempts: u64) -> Arc<SearchJob> {
        Arc::new(SearchJob::new(
            JobId::generate(),
            Pattern::new("AB", true).unwrap(),
            "devnet".into(),
            max_attempts,
        ))
    }

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    #[test]
    fn test_timer_ordering() {
        let job = make_job(1);
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(Timer {
            due: now + Duration::from_millis(20),
            seq: 0,
            job: job.clone(),
        });
        heap.push(Timer {
            due: now,
            seq: 1,
            job: job.clone(),
        });
        heap.push(Timer { due: now, seq: 2, job });

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|t| t.seq)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_jobs_run_to_budget_concurrently() {
        let worker = BatchWorker::new(Arc::new(NeverMatches), 100);
        let scheduler = Scheduler::new(worker, 2, Duration::from_millis(1)).unwrap();

        let jobs: Vec<_> = (0..4).map(|_| make_job(1_000)).collect();
        for job in &jobs {
            assert!(scheduler.schedule(job.clone(), Duration::ZERO));
        }

        let finished = wait_until(Duration::from_secs(10), || {
            jobs.iter().all(|job| job.state() == JobState::Failed)
        });
        assert!(finished);
        for job in &jobs {
            assert_eq!(job.attempts(), 1_000);
        }
    }

    #[test]
    fn test_cancelled_job_is_not_ticked() {
        let worker = BatchWorker::new(Arc::new(NeverMatches), 100);
        let scheduler = Scheduler::new(worker, 1, Duration::from_millis(1)).unwrap();

        let job = make_job(1_000);
        job.stop();
        assert!(scheduler.schedule(job.clone(), Duration::ZERO));

        thread::sleep(Duration::from_millis(30));
        assert_eq!(job.attempts(), 0);
    }

    #[test]
    fn test_schedule_after_shutdown() {
        let worker = BatchWorker::new(Arc::new(NeverMatches), 100);
        let mut scheduler = Scheduler::new(worker, 1, Duration::from_millis(1)).unwrap();
        scheduler.shutdown();
        assert!(!scheduler.schedule(make_job(10), Duration::ZERO));
    }
}
