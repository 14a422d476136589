//! Background execution for search jobs.
//!
//! This module provides:
//! - Bounded batches of keypair generation ([`BatchWorker`])
//! - Per-job tick scheduling on a shared thread pool ([`Scheduler`])
//! - Periodic eviction of old jobs ([`Sweeper`])

mod batch;
mod pool;
mod sweeper;

pub use batch::{BatchWorker, Tick};
pub use pool::Scheduler;
pub use sweeper::Sweeper;
