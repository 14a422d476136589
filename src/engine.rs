//! The search engine facade.
//!
//! Wires a [`JobRegistry`], a [`Scheduler`] and a [`Sweeper`] together and
//! exposes the three client operations: start, status and stop. None of
//! them block on search work.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::crypto::KeypairSource;
use crate::error::{Result, SetupError};
use crate::job::{Health, InMemoryStore, JobId, JobRegistry, JobStore, StatusSnapshot};
use crate::worker::{BatchWorker, Scheduler, Sweeper};

/// Asynchronous vanity address search engine.
pub struct Engine {
    config: EngineConfig,
    registry: Arc<JobRegistry>,
    scheduler: Scheduler,
    sweeper: Sweeper,
    /// Alphabet of the source's public encodings
    alphabet: &'static str,
    started_at: Instant,
}

impl Engine {
    /// Creates an engine backed by an in-memory job store.
    pub fn new(config: EngineConfig, source: Arc<dyn KeypairSource>) -> Result<Self, SetupError> {
        Self::with_store(config, source, Arc::new(InMemoryStore::new()))
    }

    /// Creates an engine on top of a caller-supplied job store.
    pub fn with_store(
        config: EngineConfig,
        source: Arc<dyn KeypairSource>,
        store: Arc<dyn JobStore>,
    ) -> Result<Self, SetupError> {
        config
            .validate()
            .map_err(|e| SetupError::InvalidConfig(e.to_string()))?;

        // Case only matters if the encoding can express it
        let case_sensitive = config.case_sensitive && source.case_significant();
        let alphabet = source.alphabet();
        let registry = Arc::new(JobRegistry::with_store(store, case_sensitive));

        let worker = BatchWorker::new(source, config.batch_size);
        let scheduler = Scheduler::new(worker, config.workers, config.tick_interval)?;
        let sweeper = Sweeper::spawn(registry.clone(), config.sweep_interval, config.retention)?;

        info!(
            workers = config.workers,
            batch_size = config.batch_size,
            tick_ms = config.tick_interval.as_millis() as u64,
            retention_secs = config.retention.as_secs(),
            case_sensitive,
            "search engine started"
        );

        Ok(Self {
            config,
            registry,
            scheduler,
            sweeper,
            alphabet,
            started_at: Instant::now(),
        })
    }

    /// Registers a new search and arms its first tick. Returns immediately.
    pub fn start_search(&self, prefix: &str, network: &str, max_attempts: u64) -> Result<JobId> {
        let job = self.registry.create(prefix, network, max_attempts)?;
        let id = job.id().clone();

        let unreachable = job.pattern().unreachable_chars(self.alphabet);
        if !unreachable.is_empty() {
            warn!(
                job_id = %id,
                chars = ?unreachable,
                "prefix contains characters the address encoding never produces"
            );
        }

        if !self.scheduler.schedule(job.clone(), self.config.start_delay) {
            error!(job_id = %id, "scheduler unavailable");
            job.fail("scheduler unavailable");
        }
        Ok(id)
    }

    /// Current snapshot of a job.
    pub fn status(&self, id: &JobId) -> Result<StatusSnapshot> {
        Ok(self.registry.get(id)?.snapshot())
    }

    /// Stops a job. Stopping a finished job is a no-op.
    pub fn stop_search(&self, id: &JobId) -> Result<()> {
        self.registry.stop(id)
    }

    /// Stops every running job, returning how many were stopped.
    pub fn stop_all(&self) -> usize {
        self.registry.stop_all()
    }

    pub fn health(&self) -> Health {
        Health {
            status: "ok",
            jobs: self.registry.len(),
            running: self.registry.running(),
            uptime: self.started_at.elapsed(),
            timestamp: Utc::now(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stops background threads. Jobs still running stay `Running` but make
    /// no further progress.
    pub fn shutdown(mut self) {
        self.stop_background();
    }

    fn stop_background(&mut self) {
        self.sweeper.stop();
        self.scheduler.shutdown();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_background();
    }
}
