//! The registry owning every live search job.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::matcher::Pattern;

use super::{InMemoryStore, JobId, JobStore, SearchJob};

/// Creates, looks up, stops and evicts search jobs.
pub struct JobRegistry {
    store: Arc<dyn JobStore>,
    /// Whether new jobs match prefixes case-sensitively
    case_sensitive: bool,
}

impl JobRegistry {
    /// Creates a registry backed by an [`InMemoryStore`].
    pub fn new(case_sensitive: bool) -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), case_sensitive)
    }

    pub fn with_store(store: Arc<dyn JobStore>, case_sensitive: bool) -> Self {
        Self {
            store,
            case_sensitive,
        }
    }

    /// Validates the request and registers a new `Running` job.
    ///
    /// Nothing is stored when validation fails.
    pub fn create(&self, prefix: &str, network: &str, max_attempts: u64) -> Result<Arc<SearchJob>> {
        let pattern = Pattern::new(prefix, self.case_sensitive)?;

        if max_attempts == 0 {
            return Err(EngineError::InvalidArgument(
                "max attempts must be greater than zero".into(),
            ));
        }

        loop {
            let job = Arc::new(SearchJob::new(
                JobId::generate(),
                pattern.clone(),
                network.to_string(),
                max_attempts,
            ));
            if self.store.insert(job.clone()) {
                info!(
                    job_id = %job.id(),
                    prefix = job.pattern().prefix(),
                    network,
                    max_attempts,
                    "search job created"
                );
                return Ok(job);
            }
        }
    }

    pub fn get(&self, id: &JobId) -> Result<Arc<SearchJob>> {
        self.store
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    /// Stops a running job. A job that already finished is left untouched.
    pub fn stop(&self, id: &JobId) -> Result<()> {
        let job = self.get(id)?;
        if job.stop() {
            info!(job_id = %id, attempts = job.attempts(), "search job stopped");
        } else {
            debug!(job_id = %id, state = %job.state(), "stop on finished job ignored");
        }
        Ok(())
    }

    /// Stops every running job. Returns how many were stopped.
    pub fn stop_all(&self) -> usize {
        let stopped = self
            .store
            .jobs()
            .iter()
            .filter(|job| job.stop())
            .count();
        if stopped > 0 {
            info!(stopped, "stopped all running search jobs");
        }
        stopped
    }

    /// Deletes a job and retires its scheduled work.
    pub fn remove(&self, id: &JobId) -> Option<Arc<SearchJob>> {
        let job = self.store.remove(id)?;
        job.cancel_token().cancel();
        Some(job)
    }

    /// Removes every job older than `retention`, running or not.
    ///
    /// Returns the number of jobs evicted.
    pub fn evict_older_than(&self, retention: Duration, now: Instant) -> usize {
        let mut evicted = 0;
        for job in self.store.jobs() {
            if job.age(now) <= retention {
                continue;
            }
            if self.remove(job.id()).is_none() {
                continue;
            }
            if job.is_running() {
                warn!(
                    job_id = %job.id(),
                    attempts = job.attempts(),
                    "evicting search job that is still running"
                );
            }
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of jobs still running.
    pub fn running(&self) -> usize {
        self.store.jobs().iter().filter(|job| job.is_running()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobState;

    #[test]
    fn test_create_assigns_fresh_ids() {
        let registry = JobRegistry::new(true);
        let a = registry.create("AB", "devnet", 100).unwrap();
        let b = registry.create("AB", "devnet", 100).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.running(), 2);
    }

    #[test]
    fn test_create_normalizes_prefix() {
        let registry = JobRegistry::new(true);
        let job = registry.create("sol9", "mainnet-beta", 100).unwrap();
        assert_eq!(job.pattern().prefix(), "SOL9");
        assert_eq!(job.network(), "mainnet-beta");
    }

    #[test]
    fn test_invalid_requests_create_nothing() {
        let registry = JobRegistry::new(true);
        for prefix in ["", "TOOLONGXX", "A_B", "a b"] {
            let err = registry.create(prefix, "devnet", 100).unwrap_err();
            assert!(matches!(err, EngineError::InvalidPrefix(_)));
            assert!(err.is_invalid_argument());
        }

        let err = registry.create("AB", "devnet", 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_unknown_id() {
        let registry = JobRegistry::new(true);
        let id = JobId::from("missing");
        assert_eq!(registry.get(&id).unwrap_err(), EngineError::NotFound(id));
    }

    #[test]
    fn test_stop_twice() {
        let registry = JobRegistry::new(true);
        let job = registry.create("AB", "devnet", 100).unwrap();

        registry.stop(job.id()).unwrap();
        let first = job.result();
        registry.stop(job.id()).unwrap();

        assert_eq!(job.state(), JobState::Stopped);
        assert_eq!(job.result(), first);
        assert!(job.cancel_token().is_cancelled());
        assert!(registry.stop(&JobId::from("missing")).is_err());
    }

    #[test]
    fn test_evict_by_age() {
        let registry = JobRegistry::new(true);
        let old = registry.create("AB", "devnet", 100).unwrap();
        old.stop();
        let running = registry.create("CD", "devnet", 100).unwrap();

        // Nothing is old enough yet
        let now = Instant::now();
        assert_eq!(registry.evict_older_than(Duration::from_secs(3600), now), 0);

        // Past the window both go, running or not
        let later = now + Duration::from_secs(3601);
        assert_eq!(registry.evict_older_than(Duration::from_secs(3600), later), 2);
        assert!(matches!(
            registry.get(old.id()),
            Err(EngineError::NotFound(_))
        ));
        assert!(registry.get(running.id()).is_err());
        assert!(running.cancel_token().is_cancelled());
    }
}
