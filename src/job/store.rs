//! Job storage backends.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{JobId, SearchJob};

/// Where the registry keeps its jobs.
///
/// The lock inside a store guards the id map only. Per-job mutation goes
/// through each [`SearchJob`]'s own lock, so batch work on different jobs
/// never contends here.
pub trait JobStore: Send + Sync {
    /// Inserts a job. Returns false if the id is already taken.
    fn insert(&self, job: Arc<SearchJob>) -> bool;

    fn get(&self, id: &JobId) -> Option<Arc<SearchJob>>;

    fn remove(&self, id: &JobId) -> Option<Arc<SearchJob>>;

    /// Handles to every stored job, in no particular order.
    fn jobs(&self) -> Vec<Arc<SearchJob>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Single-process store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    jobs: RwLock<HashMap<JobId, Arc<SearchJob>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryStore {
    fn insert(&self, job: Arc<SearchJob>) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if jobs.contains_key(job.id()) {
            return false;
        }
        jobs.insert(job.id().clone(), job);
        true
    }

    fn get(&self, id: &JobId) -> Option<Arc<SearchJob>> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(id).cloned()
    }

    fn remove(&self, id: &JobId) -> Option<Arc<SearchJob>> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.remove(id)
    }

    fn jobs(&self) -> Vec<Arc<SearchJob>> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Pattern;

    fn make_job(id: &str) -> Arc<SearchJob> {
        Arc::new(SearchJob::new(
            JobId::from(id),
            Pattern::new("AB", true).unwrap(),
            "devnet".into(),
            10,
        ))
    }

    #[test]
    fn test_insert_get_remove() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());

        assert!(store.insert(make_job("a")));
        assert!(store.insert(make_job("b")));
        assert_eq!(store.len(), 2);
        assert!(store.get(&JobId::from("a")).is_some());

        assert!(store.remove(&JobId::from("a")).is_some());
        assert!(store.get(&JobId::from("a")).is_none());
        assert!(store.remove(&JobId::from("a")).is_none());
        assert_eq!(store.jobs().len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = InMemoryStore::new();
        assert!(store.insert(make_job("a")));
        assert!(!store.insert(make_job("a")));
        assert_eq!(store.len(), 1);
    }
}
