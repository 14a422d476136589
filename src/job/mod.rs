//! Search jobs and their registry.
//!
//! This module provides:
//! - The per-job state machine ([`SearchJob`], [`JobState`])
//! - Pluggable job storage ([`JobStore`], [`InMemoryStore`])
//! - The [`JobRegistry`] that owns every live job
//! - Read-only status projections ([`StatusSnapshot`])

mod registry;
mod state;
mod status;
mod store;

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

pub use registry::JobRegistry;
pub use state::{CancelToken, Commit, JobState, Outcome, SearchJob, SearchResult};
pub use status::{Health, StatusSnapshot};
pub use store::{InMemoryStore, JobStore};

/// Opaque job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Allocates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
