//! Read-only projections handed to polling clients.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::{JobId, JobState, SearchResult};

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Point-in-time view of one job.
///
/// Built under the job's lock, so `attempts`, `state` and `result` always
/// agree. Serializes with the camelCase field names polling clients expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub id: JobId,
    pub prefix: String,
    pub network: String,
    pub attempts: u64,
    pub max_attempts: u64,
    #[serde(rename = "timeElapsed", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Attempts per second
    pub rate: f64,
    pub is_running: bool,
    pub state: JobState,
    pub result: Option<SearchResult>,
    pub created_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Fraction of the budget spent, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.max_attempts == 0 {
            return 0.0;
        }
        (self.attempts as f64 / self.max_attempts as f64).min(1.0)
    }
}

/// Engine-wide liveness report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    /// Jobs currently held by the registry
    pub jobs: usize,
    pub running: usize,
    #[serde(serialize_with = "as_secs")]
    pub uptime: Duration,
    pub timestamp: DateTime<Utc>,
}
