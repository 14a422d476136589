//! Per-job state machine.
//!
//! ```text
//! Running ──match──────────▶ Succeeded
//!    │ ───budget spent─────▶ Failed
//!    │ ───source failure───▶ Failed
//!    └────stop─────────────▶ Stopped
//! ```
//!
//! Every mutable field lives behind one per-job mutex, so a reader never
//! sees `attempts`, `state` and `result` out of step with each other.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::crypto::Candidate;
use crate::matcher::Pattern;

use super::{JobId, StatusSnapshot};

/// Lifecycle state of a search job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
    Stopped,
}

impl JobState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Running)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "running"),
            JobState::Succeeded => write!(f, "succeeded"),
            JobState::Failed => write!(f, "failed"),
            JobState::Stopped => write!(f, "stopped"),
        }
    }
}

/// How a finished search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A candidate matched the prefix
    Found(Candidate),
    /// The attempt budget ran out
    Exhausted,
    /// A client stopped the search
    Cancelled,
    /// The keypair source failed
    Faulted(String),
}

impl Outcome {
    fn state(&self) -> JobState {
        match self {
            Outcome::Found(_) => JobState::Succeeded,
            Outcome::Exhausted | Outcome::Faulted(_) => JobState::Failed,
            Outcome::Cancelled => JobState::Stopped,
        }
    }

    /// Failure reason, `None` on success.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Found(_) => None,
            Outcome::Exhausted => Some("max attempts reached"),
            Outcome::Cancelled => Some("stopped by user"),
            Outcome::Faulted(reason) => Some(reason),
        }
    }
}

/// Final record of a search. Immutable once set on a job.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub outcome: Outcome,
    pub attempts: u64,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Found(_))
    }

    /// The matching keypair, if the search succeeded.
    pub fn keypair(&self) -> Option<&Candidate> {
        match &self.outcome {
            Outcome::Found(candidate) => Some(candidate),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.outcome.reason()
    }

    pub fn rate(&self) -> f64 {
        rate(self.attempts, self.elapsed)
    }
}

// Flat wire shape: `success`, then either the keypair or a `reason`.
impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SearchResult", 6)?;
        state.serialize_field("success", &self.is_success())?;
        match &self.outcome {
            Outcome::Found(candidate) => {
                state.serialize_field("publicKey", &candidate.public_key)?;
                state.serialize_field("privateKey", &candidate.private_key)?;
            }
            other => {
                state.serialize_field("reason", &other.reason())?;
            }
        }
        state.serialize_field("attempts", &self.attempts)?;
        state.serialize_field("timeTaken", &(self.elapsed.as_millis() as u64))?;
        state.serialize_field("rate", &self.rate())?;
        state.end()
    }
}

/// Attempts per second, 0 when no time has passed.
pub(crate) fn rate(attempts: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        attempts as f64 / secs
    } else {
        0.0
    }
}

/// Shared flag that retires a job's recurring tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What happened when a candidate was offered to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Counted, no match
    Continue,
    /// Counted and matched; the job is now `Succeeded`
    Matched,
    /// Not counted; the job had already left `Running` or spent its budget
    Halted,
}

#[derive(Debug)]
struct Progress {
    attempts: u64,
    state: JobState,
    result: Option<SearchResult>,
}

/// One search attempt.
#[derive(Debug)]
pub struct SearchJob {
    id: JobId,
    pattern: Pattern,
    network: String,
    max_attempts: u64,
    created_at: Instant,
    created_wall: DateTime<Utc>,
    progress: Mutex<Progress>,
    cancel: CancelToken,
}

impl SearchJob {
    pub(crate) fn new(id: JobId, pattern: Pattern, network: String, max_attempts: u64) -> Self {
        Self {
            id,
            pattern,
            network,
            max_attempts,
            created_at: Instant::now(),
            created_wall: Utc::now(),
            progress: Mutex::new(Progress {
                attempts: 0,
                state: JobState::Running,
                result: None,
            }),
            cancel: CancelToken::new(),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn max_attempts(&self) -> u64 {
        self.max_attempts
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Token cancelled on any terminal transition and on eviction.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Time since creation as seen from `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    // Nothing panics while holding this lock; poisoning is ignored.
    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> JobState {
        self.progress().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == JobState::Running
    }

    pub fn attempts(&self) -> u64 {
        self.progress().attempts
    }

    pub fn result(&self) -> Option<SearchResult> {
        self.progress().result.clone()
    }

    /// Budget left, 0 once the job is terminal.
    pub fn remaining_attempts(&self) -> u64 {
        let progress = self.progress();
        if progress.state.is_terminal() {
            0
        } else {
            self.max_attempts.saturating_sub(progress.attempts)
        }
    }

    /// Counts one generated candidate and tests it against the prefix.
    pub fn commit(&self, candidate: Candidate) -> Commit {
        let mut progress = self.progress();
        if progress.state.is_terminal() || progress.attempts >= self.max_attempts {
            return Commit::Halted;
        }

        progress.attempts += 1;
        if self.pattern.matches(&candidate.public_key).is_match() {
            self.finish(&mut progress, Outcome::Found(candidate));
            Commit::Matched
        } else {
            Commit::Continue
        }
    }

    /// Moves a running job whose budget is spent to `Failed`.
    pub fn finish_if_exhausted(&self) -> bool {
        let mut progress = self.progress();
        if progress.attempts < self.max_attempts {
            return false;
        }
        self.finish(&mut progress, Outcome::Exhausted)
    }

    /// Fails a running job with a diagnostic reason.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let mut progress = self.progress();
        self.finish(&mut progress, Outcome::Faulted(reason.into()))
    }

    /// Stops a running job. Returns false if it was already terminal.
    pub fn stop(&self) -> bool {
        let mut progress = self.progress();
        self.finish(&mut progress, Outcome::Cancelled)
    }

    // The only place a job leaves `Running`.
    fn finish(&self, progress: &mut Progress, outcome: Outcome) -> bool {
        if progress.state.is_terminal() {
            return false;
        }

        progress.state = outcome.state();
        progress.result = Some(SearchResult {
            outcome,
            attempts: progress.attempts,
            elapsed: self.created_at.elapsed(),
        });
        self.cancel.cancel();
        true
    }

    /// Consistent point-in-time view of the job.
    pub fn snapshot(&self) -> StatusSnapshot {
        let progress = self.progress();
        let elapsed = match &progress.result {
            Some(result) => result.elapsed,
            None => self.created_at.elapsed(),
        };

        StatusSnapshot {
            id: self.id.clone(),
            prefix: self.pattern.prefix().to_string(),
            network: self.network.clone(),
            attempts: progress.attempts,
            max_attempts: self.max_attempts,
            elapsed,
            rate: rate(progress.attempts, elapsed),
            is_running: progress.state == JobState::Running,
            state: progress.state,
            result: progress.result.clone(),
            created_at: self.created_wall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_job(prefix: &str, max_attempts: u64) -> SearchJob {
        SearchJob::new(
            JobId::generate(),
            Pattern::new(prefix, true).unwrap(),
            "devnet".into(),
            max_attempts,
        )
    }

    fn miss() -> Candidate {
        Candidate::new("zzzzzz", "secret")
    }

    #[test]
    fn test_new_job_is_running() {
        let job = make_job("AB", 10);
        let snapshot = job.snapshot();
        assert!(snapshot.is_running);
        assert_eq!(snapshot.attempts, 0);
        assert!(snapshot.result.is_none());
        assert!(!job.cancel_token().is_cancelled());
    }

    #[test]
    fn test_match_succeeds() {
        let job = make_job("AB", 10);
        assert_eq!(job.commit(miss()), Commit::Continue);
        assert_eq!(job.commit(Candidate::new("ABxyz", "pk")), Commit::Matched);

        assert_eq!(job.state(), JobState::Succeeded);
        let result = job.result().unwrap();
        assert_eq!(result.attempts, 2);
        assert_eq!(result.keypair().unwrap().public_key, "ABxyz");
        assert!(job.cancel_token().is_cancelled());

        // Further candidates are not counted
        assert_eq!(job.commit(miss()), Commit::Halted);
        assert_eq!(job.attempts(), 2);
    }

    #[test]
    fn test_attempts_never_exceed_budget() {
        let job = make_job("AB", 3);
        for _ in 0..3 {
            assert_eq!(job.commit(miss()), Commit::Continue);
        }
        assert_eq!(job.commit(miss()), Commit::Halted);
        assert_eq!(job.attempts(), 3);
        assert_eq!(job.remaining_attempts(), 0);

        assert!(job.finish_if_exhausted());
        assert_eq!(job.state(), JobState::Failed);
        assert_eq!(job.result().unwrap().reason(), Some("max attempts reached"));
    }

    #[test]
    fn test_not_exhausted_below_budget() {
        let job = make_job("AB", 3);
        job.commit(miss());
        assert!(!job.finish_if_exhausted());
        assert!(job.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let job = make_job("AB", 100);
        job.commit(miss());
        assert!(job.stop());
        let first = job.result().unwrap();

        assert!(!job.stop());
        assert_eq!(job.result().unwrap(), first);
        assert_eq!(job.state(), JobState::Stopped);
        assert_eq!(first.reason(), Some("stopped by user"));
        assert_eq!(job.commit(Candidate::new("AB", "pk")), Commit::Halted);
    }

    #[test]
    fn test_stop_does_not_override_success() {
        let job = make_job("AB", 100);
        job.commit(Candidate::new("ABC", "pk"));
        assert!(!job.stop());
        assert_eq!(job.state(), JobState::Succeeded);
    }

    #[test]
    fn test_fail_records_reason() {
        let job = make_job("AB", 100);
        assert!(job.fail("keypair source failed: boom"));
        let snapshot = job.snapshot();
        assert_eq!(snapshot.state, JobState::Failed);
        assert!(!snapshot.is_running);
        assert_eq!(
            snapshot.result.unwrap().reason(),
            Some("keypair source failed: boom")
        );
    }

    #[test]
    fn test_terminal_elapsed_is_frozen() {
        let job = make_job("AB", 100);
        job.stop();
        let first = job.snapshot();
        std::thread::sleep(Duration::from_millis(5));
        let second = job.snapshot();
        assert_eq!(first.elapsed, second.elapsed);
    }

    #[test]
    fn test_result_serialization() {
        let found = SearchResult {
            outcome: Outcome::Found(Candidate::new("ABcd", "secret")),
            attempts: 50,
            elapsed: Duration::from_millis(250),
        };
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["publicKey"], "ABcd");
        assert_eq!(json["privateKey"], "secret");
        assert_eq!(json["attempts"], 50);
        assert_eq!(json["timeTaken"], 250);
        assert_eq!(json["rate"], 200.0);
        assert!(json.get("reason").is_none());

        let exhausted = SearchResult {
            outcome: Outcome::Exhausted,
            attempts: 10,
            elapsed: Duration::ZERO,
        };
        let json = serde_json::to_value(&exhausted).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["reason"], "max attempts reached");
        assert_eq!(json["rate"], 0.0);
        assert!(json.get("privateKey").is_none());
    }
}
