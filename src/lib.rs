//! # vanity_jobs
//!
//! Asynchronous vanity address search engine.
//!
//! Clients start a search for an address prefix, poll its progress, stop
//! it, and collect the winning keypair, without ever blocking on the
//! search itself.
//!
//! ## Architecture
//!
//! - `crypto`: Keypair sources (Solana, Ethereum)
//! - `matcher`: Prefix validation and matching
//! - `job`: Job state machine, registry and status snapshots
//! - `worker`: Batch execution, tick scheduling and eviction
//! - `engine`: Facade exposing start / status / stop
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod export;
pub mod job;
pub mod logging;
pub mod matcher;
pub mod worker;

pub use config::{Config, EngineConfig};
pub use crypto::{Candidate, Chain, KeypairSource};
pub use engine::Engine;
pub use error::{EngineError, SetupError};
pub use job::{JobId, JobState, SearchResult, StatusSnapshot};
pub use matcher::{MatchResult, Pattern};
