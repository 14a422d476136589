//! Keypair sources for the search engine.
//!
//! The engine only sees the [`KeypairSource`] trait: one call, one fresh
//! random keypair, already encoded as text. Two concrete sources ship with
//! the crate:
//! - [`SolanaSource`]: ed25519 keys, base58 addresses
//! - [`EthereumSource`]: secp256k1 keys, keccak-derived hex addresses

mod ethereum;
mod solana;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use ethereum::{Address, EthereumSource};
pub use solana::SolanaSource;

/// One generated keypair in its textual encodings.
#[derive(Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Public address as clients see it
    pub public_key: String,
    /// Private key material, encoded for import into a wallet
    pub private_key: String,
}

impl Candidate {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }
}

// Never print private key material through Debug.
impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Errors a keypair source may report for a single draw.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("random number generator failure: {0}")]
    Rng(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// Produces independent, uniformly random keypairs.
///
/// Implementations must be cheap to call repeatedly from several worker
/// threads at once; the engine calls `generate` once per attempt.
pub trait KeypairSource: Send + Sync {
    /// Draws one fresh keypair.
    fn generate(&self) -> Result<Candidate, SourceError>;

    /// Characters that can appear in a public encoding.
    fn alphabet(&self) -> &'static str;

    /// Whether letter case in the public encoding carries information.
    ///
    /// Base58 is case significant; hex is not.
    fn case_significant(&self) -> bool {
        true
    }
}

/// Supported address families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chain {
    #[default]
    Solana,
    Ethereum,
}

impl Chain {
    /// Builds the keypair source for this chain.
    pub fn source(self) -> Arc<dyn KeypairSource> {
        match self {
            Chain::Solana => Arc::new(SolanaSource::new()),
            Chain::Ethereum => Arc::new(EthereumSource::new()),
        }
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solana" | "sol" => Ok(Chain::Solana),
            "ethereum" | "eth" => Ok(Chain::Ethereum),
            _ => Err(format!("Unknown chain: {}", s)),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::Solana => write!(f, "solana"),
            Chain::Ethereum => write!(f, "ethereum"),
        }
    }
}
