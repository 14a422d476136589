//! Keypair export to JSON files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::crypto::Chain;
use crate::job::StatusSnapshot;

/// On-disk record of a found keypair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypairExport {
    pub public_key: String,
    pub private_key: String,
    pub prefix: String,
    pub network: String,
    pub attempts: u64,
    /// Milliseconds from job creation to the match
    pub time_taken: u64,
    pub generated_at: DateTime<Utc>,
}

impl KeypairExport {
    /// Builds the export for a succeeded job, `None` otherwise.
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Option<Self> {
        let result = snapshot.result.as_ref()?;
        let keypair = result.keypair()?;
        Some(Self {
            public_key: keypair.public_key.clone(),
            private_key: keypair.private_key.clone(),
            prefix: snapshot.prefix.clone(),
            network: snapshot.network.clone(),
            attempts: result.attempts,
            time_taken: result.elapsed.as_millis() as u64,
            generated_at: Utc::now(),
        })
    }

    /// File name used for this export, e.g. `solana-keypair-ABC.json`.
    pub fn file_name(&self, chain: Chain) -> String {
        format!("{}-keypair-{}.json", chain, self.prefix)
    }

    /// Writes the export into `dir`, creating it if needed.
    ///
    /// An existing file for the same prefix is never overwritten; a numeric
    /// suffix is added instead.
    pub fn write_to(&self, dir: &Path, chain: Chain) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let mut path = dir.join(self.file_name(chain));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{}-keypair-{}-{}.json", chain, self.prefix, n));
            n += 1;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
