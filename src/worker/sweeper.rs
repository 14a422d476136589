//! Periodic eviction of old jobs.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::{debug, info, warn};

use crate::error::SetupError;
use crate::job::JobRegistry;

/// Background thread that evicts jobs older than the retention window.
pub struct Sweeper {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Starts sweeping `registry` every `interval`.
    pub fn spawn(
        registry: Arc<JobRegistry>,
        interval: Duration,
        retention: Duration,
    ) -> Result<Self, SetupError> {
        let (shutdown, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("vanity-sweeper".into())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let evicted = registry.evict_older_than(retention, Instant::now());
                            if evicted > 0 {
                                info!(evicted, remaining = registry.len(), "evicted expired search jobs");
                            } else {
                                debug!(jobs = registry.len(), "sweep found nothing to evict");
                            }
                        }
                        recv(stop_rx) -> _ => break,
                    }
                }
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Stops the sweeper and waits for its thread.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.shutdown.send(());
            if handle.join().is_err() {
                warn!("sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
