//! Vanity Address Search CLI
//!
//! Usage:
//!   vanity_jobs -p ABC                  # Solana address starting with "ABC"
//!   vanity_jobs -p ab -p cd -m 5000000  # Two searches side by side
//!   vanity_jobs -p dead -C eth -o keys  # Ethereum, save found keys to ./keys

use std::collections::HashSet;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::error;

use vanity_jobs::export::KeypairExport;
use vanity_jobs::logging::init_logging;
use vanity_jobs::{Config, Engine, JobId, JobState, Pattern, StatusSnapshot};

/// How often job states are checked between progress reports
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    if let Err(e) = init_logging(&config.log_level, config.log_format) {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let source = config.chain.source();
    let radix = source.alphabet().chars().count() as u64;
    let engine = match Engine::new(config.engine_config(), source) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!(error = %e, "failed to start search engine");
            eprintln!("Startup error: {}", e);
            process::exit(1);
        }
    };

    // Print startup info
    println!("Vanity Address Search");
    println!("=====================");
    println!("Chain:      {}", config.chain);
    println!("Network:    {}", config.network);
    println!("Workers:    {}", engine.config().workers);
    println!("Budget:     {} keypairs per search", format_number(config.max_attempts));

    let mut jobs = Vec::new();
    for prefix in &config.prefixes {
        let id = match engine.start_search(prefix, &config.network, config.max_attempts) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("Cannot start search for {:?}: {}", prefix, e);
                process::exit(1);
            }
        };
        if let Ok(pattern) = Pattern::new(prefix, engine.config().case_sensitive) {
            println!(
                "Prefix:     {} ({}) -> job {}",
                pattern.prefix(),
                pattern.difficulty_description(radix),
                id
            );
        }
        jobs.push(id);
    }
    println!();

    // Set up ctrl-c handler
    ctrlc_handler(engine.clone());

    println!("Searching... (Press Ctrl+C to stop)\n");

    let report_interval = Duration::from_secs(config.report_interval);
    let mut last_report = Instant::now();
    let mut reported: HashSet<JobId> = HashSet::new();
    let mut found = 0;

    while reported.len() < jobs.len() {
        thread::sleep(POLL_INTERVAL);

        for id in &jobs {
            if reported.contains(id) {
                continue;
            }
            let status = match engine.status(id) {
                Ok(status) => status,
                Err(e) => {
                    eprintln!("Lost track of job {}: {}", id, e);
                    reported.insert(id.clone());
                    continue;
                }
            };
            if status.is_running {
                continue;
            }

            if status.state == JobState::Succeeded {
                found += 1;
                print_result(&status, found);
                if let Some(dir) = &config.out_dir {
                    save_keypair(&status, dir, &config);
                }
            } else {
                print_failure(&status);
            }
            reported.insert(id.clone());
        }

        if last_report.elapsed() >= report_interval {
            for id in jobs.iter().filter(|id| !reported.contains(*id)) {
                if let Ok(status) = engine.status(id) {
                    print_progress(&status);
                }
            }
            last_report = Instant::now();
        }
    }

    let health = engine.health();
    println!("\n--- Final Statistics ---");
    println!("Searches:     {}", jobs.len());
    println!("Found:        {}", found);
    println!("Time elapsed: {:.2}s", health.uptime.as_secs_f64());
}

fn print_result(status: &StatusSnapshot, index: usize) {
    let Some(keypair) = status.result.as_ref().and_then(|r| r.keypair()) else {
        return;
    };
    println!("=== Match #{} ({}) ===", index, status.prefix);
    println!("Address:     {}", keypair.public_key);
    println!("Private Key: {}", keypair.private_key);
    println!("Attempts:    {}", format_number(status.attempts));
    println!("Time:        {:.2}s", status.elapsed.as_secs_f64());
    println!();
}

fn print_failure(status: &StatusSnapshot) {
    let reason = status
        .result
        .as_ref()
        .and_then(|r| r.reason())
        .unwrap_or("unknown");
    println!(
        "=== No match for {} ({}) after {} attempts: {} ===",
        status.prefix,
        status.state,
        format_number(status.attempts),
        reason
    );
}

fn print_progress(status: &StatusSnapshot) {
    println!(
        "[{:>4}s] {}: {} keys ({}/s, {:.1}% of budget)",
        status.elapsed.as_secs(),
        status.prefix,
        format_number(status.attempts),
        format_number(status.rate as u64),
        status.progress() * 100.0
    );
}

fn save_keypair(status: &StatusSnapshot, dir: &std::path::Path, config: &Config) {
    let Some(export) = KeypairExport::from_snapshot(status) else {
        return;
    };
    match export.write_to(dir, config.chain) {
        Ok(path) => println!("Saved keypair to {}\n", path.display()),
        Err(e) => {
            error!(error = %e, dir = %dir.display(), "failed to save keypair");
            eprintln!("Could not save keypair: {}", e);
        }
    }
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(engine: Arc<Engine>) {
    if let Err(e) = ctrlc::set_handler(move || {
        let stopped = engine.stop_all();
        eprintln!("\nStopped {} search(es) by user.", stopped);
    }) {
        error!(error = %e, "could not install Ctrl-C handler");
    }
}
