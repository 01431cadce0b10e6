//! Tor v3 Vanity Onion Address Miner CLI
//!
//! Usage:
//!   onion-vanity food              # Find an address starting with "food"
//!   onion-vanity food:xid          # ... starting with "food" and ending in "xid"
//!   onion-vanity -n 5 -d keys a b  # Find 5 addresses starting with "a" or "b"

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use onion_vanity::{storage, Config, WorkerPool};

fn main() {
    let config = Config::parse();
    init_logging(config.verbose);

    // Compile the patterns before spawning anything.
    let matcher = match config.matcher() {
        Ok(matcher) => matcher,
        Err(err) => {
            eprintln!("invalid pattern: {err}");
            process::exit(2);
        }
    };

    for pattern in matcher.patterns() {
        tracing::debug!(
            starts_with = pattern.start(),
            ends_with = pattern.end(),
            "compiled filter"
        );
    }

    // Print startup info
    println!("Tor v3 vanity onion address miner");
    println!("=================================");
    println!("Filters:    {}", matcher.len());
    println!(
        "Difficulty: ~{} candidates per match, {}",
        format_number(matcher.estimated_difficulty()),
        matcher.difficulty_description()
    );
    println!("Workers:    {}", config.worker_count());
    if config.count == 0 {
        println!("Target:     unlimited");
    } else {
        println!("Target:     {} address(es)", config.count);
    }
    println!("Directory:  {}", config.dir.display());
    println!();

    let pool = WorkerPool::new(config.worker_count(), matcher, config.count);

    // Set up ctrl-c handler
    install_ctrlc_handler(pool.stop_flag_clone());

    println!("Searching... (Press Ctrl+C to stop)\n");

    let mut found = 0usize;
    let unlimited = config.count == 0;
    let report_interval = Duration::from_secs(config.report_interval.max(1));

    loop {
        match pool.wait_for_result(report_interval) {
            Some(address) => {
                found += 1;
                let hostname = address.hostname_string();
                println!("{hostname}");

                if let Err(err) = storage::save(&config.dir, &address) {
                    tracing::error!(%hostname, error = %err, "found address but could not save it");
                }

                if !unlimited && found >= config.count {
                    break;
                }
            }
            None => print_progress(&pool),
        }

        // Check if we should stop (ctrl-c was pressed)
        if pool.is_stopped() {
            println!("\nStopped.");
            break;
        }
    }

    // Print final stats
    println!("\n--- Final Statistics ---");
    println!("Addresses found: {found}");
    println!("Keys tested:     {}", format_number(pool.total_keys()));
    println!("Time elapsed:    {:.2}s", pool.elapsed().as_secs_f64());
    println!(
        "Average speed:   {}/s",
        format_number(pool.keys_per_second() as u64)
    );

    pool.join();
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "onion_vanity=debug"
    } else {
        "onion_vanity=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Diagnostics go to stderr; stdout carries the mined hostnames.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn install_ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    })
    .expect("Error setting Ctrl-C handler");
}

fn print_progress(pool: &WorkerPool) {
    println!(
        "[{:>4}s] Tested {} keys ({}/s)",
        pool.elapsed().as_secs(),
        format_number(pool.total_keys()),
        format_number(pool.keys_per_second() as u64)
    );
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
