//! Runtime configuration for the vanity miner.

use std::path::PathBuf;

use clap::Parser;

use crate::matcher::{PatternError, PatternSet};

/// Tor v3 vanity onion address miner
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Patterns to search for, each `start` or `start:end`
    #[arg(required = true, value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Stop after finding N addresses (0 = run forever)
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Directory to save the keys in
    #[arg(short = 'd', long, default_value = ".")]
    pub dir: PathBuf,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Config {
    /// Returns the number of workers, defaulting to the CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Compiles and validates the pattern arguments.
    pub fn matcher(&self) -> Result<PatternSet, PatternError> {
        PatternSet::parse(&self.patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_config(patterns: &[&str]) -> Config {
        Config {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            count: 1,
            dir: ".".into(),
            workers: None,
            report_interval: 5,
            verbose: false,
        }
    }

    #[test]
    fn valid_patterns_compile() {
        let config = make_test_config(&["food:xid", "dark"]);
        assert!(config.matcher().is_ok());
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let config = make_test_config(&["alpine9"]);
        assert!(config.matcher().is_err());
    }

    #[test]
    fn worker_count_is_never_zero() {
        let mut config = make_test_config(&["a"]);
        config.workers = Some(0);
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn args_parse_into_config() {
        let config =
            Config::try_parse_from(["onion-vanity", "food:xid", "-n", "3", "-w", "2"]).unwrap();
        assert_eq!(config.patterns, vec!["food:xid"]);
        assert_eq!(config.count, 3);
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn patterns_are_required() {
        assert!(Config::try_parse_from(["onion-vanity"]).is_err());
    }
}
