//! # onion_vanity
//!
//! Parallel miner for Tor v3 hidden-service (.onion) addresses whose base32
//! hostname matches user-supplied prefix/suffix patterns.
//!
//! ## Architecture
//!
//! - `crypto`: Amortized Ed25519 key enumeration and onion address encoding
//! - `matcher`: Hostname pattern compilation and matching
//! - `worker`: Parallel mining and worker pool management
//! - `storage`: Tor-compatible key persistence
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod storage;
pub mod worker;

pub use config::Config;
pub use crypto::{KeyError, KeyIterator, KeyPair, OnionAddress};
pub use matcher::{Pattern, PatternError, PatternSet};
pub use storage::{load, save, StorageError};
pub use worker::{mine, CpuWorker, MineError, WorkerPool, WorkerStats};
