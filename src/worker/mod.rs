//! Parallel mining and worker pool management.
//!
//! This module provides:
//! - The single-worker search loop ([`mine`])
//! - Multi-threaded CPU workers feeding a bounded result channel
//! - Pool-level coordination: spawn, cancel, join, statistics

mod cpu;
mod pool;

pub use cpu::{mine, CpuWorker, MineError, WorkerStats};
pub use pool::WorkerPool;
