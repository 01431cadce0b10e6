//! Worker pool management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::crypto::OnionAddress;
use crate::matcher::PatternSet;

use super::cpu::{CpuWorker, WorkerStats};

/// Manages a pool of workers searching for matching onion addresses.
///
/// Results flow through a bounded channel sized to the number of requested
/// addresses, so workers that keep finding matches block until the consumer
/// catches up or shuts the pool down.
pub struct WorkerPool {
    num_workers: usize,
    /// Worker thread handles (Option to allow taking during shutdown)
    handles: Option<Vec<JoinHandle<()>>>,
    /// Receiver end of the delivery channel (Option so shutdown can drop it
    /// and unblock workers stuck on a full channel)
    result_rx: Option<Receiver<OnionAddress>>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl WorkerPool {
    /// Spawns `num_workers` workers searching for `matcher`.
    ///
    /// `num_addresses` sizes the delivery buffer; pass 0 for an unlimited
    /// run (the buffer then holds a single address).
    pub fn new(num_workers: usize, matcher: PatternSet, num_addresses: usize) -> Self {
        let (result_tx, result_rx) = bounded(num_addresses.max(1));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let handles = Self::spawn_workers(
            num_workers,
            Arc::new(matcher),
            result_tx,
            stop_flag.clone(),
            stats.clone(),
        );

        Self {
            num_workers,
            handles: Some(handles),
            result_rx: Some(result_rx),
            stop_flag,
            stats,
            start_time: Instant::now(),
        }
    }

    fn spawn_workers(
        num_workers: usize,
        matcher: Arc<PatternSet>,
        result_tx: Sender<OnionAddress>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Vec<JoinHandle<()>> {
        (0..num_workers)
            .map(|id| {
                let worker = CpuWorker::new(
                    id,
                    matcher.clone(),
                    result_tx.clone(),
                    stop_flag.clone(),
                    stats.clone(),
                );

                thread::Builder::new()
                    .name(format!("mine-worker-{id}"))
                    .spawn(move || worker.run())
                    .expect("failed to spawn worker thread")
            })
            .collect()
    }

    /// Waits for the next mined address, up to `timeout`.
    ///
    /// Returns `None` on timeout or once every worker has exited.
    pub fn wait_for_result(&self, timeout: Duration) -> Option<OnionAddress> {
        self.result_rx.as_ref()?.recv_timeout(timeout).ok()
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Returns true if the pool has been signalled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Returns a clone of the stop flag for external use (e.g. signal
    /// handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Stops the pool and waits for all workers to exit.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop();

        // Dropping the receiver wakes workers blocked on a full channel;
        // their send fails and they exit.
        self.result_rx.take();

        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the total candidate keys tested across all workers.
    pub fn total_keys(&self) -> u64 {
        self.stats.total_keys()
    }

    /// Returns the total matches found across all workers.
    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current search rate in candidates per second.
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_keys() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HOSTNAME_LEN;

    #[test]
    fn pool_delivers_a_matching_address() {
        let matcher = PatternSet::parse(&["a"]).unwrap();
        let pool = WorkerPool::new(4, matcher.clone(), 1);

        let address = pool
            .wait_for_result(Duration::from_secs(60))
            .expect("no address delivered within the timeout");

        let mut hostname = [0u8; HOSTNAME_LEN];
        address.hostname(&mut hostname);
        assert!(matcher.matches_exact(&hostname));
        assert!(address.key_pair().validate().is_ok());

        assert!(pool.total_keys() > 0);
        assert!(pool.total_matches() >= 1);

        pool.join();
    }

    #[test]
    fn pool_counts_deliveries_up_to_the_target() {
        let matcher = PatternSet::parse(&["a", "b", "c"]).unwrap();
        let pool = WorkerPool::new(2, matcher, 3);

        let mut delivered = 0;
        while delivered < 3 {
            let address = pool
                .wait_for_result(Duration::from_secs(60))
                .expect("no address delivered within the timeout");
            assert!(address.key_pair().validate().is_ok());
            delivered += 1;
        }

        pool.join();
    }

    #[test]
    fn cancelled_pool_joins_promptly() {
        // A six-character prefix is far beyond what a test run can find.
        let matcher = PatternSet::parse(&["aaaaaa"]).unwrap();
        let pool = WorkerPool::new(2, matcher, 1);

        thread::sleep(Duration::from_millis(100));
        pool.stop();
        pool.join();
    }

    #[test]
    fn delivered_address_survives_a_save_load_round_trip() {
        let matcher = PatternSet::parse(&["a"]).unwrap();
        let pool = WorkerPool::new(4, matcher, 1);

        let address = pool
            .wait_for_result(Duration::from_secs(60))
            .expect("no address delivered within the timeout");
        pool.join();

        let dir = tempfile::tempdir().unwrap();
        let target = crate::storage::save(dir.path(), &address).unwrap();
        let loaded = crate::storage::load(&target).unwrap();

        assert_eq!(loaded, address);
        assert!(loaded.hostname_string().starts_with('a'));
        assert!(loaded.key_pair().validate().is_ok());
    }

    #[test]
    fn join_unblocks_workers_stuck_on_a_full_channel() {
        // Every candidate matches, so both workers fill the single-slot
        // channel immediately and block on the next send.
        let matcher = PatternSet::new(Vec::new(), true);
        let pool = WorkerPool::new(2, matcher, 1);

        let _ = pool
            .wait_for_result(Duration::from_secs(60))
            .expect("no address delivered within the timeout");

        pool.join();
    }
}
