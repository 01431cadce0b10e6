//! CPU worker: the vanity search loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::crypto::{encode_approx, encode_full, KeyError, KeyIterator, KeyPair, OnionAddress, HOSTNAME_LEN};
use crate::matcher::PatternSet;

/// Candidates counted locally before flushing to the shared counter.
const STATS_FLUSH_INTERVAL: u64 = 1024;

/// Errors produced by the mining loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MineError {
    /// The cancel signal was raised; not a failure.
    #[error("search cancelled")]
    Cancelled,

    /// The iterator ran through its entire 2^64 slice of the key space.
    #[error("searched the entire address space without a match")]
    AddressSpaceExhausted,

    /// Key reconstruction or validation failed.
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Shared statistics across the workers of a pool.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total candidate keys tested
    pub keys_tested: AtomicU64,
    /// Matches found
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total candidates tested.
    pub fn total_keys(&self) -> u64 {
        self.keys_tested.load(Ordering::Relaxed)
    }

    /// Returns the total matches found.
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Searches for one address matching `matcher`.
///
/// The hot path per candidate is an approximate (checksum-free) encode plus
/// a prefix check; the full encode runs only when the approximate hostname
/// already matches, and secret-key reconstruction only on an exact match.
/// The cancel signal is observed between candidates.
pub fn mine<R: RngCore + CryptoRng>(
    stop: &AtomicBool,
    rng: &mut R,
    matcher: &PatternSet,
    stats: &WorkerStats,
) -> Result<OnionAddress, MineError> {
    let mut iter = KeyIterator::new(rng);
    let mut hostname = [0u8; HOSTNAME_LEN];
    let mut tested: u64 = 0;

    let result = loop {
        if stop.load(Ordering::Relaxed) {
            break Err(MineError::Cancelled);
        }

        tested += 1;
        if tested == STATS_FLUSH_INTERVAL {
            stats.keys_tested.fetch_add(tested, Ordering::Relaxed);
            tested = 0;
        }

        let public_key = iter.public_key();
        encode_approx(&public_key, &mut hostname);

        if matcher.matches_approx(&hostname) {
            encode_full(&public_key, &mut hostname);

            if matcher.matches_exact(&hostname) {
                break recover_address(&iter, public_key);
            }
        }

        if !iter.advance() {
            break Err(MineError::AddressSpaceExhausted);
        }
    };

    stats.keys_tested.fetch_add(tested, Ordering::Relaxed);
    result
}

/// Reconstructs and validates the key pair at the iterator's position.
fn recover_address(iter: &KeyIterator, public_key: [u8; 32]) -> Result<OnionAddress, MineError> {
    let secret_key = iter.secret_key()?;

    let key_pair = KeyPair::from_parts(public_key, secret_key);
    key_pair.validate()?;

    Ok(OnionAddress::new(key_pair))
}

/// A CPU worker that searches for matching addresses in a loop.
pub struct CpuWorker {
    id: usize,
    matcher: Arc<PatternSet>,
    result_tx: Sender<OnionAddress>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        matcher: Arc<PatternSet>,
        result_tx: Sender<OnionAddress>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            matcher,
            result_tx,
            stop_flag,
            stats,
        }
    }

    /// Runs the worker loop until cancelled or the result channel closes.
    ///
    /// Each delivered address is followed by a fresh search from a new
    /// random seed. Failures other than cancellation are logged and the
    /// worker restarts with a new iterator.
    pub fn run(&self) {
        let mut rng = OsRng;

        while !self.stop_flag.load(Ordering::Relaxed) {
            match mine(&self.stop_flag, &mut rng, &self.matcher, &self.stats) {
                Ok(address) => {
                    self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        worker = self.id,
                        public_key = %hex::encode(address.public_key()),
                        "match found"
                    );

                    // A send error means the pool dropped the receiver; the
                    // remaining addresses are no longer wanted.
                    if self.result_tx.send(address).is_err() {
                        break;
                    }
                }
                Err(MineError::Cancelled) => break,
                Err(err) => {
                    tracing::warn!(
                        worker = self.id,
                        error = %err,
                        "search attempt failed, restarting from a fresh seed"
                    );
                }
            }
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mine_observes_a_raised_cancel_signal() {
        let stop = AtomicBool::new(true);
        let mut rng = StdRng::seed_from_u64(1);
        let matcher = PatternSet::new(Vec::new(), true);
        let stats = WorkerStats::new();

        let result = mine(&stop, &mut rng, &matcher, &stats);
        assert!(matches!(result, Err(MineError::Cancelled)));
    }

    #[test]
    fn mine_returns_the_first_candidate_for_a_match_everything_set() {
        let stop = AtomicBool::new(false);
        let mut rng = StdRng::seed_from_u64(2);
        let matcher = PatternSet::new(Vec::new(), true);
        let stats = WorkerStats::new();

        let address = mine(&stop, &mut rng, &matcher, &stats).unwrap();
        assert!(address.key_pair().validate().is_ok());
        assert_eq!(stats.total_keys(), 1);
    }

    #[test]
    fn mine_finds_an_address_matching_the_pattern() {
        let stop = AtomicBool::new(false);
        let mut rng = StdRng::seed_from_u64(3);
        let matcher = PatternSet::parse(&["a"]).unwrap();
        let stats = WorkerStats::new();

        let address = mine(&stop, &mut rng, &matcher, &stats).unwrap();

        let mut hostname = [0u8; HOSTNAME_LEN];
        address.hostname(&mut hostname);
        assert_eq!(hostname[0], b'a');
        assert!(matcher.matches_exact(&hostname));
        assert!(address.key_pair().validate().is_ok());
        assert!(stats.total_keys() > 0);
    }

    #[test]
    fn mined_hostname_string_matches_the_pattern() {
        let stop = AtomicBool::new(false);
        let mut rng = StdRng::seed_from_u64(4);
        let matcher = PatternSet::parse(&["b:d"]).unwrap();
        let stats = WorkerStats::new();

        let address = mine(&stop, &mut rng, &matcher, &stats).unwrap();
        let hostname = address.hostname_string();
        assert!(hostname.starts_with('b'));
        assert!(hostname.ends_with("d.onion"));
    }
}
