//! Parallel counter search
//!
//! Worker threads pull attempt indices from a shared atomic source and check
//! them independently. The first worker to report ends the search: the stop
//! flag is raised, the others drain out, and the scope joins them before the
//! outcome is returned.

use flume::{Receiver, Sender};
use platform::crypto::{HashAlgorithm, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

/// Hands out attempt indices `0..limit`, each exactly once
#[derive(Debug)]
pub struct AttemptSource {
    next: AtomicU64,
    limit: u64,
}

impl AttemptSource {
    pub const fn new(limit: u64) -> Self {
        Self {
            next: AtomicU64::new(0),
            limit,
        }
    }

    /// Reserve the next index, `None` once the budget is spent
    #[inline]
    pub fn fetch(&self) -> Option<u64> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        (index < self.limit).then_some(index)
    }
}

/// Shared early-stop signal; also serves as an external cancel handle
#[derive(Debug)]
pub struct StopFlag {
    stop: AtomicBool,
}

impl StopFlag {
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn force_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// How a search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(String),
    Exhausted,
    TimedOut,
    Cancelled,
}

/// Counter range search over `start ..= start + attempts - 1` (wrapping)
#[derive(Debug, Clone)]
pub struct CounterSearch {
    pub start: u32,
    /// Number of counters to try
    pub attempts: u64,
    pub workers: usize,
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<StopFlag>>,
}

impl CounterSearch {
    /// Run `check` over the range until one counter yields a candidate
    ///
    /// `check` receives a per-worker hasher for `algorithm` and the counter.
    pub fn run<F>(&self, algorithm: HashAlgorithm, check: F) -> SearchOutcome
    where
        F: Fn(&mut Hasher, u32) -> Option<String> + Sync,
    {
        let workers = self.workers.max(1);
        let source = AttemptSource::new(self.attempts);
        let stop = StopFlag::new();
        let (tx, rx): (Sender<SearchOutcome>, Receiver<SearchOutcome>) = flume::bounded(workers);

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let (source, stop, check) = (&source, &stop, &check);
                scope.spawn(move || self.worker_loop(algorithm, source, stop, check, tx));
            }
            drop(tx);

            // Every worker hung up without reporting: budget spent
            let outcome = rx.recv().unwrap_or(SearchOutcome::Exhausted);
            stop.force_stop();
            outcome
        })
    }

    fn worker_loop<F>(
        &self,
        algorithm: HashAlgorithm,
        source: &AttemptSource,
        stop: &StopFlag,
        check: &F,
        tx: Sender<SearchOutcome>,
    ) where
        F: Fn(&mut Hasher, u32) -> Option<String>,
    {
        let mut hasher = algorithm.hasher();
        while !stop.should_stop() {
            if self.cancel.as_ref().is_some_and(|cancel| cancel.should_stop()) {
                let _ = tx.send(SearchOutcome::Cancelled);
                return;
            }
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                let _ = tx.send(SearchOutcome::TimedOut);
                return;
            }
            let Some(index) = source.fetch() else {
                return;
            };
            // Truncation is the wrap-around of the u32 counter space
            let counter = self.start.wrapping_add(index as u32);
            if let Some(candidate) = check(&mut hasher, counter) {
                let _ = tx.send(SearchOutcome::Found(candidate));
                stop.force_stop();
                return;
            }
        }
    }
}
