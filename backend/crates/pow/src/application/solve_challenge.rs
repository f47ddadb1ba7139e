//! Solve Challenge Use Case
//!
//! Brute-forces the counter of an unsolved stamp. Candidate `n` is the
//! challenge text with `:base64(le32(n))` appended; the first candidate that
//! meets the difficulty is returned, which is not necessarily the smallest.

use crate::application::config::ClientConfig;
use crate::domain::entities::Stamp;
use crate::domain::services::meets_difficulty;
use crate::domain::value_objects::encode_counter;
use crate::error::{PowError, PowResult};
use crate::infra::search::{CounterSearch, SearchOutcome, StopFlag};
use derive_builder::Builder;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Async seam between the client session and the CPU-bound search
#[trait_variant::make(ChallengeSolver: Send)]
pub trait LocalChallengeSolver {
    /// Turn challenge text into solved stamp text
    async fn solve_challenge(&self, challenge: &str) -> PowResult<String>;
}

/// Counter search over an unsolved stamp
#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned")]
pub struct Solver {
    /// Counters tried beyond the first; `max_attempts + 1` candidates in total
    #[builder(default = "1000")]
    pub max_attempts: u32,
    #[builder(default = "1")]
    pub workers: usize,
    #[builder(default, setter(strip_option))]
    pub timeout: Option<Duration>,
    #[builder(default, setter(strip_option))]
    pub cancel: Option<Arc<StopFlag>>,
}

impl SolverBuilder {
    pub fn build_validated(self) -> PowResult<Solver> {
        let solver = self
            .build()
            .map_err(|e| PowError::InvalidConfig(e.to_string()))?;
        solver.validate()?;
        Ok(solver)
    }
}

impl Solver {
    pub fn from_config(config: &ClientConfig) -> PowResult<Self> {
        let mut builder = SolverBuilder::default()
            .max_attempts(config.max_attempts)
            .workers(config.workers);
        if let Some(timeout) = config.solve_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build_validated()
    }

    fn validate(&self) -> PowResult<()> {
        if self.workers == 0 {
            return Err(PowError::InvalidConfig("workers must be >= 1".into()));
        }
        Ok(())
    }

    /// Search for a counter that satisfies the challenge difficulty
    pub fn solve(&self, challenge: &str) -> PowResult<String> {
        self.validate()?;
        let challenge = challenge.trim();
        let stamp = Stamp::parse(challenge)?;
        if stamp.is_solved() {
            return Err(PowError::MalformedStamp(
                "challenge already carries a counter".into(),
            ));
        }

        let started = Instant::now();
        let search = CounterSearch {
            start: stamp.start_counter(),
            attempts: u64::from(self.max_attempts) + 1,
            workers: self.workers,
            deadline: self.timeout.map(|timeout| started + timeout),
            cancel: self.cancel.clone(),
        };
        let bits = stamp.bits;
        let outcome = search.run(stamp.hash_algorithm(), |hasher, counter| {
            let candidate = format!("{challenge}:{}", encode_counter(counter));
            meets_difficulty(&mut **hasher, candidate.as_bytes(), bits).then_some(candidate)
        });

        match outcome {
            SearchOutcome::Found(solved) => {
                tracing::debug!(
                    bits,
                    workers = self.workers,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Challenge solved"
                );
                Ok(solved)
            }
            SearchOutcome::Exhausted => Err(PowError::AttemptsExceeded),
            SearchOutcome::TimedOut => Err(PowError::SolveTimedOut),
            SearchOutcome::Cancelled => Err(PowError::SolveCancelled),
        }
    }
}

impl ChallengeSolver for Solver {
    async fn solve_challenge(&self, challenge: &str) -> PowResult<String> {
        let solver = self.clone();
        let challenge = challenge.to_string();
        tokio::task::spawn_blocking(move || solver.solve(&challenge))
            .await
            .map_err(|e| PowError::Internal(format!("solver task failed: {e}")))?
    }
}
