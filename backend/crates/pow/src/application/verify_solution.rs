//! Verify Solution Use Case
//!
//! Checks run cheapest-first and stop at the first failure:
//! parse, counter present, signature, expiry, then the difficulty predicate
//! over the full submitted text.

use crate::application::config::PowConfig;
use crate::domain::clock::Clock;
use crate::domain::entities::Stamp;
use crate::domain::services::verify_pow;
use crate::error::{PowError, PowResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Verify a solved stamp against `private_key` at `now`
pub fn verify_stamp(private_key: &str, solved: &str, now: DateTime<Utc>) -> PowResult<Stamp> {
    let solved = solved.trim();
    let stamp = Stamp::parse(solved)?;
    if !stamp.is_solved() {
        return Err(PowError::MalformedStamp("missing counter".into()));
    }

    stamp.verify_signature(private_key)?;

    if stamp.is_expired(now) {
        return Err(PowError::Expired);
    }

    if !verify_pow(stamp.hash_algorithm(), solved.as_bytes(), stamp.bits) {
        return Err(PowError::InsufficientProof);
    }

    Ok(stamp)
}

/// Verify Solution Use Case
pub struct VerifySolutionUseCase<C>
where
    C: Clock,
{
    config: Arc<PowConfig>,
    clock: C,
}

impl<C> VerifySolutionUseCase<C>
where
    C: Clock,
{
    pub fn new(config: Arc<PowConfig>, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn execute(&self, solved: &str) -> PowResult<Stamp> {
        match verify_stamp(&self.config.private_key, solved, self.clock.now()) {
            Ok(stamp) => {
                tracing::info!(
                    resource = %stamp.resource,
                    bits = stamp.bits,
                    algorithm = %stamp.algorithm,
                    "Solution verified"
                );
                Ok(stamp)
            }
            Err(e) => {
                e.log();
                Err(e)
            }
        }
    }
}
