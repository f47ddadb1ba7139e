//! Issue Challenge Use Case

use crate::application::config::PowConfig;
use crate::domain::clock::Clock;
use crate::domain::entities::Stamp;
use crate::domain::value_objects::{FIELD_SEPARATOR, StampTime, generate_nonce};
use crate::error::{PowError, PowResult};
use chrono::{DateTime, Utc};
use platform::crypto::HashAlgorithm;
use rand::Rng;
use std::sync::Arc;

const DEFAULT_BITS: u32 = 4;
const DEFAULT_NONCE_LEN: usize = 10;

/// Builds signed, unsolved stamps
#[derive(Debug, Clone)]
pub struct Minter {
    algorithm: HashAlgorithm,
    private_key: String,
    bits: u32,
    nonce_len: usize,
}

impl Minter {
    pub fn new(algorithm: HashAlgorithm, private_key: impl Into<String>) -> Self {
        Self {
            algorithm,
            private_key: private_key.into(),
            bits: DEFAULT_BITS,
            nonce_len: DEFAULT_NONCE_LEN,
        }
    }

    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    pub fn with_nonce_len(mut self, nonce_len: usize) -> Self {
        self.nonce_len = nonce_len;
        self
    }

    pub fn from_config(config: &PowConfig) -> Self {
        Self::new(config.algorithm, config.private_key.clone())
            .with_bits(config.difficulty_bits)
            .with_nonce_len(config.nonce_len)
    }

    /// Mint the 8-field challenge text for `resource`
    pub fn mint<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        resource: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> PowResult<String> {
        if resource.contains(FIELD_SEPARATOR) {
            return Err(PowError::InvalidResource(resource.to_string()));
        }
        if !StampTime::is_representable(issued_at) || !StampTime::is_representable(expires_at) {
            return Err(PowError::InvalidConfig(format!(
                "stamp window {issued_at} .. {expires_at} is outside two-digit years"
            )));
        }
        let stamp = Stamp::new(
            self.bits,
            StampTime::from_datetime(issued_at),
            StampTime::from_datetime(expires_at),
            resource,
            self.algorithm,
            generate_nonce(rng, self.nonce_len),
        );
        Ok(stamp.sign(&self.private_key))
    }
}

/// Output of issuing a challenge
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub stamp: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue Challenge Use Case
pub struct IssueChallengeUseCase<C>
where
    C: Clock,
{
    minter: Minter,
    config: Arc<PowConfig>,
    clock: C,
}

impl<C> IssueChallengeUseCase<C>
where
    C: Clock,
{
    pub fn new(config: Arc<PowConfig>, clock: C) -> Self {
        Self {
            minter: Minter::from_config(&config),
            config,
            clock,
        }
    }

    pub fn execute<R: Rng + ?Sized>(&self, rng: &mut R) -> PowResult<IssuedChallenge> {
        let issued_at = self.clock.now();
        let expires_at = self.config.expires_at(issued_at);
        let stamp = self
            .minter
            .mint(rng, &self.config.resource, issued_at, expires_at)?;

        tracing::info!(
            resource = %self.config.resource,
            difficulty = self.config.difficulty_bits,
            algorithm = %self.config.algorithm,
            %expires_at,
            "Issued challenge"
        );

        Ok(IssuedChallenge { stamp, expires_at })
    }
}
