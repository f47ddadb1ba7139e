//! Application Configuration
//!
//! Configuration for the gate server and the solving client.

use crate::domain::value_objects::{Difficulty, FIELD_SEPARATOR};
use crate::error::{PowError, PowResult};
use chrono::{DateTime, Utc};
use platform::crypto::HashAlgorithm;
use std::time::Duration;

/// Resource named in every challenge unless configured otherwise
pub const DEFAULT_RESOURCE: &str = "/ACCESS_TO_WOLF_PACK/";

/// Longest accepted stamp validity
pub const MAX_STAMP_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Messages streamed to admitted clients
pub const DEFAULT_FEED_MESSAGES: &[&str] = &[
    "A lone wolf survives the winter. The pack lives through it.",
    "The wolf that howls the loudest is rarely the one that hunts.",
    "Strength of the pack is the wolf, strength of the wolf is the pack.",
    "A wolf does not lose sleep over the opinion of sheep.",
    "Follow the tracks long enough and they lead back to you.",
    "Even the oldest wolf was once a pup that tripped in the snow.",
    "The moon does not answer the wolf. The wolf howls anyway.",
    "Hunger teaches the pack more than any elder.",
];

/// PoW server configuration
#[derive(Debug, Clone)]
pub struct PowConfig {
    /// Shared secret the stamps are signed with
    pub private_key: String,
    /// Digest algorithm for new stamps
    pub algorithm: HashAlgorithm,
    /// Difficulty in leading zero bits
    pub difficulty_bits: u32,
    /// How long a minted stamp stays valid
    pub stamp_ttl: Duration,
    /// Nonce length in symbols
    pub nonce_len: usize,
    /// Resource named in minted stamps
    pub resource: String,
    /// Payload of `ACCESS_GRANTED`
    pub grant_message: String,
    /// Upper bound for the whole challenge exchange
    pub handshake_timeout: Duration,
    /// Delay between feed messages after admission
    pub feed_interval: Duration,
    pub feed_messages: Vec<String>,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            private_key: String::new(),
            algorithm: HashAlgorithm::Sha256,
            difficulty_bits: Difficulty::DEFAULT.bits(),
            stamp_ttl: Duration::from_secs(10),
            nonce_len: 10,
            resource: DEFAULT_RESOURCE.to_string(),
            grant_message: "Welcome to Wolf Pack. AUUFFFF!".to_string(),
            handshake_timeout: Duration::from_secs(60),
            feed_interval: Duration::from_secs(3),
            feed_messages: DEFAULT_FEED_MESSAGES
                .iter()
                .map(|message| message.to_string())
                .collect(),
        }
    }
}

impl PowConfig {
    /// Default configuration signing with `private_key`
    pub fn with_private_key(private_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> PowResult<()> {
        if self.private_key.is_empty() {
            return Err(PowError::InvalidConfig("private key must be set".into()));
        }
        if Difficulty::new(self.difficulty_bits).is_none() {
            return Err(PowError::InvalidConfig(format!(
                "difficulty must be <= {} bits",
                Difficulty::MAX
            )));
        }
        if self.stamp_ttl.is_zero() {
            return Err(PowError::InvalidConfig("stamp ttl must be positive".into()));
        }
        if self.stamp_ttl > MAX_STAMP_TTL {
            return Err(PowError::InvalidConfig(format!(
                "stamp ttl must be <= {} days",
                MAX_STAMP_TTL.as_secs() / 86_400
            )));
        }
        if self.nonce_len == 0 {
            return Err(PowError::InvalidConfig("nonce length must be >= 1".into()));
        }
        if self.resource.contains(FIELD_SEPARATOR) {
            return Err(PowError::InvalidResource(self.resource.clone()));
        }
        if self.feed_interval.is_zero() {
            return Err(PowError::InvalidConfig("feed interval must be positive".into()));
        }
        Ok(())
    }

    /// Expiry for a stamp issued at `issued_at`
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.stamp_ttl)
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Solving client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Counters tried beyond the first before giving up
    pub max_attempts: u32,
    /// Solver threads
    pub workers: usize,
    /// Wall-clock limit for one solve
    pub solve_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1000,
            workers: 1,
            solve_timeout: None,
        }
    }
}
