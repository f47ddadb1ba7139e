//! Domain Value Objects
//!
//! Immutable value types for the stamp protocol.

use crate::error::{PowError, PowResult};
use chrono::{DateTime, Datelike, NaiveDateTime, SubsecRound, Utc};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Stamp protocol revision
pub const STAMP_VERSION: u32 = 1;

/// Separator between stamp fields
pub const FIELD_SEPARATOR: char = ':';

/// Timestamp layout `YYMMDDHHMMSS`
pub const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// Symbols a nonce is drawn from
pub const NONCE_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/=";

/// Point in time with whole-second resolution, as carried in a stamp
///
/// Two-digit years follow the usual pivot: 69..=99 is the 1900s, 00..=68 the 2000s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StampTime(DateTime<Utc>);

impl StampTime {
    /// Years a two-digit stamp year can name
    pub const YEARS: std::ops::RangeInclusive<i32> = 1969..=2068;

    /// Whether `at` survives a format/parse round trip
    pub fn is_representable(at: DateTime<Utc>) -> bool {
        Self::YEARS.contains(&at.year())
    }

    /// Truncates sub-second precision
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(0))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn is_before(&self, other: DateTime<Utc>) -> bool {
        self.0 < other
    }
}

impl fmt::Display for StampTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for StampTime {
    type Err = PowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 12 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PowError::MalformedStamp(format!("invalid timestamp {s:?}")));
        }
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(|naive| Self(naive.and_utc()))
            .map_err(|e| PowError::MalformedStamp(format!("invalid timestamp {s:?}: {e}")))
    }
}

/// Difficulty level for PoW
///
/// Leading zero bits of the double digest. The predicate never reports more
/// than 63 zero bits, so anything above that is unsolvable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difficulty(u32);

impl Difficulty {
    pub const DEFAULT: Difficulty = Difficulty(5);
    pub const MAX: u32 = 63;

    pub fn new(bits: u32) -> Option<Self> {
        (bits <= Self::MAX).then_some(Self(bits))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

/// Generate a nonce of `len` symbols from [`NONCE_ALPHABET`]
pub fn generate_nonce<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    platform::crypto::random_token(rng, NONCE_ALPHABET, len)
}

/// Counter field text: base64 of the little-endian bytes
pub fn encode_counter(counter: u32) -> String {
    platform::crypto::to_base64(&counter.to_le_bytes())
}

/// Inverse of [`encode_counter`]; the payload must be exactly four bytes
pub fn decode_counter(field: &str) -> PowResult<u32> {
    let bytes = platform::crypto::from_base64(field)
        .map_err(|e| PowError::MalformedStamp(format!("invalid counter {field:?}: {e}")))?;
    let bytes: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
        PowError::MalformedStamp(format!("counter must be 4 bytes, got {}", bytes.len()))
    })?;
    Ok(u32::from_le_bytes(bytes))
}
