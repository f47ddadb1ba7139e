//! Domain Entities
//!
//! The stamp: a signed, time-limited proof-of-work token.
//!
//! Text form:
//!
//! ```text
//! version:bits:issuedAt:expiredAt:resource:algorithm:nonce:signature[:counter]
//! ```
//!
//! The signature covers the first seven fields only, so a solver may append
//! any counter without invalidating it.

use crate::domain::value_objects::{
    FIELD_SEPARATOR, STAMP_VERSION, StampTime, decode_counter, encode_counter,
};
use crate::error::{PowError, PowResult};
use chrono::{DateTime, Utc};
use platform::crypto::{HashAlgorithm, constant_time_eq, from_base64, to_base64};
use std::fmt;
use std::str::FromStr;

/// Stamp entity - a challenge issued to a client, solved or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub version: u32,
    /// Required leading zero bits
    pub bits: u32,
    pub issued_at: StampTime,
    pub expired_at: StampTime,
    /// Opaque name of what access is granted to
    pub resource: String,
    /// Digest algorithm name, resolved through the registry
    pub algorithm: String,
    pub nonce: String,
    /// Base64 keyed digest of the prefix; empty until signed
    pub signature: String,
    /// Proof-of-work witness; `None` while unsolved
    pub counter: Option<u32>,
}

impl Stamp {
    /// Create an unsigned, unsolved stamp
    pub fn new(
        bits: u32,
        issued_at: StampTime,
        expired_at: StampTime,
        resource: impl Into<String>,
        algorithm: HashAlgorithm,
        nonce: impl Into<String>,
    ) -> Self {
        Self {
            version: STAMP_VERSION,
            bits,
            issued_at,
            expired_at,
            resource: resource.into(),
            algorithm: algorithm.name().to_string(),
            nonce: nonce.into(),
            signature: String::new(),
            counter: None,
        }
    }

    /// Parse the text form
    ///
    /// Needs 8 fields, or 9 when solved. Unknown algorithm names are kept
    /// verbatim and only resolved when hashing.
    pub fn parse(text: &str) -> PowResult<Self> {
        let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
        if fields.len() < 8 {
            return Err(PowError::MalformedStamp(format!(
                "expected at least 8 fields, got {}",
                fields.len()
            )));
        }
        if fields.len() > 9 {
            return Err(PowError::MalformedStamp(format!(
                "expected at most 9 fields, got {}",
                fields.len()
            )));
        }

        let version = parse_int(fields[0], "version")?;
        let bits = parse_int(fields[1], "bits")?;
        let issued_at = fields[2].parse()?;
        let expired_at = fields[3].parse()?;
        let counter = fields.get(8).map(|field| decode_counter(field)).transpose()?;

        Ok(Self {
            version,
            bits,
            issued_at,
            expired_at,
            resource: fields[4].to_string(),
            algorithm: fields[5].to_string(),
            nonce: fields[6].to_string(),
            signature: fields[7].to_string(),
            counter,
        })
    }

    /// Canonical seven-field prefix covered by the signature
    pub fn serialize(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.version,
            self.bits,
            self.issued_at,
            self.expired_at,
            self.resource,
            self.algorithm,
            self.nonce
        )
    }

    /// Registry entry for the declared algorithm (default on unknown names)
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::lookup_by_name(&self.algorithm)
    }

    fn keyed_digest(&self, private_key: &str) -> Vec<u8> {
        let mut keyed = String::with_capacity(private_key.len() + 64);
        keyed.push_str(private_key);
        keyed.push_str(&self.serialize());
        self.hash_algorithm().digest(keyed.as_bytes())
    }

    /// Sign the prefix and return the 8-field unsolved text
    pub fn sign(&self, private_key: &str) -> String {
        let signature = to_base64(&self.keyed_digest(private_key));
        format!("{}:{}", self.serialize(), signature)
    }

    /// Recompute the keyed digest and compare with the carried signature
    pub fn verify_signature(&self, private_key: &str) -> PowResult<()> {
        let provided = from_base64(&self.signature).map_err(|_| PowError::InvalidSignature)?;
        if !constant_time_eq(&provided, &self.keyed_digest(private_key)) {
            return Err(PowError::InvalidSignature);
        }
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expired_at.is_before(now)
    }

    pub fn is_solved(&self) -> bool {
        self.counter.is_some()
    }

    /// Counter the search starts from
    pub fn start_counter(&self) -> u32 {
        self.counter.unwrap_or_default()
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.serialize(), self.signature)?;
        if let Some(counter) = self.counter {
            write!(f, ":{}", encode_counter(counter))?;
        }
        Ok(())
    }
}

impl FromStr for Stamp {
    type Err = PowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stamp::parse(s)
    }
}

fn parse_int(field: &str, name: &str) -> PowResult<u32> {
    field
        .parse()
        .map_err(|e| PowError::MalformedStamp(format!("invalid {name} {field:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PRIVATE_KEY: &str = "private-key";
    const PREFIX: &str = "1:2:231103022237:321103022237:127.0.0.1:SHA-256:ZG27RRvTK";
    const SIGNATURE: &str = "u/t58m9ElIkm6F6CuUOcBWlGpL7FJF3mcjGvyYsGU7Q=";

    fn reference_stamp() -> Stamp {
        Stamp::new(
            2,
            "231103022237".parse().unwrap(),
            "321103022237".parse().unwrap(),
            "127.0.0.1",
            HashAlgorithm::Sha256,
            "ZG27RRvTK",
        )
    }

    #[test]
    fn test_serialize_prefix() {
        assert_eq!(reference_stamp().serialize(), PREFIX);
    }

    #[test]
    fn test_sign_golden_vector() {
        assert_eq!(
            reference_stamp().sign(PRIVATE_KEY),
            format!("{PREFIX}:{SIGNATURE}")
        );
    }

    #[test]
    fn test_sign_uses_declared_algorithm() {
        let mut stamp = reference_stamp();
        stamp.algorithm = HashAlgorithm::Sha1.name().to_string();
        let signed = stamp.sign(PRIVATE_KEY);
        assert!(signed.ends_with(":7R6mddBwSFKtzhQQ23whc/cSNhM="));

        stamp.algorithm = HashAlgorithm::Sha512.name().to_string();
        let signed = Stamp::parse(&stamp.sign(PRIVATE_KEY)).unwrap();
        assert_eq!(from_base64(&signed.signature).unwrap().len(), 64);
    }

    #[test]
    fn test_parse_unsolved() {
        let stamp = Stamp::parse(&format!("{PREFIX}:{SIGNATURE}")).unwrap();
        assert_eq!(stamp.version, 1);
        assert_eq!(stamp.bits, 2);
        assert_eq!(stamp.resource, "127.0.0.1");
        assert_eq!(stamp.algorithm, "SHA-256");
        assert_eq!(stamp.nonce, "ZG27RRvTK");
        assert_eq!(stamp.signature, SIGNATURE);
        assert!(!stamp.is_solved());
        assert_eq!(stamp.start_counter(), 0);
    }

    #[test]
    fn test_parse_solved() {
        let stamp = Stamp::parse(&format!("{PREFIX}:{SIGNATURE}:BAAAAA==")).unwrap();
        assert_eq!(stamp.counter, Some(4));
        assert!(stamp.is_solved());
    }

    #[test]
    fn test_round_trip() {
        let mut stamp = Stamp::parse(&reference_stamp().sign(PRIVATE_KEY)).unwrap();
        assert_eq!(Stamp::parse(&stamp.to_string()).unwrap(), stamp);

        stamp.counter = Some(0xDEAD_BEEF);
        assert_eq!(stamp.to_string().parse::<Stamp>().unwrap(), stamp);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases = [
            "1:2:231103022237:321103022237:127.0.0.1:SHA-256:ZG27RRvTK".to_string(),
            format!("x:2:231103022237:321103022237:r:SHA-256:n:{SIGNATURE}"),
            format!("1:-2:231103022237:321103022237:r:SHA-256:n:{SIGNATURE}"),
            format!("1:2:2311030222:321103022237:r:SHA-256:n:{SIGNATURE}"),
            format!("1:2:231103022237:32110302223z:r:SHA-256:n:{SIGNATURE}"),
            format!("1:2:231103022237:321103022237:r:SHA-256:n:{SIGNATURE}:%%%"),
            format!("1:2:231103022237:321103022237:r:SHA-256:n:{SIGNATURE}:AAAAAA==:x"),
            String::new(),
        ];
        for text in cases {
            assert!(
                matches!(Stamp::parse(&text), Err(PowError::MalformedStamp(_))),
                "{text:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_keeps_unknown_algorithm() {
        let stamp =
            Stamp::parse(&format!("1:2:231103022237:321103022237:r:WHIRLPOOL:n:{SIGNATURE}"))
                .unwrap();
        assert_eq!(stamp.algorithm, "WHIRLPOOL");
        assert_eq!(stamp.hash_algorithm(), HashAlgorithm::Sha1);
    }

    #[test]
    fn test_verify_signature() {
        let stamp = Stamp::parse(&reference_stamp().sign(PRIVATE_KEY)).unwrap();
        assert!(stamp.verify_signature(PRIVATE_KEY).is_ok());
        assert!(matches!(
            stamp.verify_signature("other-key"),
            Err(PowError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_signature_ignores_counter() {
        let mut stamp = Stamp::parse(&reference_stamp().sign(PRIVATE_KEY)).unwrap();
        stamp.counter = Some(12345);
        assert!(stamp.verify_signature(PRIVATE_KEY).is_ok());
    }

    #[test]
    fn test_single_character_tamper_breaks_signature() {
        let signed = reference_stamp().sign(PRIVATE_KEY);
        let prefix_len = PREFIX.len();
        for (i, ch) in signed.char_indices().take(prefix_len) {
            if ch == FIELD_SEPARATOR {
                continue;
            }
            let replacement = if ch == '1' { '3' } else { '1' };
            let mut tampered = signed.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());
            // Some edits yield an unparsable timestamp; those fail even earlier
            if let Ok(stamp) = Stamp::parse(&tampered) {
                assert!(
                    matches!(
                        stamp.verify_signature(PRIVATE_KEY),
                        Err(PowError::InvalidSignature)
                    ),
                    "tamper at {i} went unnoticed: {tampered}"
                );
            }
        }
    }

    #[test]
    fn test_garbled_signature_is_invalid() {
        let mut stamp = Stamp::parse(&reference_stamp().sign(PRIVATE_KEY)).unwrap();
        stamp.signature = "not base64!".to_string();
        assert!(matches!(
            stamp.verify_signature(PRIVATE_KEY),
            Err(PowError::InvalidSignature)
        ));
    }

    #[test]
    fn test_is_expired() {
        let stamp = reference_stamp();
        let before = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let at = Utc.with_ymd_and_hms(2032, 11, 3, 2, 22, 37).unwrap();
        let after = Utc.with_ymd_and_hms(2032, 11, 3, 2, 22, 38).unwrap();
        assert!(!stamp.is_expired(before));
        assert!(!stamp.is_expired(at));
        assert!(stamp.is_expired(after));
    }
}
