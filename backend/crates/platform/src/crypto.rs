//! Cryptographic Utilities
//!
//! Digest algorithm registry, Base64 helpers and byte comparison.

use base64::{Engine, engine::general_purpose};
use rand::Rng;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

pub use sha2::digest::DynDigest;

/// Fresh, resettable hash accumulator produced by [`HashAlgorithm::hasher`]
pub type Hasher = Box<dyn DynDigest + Send>;

/// Digest algorithms selectable by name
///
/// The default is the fallback used by [`HashAlgorithm::lookup_by_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

/// Error returned by the strict `FromStr` parse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm: {0} (expected one of SHA-1, SHA-256, SHA-512)")]
pub struct UnknownAlgorithm(pub String);

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
    ];

    /// Stable wire name
    pub const fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Resolve a wire name, falling back to the default on unknown names
    ///
    /// Lookup failure is deliberately not observable here. Use `str::parse`
    /// where an unknown name must be an error.
    pub fn lookup_by_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    /// Create a fresh hasher for this algorithm
    pub fn hasher(&self) -> Hasher {
        match self {
            HashAlgorithm::Sha1 => Box::new(Sha1::default()),
            HashAlgorithm::Sha256 => Box::new(Sha256::default()),
            HashAlgorithm::Sha512 => Box::new(Sha512::default()),
        }
    }

    /// One-shot digest of `data`
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize_reset().into_vec()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HashAlgorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Draw `len` symbols uniformly from `alphabet`
///
/// The generator is supplied by the caller, so seeded generators give
/// reproducible output.
pub fn random_token<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    if alphabet.is_empty() {
        return String::new();
    }
    (0..len)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_digest_known_values() {
        let hash = HashAlgorithm::Sha256.digest(b"hello");
        let expected =
            hex::decode("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
                .unwrap();
        assert_eq!(hash, expected);

        let hash = HashAlgorithm::Sha1.digest(b"hello");
        let expected = hex::decode("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d").unwrap();
        assert_eq!(hash, expected);

        let hash = HashAlgorithm::Sha512.digest(b"hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(hex::encode(&hash[..16]), "9b71d224bd62f3785d96d46ad3ea3d73");
    }

    #[test]
    fn test_hasher_is_resettable() {
        let mut hasher = HashAlgorithm::Sha256.hasher();
        hasher.update(b"first");
        let _ = hasher.finalize_reset();
        hasher.update(b"hello");
        assert_eq!(
            hasher.finalize_reset().into_vec(),
            HashAlgorithm::Sha256.digest(b"hello")
        );
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(HashAlgorithm::lookup_by_name("SHA-1"), HashAlgorithm::Sha1);
        assert_eq!(HashAlgorithm::lookup_by_name("SHA-256"), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::lookup_by_name("SHA-512"), HashAlgorithm::Sha512);
        // Unknown names fall back silently
        assert_eq!(HashAlgorithm::lookup_by_name("MD5"), HashAlgorithm::Sha1);
        assert_eq!(HashAlgorithm::lookup_by_name("sha-256"), HashAlgorithm::Sha1);
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!("SHA-512".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha512));
        let err = "BLAKE3".parse::<HashAlgorithm>().unwrap_err();
        assert_eq!(err, UnknownAlgorithm("BLAKE3".to_string()));
        assert!(err.to_string().contains("BLAKE3"));
    }

    #[test]
    fn test_display_round_trips() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<HashAlgorithm>(), Ok(algorithm));
        }
    }

    #[test]
    fn test_base64_roundtrip() {
        let data = b"hello world";
        let encoded = to_base64(data);
        let decoded = from_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
        assert!(from_base64("not base64!").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8, 2, 3, 4];
        let b = [1u8, 2, 3, 4];
        let c = [1u8, 2, 3, 5];
        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &b[..3]));
    }

    #[test]
    fn test_random_token() {
        let alphabet = b"abc";
        let mut rng = StdRng::seed_from_u64(42);
        let token = random_token(&mut rng, alphabet, 32);
        assert_eq!(token.len(), 32);
        assert!(token.bytes().all(|b| alphabet.contains(&b)));

        // Same seed, same token
        let again = random_token(&mut StdRng::seed_from_u64(42), alphabet, 32);
        assert_eq!(token, again);

        assert_eq!(random_token(&mut rng, b"", 8), "");
    }
}
