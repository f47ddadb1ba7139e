//! Domain Services
//!
//! Pure domain logic for the difficulty predicate shared by solver and verifier.

use platform::crypto::{DynDigest, HashAlgorithm};

/// Count leading zero bits of the first 8 bytes read as a big-endian `u64`
///
/// An all-zero head counts as 63, not 64. Stamps produced by other
/// implementations of this protocol are checked the same way, so solver and
/// verifier must both keep it.
pub fn count_leading_zero_bits(digest: &[u8]) -> u32 {
    let Some(head) = digest.first_chunk::<8>() else {
        return 0;
    };
    match u64::from_be_bytes(*head) {
        0 => 63,
        value => value.leading_zeros(),
    }
}

/// Double digest of `data`: the second pass hashes the first digest, not `data`
pub fn double_digest(hasher: &mut dyn DynDigest, data: &[u8]) -> Box<[u8]> {
    hasher.update(data);
    let first = hasher.finalize_reset();
    hasher.update(&first);
    hasher.finalize_reset()
}

/// Check `data` against the difficulty with a reusable hasher
pub fn meets_difficulty(hasher: &mut dyn DynDigest, data: &[u8], bits: u32) -> bool {
    count_leading_zero_bits(&double_digest(hasher, data)) >= bits
}

/// Verify a PoW candidate
pub fn verify_pow(algorithm: HashAlgorithm, data: &[u8], bits: u32) -> bool {
    let mut hasher = algorithm.hasher();
    meets_difficulty(hasher.as_mut(), data, bits)
}
