//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Digest algorithm registry (SHA-1, SHA-256, SHA-512)
//! - Base64 helpers and byte comparison
//! - Random token generation from a caller-supplied generator

pub mod crypto;
