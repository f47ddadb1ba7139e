//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Stamp)
//! - Domain value objects (StampTime, Difficulty, nonce and counter encoding)
//! - Domain services (difficulty predicate)
//! - Clock abstraction

pub mod clock;
pub mod entities;
pub mod services;
pub mod value_objects;
