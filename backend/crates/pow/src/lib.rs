//! PoW (Proof of Work) Gate
//!
//! Hashcash-style admission over a line protocol: the server hands out signed,
//! time-limited stamps; a client brute-forces a counter so the double digest of
//! the solved stamp has enough leading zero bits; the server verifies and admits.
//!
//! Clean Architecture structure:
//! - `domain/` - Stamp entity, value objects, difficulty predicate, clock
//! - `application/` - Config and use cases (issue, solve, verify)
//! - `infra/` - Parallel counter search
//! - `presentation/` - Wire messages, sessions, accept loop, feed
//!
//! ## Security Model
//! - The server is the sole authority for difficulty, expiry and signature
//! - Stamps are stateless: any stamp signed with the server key is accepted
//!   until it expires, and nothing prevents replay within that window
//! - The algorithm field is covered by the signature

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{ClientConfig, PowConfig};
pub use application::issue_challenge::Minter;
pub use application::solve_challenge::{ChallengeSolver, Solver, SolverBuilder};
pub use application::verify_solution::verify_stamp;
pub use domain::entities::Stamp;
pub use error::{PowError, PowResult};
pub use infra::search::StopFlag;
pub use presentation::client::ClientSession;
pub use presentation::listener::serve;
pub use presentation::server::{ServerSession, serve_connection};

#[cfg(test)]
mod tests;
