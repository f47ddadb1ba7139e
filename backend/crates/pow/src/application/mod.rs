//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod config;
pub mod issue_challenge;
pub mod solve_challenge;
pub mod verify_solution;
