//! Infrastructure Layer - CPU-bound search machinery

pub mod search;
