//! Presentation Layer
//!
//! Line protocol over TCP: wire messages, the session state machines for both
//! ends, the accept loop and the post-admission feed.

pub mod client;
pub mod feed;
pub mod listener;
pub mod message;
pub mod server;
pub mod transport;
