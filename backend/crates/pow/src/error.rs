//! PoW Error Types
//!
//! Every failure of the stamp protocol and its transport maps to one
//! `PowError` variant. Verification failures render as the human readable
//! reason that is sent to the peer in a `REJECT` message.

use thiserror::Error;

/// PoW-specific result type alias
pub type PowResult<T> = Result<T, PowError>;

/// PoW-specific error variants
#[derive(Debug, Error)]
pub enum PowError {
    /// Stamp text is structurally invalid (field count, integer, timestamp, counter)
    #[error("malformed stamp: {0}")]
    MalformedStamp(String),

    /// Signature does not match the stamp prefix under the server key
    #[error("invalid signature")]
    InvalidSignature,

    /// Stamp validity window has passed
    #[error("stamp has expired")]
    Expired,

    /// Solved stamp does not meet the required difficulty
    #[error("not verified: insufficient proof of work")]
    InsufficientProof,

    /// Solver ran out of its attempt budget
    #[error("attempts exceeded")]
    AttemptsExceeded,

    /// Solver ran past its wall-clock limit
    #[error("solver timed out")]
    SolveTimedOut,

    /// Solver was stopped through its cancel flag
    #[error("solver cancelled")]
    SolveCancelled,

    /// Resource cannot be encoded in a stamp
    #[error("invalid resource {0:?}: must not contain ':'")]
    InvalidResource(String),

    /// Opcode token is not part of the protocol
    #[error("unknown command: {0}")]
    UnknownOpcode(String),

    /// Line could not be read as a protocol message
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Peer rejected the exchange, or answered out of turn
    #[error("rejected: {0}")]
    Rejected(String),

    /// Handshake did not finish in time
    #[error("handshake timed out")]
    HandshakeTimedOut,

    /// Peer closed the connection
    #[error("connection closed")]
    ConnectionClosed,

    /// Configuration failed validation
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Transport error other than a closed connection
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PowError {
    /// Whether the error comes from checking a submitted stamp
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            PowError::MalformedStamp(_)
                | PowError::InvalidSignature
                | PowError::Expired
                | PowError::InsufficientProof
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            PowError::Io(e) => {
                tracing::error!(error = %e, "PoW transport error");
            }
            PowError::Internal(msg) => {
                tracing::error!(message = %msg, "PoW internal error");
            }
            PowError::ConnectionClosed => {
                tracing::info!("connection closed");
            }
            PowError::InvalidSignature
            | PowError::InsufficientProof
            | PowError::HandshakeTimedOut => {
                tracing::warn!(error = %self, "PoW rejected");
            }
            _ => {
                tracing::debug!(error = %self, "PoW error");
            }
        }
    }
}

impl From<std::io::Error> for PowError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => PowError::ConnectionClosed,
            ErrorKind::InvalidData => PowError::MalformedMessage(err.to_string()),
            _ => PowError::Io(err),
        }
    }
}
