//! Wire messages
//!
//! One message per line: `<OPCODE> <payload>\n`. Opcodes are written in upper
//! case and matched case-insensitively on receipt.

use crate::error::{PowError, PowResult};
use std::fmt;
use std::str::FromStr;

/// Protocol opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    RequestChallenge,
    Challenge,
    SolvedChallenge,
    AccessGranted,
    Reject,
    /// Informational text, sent only after admission
    Msg,
}

impl Opcode {
    pub const ALL: [Opcode; 6] = [
        Opcode::RequestChallenge,
        Opcode::Challenge,
        Opcode::SolvedChallenge,
        Opcode::AccessGranted,
        Opcode::Reject,
        Opcode::Msg,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Opcode::RequestChallenge => "REQUEST_CHALLENGE",
            Opcode::Challenge => "CHALLENGE",
            Opcode::SolvedChallenge => "SOLVED_CHALLENGE",
            Opcode::AccessGranted => "ACCESS_GRANTED",
            Opcode::Reject => "REJECT",
            Opcode::Msg => "MSG",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Opcode {
    type Err = PowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .into_iter()
            .find(|opcode| opcode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PowError::UnknownOpcode(s.to_string()))
    }
}

/// A decoded line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub opcode: Opcode,
    pub payload: String,
}

impl Message {
    pub fn new(opcode: Opcode, payload: impl Into<String>) -> Self {
        Self {
            opcode,
            payload: payload.into(),
        }
    }

    /// Wire form including the trailing newline
    pub fn encode(&self) -> String {
        encode(self.opcode, &self.payload)
    }

    /// Decode one line; the payload is everything after the first space
    pub fn decode(line: &str) -> PowResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(PowError::MalformedMessage("empty line".into()));
        }
        let (token, payload) = line.split_once(' ').unwrap_or((line, ""));
        Ok(Self {
            opcode: token.parse()?,
            payload: payload.trim().to_string(),
        })
    }
}

/// Wire form of `opcode` with `payload`, newline terminated
pub fn encode(opcode: Opcode, payload: &str) -> String {
    let mut line = String::with_capacity(opcode.as_str().len() + payload.len() + 2);
    line.push_str(opcode.as_str());
    line.push(' ');
    line.push_str(payload);
    line.push('\n');
    line
}
