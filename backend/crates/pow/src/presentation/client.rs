//! Client session
//!
//! ```text
//! Connected -> AwaitingChallenge -> Solving -> AwaitingResult -> Done
//! ```
//!
//! The request goes out on connect. `REJECT` ends the exchange with the
//! server's reason; an opcode the client does not know, or one that arrives
//! out of turn, counts as a rejection too.

use crate::application::solve_challenge::ChallengeSolver;
use crate::error::{PowError, PowResult};
use crate::presentation::message::{Message, Opcode};
use crate::presentation::transport::MessageStream;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Connected,
    AwaitingChallenge,
    Solving,
    AwaitingResult,
    Done,
}

pub struct ClientSession<S, V> {
    stream: MessageStream<S>,
    solver: V,
    state: ClientState,
}

impl<S, V> ClientSession<S, V>
where
    S: AsyncRead + AsyncWrite + Unpin,
    V: ChallengeSolver,
{
    pub fn new(stream: S, solver: V) -> Self {
        Self {
            stream: MessageStream::new(stream),
            solver,
            state: ClientState::Connected,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Run the exchange; returns the `ACCESS_GRANTED` payload
    ///
    /// A solver failure is returned as is and nothing is sent for it.
    pub async fn run(&mut self) -> PowResult<String> {
        let result = self.exchange().await;
        self.state = ClientState::Done;
        result
    }

    async fn exchange(&mut self) -> PowResult<String> {
        self.stream.send(Opcode::RequestChallenge, "").await?;
        self.state = ClientState::AwaitingChallenge;

        loop {
            let message = self.stream.read_message().await?;
            match (self.state, message.opcode) {
                (ClientState::AwaitingChallenge, Opcode::Challenge) => {
                    self.state = ClientState::Solving;
                    tracing::debug!(challenge = %message.payload, "Solving challenge");
                    let solved = self.solver.solve_challenge(&message.payload).await?;
                    self.stream.send(Opcode::SolvedChallenge, &solved).await?;
                    self.state = ClientState::AwaitingResult;
                }
                (ClientState::AwaitingResult, Opcode::AccessGranted) => {
                    tracing::info!(message = %message.payload, "Access granted");
                    return Ok(message.payload);
                }
                (_, Opcode::Reject) => {
                    tracing::warn!(reason = %message.payload, "Rejected by server");
                    return Err(PowError::Rejected(message.payload));
                }
                (state, opcode) => {
                    tracing::warn!(?state, %opcode, "Unexpected message");
                    return Err(PowError::Rejected(format!("unexpected {opcode}")));
                }
            }
        }
    }

    /// Next message after admission, such as a feed `MSG`
    pub async fn next_message(&mut self) -> PowResult<Message> {
        self.stream.read_message().await
    }

    pub fn into_stream(self) -> MessageStream<S> {
        self.stream
    }
}
