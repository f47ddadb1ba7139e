//! Server session
//!
//! ```text
//! AwaitingRequest --REQUEST_CHALLENGE--> AwaitingSolution
//! AwaitingSolution --SOLVED_CHALLENGE ok--> Admitted
//! AwaitingSolution --SOLVED_CHALLENGE bad--> Rejected
//! ```
//!
//! Anything else before admission is answered with `REJECT unknown command`
//! and leaves the state unchanged. A repeated `REQUEST_CHALLENGE` replaces the
//! outstanding challenge.

use crate::application::config::PowConfig;
use crate::application::issue_challenge::IssueChallengeUseCase;
use crate::application::verify_solution::VerifySolutionUseCase;
use crate::domain::clock::{Clock, SystemClock};
use crate::error::{PowError, PowResult};
use crate::presentation::feed::Feed;
use crate::presentation::message::Opcode;
use crate::presentation::transport::MessageStream;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Reason sent for out-of-turn or unrecognised messages
pub const UNKNOWN_COMMAND: &str = "unknown command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    AwaitingRequest,
    AwaitingSolution,
    Admitted,
    Rejected,
}

impl ServerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerState::Admitted | ServerState::Rejected)
    }
}

/// One connection's challenge exchange
pub struct ServerSession<S, C>
where
    C: Clock,
{
    stream: MessageStream<S>,
    state: ServerState,
    issue: IssueChallengeUseCase<C>,
    verify: VerifySolutionUseCase<C>,
    grant_message: String,
    rng: StdRng,
}

impl<S> ServerSession<S, SystemClock>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: Arc<PowConfig>) -> Self {
        Self::with_parts(stream, config, SystemClock, StdRng::from_os_rng())
    }
}

impl<S, C> ServerSession<S, C>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Clock + Clone,
{
    pub fn with_parts(stream: S, config: Arc<PowConfig>, clock: C, rng: StdRng) -> Self {
        Self {
            stream: MessageStream::new(stream),
            state: ServerState::AwaitingRequest,
            issue: IssueChallengeUseCase::new(config.clone(), clock.clone()),
            verify: VerifySolutionUseCase::new(config.clone(), clock),
            grant_message: config.grant_message.clone(),
            rng,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Handle one incoming message
    ///
    /// A failed verification is sent to the peer as `REJECT <reason>`, moves
    /// the session to `Rejected` and is returned as the error.
    pub async fn step(&mut self) -> PowResult<ServerState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let message = match self.stream.read_message().await {
            Ok(message) => message,
            Err(e @ (PowError::UnknownOpcode(_) | PowError::MalformedMessage(_))) => {
                tracing::debug!(error = %e, state = ?self.state, "Unrecognised message");
                self.stream.send(Opcode::Reject, UNKNOWN_COMMAND).await?;
                return Ok(self.state);
            }
            Err(e) => return Err(e),
        };

        match (self.state, message.opcode) {
            (_, Opcode::RequestChallenge) => {
                let issued = self.issue.execute(&mut self.rng)?;
                self.stream.send(Opcode::Challenge, &issued.stamp).await?;
                self.state = ServerState::AwaitingSolution;
            }
            (ServerState::AwaitingSolution, Opcode::SolvedChallenge) => {
                match self.verify.execute(&message.payload) {
                    Ok(_) => {
                        self.stream
                            .send(Opcode::AccessGranted, &self.grant_message)
                            .await?;
                        self.state = ServerState::Admitted;
                    }
                    Err(e) => {
                        self.state = ServerState::Rejected;
                        self.stream.send(Opcode::Reject, &e.to_string()).await?;
                        return Err(e);
                    }
                }
            }
            (state, opcode) => {
                tracing::debug!(?state, %opcode, "Out of turn message");
                self.stream.send(Opcode::Reject, UNKNOWN_COMMAND).await?;
            }
        }
        Ok(self.state)
    }

    /// Drive the exchange until the client is admitted
    pub async fn run_handshake(&mut self) -> PowResult<()> {
        loop {
            if self.step().await? == ServerState::Admitted {
                return Ok(());
            }
        }
    }

    pub fn stream_mut(&mut self) -> &mut MessageStream<S> {
        &mut self.stream
    }

    pub fn into_stream(self) -> MessageStream<S> {
        self.stream
    }
}

/// Serve one accepted connection: handshake under a deadline, then the feed
pub async fn serve_connection<S>(stream: S, config: Arc<PowConfig>) -> PowResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = ServerSession::new(stream, config.clone());
    let handshake = tokio::time::timeout(config.handshake_timeout, session.run_handshake()).await;
    match handshake {
        Ok(result) => result?,
        Err(_) => {
            // Best effort; the peer may already be gone
            let _ = session
                .stream_mut()
                .send(Opcode::Reject, &PowError::HandshakeTimedOut.to_string())
                .await;
            return Err(PowError::HandshakeTimedOut);
        }
    }

    tracing::info!("Client admitted");
    let mut stream = session.into_stream();
    Feed::from_config(&config).run(&mut stream).await
}
