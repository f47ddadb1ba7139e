//! Post-admission feed
//!
//! Admitted clients get one `MSG` line per interval, cycling through the
//! configured messages until they hang up.

use crate::application::config::PowConfig;
use crate::error::{PowError, PowResult};
use crate::presentation::message::Opcode;
use crate::presentation::transport::MessageStream;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone)]
pub struct Feed {
    messages: Vec<String>,
    interval: Duration,
}

impl Feed {
    pub fn new(messages: Vec<String>, interval: Duration) -> Self {
        Self { messages, interval }
    }

    pub fn from_config(config: &PowConfig) -> Self {
        Self::new(config.feed_messages.clone(), config.feed_interval)
    }

    /// Stream messages until the peer disconnects
    ///
    /// The first message goes out one interval after admission. A closed
    /// connection ends the feed normally.
    pub async fn run<S>(&self, stream: &mut MessageStream<S>) -> PowResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.messages.is_empty() {
            return Ok(());
        }
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut sent = 0u64;
        for message in self.messages.iter().cycle() {
            ticker.tick().await;
            match stream.send(Opcode::Msg, message).await {
                Ok(()) => sent += 1,
                Err(PowError::ConnectionClosed) => {
                    tracing::info!(sent, "Feed ended: peer disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
