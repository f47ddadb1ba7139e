//! TCP accept loop
//!
//! One task per connection; the loop only accepts and spawns, so a slow or
//! stuck peer never holds up the others.

use crate::application::config::PowConfig;
use crate::error::{PowError, PowResult};
use crate::presentation::server::serve_connection;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

/// Accept connections until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    config: Arc<PowConfig>,
    shutdown: F,
) -> PowResult<()>
where
    F: Future<Output = ()>,
{
    config.validate()?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(
            %addr,
            difficulty = config.difficulty_bits,
            algorithm = %config.algorithm,
            "Gate listening"
        );
    }

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down listener");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        continue;
                    }
                };
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!(error = %e, %peer, "Failed to set TCP_NODELAY");
                }

                let span = tracing::info_span!("conn", id = %Uuid::new_v4(), %peer);
                let config = config.clone();
                tokio::spawn(
                    async move {
                        tracing::info!("Accepted connection");
                        match serve_connection(stream, config).await {
                            Ok(()) => tracing::info!("Connection finished"),
                            Err(PowError::ConnectionClosed) => tracing::info!("Peer disconnected"),
                            Err(e) => e.log(),
                        }
                    }
                    .instrument(span),
                );
            }
        }
    }
}
