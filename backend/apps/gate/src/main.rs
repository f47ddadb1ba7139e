//! Gate Entry Point
//!
//! `gate server` accepts TCP clients and admits those that solve a
//! proof-of-work challenge. `gate client` connects, solves, and prints the
//! messages streamed after admission.
//! Uses `anyhow` for startup errors; protocol errors are `pow::PowError`.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use platform::crypto::HashAlgorithm;
use pow::{ClientConfig, ClientSession, PowConfig, PowError, Solver, StopFlag};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gate", about = "Proof-of-work gated TCP service", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue challenges and admit clients that solve them
    Server(ServerArgs),
    /// Solve a challenge and follow the feed
    Client(ClientArgs),
}

#[derive(Args)]
struct ServerArgs {
    #[arg(long, env = "GATE_ADDR", default_value = "127.0.0.1:9001")]
    addr: String,
    /// Secret the stamps are signed with
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
    /// SHA-1, SHA-256 or SHA-512
    #[arg(long, env = "POW_ALGORITHM", default_value = "SHA-256")]
    algo: HashAlgorithm,
    /// Required leading zero bits
    #[arg(short, long, env = "POW_DIFFICULTY", default_value_t = 5)]
    difficulty: u32,
    #[arg(long, env = "POW_TTL_SECS", default_value_t = 10)]
    ttl_secs: u64,
    #[arg(long, default_value_t = 10)]
    nonce_len: usize,
    #[arg(long, default_value_t = 3)]
    feed_interval_secs: u64,
    #[arg(long, default_value_t = 60)]
    handshake_timeout_secs: u64,
}

#[derive(Args)]
struct ClientArgs {
    #[arg(long, env = "GATE_DST", default_value = "127.0.0.1:9001")]
    dst: String,
    #[arg(long, env = "POW_MAX_ATTEMPTS", default_value_t = 1000)]
    max_attempts: u32,
    /// Solver threads (defaults to the available parallelism)
    #[arg(long)]
    workers: Option<usize>,
    /// Give up solving after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gate=info,pow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Server(args) => run_server(args).await,
        Command::Client(args) => run_client(args).await,
    }
}

async fn run_server(args: ServerArgs) -> anyhow::Result<()> {
    let config = PowConfig {
        private_key: args.private_key,
        algorithm: args.algo,
        difficulty_bits: args.difficulty,
        stamp_ttl: Duration::from_secs(args.ttl_secs),
        nonce_len: args.nonce_len,
        feed_interval: Duration::from_secs(args.feed_interval_secs),
        handshake_timeout: Duration::from_secs(args.handshake_timeout_secs),
        ..PowConfig::default()
    };
    config.validate().context("invalid server configuration")?;

    let listener = TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;

    pow::serve(listener, Arc::new(config), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await?;

    Ok(())
}

async fn run_client(args: ClientArgs) -> anyhow::Result<()> {
    let workers = args.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    });
    let client_config = ClientConfig {
        max_attempts: args.max_attempts,
        workers,
        solve_timeout: args.timeout_secs.map(Duration::from_secs),
    };
    let cancel = Arc::new(StopFlag::new());
    let solver = Solver {
        cancel: Some(cancel.clone()),
        ..Solver::from_config(&client_config)?
    };

    let stream = TcpStream::connect(&args.dst)
        .await
        .with_context(|| format!("failed to connect to {}", args.dst))?;
    tracing::info!(dst = %args.dst, workers, "Connected");

    let mut session = ClientSession::new(stream, solver);
    tokio::select! {
        result = follow(&mut session) => result,
        _ = tokio::signal::ctrl_c() => {
            cancel.force_stop();
            tracing::info!("Interrupted");
            Ok(())
        }
    }
}

/// Pass the challenge, then log feed messages until the server hangs up
async fn follow(session: &mut ClientSession<TcpStream, Solver>) -> anyhow::Result<()> {
    let granted = session.run().await?;
    println!("{granted}");

    loop {
        match session.next_message().await {
            Ok(message) => tracing::info!(opcode = %message.opcode, "{}", message.payload),
            Err(PowError::ConnectionClosed) => {
                tracing::info!("Server closed the connection");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
}
