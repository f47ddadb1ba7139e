//! End-to-end tests for the PoW gate
//! Both session state machines wired together over in-memory and TCP streams.

#[cfg(test)]
mod protocol_tests {
    use crate::application::config::PowConfig;
    use crate::application::solve_challenge::{Solver, SolverBuilder};
    use crate::error::PowError;
    use crate::presentation::client::ClientSession;
    use crate::presentation::message::{Message, Opcode};
    use crate::presentation::server::{ServerState, serve_connection};
    use crate::presentation::transport::{MAX_LINE_LEN, MessageStream};
    use platform::crypto::HashAlgorithm;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn config(algorithm: HashAlgorithm) -> Arc<PowConfig> {
        Arc::new(PowConfig {
            algorithm,
            difficulty_bits: 4,
            feed_interval: Duration::from_millis(10),
            feed_messages: vec!["first".to_string(), "second".to_string()],
            ..PowConfig::with_private_key("private-key")
        })
    }

    fn solver() -> Solver {
        SolverBuilder::default()
            .max_attempts(100_000)
            .workers(2)
            .build_validated()
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_exchange_over_duplex() {
        for algorithm in HashAlgorithm::ALL {
            let (server_io, client_io) = tokio::io::duplex(4096);
            let server = tokio::spawn(serve_connection(server_io, config(algorithm)));

            let mut client = ClientSession::new(client_io, solver());
            let granted = client.run().await.unwrap();
            assert_eq!(granted, "Welcome to Wolf Pack. AUUFFFF!");

            let feed = client.next_message().await.unwrap();
            assert_eq!(feed, Message::new(Opcode::Msg, "first"));
            let feed = client.next_message().await.unwrap();
            assert_eq!(feed, Message::new(Opcode::Msg, "second"));

            // Hanging up ends the feed cleanly
            drop(client);
            assert!(server.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_garbage_solution_is_rejected_and_closed() {
        let (server_io, client_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(serve_connection(server_io, config(HashAlgorithm::Sha256)));
        let mut peer = MessageStream::new(client_io);

        peer.send(Opcode::RequestChallenge, "").await.unwrap();
        assert_eq!(peer.read_message().await.unwrap().opcode, Opcode::Challenge);

        peer.send(Opcode::SolvedChallenge, "this is not a stamp")
            .await
            .unwrap();
        let reply = peer.read_message().await.unwrap();
        assert_eq!(reply.opcode, Opcode::Reject);
        assert!(reply.payload.starts_with("malformed stamp"));

        assert!(matches!(
            server.await.unwrap(),
            Err(PowError::MalformedStamp(_))
        ));
        assert!(matches!(
            peer.read_message().await,
            Err(PowError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_unsolved_challenge_is_rejected() {
        let (server_io, client_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(serve_connection(server_io, config(HashAlgorithm::Sha1)));
        let mut peer = MessageStream::new(client_io);

        peer.send(Opcode::RequestChallenge, "").await.unwrap();
        let challenge = peer.read_message().await.unwrap().payload;

        // Echo the challenge back without a counter
        peer.send(Opcode::SolvedChallenge, &challenge).await.unwrap();
        assert_eq!(peer.read_message().await.unwrap().opcode, Opcode::Reject);
        assert!(server.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_pipelined_lines_are_not_lost() {
        let (server_io, client_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(serve_connection(server_io, config(HashAlgorithm::Sha256)));
        let mut peer = MessageStream::new(client_io);

        // Two lines in one write: the second must survive the first read
        peer.get_mut()
            .write_all(b"HELLO\nREQUEST_CHALLENGE\n")
            .await
            .unwrap();
        assert_eq!(
            peer.read_message().await.unwrap(),
            Message::new(Opcode::Reject, "unknown command")
        );
        assert_eq!(peer.read_message().await.unwrap().opcode, Opcode::Challenge);

        drop(peer);
        assert!(matches!(
            server.await.unwrap(),
            Err(PowError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_padded_command_after_overlong_line_is_ignored() {
        let (server_io, client_io) = tokio::io::duplex(16 * 1024);
        let server = tokio::spawn(serve_connection(server_io, config(HashAlgorithm::Sha256)));
        let mut peer = MessageStream::new(client_io);

        let mut line = vec![b'X'; MAX_LINE_LEN as usize];
        line.extend_from_slice(b"REQUEST_CHALLENGE\nHELLO\n");
        peer.get_mut().write_all(&line).await.unwrap();

        // One reply for the overlong line, one for HELLO; no challenge
        for _ in 0..2 {
            assert_eq!(
                peer.read_message().await.unwrap(),
                Message::new(Opcode::Reject, "unknown command")
            );
        }

        drop(peer);
        assert!(matches!(
            server.await.unwrap(),
            Err(PowError::ConnectionClosed)
        ));
    }

    #[test]
    fn test_server_state_names() {
        assert!(ServerState::Admitted.is_terminal());
        assert!(ServerState::Rejected.is_terminal());
        assert!(!ServerState::AwaitingSolution.is_terminal());
    }
}

#[cfg(test)]
mod tcp_tests {
    use crate::application::config::PowConfig;
    use crate::application::solve_challenge::SolverBuilder;
    use crate::error::PowError;
    use crate::presentation::client::ClientSession;
    use crate::presentation::listener::serve;
    use crate::presentation::message::Opcode;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_loopback_clients_are_served_concurrently() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = Arc::new(PowConfig {
            difficulty_bits: 3,
            feed_interval: Duration::from_millis(5),
            ..PowConfig::with_private_key("loopback-key")
        });
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, config, async {
            let _ = stop_rx.await;
        }));

        // An idle connection must not block the others
        let _idle = TcpStream::connect(addr).await.unwrap();

        let mut clients = Vec::new();
        for _ in 0..3 {
            clients.push(tokio::spawn(async move {
                let stream = TcpStream::connect(addr).await.unwrap();
                let solver = SolverBuilder::default().build_validated().unwrap();
                let mut session = ClientSession::new(stream, solver);
                let granted = session.run().await?;
                let feed = session.next_message().await?;
                assert_eq!(feed.opcode, Opcode::Msg);
                Ok::<_, PowError>(granted)
            }));
        }
        for client in clients {
            assert_eq!(
                client.await.unwrap().unwrap(),
                "Welcome to Wolf Pack. AUUFFFF!"
            );
        }

        stop_tx.send(()).unwrap();
        assert!(server.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_listener_rejects_invalid_config() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = Arc::new(PowConfig {
            resource: "host:port".to_string(),
            ..PowConfig::with_private_key("k")
        });
        let result = serve(listener, config, std::future::pending()).await;
        assert!(matches!(result, Err(PowError::InvalidResource(_))));
    }
}
