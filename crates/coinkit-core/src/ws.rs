//! WebSocket smoke session against the backend's socket endpoint.
//!
//! The session sends a fixed list of text commands, waiting for exactly one
//! reply to each before sending the next, then collects unsolicited event
//! messages until a single listen deadline passes.

use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, trace};

use crate::error::WsError;

pub const DEFAULT_WS_URL: &str = "ws://localhost:9000/api/ws";

/// Commands sent by a full smoke session, in order. The last one is
/// deliberately unrecognized by the server.
pub const DEFAULT_COMMANDS: [&str; 5] = ["subscribe", "create", "buy", "sell", "unknown"];

// ==============================================================================
// Session Types
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    pub commands: Vec<String>,
    /// Upper bound on the wait for each command's reply.
    pub reply_timeout: Duration,
    /// Length of the listen window that follows the last reply.
    pub listen_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_owned(),
            commands: DEFAULT_COMMANDS.iter().map(|c| (*c).to_owned()).collect(),
            reply_timeout: Duration::from_secs(10),
            listen_window: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub command: String,
    pub reply: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// One entry per command, in send order.
    pub replies: Vec<CommandReply>,
    /// Messages received during the listen window.
    pub events: Vec<String>,
    /// The server closed the socket before the listen window ran out.
    pub closed_by_peer: bool,
}

// ==============================================================================
// Session
// ==============================================================================

/// Run one session against `config.url`.
///
/// Any failure after the connection is established is returned as
/// [`WsError::Incomplete`], carrying the replies and events received so far.
pub async fn run_session(config: &SessionConfig) -> Result<SessionReport, WsError> {
    let (mut socket, _) = tokio_tungstenite::connect_async(config.url.as_str())
        .await
        .map_err(|source| WsError::Connect {
            url: config.url.clone(),
            source,
        })?;
    info!(url = %config.url, "websocket connected");

    let mut report = SessionReport::default();
    if let Err(source) = exchange(&mut socket, config, &mut report).await {
        debug!(replies = report.replies.len(), error = %source, "websocket session stopped early");
        return Err(WsError::Incomplete {
            report: Box::new(report),
            source: Box::new(source),
        });
    }

    if !report.closed_by_peer {
        if let Err(e) = socket.close(None).await {
            debug!(error = %e, "close handshake failed");
        }
    }

    info!(
        replies = report.replies.len(),
        events = report.events.len(),
        "websocket session finished"
    );
    Ok(report)
}

/// Command/reply phase followed by the listen window. Results are recorded
/// into `report` as they arrive.
async fn exchange<S>(
    socket: &mut S,
    config: &SessionConfig,
    report: &mut SessionReport,
) -> Result<(), WsError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    for command in &config.commands {
        socket.send(Message::Text(command.clone())).await?;
        debug!(command = %command, "command sent");

        let reply = timeout(config.reply_timeout, next_text(socket))
            .await
            .map_err(|_| WsError::ReplyTimeout {
                command: command.clone(),
                timeout_ms: config.reply_timeout.as_millis(),
            })??
            .ok_or_else(|| WsError::Closed {
                command: command.clone(),
            })?;
        debug!(command = %command, reply = %reply, "reply received");

        report.replies.push(CommandReply {
            command: command.clone(),
            reply,
        });
    }

    let deadline = Instant::now() + config.listen_window;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(());
        }
        match timeout(remaining, next_text(socket)).await {
            Err(_) => return Ok(()),
            Ok(Ok(Some(event))) => {
                debug!(event = %event, "event received");
                report.events.push(event);
            }
            Ok(Ok(None)) => {
                debug!("peer closed the socket during the listen window");
                report.closed_by_peer = true;
                return Ok(());
            }
            Ok(Err(e)) => return Err(e),
        }
    }
}

/// Next text frame, skipping control and binary frames.
/// `Ok(None)` means the connection is closed.
async fn next_text<S>(stream: &mut S) -> Result<Option<String>, WsError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => return Ok(Some(text)),
            Ok(Message::Close(frame)) => {
                trace!(?frame, "close frame");
                return Ok(None);
            }
            Ok(other) => trace!(?other, "skipping non-text frame"),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(None)
            }
            Err(e) => return Err(WsError::Protocol(e)),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::error::UrlError;

    use super::*;

    /// How the test server behaves once it has answered its commands.
    #[derive(Clone, Copy)]
    enum AfterReplies {
        /// Push events, then hold the connection open without reading.
        Hold,
        /// Push events, then close.
        Close,
    }

    struct Script {
        replies: usize,
        events: Vec<&'static str>,
        after: AfterReplies,
        /// Send a ping and a binary frame ahead of every reply.
        control_frames: bool,
    }

    impl Script {
        fn new(replies: usize, events: Vec<&'static str>, after: AfterReplies) -> Self {
            Self {
                replies,
                events,
                after,
                control_frames: false,
            }
        }
    }

    async fn spawn_server(script: Script) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(tcp)
                .await
                .expect("handshake");

            let mut answered = 0;
            while answered < script.replies {
                match ws.next().await {
                    Some(Ok(Message::Text(cmd))) => {
                        if script.control_frames {
                            ws.send(Message::Ping(vec![1, 2, 3]))
                                .await
                                .expect("send ping");
                            ws.send(Message::Binary(vec![0xde, 0xad]))
                                .await
                                .expect("send binary");
                        }
                        let reply = match cmd.as_str() {
                            "subscribe" | "create" | "buy" | "sell" => format!("ok:{cmd}"),
                            _ => format!("unknown command: {cmd}"),
                        };
                        ws.send(Message::Text(reply)).await.expect("send reply");
                        answered += 1;
                    }
                    Some(Ok(_)) => continue,
                    _ => return,
                }
            }

            for event in script.events {
                ws.send(Message::Text(event.to_owned()))
                    .await
                    .expect("send event");
            }

            match script.after {
                AfterReplies::Hold => tokio::time::sleep(Duration::from_secs(5)).await,
                AfterReplies::Close => {
                    let _ = ws.close(None).await;
                    // Keep the TCP stream open until the client acknowledges.
                    while let Some(Ok(_)) = ws.next().await {}
                }
            }
        });

        addr
    }

    fn config(addr: SocketAddr, listen_window: Duration) -> SessionConfig {
        SessionConfig {
            url: format!("ws://{addr}/api/ws"),
            reply_timeout: Duration::from_secs(2),
            listen_window,
            ..SessionConfig::default()
        }
    }

    fn replies_of(report: &SessionReport) -> Vec<&str> {
        report.replies.iter().map(|r| r.reply.as_str()).collect()
    }

    #[tokio::test]
    async fn replies_in_send_order_then_events_until_deadline() {
        let events = vec!["{\"type\":\"buy\"}", "{\"type\":\"sell\"}"];
        let addr = spawn_server(Script::new(5, events, AfterReplies::Hold)).await;
        let window = Duration::from_millis(300);

        let started = Instant::now();
        let report = run_session(&config(addr, window))
            .await
            .expect("session must succeed");

        let commands: Vec<_> = report.replies.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, DEFAULT_COMMANDS);
        assert_eq!(report.replies[0].reply, "ok:subscribe");
        assert_eq!(report.replies[4].reply, "unknown command: unknown");
        assert_eq!(report.events, vec!["{\"type\":\"buy\"}", "{\"type\":\"sell\"}"]);
        assert!(!report.closed_by_peer);
        assert!(started.elapsed() >= window);
    }

    #[tokio::test]
    async fn control_frames_before_a_reply_are_skipped() {
        let script = Script {
            control_frames: true,
            ..Script::new(5, Vec::new(), AfterReplies::Hold)
        };
        let addr = spawn_server(script).await;

        let report = run_session(&config(addr, Duration::from_millis(100)))
            .await
            .expect("session must succeed");

        assert_eq!(
            replies_of(&report),
            ["ok:subscribe", "ok:create", "ok:buy", "ok:sell", "unknown command: unknown"]
        );
        assert!(report.events.is_empty());
    }

    #[tokio::test]
    async fn peer_close_ends_listen_window_early() {
        let addr = spawn_server(Script::new(5, vec!["evt"], AfterReplies::Close)).await;

        let started = Instant::now();
        let report = run_session(&config(addr, Duration::from_secs(5)))
            .await
            .expect("session must succeed");

        assert_eq!(report.events, vec!["evt"]);
        assert!(report.closed_by_peer);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn close_before_all_replies_keeps_earlier_replies() {
        let addr = spawn_server(Script::new(2, Vec::new(), AfterReplies::Close)).await;

        let err = run_session(&config(addr, Duration::from_millis(100)))
            .await
            .expect_err("third command never gets a reply");

        assert!(matches!(err.failure(), WsError::Closed { command } if command == "buy"));
        let partial = err.partial_report().expect("connected session keeps its replies");
        assert_eq!(replies_of(partial), ["ok:subscribe", "ok:create"]);
    }

    #[tokio::test]
    async fn silent_server_times_out_and_keeps_earlier_replies() {
        let addr = spawn_server(Script::new(2, Vec::new(), AfterReplies::Hold)).await;
        let config = SessionConfig {
            reply_timeout: Duration::from_millis(300),
            ..config(addr, Duration::from_millis(100))
        };

        let err = run_session(&config)
            .await
            .expect_err("server stops answering");

        assert!(matches!(
            err.failure(),
            WsError::ReplyTimeout { command, timeout_ms: 300 } if command == "buy"
        ));
        let partial = err.partial_report().expect("connected session keeps its replies");
        assert_eq!(replies_of(partial), ["ok:subscribe", "ok:create"]);
        assert!(err.to_string().contains("after 2 replies"));
    }

    #[tokio::test]
    async fn server_that_never_replies_times_out_on_first_command() {
        let addr = spawn_server(Script::new(0, Vec::new(), AfterReplies::Hold)).await;
        let config = SessionConfig {
            reply_timeout: Duration::from_millis(200),
            ..config(addr, Duration::from_millis(100))
        };

        let started = Instant::now();
        let err = run_session(&config)
            .await
            .expect_err("no reply ever arrives");

        assert!(matches!(
            err.failure(),
            WsError::ReplyTimeout { command, .. } if command == "subscribe"
        ));
        assert!(err.partial_report().is_some_and(|r| r.replies.is_empty()));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn connect_failure_reports_url() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = run_session(&config(addr, Duration::from_millis(100)))
            .await
            .expect_err("nothing is listening");
        assert!(matches!(err, WsError::Connect { .. }));
        assert!(err.partial_report().is_none());
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn secure_urls_go_through_a_tls_handshake() {
        // A plain TCP peer that hangs up makes the TLS handshake fail.
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            if let Ok((tcp, _)) = listener.accept().await {
                drop(tcp);
            }
        });

        let config = SessionConfig {
            url: format!("wss://{addr}/ws"),
            ..config(addr, Duration::from_millis(100))
        };
        let err = run_session(&config)
            .await
            .expect_err("peer does not speak TLS");

        match err {
            WsError::Connect { source, .. } => assert!(
                !matches!(source, tungstenite::Error::Url(UrlError::TlsFeatureNotEnabled)),
                "wss support must be compiled in"
            ),
            other => panic!("expected a connect failure, got {other}"),
        }
    }
}
