//! Message channels
//!
//! A [`MessageChannel`] sends text messages and hands out subscriptions to
//! the messages coming back. [`MemoryChannel`] connects two endpoints inside
//! one process; [`TcpChannel`] speaks newline-delimited text to a server.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of each subscription's backlog
pub const CHANNEL_BACKLOG: usize = 256;

/// Bidirectional text message channel
pub trait MessageChannel: Send + Sync {
    fn send(&self, message: &str) -> Result<()>;

    /// Receive every message that arrives from now on
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

/// One end of an in-process channel pair
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    outbound: broadcast::Sender<String>,
    inbound: broadcast::Sender<String>,
}

impl MemoryChannel {
    /// Two connected endpoints; what one sends the other receives
    pub fn pair() -> (Self, Self) {
        let (a_to_b, _) = broadcast::channel(CHANNEL_BACKLOG);
        let (b_to_a, _) = broadcast::channel(CHANNEL_BACKLOG);
        (
            Self {
                outbound: a_to_b.clone(),
                inbound: b_to_a.clone(),
            },
            Self {
                outbound: b_to_a,
                inbound: a_to_b,
            },
        )
    }
}

impl MessageChannel for MemoryChannel {
    fn send(&self, message: &str) -> Result<()> {
        if self.outbound.send(message.to_string()).is_err() {
            debug!(message, "no subscriber on the other end");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inbound.subscribe()
    }
}

/// Server address
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9700,
        }
    }
}

impl ConnectConfig {
    /// Create from `TETRECS_SERVER_HOST` / `TETRECS_SERVER_PORT`
    pub fn from_env() -> Self {
        use std::env;

        let d = Self::default();
        let host = env::var("TETRECS_SERVER_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(d.host);
        let port = env::var("TETRECS_SERVER_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(d.port);

        Self { host, port }
    }

    /// Parse `host:port`
    pub fn parse(addr: &str) -> Option<Self> {
        let (host, port) = addr.rsplit_once(':')?;
        let port = port.parse().ok()?;
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Escape a message so it fits on one line
pub fn escape_line(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_line`]; unknown escapes are kept verbatim
pub fn unescape_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Newline-delimited text over TCP
///
/// Messages with embedded newlines are escaped on the wire.
#[derive(Debug)]
pub struct TcpChannel {
    out_tx: mpsc::UnboundedSender<String>,
    inbound: broadcast::Sender<String>,
    peer: SocketAddr,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl TcpChannel {
    pub async fn connect(config: &ConnectConfig) -> Result<Self> {
        let addr = config.address();
        let socket = TcpStream::connect(&addr)
            .await
            .with_context(|| format!("connecting to {}", addr))?;
        Self::from_stream(socket)
    }

    pub fn from_stream(socket: TcpStream) -> Result<Self> {
        let peer = socket.peer_addr().context("reading peer address")?;
        let (reader, mut writer) = socket.into_split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (inbound, _) = broadcast::channel(CHANNEL_BACKLOG);
        info!(%peer, "connected");

        let writer = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let mut line = escape_line(&msg);
                line.push('\n');
                if writer.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if writer.flush().await.is_err() {
                    break;
                }
            }
        });

        let inbound_tx = inbound.clone();
        let reader = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        info!(%peer, "server closed the connection");
                        break;
                    }
                    Ok(_) => {
                        let raw = line.trim_end_matches(['\n', '\r']);
                        if raw.is_empty() {
                            continue;
                        }
                        let _ = inbound_tx.send(unescape_line(raw));
                    }
                    Err(err) => {
                        warn!(%peer, %err, "read failed");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            out_tx,
            inbound,
            peer,
            reader,
            writer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl MessageChannel for TcpChannel {
    fn send(&self, message: &str) -> Result<()> {
        self.out_tx
            .send(message.to_string())
            .map_err(|_| anyhow::anyhow!("connection to {} is closed", self.peer))
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inbound.subscribe()
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_memory_pair_delivers_both_ways() {
        let (a, b) = MemoryChannel::pair();
        let mut a_rx = a.subscribe();
        let mut b_rx = b.subscribe();

        a.send("PIECE").unwrap();
        b.send("PIECE 4").unwrap();

        assert_eq!(b_rx.recv().await.unwrap(), "PIECE");
        assert_eq!(a_rx.recv().await.unwrap(), "PIECE 4");
    }

    #[test]
    fn test_send_without_subscriber_is_ok() {
        let (a, _b) = MemoryChannel::pair();
        assert!(a.send("DIE").is_ok());
    }

    #[test]
    fn test_escape_roundtrip_keeps_newlines() {
        let msg = "SCORES a:1:3\nb:2:DEAD\\x";
        let escaped = escape_line(msg);
        assert!(!escaped.contains('\n'));
        assert_eq!(unescape_line(&escaped), msg);
    }

    #[test]
    fn test_connect_config_parse() {
        let c = ConnectConfig::parse("example.org:9700").unwrap();
        assert_eq!(c.host, "example.org");
        assert_eq!(c.port, 9700);
        assert!(ConnectConfig::parse("nope").is_none());
        assert!(ConnectConfig::parse(":1").is_none());
    }

    #[tokio::test]
    async fn test_tcp_channel_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (r, mut w) = socket.into_split();
            let mut r = BufReader::new(r);
            let mut line = String::new();
            r.read_line(&mut line).await.unwrap();
            assert_eq!(line, "PIECE\n");
            w.write_all(b"SCORES a:10:3\\nb:5:2\n").await.unwrap();
            w.flush().await.unwrap();
            // Keep the socket open until the client has read.
            let mut rest = String::new();
            let _ = r.read_line(&mut rest).await;
        });

        let config = ConnectConfig {
            host: "127.0.0.1".to_string(),
            port,
        };
        let channel = TcpChannel::connect(&config).await.unwrap();
        let mut rx = channel.subscribe();
        channel.send("PIECE").unwrap();

        assert_eq!(rx.recv().await.unwrap(), "SCORES a:10:3\nb:5:2");
        drop(channel);
        server.await.unwrap();
    }
}
