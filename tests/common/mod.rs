//! Test helpers for relay integration tests.
//!
//! Provides TestServer and TestClient for driving a real listener over TCP.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use chat_relay::{RelayServer, Registry, ServerConfig};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A relay server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<Registry>,
}

impl TestServer {
    /// Start a server whose uploads land in `upload_dir`.
    pub async fn start(upload_dir: &Path) -> Self {
        let config = ServerConfig {
            port: 0,
            upload_dir: upload_dir.to_path_buf(),
            ..ServerConfig::default()
        };
        let server = RelayServer::bind(config).await.unwrap();
        let addr = server.local_addr().unwrap();
        let registry = server.registry();
        tokio::spawn(server.run());
        Self { addr, registry }
    }

    /// Poll the registry until it holds `expected` members in total.
    pub async fn wait_for_members(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
        while self.registry.member_count().await != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "registry never reached {} members",
                expected
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Line-oriented test client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connect without registering.
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Connect, register, and wait until our own join notice arrives.
    pub async fn join(addr: SocketAddr, name: &str, room: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send_line(name).await;
        client.send_line(room).await;
        client
            .expect_line(&format!("{} has joined the room.", name))
            .await;
        client
    }

    pub async fn send_line(&mut self, line: &str) {
        self.send_raw(format!("{}\n", line).as_bytes()).await;
    }

    pub async fn send_raw(&mut self, data: &[u8]) {
        self.writer.write_all(data).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Read the next line without its newline; None on EOF.
    pub async fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = timeout(DEFAULT_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        if n == 0 {
            return None;
        }
        Some(line.trim_end_matches('\n').to_string())
    }

    /// Skip lines until one equals `expected`; returns the skipped lines.
    pub async fn expect_line(&mut self, expected: &str) -> Vec<String> {
        let mut skipped = Vec::new();
        loop {
            match self.read_line().await {
                Some(line) if line == expected => return skipped,
                Some(line) => skipped.push(line),
                None => panic!("connection closed before {:?}; saw {:?}", expected, skipped),
            }
        }
    }

    /// Close both halves of the connection.
    pub fn close(self) {
        drop(self);
    }
}
