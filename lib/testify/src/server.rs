use std::net::SocketAddr;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

const TIMEOUT: Duration = Duration::from_secs(10);

/// A scripted rules server on a loopback port. Every accepted connection is
/// handed to the test as a [`Peer`].
pub struct RulesServer {
    listener: TcpListener,
}

impl RulesServer {
    pub async fn bind() -> RulesServer {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");

        RulesServer { listener }
    }

    pub fn addr(&self) -> SocketAddr {
        self.listener.local_addr().expect("listener address")
    }

    pub async fn accept(&self) -> Peer {
        let (socket, _) = tokio::time::timeout(TIMEOUT, self.listener.accept())
            .await
            .expect("no client connected in time")
            .expect("accept connection");
        let (read, writer) = socket.into_split();

        Peer {
            lines: BufReader::new(read).lines(),
            writer,
        }
    }
}

/// One client connection, speaking newline delimited JSON.
pub struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Peer {
    /// The next frame from the client, `None` once it hung up.
    pub async fn recv(&mut self) -> Option<Value> {
        let line = tokio::time::timeout(TIMEOUT, self.lines.next_line())
            .await
            .expect("no frame received in time")
            .expect("read frame")?;

        Some(serde_json::from_str(&line).expect("client sent invalid JSON"))
    }

    pub async fn send(&mut self, frame: &str) {
        self.writer
            .write_all(format!("{frame}\n").as_bytes())
            .await
            .expect("write frame");
    }

    pub async fn send_json(&mut self, value: &Value) {
        self.send(&value.to_string()).await
    }
}
