//! Scripted SMTP server for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedReadHalf;
use tokio::task::JoinHandle;

/// One exchange with the client.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Read one command line, then send the reply.
    Reply(&'static str),
    /// Read message data up to the `.` line, then send the reply.
    Data(&'static str),
    /// Read one command line, then drop the connection without replying.
    Close,
    /// Read one command line, send the reply, then drop the connection.
    Hangup(&'static str),
}

/// A server accepting one connection and following a script.
pub struct MockServer {
    /// Address to connect to.
    pub addr: SocketAddr,
    handle: JoinHandle<Vec<String>>,
}

impl MockServer {
    /// Binds to an ephemeral port and serves one session.
    ///
    /// After the script the server keeps reading until the client closes the
    /// connection, so that unexpected commands show up in [`Self::received`].
    pub async fn start(greeting: &'static str, steps: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut reader = BufReader::new(read);
            let mut received = Vec::new();

            let _ = write.write_all(format!("{greeting}\r\n").as_bytes()).await;

            for step in steps {
                let reply = match step {
                    Step::Close => {
                        if let Some(line) = read_line(&mut reader).await {
                            received.push(line);
                        }
                        return received;
                    }
                    Step::Hangup(reply) => {
                        if let Some(line) = read_line(&mut reader).await {
                            received.push(line);
                            let _ = write.write_all(format!("{reply}\r\n").as_bytes()).await;
                        }
                        return received;
                    }
                    Step::Reply(reply) => {
                        let Some(line) = read_line(&mut reader).await else {
                            return received;
                        };
                        received.push(line);
                        reply
                    }
                    Step::Data(reply) => {
                        loop {
                            let Some(line) = read_line(&mut reader).await else {
                                return received;
                            };
                            let end = line == ".";
                            received.push(line);
                            if end {
                                break;
                            }
                        }
                        reply
                    }
                };
                let _ = write.write_all(format!("{reply}\r\n").as_bytes()).await;
            }

            while let Some(line) = read_line(&mut reader).await {
                received.push(line);
            }
            received
        });

        Self { addr, handle }
    }

    /// Port the server listens on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Lines received from the client, once it disconnected.
    pub async fn received(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}
