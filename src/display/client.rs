//! # TowerClient: display over a line-delimited JSON connection.
//!
//! Each call writes one request line and waits for one reply line before
//! returning, so requests on a connection are never pipelined.
//!
//! ## Wire format
//! ```text
//! → {"op":"start_drawing"}
//! → {"op":"write_text","text":"<text>..</text>","font":"6x8","x":0,"color":[30,144,255],"y":0,"mode":"paint"}
//! ← {"ok":true}
//! ← {"ok":false,"error":"no frame"}
//! ```
//!
//! ## Reconnect
//! A transport failure drops the connection and fails the current call. The
//! next call dials again, so one hiccup costs one call sequence, not the service.
//! After [`Display::close`] no reconnect happens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::display::{Display, Roll, TextCommand};
use crate::error::DisplayError;

/// One request on the wire.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Acquire a frame.
    StartDrawing,
    /// Reset the canvas.
    Init,
    /// Write text.
    WriteText(TextCommand),
    /// Set rolling.
    AutoRoll(Roll),
    /// Commit the frame.
    Render,
}

impl Request {
    fn op(&self) -> &'static str {
        match self {
            Request::StartDrawing => "start_drawing",
            Request::Init => "init",
            Request::WriteText(_) => "write_text",
            Request::AutoRoll(_) => "auto_roll",
            Request::Render => "render",
        }
    }
}

/// One reply on the wire.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Failure message when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Conn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// [`Display`] implementation talking to a remote display server.
pub struct TowerClient {
    addr: String,
    conn: Option<Conn>,
    closed: bool,
}

impl TowerClient {
    /// Connects to `addr` (`host:port`).
    pub async fn connect(addr: impl Into<String>) -> Result<Self, DisplayError> {
        let addr = addr.into();
        let conn = dial(&addr).await?;
        tracing::info!(%addr, "connected to display server");
        Ok(Self {
            addr,
            conn: Some(conn),
            closed: false,
        })
    }

    /// Endpoint address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn call(&mut self, req: Request) -> Result<(), DisplayError> {
        if self.closed {
            return Err(DisplayError::Closed);
        }
        if self.conn.is_none() {
            tracing::debug!(addr = %self.addr, "reconnecting to display server");
            self.conn = Some(dial(&self.addr).await?);
        }
        let op = req.op();
        let res = match self.conn.as_mut() {
            Some(conn) => exchange(conn, &req).await,
            None => Err(DisplayError::Closed),
        };
        match res {
            Ok(Reply { ok: true, .. }) => Ok(()),
            Ok(Reply { ok: false, error }) => Err(DisplayError::Remote {
                op,
                message: error.unwrap_or_default(),
            }),
            Err(e) => {
                self.conn = None;
                Err(e)
            }
        }
    }
}

async fn dial(addr: &str) -> Result<Conn, DisplayError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| DisplayError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    stream.set_nodelay(true)?;
    let (r, w) = stream.into_split();
    Ok(Conn {
        reader: BufReader::new(r),
        writer: w,
    })
}

async fn exchange(conn: &mut Conn, req: &Request) -> Result<Reply, DisplayError> {
    let mut line = serde_json::to_string(req).map_err(|e| DisplayError::Protocol(e.to_string()))?;
    line.push('\n');
    conn.writer.write_all(line.as_bytes()).await?;
    conn.writer.flush().await?;

    let mut buf = String::new();
    if conn.reader.read_line(&mut buf).await? == 0 {
        return Err(DisplayError::Closed);
    }
    serde_json::from_str(buf.trim_end()).map_err(|e| DisplayError::Protocol(e.to_string()))
}

#[async_trait]
impl Display for TowerClient {
    fn name(&self) -> &str {
        "tower"
    }

    async fn start_drawing(&mut self) -> Result<(), DisplayError> {
        self.call(Request::StartDrawing).await
    }

    async fn init(&mut self) -> Result<(), DisplayError> {
        self.call(Request::Init).await
    }

    async fn write_text(&mut self, text: &TextCommand) -> Result<(), DisplayError> {
        self.call(Request::WriteText(text.clone())).await
    }

    async fn auto_roll(&mut self, roll: &Roll) -> Result<(), DisplayError> {
        self.call(Request::AutoRoll(*roll)).await
    }

    async fn render(&mut self) -> Result<(), DisplayError> {
        self.call(Request::Render).await
    }

    async fn close(&mut self) -> Result<(), DisplayError> {
        self.closed = true;
        if let Some(mut conn) = self.conn.take() {
            conn.writer.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts one connection, answers every line, and returns the requests seen.
    async fn fake_server(
        fail_op: Option<&'static str>,
    ) -> (String, tokio::task::JoinHandle<Vec<Request>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (r, mut w) = stream.into_split();
            let mut lines = BufReader::new(r).lines();
            let mut seen = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                let req: Request = serde_json::from_str(&line).unwrap();
                let reply = if Some(req.op()) == fail_op {
                    Reply {
                        ok: false,
                        error: Some("nope".into()),
                    }
                } else {
                    Reply { ok: true, error: None }
                };
                seen.push(req);
                let mut out = serde_json::to_string(&reply).unwrap();
                out.push('\n');
                w.write_all(out.as_bytes()).await.unwrap();
            }
            seen
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_calls_are_sent_in_order() {
        let (addr, server) = fake_server(None).await;
        let mut client = TowerClient::connect(addr).await.unwrap();

        client.start_drawing().await.unwrap();
        client.init().await.unwrap();
        client.write_text(&TextCommand::new("hi")).await.unwrap();
        client.auto_roll(&Roll::NEXT).await.unwrap();
        client.render().await.unwrap();
        client.close().await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(
            seen,
            vec![
                Request::StartDrawing,
                Request::Init,
                Request::WriteText(TextCommand::new("hi")),
                Request::AutoRoll(Roll::NEXT),
                Request::Render,
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_rejection_maps_to_error() {
        let (addr, _server) = fake_server(Some("render")).await;
        let mut client = TowerClient::connect(addr).await.unwrap();

        client.start_drawing().await.unwrap();
        let err = client.render().await.unwrap_err();
        assert!(matches!(err, DisplayError::Remote { op: "render", .. }));
    }

    #[tokio::test]
    async fn test_closed_client_refuses_calls() {
        let (addr, _server) = fake_server(None).await;
        let mut client = TowerClient::connect(addr).await.unwrap();
        client.close().await.unwrap();

        assert!(matches!(client.init().await, Err(DisplayError::Closed)));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = TowerClient::connect(addr).await.err().unwrap();
        assert_eq!(err.as_label(), "display_connect");
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(Request::AutoRoll(Roll::STOP)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "auto_roll", "layer": 0, "mode": "stop", "entry": 0, "separator": 0})
        );
    }
}
