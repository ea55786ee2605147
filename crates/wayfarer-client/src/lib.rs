// ABOUTME: WebSocket connection manager: one live channel per session
// ABOUTME: Writer/reader tasks, heartbeat, send gating, connectivity events

mod error;

pub use error::ClientError;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use wayfarer_proto::{encode_frame, ClientFrame, ServerFrame};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Events delivered to the session reducer, in arrival order.
#[derive(Debug)]
pub enum ClientEvent {
    /// Synthetic, emitted once when the channel opens
    Connected,
    /// One decoded inbound frame
    Frame(ServerFrame),
    /// Server closed the channel or the read loop ended
    Disconnected,
    /// Transport-level failure; a Disconnected follows
    TransportError(String),
}

enum WriterCommand {
    Send(String),
    Ping,
    Close,
}

/// Handle to one live WebSocket channel. Reconnection is manual: drop or
/// close the old handle and open a new one; at most one live channel per
/// session. No backoff, no queuing across reconnects.
pub struct Connection {
    writer: mpsc::UnboundedSender<WriterCommand>,
    connected: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
}

impl Connection {
    /// Dial `<server_url>/ws/<session_id>` and spawn the writer, reader,
    /// and heartbeat tasks. Returns the handle plus the event stream.
    pub async fn open(
        server_url: &str,
        session_id: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ClientEvent>), ClientError> {
        let url = session_url(server_url, session_id)?;
        tracing::info!(%url, "connecting");

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let _ = event_tx.send(ClientEvent::Connected);

        let writer_connected = connected.clone();
        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                let text = match cmd {
                    WriterCommand::Send(text) => text,
                    WriterCommand::Ping => match encode_frame(&ClientFrame::Ping) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(error = %e, "heartbeat encode failed");
                            continue;
                        }
                    },
                    WriterCommand::Close => {
                        let _ = write.close().await;
                        break;
                    }
                };
                if let Err(e) = write.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, "websocket write failed");
                    break;
                }
            }
            writer_connected.store(false, Ordering::SeqCst);
        });

        // App-level heartbeat; the backend answers with a pong frame.
        let heartbeat_tx = cmd_tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                if heartbeat_tx.send(WriterCommand::Ping).is_err() {
                    break;
                }
            }
        });

        let reader_connected = connected.clone();
        let reader_tx = event_tx.clone();
        tokio::spawn(async move {
            while let Some(result) = read.next().await {
                match result {
                    Ok(Message::Text(text)) => match wayfarer_proto::decode_frame(&text) {
                        Ok(frame) => {
                            if reader_tx.send(ClientEvent::Frame(frame)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, frame = truncate_for_log(&text), "malformed frame dropped");
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("connection closed by server");
                        break;
                    }
                    // tungstenite answers native pings itself
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(_) => {}
                    Err(e) => {
                        let _ = reader_tx.send(ClientEvent::TransportError(e.to_string()));
                        break;
                    }
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
            let _ = reader_tx.send(ClientEvent::Disconnected);
        });

        let connection = Self {
            writer: cmd_tx,
            connected,
            in_flight: Arc::new(AtomicBool::new(false)),
        };
        Ok((connection, event_rx))
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn turn_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Queue a travel request. Returns Ok(false) without sending when the
    /// channel is down or a turn is already in flight; on a real send the
    /// in-flight gate is set.
    pub fn send_request(&self, content: &str) -> Result<bool, ClientError> {
        if !self.is_connected() || self.turn_in_flight() {
            return Ok(false);
        }
        let text = encode_frame(&ClientFrame::TravelRequest {
            content: content.to_string(),
        })?;
        self.writer
            .send(WriterCommand::Send(text))
            .map_err(|_| ClientError::Send("writer task gone".to_string()))?;
        self.in_flight.store(true, Ordering::SeqCst);
        Ok(true)
    }

    /// Manually claim the in-flight gate, e.g. before an out-of-band send.
    pub fn begin_turn(&self) {
        self.in_flight.store(true, Ordering::SeqCst);
    }

    /// Release the in-flight gate once the turn reached a terminal outcome.
    pub fn end_turn(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }

    pub fn close(&self) {
        let _ = self.writer.send(WriterCommand::Close);
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.writer.send(WriterCommand::Close);
    }
}

/// Build the per-session endpoint URL. HTTP schemes are upgraded to their
/// WebSocket counterparts so config can carry either form.
fn session_url(server_url: &str, session_id: &str) -> Result<Url, ClientError> {
    let normalized = if let Some(rest) = server_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = server_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        server_url.to_string()
    };
    let mut url = Url::parse(&normalized)?;
    let path = format!("{}/ws/{}", url.path().trim_end_matches('/'), session_id);
    url.set_path(&path);
    Ok(url)
}

fn truncate_for_log(text: &str) -> &str {
    match text.char_indices().nth(120) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connection(connected: bool) -> (Connection, mpsc::UnboundedReceiver<WriterCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Connection {
                writer: tx,
                connected: Arc::new(AtomicBool::new(connected)),
                in_flight: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    #[test]
    fn session_url_joins_path() {
        let url = session_url("ws://127.0.0.1:8000", "abc-123").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws/abc-123");
    }

    #[test]
    fn session_url_upgrades_http_schemes() {
        let url = session_url("http://example.com", "s1").unwrap();
        assert_eq!(url.scheme(), "ws");
        let url = session_url("https://example.com", "s1").unwrap();
        assert_eq!(url.scheme(), "wss");
    }

    #[test]
    fn session_url_keeps_base_path() {
        let url = session_url("ws://example.com/agent/", "s1").unwrap();
        assert_eq!(url.path(), "/agent/ws/s1");
    }

    #[test]
    fn session_url_rejects_garbage() {
        assert!(session_url("not a url", "s1").is_err());
    }

    #[test]
    fn send_is_gated_when_disconnected() {
        let (conn, mut rx) = test_connection(false);
        assert!(!conn.send_request("去杭州").unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn send_is_gated_while_in_flight() {
        let (conn, mut rx) = test_connection(true);
        conn.begin_turn();
        assert!(!conn.send_request("去杭州").unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn send_writes_travel_request_and_claims_gate() {
        let (conn, mut rx) = test_connection(true);
        assert!(conn.send_request("去杭州玩三天").unwrap());
        assert!(conn.turn_in_flight());
        match rx.try_recv().unwrap() {
            WriterCommand::Send(text) => {
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(value["type"], "travel_request");
                assert_eq!(value["content"], "去杭州玩三天");
            }
            _ => panic!("expected a send command"),
        }
    }

    #[test]
    fn end_turn_releases_gate() {
        let (conn, _rx) = test_connection(true);
        conn.send_request("hi").unwrap();
        assert!(conn.turn_in_flight());
        conn.end_turn();
        assert!(!conn.turn_in_flight());
        assert!(conn.send_request("again").unwrap());
    }

    #[test]
    fn close_flips_the_gate_and_queues_close() {
        let (conn, mut rx) = test_connection(true);
        conn.close();
        assert!(!conn.is_connected());
        assert!(matches!(rx.try_recv().unwrap(), WriterCommand::Close));
    }

    #[test]
    fn truncate_for_log_cuts_long_frames() {
        let long = "字".repeat(500);
        assert_eq!(truncate_for_log(&long).chars().count(), 120);
        assert_eq!(truncate_for_log("short"), "short");
    }
}
