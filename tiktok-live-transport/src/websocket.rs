/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Native WebSocket client for the Webcast push connection.
//!
//! Grounded on `videocall-transport::native_websocket` (connect/split-stream
//! read loop/send/close shape) generalized to: (a) carry custom request
//! headers (`Cookie`, `User-Agent`, subprotocol), required because the
//! Webcast upgrade is signed and cookie-gated, and (b) surface the
//! `Handshake-Msg`/`Handshake-Options` response headers the session engine
//! needs (spec.md §4.5), which the teacher's generic client discards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::{Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;

use crate::error::WebSocketConnectError;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Extra headers the Webcast upgrade requires beyond the URL itself.
pub struct ConnectHeaders {
    pub cookie: String,
    pub user_agent: String,
}

/// Response headers surfaced to the session engine (spec.md §4.5: the
/// `Handshake-Options` header resolves the heartbeat interval).
#[derive(Clone, Debug, Default)]
pub struct UpgradeResponse {
    pub headers: HashMap<String, String>,
}

#[derive(Clone)]
pub struct NativeWebSocketClient {
    writer: Arc<Mutex<SplitSink<WsStream, Message>>>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for NativeWebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeWebSocketClient")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl NativeWebSocketClient {
    /// Connect with the `echo-protocol` subprotocol and no library-level
    /// ping (spec.md §4.5): `tokio-tungstenite` does not auto-ping unless a
    /// ping interval is configured on the stream explicitly, so simply not
    /// wrapping the stream in a pinger satisfies this requirement.
    pub async fn connect(
        url: &str,
        headers: ConnectHeaders,
        ws_proxy: Option<&str>,
    ) -> Result<(Self, UpgradeResponse, mpsc::Receiver<Vec<u8>>), WebSocketConnectError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| WebSocketConnectError::Other(e.to_string()))?;

        insert_header(&mut request, "Cookie", &headers.cookie)?;
        insert_header(&mut request, "User-Agent", &headers.user_agent)?;
        insert_header(&mut request, "Sec-WebSocket-Protocol", "echo-protocol")?;

        let (ws_stream, response) = match ws_proxy {
            Some(proxy_url) => connect_through_proxy(request, proxy_url).await?,
            None => tokio_tungstenite::connect_async(request).await.map_err(map_connect_error)?,
        };

        let upgrade = UpgradeResponse {
            headers: response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
                .collect(),
        };

        let (client, inbound_rx) = Self::setup_streams(ws_stream);
        Ok((client, upgrade, inbound_rx))
    }

    fn setup_streams(ws_stream: WsStream) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (writer, mut reader) = ws_stream.split();

        let closed = Arc::new(AtomicBool::new(false));
        let client = Self {
            writer: Arc::new(Mutex::new(writer)),
            closed: closed.clone(),
        };

        let (inbound_tx, inbound_rx) = mpsc::channel(100);
        let closed_reader = closed.clone();

        tokio::spawn(async move {
            while let Some(msg_result) = reader.next().await {
                if closed_reader.load(Ordering::Relaxed) {
                    break;
                }
                match msg_result {
                    Ok(Message::Binary(data)) => {
                        if inbound_tx.send(data).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("webcast websocket received close frame");
                        closed_reader.store(true, Ordering::Relaxed);
                        break;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Text(_)) | Ok(Message::Frame(_)) => {
                        // TikTok does not use text frames or expect library pongs
                        // (spec.md §4.5); silently consumed like heartbeat/diagnostic push frames.
                    }
                    Err(e) => {
                        if !closed_reader.load(Ordering::Relaxed) {
                            tracing::error!(error = %e, "webcast websocket read error");
                        }
                        break;
                    }
                }
            }
        });

        (client, inbound_rx)
    }

    pub async fn send(&self, data: Vec<u8>) -> Result<(), WebSocketConnectError> {
        if self.closed.load(Ordering::Relaxed) {
            return Ok(()); // acks/heartbeats are fire-and-forget on a closed socket (spec.md §4.5)
        }
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Binary(data))
            .await
            .map_err(|e| WebSocketConnectError::Other(e.to_string()))
    }

    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Relaxed)
    }

    pub async fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            let mut writer = self.writer.lock().await;
            let _ = writer.send(Message::Close(None)).await;
        }
    }
}

/// Tunnel the WebSocket upgrade through an HTTP `CONNECT` proxy (spec.md §6
/// `ws_proxy`, "converted internally to the WebSocket proxy format"): open a
/// plain TCP connection to the proxy, issue `CONNECT`, then hand the
/// resulting stream to `tokio-tungstenite`'s generic TLS-aware upgrade path,
/// the same technique the wider ecosystem uses to combine a TCP-level proxy
/// crate with a WebSocket client that has no native proxy support.
async fn connect_through_proxy(
    request: Request,
    proxy_url: &str,
) -> Result<(WsStream, Response), WebSocketConnectError> {
    let proxy = url::Url::parse(proxy_url)
        .map_err(|e| WebSocketConnectError::Other(format!("invalid ws_proxy URL: {e}")))?;
    let proxy_host = proxy
        .host_str()
        .ok_or_else(|| WebSocketConnectError::Other("ws_proxy URL has no host".to_string()))?
        .to_string();
    let proxy_port = proxy.port_or_known_default().unwrap_or(80);

    let target_host = request
        .uri()
        .host()
        .ok_or_else(|| WebSocketConnectError::Other("request URL has no host".to_string()))?
        .to_string();
    let target_port = request
        .uri()
        .port_u16()
        .unwrap_or(if request.uri().scheme_str() == Some("wss") { 443 } else { 80 });

    let mut stream = TcpStream::connect((proxy_host.as_str(), proxy_port))
        .await
        .map_err(|e| WebSocketConnectError::Other(format!("ws_proxy connect failed: {e}")))?;

    let connect_req = format!("CONNECT {target_host}:{target_port} HTTP/1.1\r\nHost: {target_host}:{target_port}\r\n\r\n");
    stream
        .write_all(connect_req.as_bytes())
        .await
        .map_err(|e| WebSocketConnectError::Other(format!("ws_proxy CONNECT write failed: {e}")))?;

    let mut response_buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        stream
            .read_exact(&mut byte)
            .await
            .map_err(|e| WebSocketConnectError::Other(format!("ws_proxy CONNECT read failed: {e}")))?;
        response_buf.push(byte[0]);
        if response_buf.ends_with(b"\r\n\r\n") {
            break;
        }
    }

    let status_line = String::from_utf8_lossy(&response_buf);
    if !status_line.starts_with("HTTP/1.1 200") && !status_line.starts_with("HTTP/1.0 200") {
        let reason = status_line.lines().next().unwrap_or("unknown").to_string();
        return Err(WebSocketConnectError::Other(format!("ws_proxy CONNECT rejected: {reason}")));
    }

    tokio_tungstenite::client_async_tls(request, stream)
        .await
        .map_err(map_connect_error)
}

fn insert_header(request: &mut Request, name: &str, value: &str) -> Result<(), WebSocketConnectError> {
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| WebSocketConnectError::Other(format!("invalid header value for {name}: {e}")))?;
    request.headers_mut().insert(
        tokio_tungstenite::tungstenite::http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| WebSocketConnectError::Other(e.to_string()))?,
        header_value,
    );
    Ok(())
}

fn map_connect_error(e: tokio_tungstenite::tungstenite::Error) -> WebSocketConnectError {
    match e {
        tokio_tungstenite::tungstenite::Error::Http(resp) => {
            let status = resp.status().as_u16();
            if status == 200 {
                let message = resp
                    .headers()
                    .get("Handshake-Msg")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("an unknown reason")
                    .to_string();
                WebSocketConnectError::Blocked200 { message }
            } else {
                WebSocketConnectError::HttpError { status }
            }
        }
        other => WebSocketConnectError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_200_carries_handshake_message() {
        let err = WebSocketConnectError::Blocked200 {
            message: "illegal secret key".to_string(),
        };
        assert!(format!("{err}").contains("illegal secret key"));
    }

    #[test]
    fn http_error_carries_status() {
        let err = WebSocketConnectError::HttpError { status: 401 };
        assert!(format!("{err}").contains("401"));
    }
}
