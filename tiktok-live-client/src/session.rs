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

//! Session engine (spec.md §4.5).
//!
//! The `tokio::select!`-driven main loop (heartbeat tick / inbound frame /
//! shutdown signal) is grounded on the domain-adjacent danmaku WebSocket
//! reference implementation's reconnect-with-backoff session loop shape;
//! the connect/heartbeat/disconnect lifecycle itself is grounded on
//! `videocall-client::native_client::NativeVideoCallClient`.

use std::collections::HashMap;
use std::time::Duration;

use tiktok_live_transport::{ConnectHeaders, NativeWebSocketClient, UpgradeResponse, WebSocketConnectError};
use tiktok_live_types::{codec, CookieJar, Event, FetchResult};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::defaults::{DEFAULT_PING_INTERVAL_SECS, WS_CLIENT_PARAMS_APPEND_STR};
use crate::error::ClientError;
use crate::event_bus::EventBus;
use crate::handle::Handle;
use crate::router::{self, RouterSignal};

/// Pure function of its inputs (spec.md §8 Testable Property 5).
pub fn build_uri(
    initial: &FetchResult,
    base_ws_params: &HashMap<String, String>,
    room_id: u64,
    compress_ws_events: bool,
) -> Result<String, ClientError> {
    if initial.cursor.is_empty() {
        return Err(ClientError::InitialCursorMissing);
    }
    if initial.push_server.is_empty() || initial.route_params.is_empty() {
        return Err(ClientError::WebsocketUrlMissing);
    }

    let mut params: Vec<(String, String)> = initial.route_params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for (k, v) in base_ws_params {
        set_or_push(&mut params, k, v);
    }
    set_or_push(&mut params, "internal_ext", &initial.internal_ext);
    set_or_push(&mut params, "cursor", &initial.cursor);
    set_or_push(&mut params, "room_id", &room_id.to_string());
    set_or_push(&mut params, "compress", if compress_ws_events { "gzip" } else { "" });

    let query = params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    Ok(format!("{}?{}{}", initial.push_server, query, WS_CLIENT_PARAMS_APPEND_STR))
}

fn set_or_push(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    if let Some(existing) = params.iter_mut().find(|(k, _)| k == key) {
        existing.1 = value.to_string();
    } else {
        params.push((key.to_string(), value.to_string()));
    }
}

/// Parse the cookie-style `Handshake-Options` header (spec.md §4.5).
fn parse_handshake_options(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn resolve_ping_interval(upgrade: &UpgradeResponse) -> Duration {
    let options = upgrade
        .headers
        .get("Handshake-Options")
        .map(|raw| parse_handshake_options(raw))
        .unwrap_or_default();

    // The server's observed key casing varies (spec.md §9 Open Question);
    // check both forms rather than guessing one.
    let seconds = options
        .get("ping-interval")
        .or_else(|| options.get("ping_interval"))
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(DEFAULT_PING_INTERVAL_SECS);

    Duration::from_secs_f64(seconds)
}

pub struct SessionHandle {
    pub disconnect_tx: oneshot::Sender<()>,
    pub task: JoinHandle<Result<(), ClientError>>,
}

/// Connect to the Webcast push server and run the inbound loop until
/// termination (spec.md §4.5). `handshake_result` is the signing-service
/// derived envelope; its embedded messages are dispatched as the
/// first-yield contract before any WebSocket frame is processed.
pub async fn connect_and_run(
    handle: Handle,
    room_id: u64,
    cookies: CookieJar,
    user_agent: String,
    handshake_result: FetchResult,
    base_ws_params: HashMap<String, String>,
    compress_ws_events: bool,
    process_connect_events: bool,
    bus: EventBus,
    ws_proxy: Option<String>,
) -> Result<SessionHandle, ClientError> {
    let uri = build_uri(&handshake_result, &base_ws_params, room_id, compress_ws_events)?;

    tracing::debug!(uri = %uri, "connecting to webcast push server");
    tracing::debug!(cookie_header = %cookies.to_header_string(true), "built websocket cookie header");

    let (ws, upgrade, inbound_rx) = NativeWebSocketClient::connect(
        &uri,
        ConnectHeaders { cookie: cookies.to_header_string(false), user_agent: user_agent.clone() },
        ws_proxy.as_deref(),
    )
    .await
    .map_err(map_ws_error)?;

    let ping_interval = resolve_ping_interval(&upgrade);

    let mut first_yield = handshake_result;
    if !process_connect_events {
        first_yield.messages.clear();
    }

    // First-yield contract: dispatch the handshake-derived envelope before
    // any inbound WebSocket frame (spec.md §4.5).
    router::route(&bus, &first_yield, &handle, room_id);

    let heartbeat_handle = spawn_heartbeat(ws.clone(), room_id, ping_interval);

    let (disconnect_tx, disconnect_rx) = oneshot::channel();

    let task = tokio::spawn(run_inbound_loop(
        ws,
        inbound_rx,
        handle,
        room_id,
        bus,
        heartbeat_handle,
        disconnect_rx,
    ));

    Ok(SessionHandle { disconnect_tx, task })
}

fn spawn_heartbeat(ws: NativeWebSocketClient, room_id: u64, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let payload = codec::heartbeat_frame(room_id);
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it, heartbeat starts after one interval
        loop {
            ticker.tick().await;
            if !ws.is_connected() {
                break;
            }
            if ws.send(payload.clone()).await.is_err() {
                break;
            }
        }
    })
}

async fn run_inbound_loop(
    ws: NativeWebSocketClient,
    mut inbound_rx: mpsc::Receiver<Vec<u8>>,
    handle: Handle,
    room_id: u64,
    bus: EventBus,
    heartbeat_handle: JoinHandle<()>,
    mut disconnect_rx: oneshot::Receiver<()>,
) -> Result<(), ClientError> {
    // A control-triggered stream end schedules a disconnect on a separate
    // task rather than being awaited inline, to avoid deadlocking the loop
    // that is itself processing the frame that triggered it (spec.md §9
    // REDESIGN FLAG: "Coroutine cancellation intertwined with outer tasks").
    let (scheduled_disconnect_tx, mut scheduled_disconnect_rx) = mpsc::channel::<()>(1);

    loop {
        tokio::select! {
            _ = &mut disconnect_rx => {
                tracing::debug!("session disconnect requested by consumer");
                break;
            }
            _ = scheduled_disconnect_rx.recv() => {
                tracing::debug!("session disconnect scheduled by control signal");
                break;
            }
            frame = inbound_rx.recv() => {
                match frame {
                    Some(data) => {
                        if let Err(e) = handle_inbound_frame(&ws, &data, &handle, room_id, &bus, &scheduled_disconnect_tx).await {
                            tracing::warn!(error = %e, "dropping malformed inbound frame");
                        }
                    }
                    None => {
                        tracing::debug!("peer closed the websocket");
                        break;
                    }
                }
            }
        }
    }

    ws.close().await;
    heartbeat_handle.abort();
    bus.emit(Event::Disconnect);

    Ok(())
}

async fn handle_inbound_frame(
    ws: &NativeWebSocketClient,
    data: &[u8],
    handle: &Handle,
    room_id: u64,
    bus: &EventBus,
    scheduled_disconnect_tx: &mpsc::Sender<()>,
) -> Result<(), ClientError> {
    let push_frame = codec::decode_push_frame(data)?;

    if push_frame.payload_type != "msg" {
        tracing::debug!(payload_type = %push_frame.payload_type, "ignoring non-msg push frame");
        return Ok(());
    }

    let fetch_result = codec::decode_fetch_result(&push_frame)?;

    let signal = router::route(bus, &fetch_result, handle, room_id);

    if fetch_result.need_ack {
        let ack = codec::build_ack_frame(push_frame.log_id, &fetch_result.internal_ext);
        let _ = ws.send(codec::encode_push_frame(&ack)).await;
    }

    if signal == RouterSignal::LiveEnd {
        let _ = scheduled_disconnect_tx.try_send(());
    }

    Ok(())
}

fn map_ws_error(e: WebSocketConnectError) -> ClientError {
    match e {
        WebSocketConnectError::Blocked200 { message } => ClientError::WebcastBlocked200(message),
        other => ClientError::WebSocket(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiktok_live_types::FetchResult;

    fn sample_result() -> FetchResult {
        FetchResult {
            cursor: "c0".to_string(),
            push_server: "wss://x/y".to_string(),
            internal_ext: "ext".to_string(),
            route_params: [("k".to_string(), "v".to_string())].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn uri_construction_is_pure() {
        let result = sample_result();
        let base = HashMap::new();
        let a = build_uri(&result, &base, 42, true).unwrap();
        let b = build_uri(&result, &base, 42, true).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("room_id=42"));
        assert!(a.contains("compress=gzip"));
        assert!(a.ends_with(WS_CLIENT_PARAMS_APPEND_STR));
    }

    #[test]
    fn missing_cursor_is_fatal() {
        let mut result = sample_result();
        result.cursor.clear();
        assert!(matches!(build_uri(&result, &HashMap::new(), 1, true), Err(ClientError::InitialCursorMissing)));
    }

    #[test]
    fn missing_route_params_is_fatal() {
        let mut result = sample_result();
        result.route_params.clear();
        assert!(matches!(build_uri(&result, &HashMap::new(), 1, true), Err(ClientError::WebsocketUrlMissing)));
    }

    #[test]
    fn handshake_options_parses_ping_interval_either_casing() {
        let mut upgrade = UpgradeResponse::default();
        upgrade.headers.insert("Handshake-Options".to_string(), "ping-interval=9".to_string());
        assert_eq!(resolve_ping_interval(&upgrade), Duration::from_secs_f64(9.0));

        let mut upgrade = UpgradeResponse::default();
        upgrade.headers.insert("Handshake-Options".to_string(), "ping_interval=3".to_string());
        assert_eq!(resolve_ping_interval(&upgrade), Duration::from_secs_f64(3.0));
    }

    #[test]
    fn default_ping_interval_when_absent() {
        let upgrade = UpgradeResponse::default();
        assert_eq!(resolve_ping_interval(&upgrade), Duration::from_secs_f64(DEFAULT_PING_INTERVAL_SECS));
    }
}
