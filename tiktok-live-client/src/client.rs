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

//! Public client (spec.md §6).
//!
//! Owns the cookie jar, HTTP params, and gift catalog — mutated only here
//! and in [`crate::handshake::HandshakeClient`], both on the same task
//! (spec.md §5 "Shared-resource policy"). Grounded on
//! `videocall-client::native_client::NativeVideoCallClient`'s
//! connect/already-connected/disconnect lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tiktok_live_transport::{Backend, HttpFacade};
use tiktok_live_types::{CookieJar, Event, Gift, GiftCatalog};

use crate::config::{ClientConfig, StartOptions};
use crate::defaults;
use crate::error::ClientError;
use crate::event_bus::{EventBus, EventSubscription};
use crate::handle::Handle;
use crate::handshake::HandshakeClient;
use crate::resolver;
use crate::session::{self, SessionHandle};

type Listener = Box<dyn Fn(&Event) + Send + Sync>;

/// Handlers registered by event-type token (spec.md §4.6 "Registration").
/// Shared with the dispatch task spawned in `start`, so registration can
/// happen before or after the session is running.
#[derive(Clone, Default)]
struct Listeners(Arc<Mutex<HashMap<&'static str, Vec<Listener>>>>);

impl Listeners {
    fn add(&self, kind: &'static str, handler: Listener) {
        self.0.lock().expect("listener registry poisoned").entry(kind).or_default().push(handler);
    }

    fn has(&self, kind: &'static str) -> bool {
        self.0.lock().expect("listener registry poisoned").get(kind).is_some_and(|v| !v.is_empty())
    }

    fn dispatch(&self, event: &Event) {
        let registry = self.0.lock().expect("listener registry poisoned");
        if let Some(handlers) = registry.get(event.kind()) {
            for handler in handlers {
                // A handler exception must not terminate the session loop
                // (spec.md §7 "Handler exceptions ... log and continue").
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(event))).is_err() {
                    tracing::error!(kind = event.kind(), "event handler panicked");
                }
            }
        }
    }
}

/// The real-time client for a single broadcaster handle (spec.md §6 `new`).
///
/// At most one session may be connected at a time: `start`/`connect`/`run`
/// all raise [`ClientError::AlreadyConnected`] on an already-running client
/// (spec.md §5 "exactly one session task per public client").
pub struct Client {
    handle: Handle,
    config: ClientConfig,
    http: HttpFacade,
    gifts: GiftCatalog,
    room_info: Option<serde_json::Value>,
    room_id: Option<u64>,
    bus: EventBus,
    listeners: Listeners,
    dispatch: Option<tokio::task::JoinHandle<()>>,
    session: Option<SessionHandle>,
}

impl Client {
    pub fn new(handle: impl Into<Handle>, config: ClientConfig) -> Result<Self, ClientError> {
        let mut cookies = CookieJar::new();
        cookies.merge(defaults::default_cookies());
        if let Some(idc) = &config.tt_target_idc {
            cookies.set("tt-target-idc", idc.clone());
        }

        let (bus, _receiver) = EventBus::new();

        let http = HttpFacade::new(
            defaults::web_client_params(),
            defaults::request_headers(),
            cookies,
            config.web_proxy.as_deref(),
        )?;

        Ok(Self {
            handle: handle.into(),
            config,
            http,
            gifts: GiftCatalog::new(),
            room_info: None,
            room_id: None,
            bus,
            listeners: Listeners::default(),
            dispatch: None,
            session: None,
        })
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.bus.subscribe()
    }

    /// Register a handler for an event-type token, e.g. `"chat"`, `"gift"`
    /// (spec.md §6 `on`/`add_listener`).
    pub fn on(&self, kind: &'static str, handler: impl Fn(&Event) + Send + Sync + 'static) {
        self.listeners.add(kind, Box::new(handler));
    }

    pub fn add_listener(&self, kind: &'static str, handler: impl Fn(&Event) + Send + Sync + 'static) {
        self.on(kind, handler);
    }

    pub fn has_listener(&self, kind: &'static str) -> bool {
        self.listeners.has(kind)
    }

    /// Resolve the room, run the handshake, connect the WebSocket, and spawn
    /// the session task. Returns once the first-yield contract has been
    /// satisfied (spec.md §6 `start`).
    pub async fn start(&mut self, options: StartOptions) -> Result<(), ClientError> {
        if self.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }

        let room_id = match options.room_id {
            Some(id) => id,
            None => resolver::resolve_room_id(&self.http, &self.handle, self.config.is_user_id).await?,
        };

        if options.fetch_live_check {
            let alive = resolver::check_alive(&self.http, &[room_id]).await?;
            if alive.first() == Some(&false) {
                return Err(ClientError::UserOffline);
            }
        }

        if options.fetch_room_info {
            self.fetch_room_info(room_id).await?;
        }

        if options.fetch_gift_info {
            self.fetch_gift_info().await?;
        }

        // Subscribe before the session exists: the session's first-yield
        // events are emitted synchronously inside `connect_and_run`, and the
        // bus has no replay log, so a late subscriber would miss them.
        self.spawn_dispatch_task();

        let user_agent = defaults::request_headers()
            .get("User-Agent")
            .cloned()
            .unwrap_or_default();

        let handshake = HandshakeClient::new(&self.http, &self.config);
        let handshake_result = handshake.fetch(room_id, &user_agent, &options.preferred_agent_ids).await?;

        let base_ws_params = merged_ws_params();

        let session = session::connect_and_run(
            self.handle.clone(),
            room_id,
            self.http.cookies_snapshot(),
            user_agent,
            handshake_result,
            base_ws_params,
            options.compress_ws_events,
            options.process_connect_events,
            self.bus.clone(),
            self.config.ws_proxy.clone(),
        )
        .await?;

        self.room_id = Some(room_id);
        self.session = Some(session);
        Ok(())
    }

    /// Awaits the session task to completion (spec.md §6 `connect`).
    pub async fn connect(&mut self, options: StartOptions) -> Result<(), ClientError> {
        self.start(options).await?;
        self.run_to_completion().await
    }

    /// Blocks until the session ends; identical to `connect` minus the
    /// implicit `start` (spec.md §6 `run`: "blocks current thread for the
    /// loop lifetime" — here, the current task, per tokio convention).
    pub async fn run(&mut self, options: StartOptions) -> Result<(), ClientError> {
        self.connect(options).await
    }

    async fn run_to_completion(&mut self) -> Result<(), ClientError> {
        if let Some(session) = self.session.take() {
            match session.task.await {
                Ok(result) => result,
                Err(join_error) if join_error.is_cancelled() => Ok(()),
                Err(join_error) => Err(ClientError::SignApi(crate::error::SignApiError::ConnectError(join_error.to_string()))),
            }
        } else {
            Ok(())
        }
    }

    /// Closes the WebSocket and awaits teardown. A no-op if already
    /// disconnected (spec.md §5 "Double-disconnect is a no-op"). Always
    /// clears room state, even when already disconnected, since a naturally
    /// terminated session (peer close, control-driven live-end) leaves
    /// `self.session` as `None` but the stale room id/info/gifts behind
    /// (spec.md §6 "clear room id and room/gift info").
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        self.reconcile_session();

        let Some(session) = self.session.take() else {
            self.clear_room_state();
            return Ok(());
        };
        let _ = session.disconnect_tx.send(());
        let result = match session.task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => Ok(()),
            Err(join_error) => Err(ClientError::SignApi(crate::error::SignApiError::ConnectError(join_error.to_string()))),
        };
        if let Some(dispatch) = self.dispatch.take() {
            dispatch.abort();
        }
        self.clear_room_state();
        result
    }

    fn clear_room_state(&mut self) {
        self.room_id = None;
        self.room_info = None;
        self.gifts = GiftCatalog::new();
    }

    /// Drop `self.session` if its task already finished on its own (peer
    /// close, or the `RouterSignal::LiveEnd` path in `session.rs`), so a
    /// natural termination doesn't leave `is_connected` reporting a stale
    /// `true` forever (spec.md §5 "exactly one session task per public
    /// client").
    fn reconcile_session(&mut self) {
        if self.session.as_ref().is_some_and(|session| session.task.is_finished()) {
            self.session = None;
        }
    }

    pub fn is_connected(&mut self) -> bool {
        self.reconcile_session();
        self.session.is_some()
    }

    pub fn room_info(&self) -> Option<&serde_json::Value> {
        self.room_info.as_ref()
    }

    pub fn gifts(&self) -> &GiftCatalog {
        &self.gifts
    }

    /// Bulk liveness check against the resolved room, or any explicitly
    /// passed handle's room (spec.md §6 `is_live(handle?)`).
    pub async fn is_live(&self, handle: Option<&Handle>) -> Result<bool, ClientError> {
        let room_id = match handle {
            Some(handle) => resolver::resolve_room_id(&self.http, handle, self.config.is_user_id).await?,
            None => match self.room_id {
                Some(id) => id,
                None => resolver::resolve_room_id(&self.http, &self.handle, self.config.is_user_id).await?,
            },
        };
        let alive = resolver::check_alive(&self.http, &[room_id]).await?;
        Ok(alive.first().copied().unwrap_or(false))
    }

    /// `POST {sign_base}/webcast/sign_url/` (spec.md §6 `send_room_chat`).
    /// Requires an authenticated session cookie; the signing service
    /// rejects the request otherwise.
    pub async fn send_room_chat(&self, content: &str) -> Result<String, ClientError> {
        let Some(room_id) = self.room_id else {
            return Err(ClientError::WebsocketUrlMissing);
        };

        let mut params = HashMap::new();
        params.insert("room_id".to_string(), room_id.to_string());
        params.insert("content".to_string(), content.to_string());
        if let Some(session_id) = &self.config.session_id {
            params.insert("session_id".to_string(), session_id.clone());
        }

        let url = format!("{}/webcast/sign_url/", defaults::TIKTOK_SIGN_URL);
        let response = self
            .http
            .post(&url, &params, &HashMap::new(), Backend::Standard)
            .await
            .map_err(|e| crate::error::SignApiError::ConnectError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.ok();
            return Err(crate::error::SignApiError::SignNot200 { status, message }.into());
        }

        let body = response
            .text()
            .await
            .map_err(tiktok_live_transport::TransportError::Http)?;

        // The sign server answers 200 with an embedded `code` field for
        // premium-only routes (grounded on `web_signer.py`'s
        // `sign_response['code'] == 403` check against this same endpoint).
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
            if json.get("code").and_then(serde_json::Value::as_i64) == Some(403) {
                let message = json.get("message").and_then(serde_json::Value::as_str).map(str::to_string);
                return Err(crate::error::SignApiError::PremiumEndpoint { message }.into());
            }
        }

        Ok(body)
    }

    fn spawn_dispatch_task(&mut self) {
        if let Some(handle) = self.dispatch.take() {
            handle.abort();
        }
        let mut subscription = self.bus.subscribe().0;
        let listeners = self.listeners.clone();
        self.dispatch = Some(tokio::spawn(async move {
            while let Ok(event) = subscription.recv().await {
                listeners.dispatch(&event);
            }
        }));
    }

    /// `GET {webcast_base}/room/info/` (spec.md §6 `fetch_room_info`),
    /// grounded on `fetch_room_info.py`. Stored as a free-form JSON value
    /// (spec.md §3 `RoomInfo`), since this crate only reads a handful of
    /// fields and the rest is out of scope to model exhaustively.
    async fn fetch_room_info(&mut self, room_id: u64) -> Result<(), ClientError> {
        let url = format!("{}/room/info/", defaults::TIKTOK_WEBCAST_URL);
        let mut params = HashMap::new();
        params.insert("room_id".to_string(), room_id.to_string());

        let response = self.http.get(&url, &params, &HashMap::new(), Backend::Standard).await?;
        let json: serde_json::Value = response.json().await.map_err(tiktok_live_transport::TransportError::Http)?;
        self.room_info = json.get("data").cloned();
        Ok(())
    }

    /// `GET {webcast_base}/gift/list/` (spec.md §6 `fetch_gift_info`),
    /// grounded on `fetch_gift_list.py`. The upstream route takes no
    /// `room_id` parameter: the gift catalog is scoped to the account
    /// identified by the facade's base params/cookies, not the room.
    async fn fetch_gift_info(&mut self) -> Result<(), ClientError> {
        let url = format!("{}/gift/list/", defaults::TIKTOK_WEBCAST_URL);
        let response = self.http.get(&url, &HashMap::new(), &HashMap::new(), Backend::Standard).await?;
        let json: serde_json::Value = response.json().await.map_err(tiktok_live_transport::TransportError::Http)?;

        if let Some(gifts) = json.pointer("/data/gifts").and_then(serde_json::Value::as_array) {
            for entry in gifts {
                let Some(id) = entry.get("id").and_then(serde_json::Value::as_u64) else { continue };
                let gift = Gift {
                    id,
                    name: entry.get("name").and_then(serde_json::Value::as_str).unwrap_or_default().to_string(),
                    diamond_count: entry.get("diamond_count").and_then(serde_json::Value::as_u64).unwrap_or(0) as u32,
                    icon_urls: entry
                        .pointer("/image/url_list")
                        .and_then(serde_json::Value::as_array)
                        .map(|urls| urls.iter().filter_map(|u| u.as_str().map(str::to_string)).collect())
                        .unwrap_or_default(),
                    is_repeatable: entry.get("type").and_then(serde_json::Value::as_i64) == Some(1),
                };
                self.gifts.insert(id, gift);
            }
        }
        Ok(())
    }
}

fn merged_ws_params() -> HashMap<String, String> {
    let mut params = defaults::web_client_params();
    params.extend(defaults::ws_client_params());
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_starts_with_no_session() {
        let mut client = Client::new("someuser", ClientConfig::default()).unwrap();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn double_disconnect_is_a_no_op() {
        let mut client = Client::new("someuser", ClientConfig::default()).unwrap();
        client.disconnect().await.unwrap();
        client.disconnect().await.unwrap();
    }

    #[test]
    fn invalid_web_proxy_is_a_clear_construction_error() {
        let config = ClientConfig { web_proxy: Some("not a url".to_string()), ..Default::default() };
        assert!(Client::new("someuser", config).is_err());
    }
}
