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

//! Client configuration (spec.md §6 "Configuration", §9 REDESIGN FLAG:
//! model as an immutable configuration record passed at construction).
//!
//! Grounded on `bot/src/config.rs`'s `BotConfig`/`ClientConfig` pattern
//! (serde-deserializable struct with sane defaults via `#[serde(default)]`).

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Recognized options for `Client::start` (spec.md §6 "Configuration" table).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartOptions {
    #[serde(default = "default_true")]
    pub process_connect_events: bool,
    #[serde(default = "default_true")]
    pub compress_ws_events: bool,
    #[serde(default)]
    pub fetch_room_info: bool,
    #[serde(default)]
    pub fetch_gift_info: bool,
    #[serde(default = "default_true")]
    pub fetch_live_check: bool,
    #[serde(default)]
    pub room_id: Option<u64>,
    #[serde(default)]
    pub preferred_agent_ids: Vec<String>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            process_connect_events: true,
            compress_ws_events: true,
            fetch_room_info: false,
            fetch_gift_info: false,
            fetch_live_check: true,
            room_id: None,
            preferred_agent_ids: Vec::new(),
        }
    }
}

/// Client-construction options: proxies and signer overrides (spec.md §6
/// `new(handle, {web_proxy?, ws_proxy?, web_kwargs?, ws_kwargs?,
/// is_user_id?})`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub web_proxy: Option<String>,
    pub ws_proxy: Option<String>,
    pub sign_api_key: Option<String>,
    #[serde(default)]
    pub is_user_id: bool,
    /// Consumer-supplied authenticated session cookie. Forwarding it to the
    /// WebSocket is gated by `WHITELIST_AUTHENTICATED_SESSION_ID_HOST`
    /// (spec.md §4.4).
    pub session_id: Option<String>,
    pub tt_target_idc: Option<String>,
}

/// The two environment variables spec.md §6 names.
pub const WHITELIST_AUTHENTICATED_SESSION_ID_HOST: &str = "WHITELIST_AUTHENTICATED_SESSION_ID_HOST";
pub const SIGN_SERVER_MESSAGE_DISABLED: &str = "SIGN_SERVER_MESSAGE_DISABLED";
