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

//! Immutable default URLs/params/headers (spec.md §9 REDESIGN FLAG: "Global
//! mutable defaults" → "immutable configuration record ... with a
//! compile-time default"). Values grounded on
//! `examples/original_source/TikTokLive/client/web/web_settings.py`.

use std::collections::HashMap;

pub const TIKTOK_APP_URL: &str = "https://www.tiktok.com";
pub const TIKTOK_SIGN_URL: &str = "https://tiktok.eulerstream.com";
pub const TIKTOK_WEBCAST_URL: &str = "https://webcast.tiktok.com/webcast";

pub const WS_CLIENT_PARAMS_APPEND_STR: &str = "&version_code=270000";

/// Mirrors `DEFAULT_WEB_CLIENT_PARAMS`.
pub fn web_client_params() -> HashMap<String, String> {
    [
        ("aid", "1988"),
        ("app_name", "tiktok_web"),
        ("browser_online", "true"),
        ("device_platform", "web_pc"),
        ("cookie_enabled", "true"),
        ("focus_state", "true"),
        ("is_fullscreen", "false"),
        ("is_page_visible", "true"),
        ("channel", "tiktok_web"),
        ("data_collection_enabled", "true"),
        ("user_is_login", "false"),
        ("msToken", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Mirrors `DEFAULT_WS_CLIENT_PARAMS`.
pub fn ws_client_params() -> HashMap<String, String> {
    [
        ("aid", "1988"),
        ("app_name", "tiktok_web"),
        ("browser_online", "true"),
        ("cookie_enabled", "true"),
        ("device_platform", "web"),
        ("debug", "false"),
        ("identity", "audience"),
        ("sup_ws_ds_opt", "1"),
        ("update_version_code", "2.0.0"),
        ("version_code", "180800"),
        ("did_rule", "3"),
        ("heartbeat_duration", "0"),
        ("resp_content_type", "protobuf"),
        ("history_comment_count", "6"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Mirrors `DEFAULT_REQUEST_HEADERS`.
pub fn request_headers() -> HashMap<String, String> {
    [
        ("Connection", "keep-alive"),
        ("Cache-Control", "max-age=0"),
        ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"),
        ("Accept", "text/html,application/json,application/protobuf"),
        ("Referer", "https://www.tiktok.com/"),
        ("Origin", "https://www.tiktok.com"),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Sec-Fetch-Site", "same-site"),
        ("Sec-Fetch-Mode", "cors"),
        ("Sec-Fetch-Dest", "empty"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn default_cookies() -> HashMap<String, String> {
    [("tt-target-idc", "useast1a")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub const DEFAULT_PING_INTERVAL_SECS: f64 = 5.0;
pub const CLIENT_NAME: &str = "tiktok-live-client-rs";
