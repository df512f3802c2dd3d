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

//! Room resolver (spec.md §4.3).
//!
//! Primary strategy grounded on
//! `fetch_room_id_live_html.py` (SIGI_STATE scrape); fallback grounded on
//! `fetch_room_id_api.py` (REST); bulk liveness grounded on
//! `fetch_is_live.py`.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;
use tiktok_live_transport::{Backend, HttpFacade};

use crate::defaults::{TIKTOK_APP_URL, TIKTOK_WEBCAST_URL};
use crate::error::ClientError;
use crate::handle::Handle;

const OFFLINE_STATUS: i64 = 4;

/// The exact JSON field name is an educated guess (spec.md §9 Open
/// Question); checked on both `user` and the enclosing `LiveRoom` object
/// since the read source material doesn't pin down which level carries it.
fn is_age_restricted(user: &Value, live_room: &Value) -> bool {
    user.get("ageRestricted").and_then(Value::as_bool).unwrap_or(false)
        || live_room.get("ageRestricted").and_then(Value::as_bool).unwrap_or(false)
}

fn sigi_state_pattern() -> Regex {
    Regex::new(r#"<script id="SIGI_STATE" type="application/json">(?P<json>.+?)</script>"#)
        .expect("static regex is valid")
}

/// Primary strategy: scrape the live page HTML for the embedded SIGI_STATE
/// JSON blob.
pub async fn resolve_via_html(http: &HttpFacade, handle: &Handle) -> Result<u64, ClientError> {
    let url = format!("{TIKTOK_APP_URL}/@{}/live", handle.as_str());
    let response = http
        .get(&url, &HashMap::new(), &HashMap::new(), Backend::Standard)
        .await?;
    let body = response.text().await.map_err(tiktok_live_transport::TransportError::Http)?;

    let captures = sigi_state_pattern()
        .captures(&body)
        .ok_or(ClientError::FailedParseAppInfo)?;
    let json: Value = serde_json::from_str(&captures["json"]).map_err(|_| ClientError::FailedParseAppInfo)?;

    let live_room = json
        .get("LiveRoom")
        .ok_or_else(|| ClientError::UserNotFound { unique_id: handle.to_string() })?;

    let user = live_room
        .pointer("/liveRoomUserInfo/user")
        .ok_or(ClientError::FailedParseAppInfo)?;

    // Age-restricted rooms hide their room id behind a login wall unless an
    // authenticated session cookie is already present ("Pass sessionid to
    // bypass", mirroring `errors.py`'s `AgeRestrictedError` docstring).
    if is_age_restricted(user, live_room) && http.cookies_snapshot().get("sessionid").is_none() {
        return Err(ClientError::AgeRestricted);
    }

    if user.get("status").and_then(Value::as_i64) == Some(OFFLINE_STATUS) {
        return Err(ClientError::UserOffline);
    }

    user.get("roomId")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or(ClientError::FailedParseRoomId)
}

/// Fallback strategy: REST endpoint `/api-live/user/room/`.
pub async fn resolve_via_api(http: &HttpFacade, handle: &Handle) -> Result<u64, ClientError> {
    let params: HashMap<String, String> = [
        ("uniqueId".to_string(), handle.to_string()),
        ("sourceType".to_string(), "54".to_string()),
    ]
    .into_iter()
    .collect();

    let response = http
        .get(&format!("{TIKTOK_APP_URL}/api-live/user/room/"), &params, &HashMap::new(), Backend::Standard)
        .await?;
    let json: Value = response.json().await.map_err(tiktok_live_transport::TransportError::Http)?;

    if json.get("message").and_then(Value::as_str) == Some("user_not_found") {
        return Err(ClientError::UserNotFound { unique_id: handle.to_string() });
    }

    json.pointer("/data/user/roomId")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or(ClientError::FailedParseRoomId)
}

/// Resolve a handle to a room id, trying the HTML strategy first and
/// falling back to the REST strategy on any failure other than
/// `UserOffline`/`UserNotFound` (those are definitive and propagate
/// directly, per spec.md §4.3).
///
/// `is_user_id` signals the handle is already a numeric user id rather than
/// a `@username` (spec.md §6 `new(handle, {..., is_user_id?})`); the HTML
/// strategy scrapes `/@{handle}/live` and returns garbage for a bare id, so
/// it is skipped in favor of going straight to the REST fallback.
pub async fn resolve_room_id(http: &HttpFacade, handle: &Handle, is_user_id: bool) -> Result<u64, ClientError> {
    if is_user_id {
        return resolve_via_api(http, handle).await;
    }

    match resolve_via_html(http, handle).await {
        Ok(room_id) => Ok(room_id),
        Err(ClientError::UserOffline) => Err(ClientError::UserOffline),
        Err(ClientError::UserNotFound { unique_id }) => Err(ClientError::UserNotFound { unique_id }),
        Err(ClientError::AgeRestricted) => Err(ClientError::AgeRestricted),
        Err(_) => resolve_via_api(http, handle).await,
    }
}

/// Bulk liveness check for a set of known room ids.
pub async fn check_alive(http: &HttpFacade, room_ids: &[u64]) -> Result<Vec<bool>, ClientError> {
    let joined = room_ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
    let params: HashMap<String, String> = [("room_ids".to_string(), joined)].into_iter().collect();

    let response = http
        .get(&format!("{TIKTOK_WEBCAST_URL}/room/check_alive/"), &params, &HashMap::new(), Backend::Standard)
        .await?;
    let json: Value = response.json().await.map_err(tiktok_live_transport::TransportError::Http)?;

    let data = json.get("data").and_then(Value::as_array).ok_or(ClientError::FailedParseAppInfo)?;
    Ok(data
        .iter()
        .map(|entry| entry.get("alive").and_then(Value::as_bool).unwrap_or(false))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigi_pattern_extracts_json_blob() {
        let html = r#"<html><script id="SIGI_STATE" type="application/json">{"a":1}</script></html>"#;
        let captures = sigi_state_pattern().captures(html).unwrap();
        assert_eq!(&captures["json"], r#"{"a":1}"#);
    }

    #[test]
    fn offline_status_constant_is_four() {
        assert_eq!(OFFLINE_STATUS, 4);
    }

    #[test]
    fn age_restricted_checked_on_user_or_live_room() {
        let neither = serde_json::json!({});
        assert!(!is_age_restricted(&neither, &neither));

        let on_user = serde_json::json!({"ageRestricted": true});
        assert!(is_age_restricted(&on_user, &neither));

        let on_live_room = serde_json::json!({"ageRestricted": true});
        assert!(is_age_restricted(&neither, &on_live_room));
    }
}
