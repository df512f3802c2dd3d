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

//! Handshake client (spec.md §4.4).
//!
//! Grounded on
//! `examples/original_source/TikTokLive/client/web/routes/fetch_signed_websocket.py`
//! (current/authoritative route), including the
//! `WHITELIST_AUTHENTICATED_SESSION_ID_HOST` gating and the
//! `X-Set-TT-Cookie` cookie-merge step.

use std::collections::HashMap;

use serde_json::Value;
use tiktok_live_transport::{Backend, HttpFacade};
use tiktok_live_types::{codec, FetchResult, PushFrame};

use crate::config::{ClientConfig, WHITELIST_AUTHENTICATED_SESSION_ID_HOST};
use crate::defaults::TIKTOK_SIGN_URL;
use crate::error::{ClientError, SignApiError};

/// Synthetic `log_id` used for the handshake-derived envelope (spec.md
/// §4.4: "`log_id = -1`"). Represented as `u64::MAX`, the two's-complement
/// value of `-1` on the wire's `uint64` field.
pub const HANDSHAKE_LOG_ID: u64 = u64::MAX;

pub struct HandshakeClient<'a> {
    http: &'a HttpFacade,
    config: &'a ClientConfig,
    sign_base: String,
}

impl<'a> HandshakeClient<'a> {
    pub fn new(http: &'a HttpFacade, config: &'a ClientConfig) -> Self {
        Self {
            http,
            config,
            sign_base: TIKTOK_SIGN_URL.to_string(),
        }
    }

    /// `GET {sign_base}/webcast/fetch/`.
    pub async fn fetch(
        &self,
        room_id: u64,
        user_agent: &str,
        preferred_agent_ids: &[String],
    ) -> Result<FetchResult, ClientError> {
        self.check_session_gating()?;

        let mut params: HashMap<String, String> = [
            ("client".to_string(), crate::defaults::CLIENT_NAME.to_string()),
            ("room_id".to_string(), room_id.to_string()),
            ("user_agent".to_string(), user_agent.to_string()),
        ]
        .into_iter()
        .collect();

        if !preferred_agent_ids.is_empty() {
            params.insert("preferred_agent_ids".to_string(), preferred_agent_ids.join(","));
        }
        if let Some(session_id) = &self.config.session_id {
            params.insert("session_id".to_string(), session_id.clone());
        }

        let mut headers = HashMap::new();
        if let Some(key) = &self.config.sign_api_key {
            headers.insert("X-Api-Key".to_string(), key.clone());
        }

        let url = format!("{}/webcast/fetch/", self.sign_base);
        let response = self
            .http
            .get(&url, &params, &headers, Backend::Standard)
            .await
            .map_err(|e| SignApiError::ConnectError(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(self.rate_limit_error(response).await.into());
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.ok();
            return Err(SignApiError::SignNot200 { status, message }.into());
        }

        let set_cookie = response
            .headers()
            .get("X-Set-TT-Cookie")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(SignApiError::EmptyCookies)?;

        let body = response.bytes().await.map_err(tiktok_live_transport::TransportError::Http)?;
        if body.is_empty() {
            return Err(SignApiError::EmptyPayload.into());
        }

        self.http.merge_cookies(parse_set_cookie_header(&set_cookie));

        let synthetic_frame = PushFrame {
            log_id: HANDSHAKE_LOG_ID,
            payload_type: "msg".to_string(),
            payload: body.to_vec(),
            ..Default::default()
        };

        let mut fetch_result = codec::decode_fetch_result(&synthetic_frame)?;
        fetch_result.is_first = true;

        if fetch_result.cursor.is_empty() {
            return Err(ClientError::InitialCursorMissing);
        }
        if fetch_result.push_server.is_empty() || fetch_result.route_params.is_empty() {
            return Err(ClientError::WebsocketUrlMissing);
        }

        Ok(fetch_result)
    }

    fn check_session_gating(&self) -> Result<(), ClientError> {
        if self.config.session_id.is_none() {
            return Ok(());
        }

        let sign_host = self
            .sign_base
            .split("://")
            .nth(1)
            .unwrap_or(&self.sign_base);

        let whitelisted = std::env::var(WHITELIST_AUTHENTICATED_SESSION_ID_HOST)
            .map(|host| host == sign_host)
            .unwrap_or(false);

        if whitelisted {
            Ok(())
        } else {
            Err(SignApiError::AuthenticatedWebSocket.into())
        }
    }

    async fn rate_limit_error(&self, response: reqwest::Response) -> SignApiError {
        let retry_after = response
            .headers()
            .get("RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let reset_time = response
            .headers()
            .get("RateLimit-Reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let api_message = if std::env::var(crate::config::SIGN_SERVER_MESSAGE_DISABLED).is_ok() {
            None
        } else {
            response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        };

        SignApiError::RateLimit { retry_after, reset_time, api_message }
    }
}

/// Parse `X-Set-TT-Cookie` (a `Set-Cookie`-style, `; `-separated string) into
/// the pairs to merge into the shared cookie jar, scoped to the platform
/// domain (spec.md §4.4).
fn parse_set_cookie_header(header_value: &str) -> Vec<(String, String)> {
    header_value
        .split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.eq_ignore_ascii_case("domain") || key.eq_ignore_ascii_case("path") || key.eq_ignore_ascii_case("expires") {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_simple_cookie_pairs() {
        let pairs = parse_set_cookie_header("sessionid=abc; tt-target-idc=useast1a");
        assert!(pairs.contains(&("sessionid".to_string(), "abc".to_string())));
        assert!(pairs.contains(&("tt-target-idc".to_string(), "useast1a".to_string())));
    }

    #[test]
    fn skips_domain_path_expires_attributes() {
        let pairs = parse_set_cookie_header("sessionid=abc; Domain=.tiktok.com; Path=/");
        assert!(!pairs.iter().any(|(k, _)| k.eq_ignore_ascii_case("domain")));
        assert!(!pairs.iter().any(|(k, _)| k.eq_ignore_ascii_case("path")));
    }

    #[test]
    fn handshake_log_id_is_max_u64() {
        assert_eq!(HANDSHAKE_LOG_ID, u64::MAX);
    }
}
