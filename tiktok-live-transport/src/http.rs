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

//! HTTP facade (spec.md §4.2).
//!
//! Grounded on `videocall-meeting-client::MeetingApiClient` for the
//! builder/response-mapping shape, and on
//! `examples/original_source/TikTokLive/client/web/web_base.py` for the
//! device-id/param/header merge semantics this facade must reproduce.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;
use reqwest::{Client, Method, RequestBuilder, Response};
use tiktok_live_types::CookieJar;

use crate::error::TransportError;

/// Selects which backend performs the request. `Impersonate` exists because
/// spec.md §4.2 requires a TLS-fingerprint-impersonating backend for a
/// subset of endpoints; this workspace does not vendor one (none is present
/// across the example corpus), so selecting it always degrades to a clear
/// runtime error rather than silently falling back to the standard backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Standard,
    Impersonate,
}

#[derive(Clone)]
pub struct HttpFacade {
    client: Client,
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    cookies: Arc<Mutex<CookieJar>>,
}

impl HttpFacade {
    /// `web_proxy`, when set, is wired into the underlying `reqwest::Client`
    /// (spec.md §6 `new(handle, {web_proxy?, ...})`).
    pub fn new(
        base_params: HashMap<String, String>,
        base_headers: HashMap<String, String>,
        cookies: CookieJar,
        web_proxy: Option<&str>,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder().timeout(std::time::Duration::from_secs(10));
        if let Some(proxy_url) = web_proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            params: base_params,
            headers: base_headers,
            cookies: Arc::new(Mutex::new(cookies)),
        })
    }

    /// A point-in-time copy of the shared cookie jar (spec.md §4.2 "a
    /// session setter, and a cookie jar").
    pub fn cookies_snapshot(&self) -> CookieJar {
        self.cookies.lock().expect("cookie jar poisoned").clone()
    }

    /// Merge cookies into the shared jar, e.g. from a signing-service
    /// `X-Set-TT-Cookie` response header.
    pub fn merge_cookies(&self, entries: impl IntoIterator<Item = (String, String)>) {
        self.cookies.lock().expect("cookie jar poisoned").merge(entries);
    }

    /// Consumer-supplied authenticated session cookie (spec.md §3 "Cookie
    /// jar", §6 "session setter").
    pub fn set_session_cookie(&self, value: impl Into<String>) {
        self.cookies.lock().expect("cookie jar poisoned").set("sessionid", value);
    }

    /// A fresh pseudo-random 20-digit device identifier (spec.md §4.2 step 1).
    pub fn generate_device_id() -> u128 {
        let mut rng = rand::thread_rng();
        rng.gen_range(10_000_000_000_000_000_000..99_999_999_999_999_999_999)
    }

    fn build_url(&self, url: &str, extra_params: &HashMap<String, String>) -> String {
        let mut merged = self.params.clone();
        merged.extend(extra_params.clone());
        merged.insert("device_id".to_string(), Self::generate_device_id().to_string());

        let query: Vec<String> = merged.iter().map(|(k, v)| format!("{k}={v}")).collect();
        if url.contains('?') {
            format!("{url}&{}", query.join("&"))
        } else {
            format!("{url}?{}", query.join("&"))
        }
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        backend: Backend,
        extra_params: &HashMap<String, String>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<RequestBuilder, TransportError> {
        if backend == Backend::Impersonate {
            return Err(TransportError::ImpersonationUnavailable);
        }

        let full_url = self.build_url(url, extra_params);
        let mut builder = self.client.request(method, full_url);

        let mut headers = self.headers.clone();
        headers.extend(extra_headers.clone());
        for (k, v) in headers {
            builder = builder.header(k, v);
        }

        let cookie_header = self.cookies_snapshot().to_header_string(false);
        if !cookie_header.is_empty() {
            builder = builder.header("Cookie", cookie_header);
        }

        Ok(builder)
    }

    pub async fn get(
        &self,
        url: &str,
        extra_params: &HashMap<String, String>,
        extra_headers: &HashMap<String, String>,
        backend: Backend,
    ) -> Result<Response, TransportError> {
        let request = self.build_request(Method::GET, url, backend, extra_params, extra_headers)?;
        Ok(request.send().await?)
    }

    pub async fn post(
        &self,
        url: &str,
        extra_params: &HashMap<String, String>,
        extra_headers: &HashMap<String, String>,
        backend: Backend,
    ) -> Result<Response, TransportError> {
        let request = self.build_request(Method::POST, url, backend, extra_params, extra_headers)?;
        Ok(request.send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_is_twenty_digits() {
        let id = HttpFacade::generate_device_id();
        assert_eq!(id.to_string().len(), 20);
    }

    #[test]
    fn build_url_appends_query_with_question_mark() {
        let facade = HttpFacade::new(HashMap::new(), HashMap::new(), CookieJar::new(), None).unwrap();
        let url = facade.build_url("https://example.com/x", &HashMap::new());
        assert!(url.starts_with("https://example.com/x?"));
        assert!(url.contains("device_id="));
    }

    #[test]
    fn invalid_web_proxy_url_is_a_clear_error() {
        assert!(HttpFacade::new(HashMap::new(), HashMap::new(), CookieJar::new(), Some("not a url")).is_err());
    }

    #[tokio::test]
    async fn cookies_set_via_facade_are_visible_in_snapshot() {
        let facade = HttpFacade::new(HashMap::new(), HashMap::new(), CookieJar::new(), None).unwrap();
        facade.set_session_cookie("abc123");
        assert_eq!(facade.cookies_snapshot().get("sessionid"), Some("abc123"));
    }
}
