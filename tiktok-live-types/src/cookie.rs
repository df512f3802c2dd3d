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

//! Ordered cookie jar (spec.md §3 "Cookie jar").
//!
//! Kept as an explicit insertion-ordered list rather than `reqwest`'s cookie
//! jar: the session engine needs to render a flat `key=value; ...` string
//! for the WebSocket upgrade `Cookie` header (grounded on the reference
//! implementation's `ws_client.py::get_ws_cookie_string`), which a generic
//! HTTP cookie store does not expose directly.

#[derive(Clone, Debug, Default)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a cookie, preserving original insertion position
    /// on overwrite (so default ordering is stable across `set`).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn merge(&mut self, other: impl IntoIterator<Item = (String, String)>) {
        for (k, v) in other {
            self.set(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as a `key=value;` string suitable for a `Cookie` header,
    /// redacting a `sessionid` value to its first 8 characters when
    /// `redact` is true (grounded on `ws_client.py::get_ws_cookie_string`).
    pub fn to_header_string(&self, redact: bool) -> String {
        let session_id = self.get("sessionid").map(str::to_string);

        let rendered = self
            .entries
            .iter()
            .map(|(k, v)| format!("{k}={v};"))
            .collect::<Vec<_>>()
            .join(" ");

        if redact {
            if let Some(sid) = session_id {
                if sid.len() > 8 {
                    let redacted = format!("{}{}", &sid[..8], "*".repeat(sid.len() - 8));
                    return rendered.replace(&sid, &redacted);
                }
            }
        }

        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_in_place() {
        let mut jar = CookieJar::new();
        jar.set("a", "1");
        jar.set("b", "2");
        jar.set("a", "3");
        assert_eq!(jar.get("a"), Some("3"));
        let keys: Vec<_> = jar.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn redacts_session_id_in_header_string() {
        let mut jar = CookieJar::new();
        jar.set("sessionid", "abcdefgh12345");
        let header = jar.to_header_string(true);
        assert!(header.contains("abcdefgh"));
        assert!(!header.contains("12345"));
    }
}
