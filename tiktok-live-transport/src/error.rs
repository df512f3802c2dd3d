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

use thiserror::Error;

/// WebSocket connection errors (spec.md §4.5 "Errors").
#[derive(Debug, Error)]
pub enum WebSocketConnectError {
    /// The server accepted the request but refused to upgrade, returning
    /// HTTP 200 with a `Handshake-Msg` header (spec.md §4.5, detection
    /// signal). Carries that header's value.
    #[error("WebSocket rejected by server due to \"{message}\"")]
    Blocked200 { message: String },

    /// Any other non-101 HTTP status during the upgrade.
    #[error("HTTP {status}: WebSocket upgrade rejected")]
    HttpError { status: u16 },

    #[error("WebSocket connection failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TLS-fingerprint impersonation backend is not available in this build")]
    ImpersonationUnavailable,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
