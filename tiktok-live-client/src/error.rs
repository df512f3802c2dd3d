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

//! Top-level error kinds (spec.md §7), composed from per-module errors the
//! way `videocall-meeting-client::error::ApiError` composes a `reqwest`
//! source error rather than flattening everything into one enum by hand.

use thiserror::Error;

/// Sign-server-level failures (spec.md §4.4, §7 `SignAPIError`). All carry
/// enough of the originating response for introspection.
#[derive(Debug, Error)]
pub enum SignApiError {
    #[error("rate limited by sign server, retry after {retry_after}s (resets at {reset_time})")]
    RateLimit { retry_after: u64, reset_time: u64, api_message: Option<String> },

    #[error("could not connect to sign server: {0}")]
    ConnectError(String),

    #[error("sign server returned an empty payload")]
    EmptyPayload,

    #[error("sign server returned HTTP {status}: {message:?}")]
    SignNot200 { status: u16, message: Option<String> },

    #[error("sign server response carried no X-Set-TT-Cookie header")]
    EmptyCookies,

    #[error("premium sign-server endpoint refused the request: {message:?}")]
    PremiumEndpoint { message: Option<String> },

    #[error("authenticated WebSocket connection requires WHITELIST_AUTHENTICATED_SESSION_ID_HOST to match the sign host")]
    AuthenticatedWebSocket,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("a session is already connected for this client")]
    AlreadyConnected,

    #[error("user is not live")]
    UserOffline,

    #[error("user not found: {unique_id}")]
    UserNotFound { unique_id: String },

    #[error("this account is age-restricted")]
    AgeRestricted,

    #[error("failed to parse room id")]
    FailedParseRoomId,

    #[error("failed to parse app info")]
    FailedParseAppInfo,

    #[error("initial fetch response is missing a cursor")]
    InitialCursorMissing,

    #[error("initial fetch response is missing a websocket URL")]
    WebsocketUrlMissing,

    #[error(transparent)]
    SignApi(#[from] SignApiError),

    #[error("websocket rejected by server: {0}")]
    WebcastBlocked200(String),

    #[error(transparent)]
    Transport(#[from] tiktok_live_transport::TransportError),

    #[error(transparent)]
    WebSocket(#[from] tiktok_live_transport::WebSocketConnectError),

    #[error(transparent)]
    Codec(#[from] tiktok_live_types::CodecError),

    /// Recorder collaborator error, out of core scope; kept for API
    /// compatibility per spec.md §7 ("surface unchanged"). Never
    /// constructed by this crate.
    #[error("a download for this room is already in progress")]
    DuplicateDownload,

    /// See [`ClientError::DuplicateDownload`].
    #[error("no download is in progress for this room")]
    NotDownloadingStream,
}
