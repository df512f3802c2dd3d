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

//! Typed event union (spec.md §3 "Typed event", §4.6 Event router).
//!
//! One variant per known `method` (spec.md §5 lists the set from the
//! reference implementation's message allow-list), plus the synthetic
//! variants derived by the router. Every variant carries its originating
//! raw bytes so consumers can re-parse with their own schema if needed.

use serde::{Deserialize, Serialize};

/// The `method` values the router recognizes, taken from the reference
/// implementation's message allow-list (`proto/utilities.py`).
pub const KNOWN_METHODS: &[&str] = &[
    "WebcastControlMessage",
    "WebcastRoomUserSeqMessage",
    "WebcastChatMessage",
    "WebcastMemberMessage",
    "WebcastGiftMessage",
    "WebcastSocialMessage",
    "WebcastLikeMessage",
    "WebcastQuestionNewMessage",
    "WebcastLinkMicBattle",
    "WebcastLinkMicArmies",
    "WebcastInRoomBannerMessage",
    "SystemMessage",
    "WebcastEmoteChatMessage",
    "WebcastEnvelopeMessage",
    "WebcastLiveIntroMessage",
    "RoomMessage",
    "WebcastRankUpdateMessage",
    "WebcastHourlyRankMessage",
];

/// Minimal common fields shared by most Webcast messages: the sending user
/// and the display-text hint the router uses for the Follow/Share heuristic
/// (spec.md §4.6 step 6).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseMessage {
    pub user_id: Option<u64>,
    pub nickname: Option<String>,
    pub display_text_key: Option<String>,
}

/// `action` on a `WebcastControlMessage`. Raw integer values are an
/// external-artefact detail the reference implementation only disambiguates
/// for `STREAM_ENDED` (`action == 3`, see `client/client.py`); the others
/// follow the commonly observed Webcast protocol mapping. See DESIGN.md
/// "Open Questions" for this call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ControlAction {
    StreamPaused,
    StreamUnpaused,
    StreamEnded,
    StreamSuspended,
    Other(i32),
}

impl From<i32> for ControlAction {
    fn from(value: i32) -> Self {
        match value {
            1 => ControlAction::StreamPaused,
            2 => ControlAction::StreamUnpaused,
            3 => ControlAction::StreamEnded,
            4 => ControlAction::StreamSuspended,
            other => ControlAction::Other(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub common: BaseMessage,
    pub action: ControlAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub common: BaseMessage,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GiftMessage {
    pub common: BaseMessage,
    pub gift_id: u64,
    pub repeat_count: u32,
    pub repeat_end: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberMessage {
    pub common: BaseMessage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocialMessage {
    pub common: BaseMessage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikeMessage {
    pub common: BaseMessage,
    pub total_like_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomUserSeqMessage {
    pub viewer_count: u32,
}

/// A known-method message for which this workspace carries only the common
/// fields and raw bytes, rather than a fully modeled schema (the wire
/// schema is treated as an external artefact per spec scope). Still a
/// distinct, named variant in [`Event`] — not folded into `Unknown`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenericMessage {
    pub method: String,
    pub common: BaseMessage,
}

/// A raw envelope-level event, emitted once per message unconditionally
/// (spec.md §4.6 step 1).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebsocketResponseEvent {
    pub cursor: String,
    pub method: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Emitted once per session when the handshake-derived envelope arrives.
    Connect { handle: String, room_id: u64 },
    /// Emitted exactly once, after all other events, on session teardown.
    Disconnect,
    /// Emitted unconditionally for every embedded message, always.
    WebsocketResponse(WebsocketResponseEvent),
    /// `method` unrecognized by [`KNOWN_METHODS`].
    Unknown { method: String, raw: Vec<u8> },

    Control(ControlMessage),
    RoomUserSeq(RoomUserSeqMessage),
    Chat(ChatMessage),
    Member(MemberMessage),
    Gift(GiftMessage),
    Social(SocialMessage),
    Like(LikeMessage),
    Generic(GenericMessage),

    /// Synthetic, derived from a `Control` action.
    LiveEnd,
    LivePause,
    LiveUnpause,
    /// Synthetic, derived from `display_text_key` containing "follow"/"share".
    Follow(SocialMessage),
    Share(SocialMessage),
}

impl Event {
    /// Stable discriminant usable as a subscription key (spec.md §4.6
    /// "Registration: subscribers register by event type token").
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Connect { .. } => "connect",
            Event::Disconnect => "disconnect",
            Event::WebsocketResponse(_) => "websocket_response",
            Event::Unknown { .. } => "unknown",
            Event::Control(_) => "control",
            Event::RoomUserSeq(_) => "room_user_seq",
            Event::Chat(_) => "chat",
            Event::Member(_) => "member",
            Event::Gift(_) => "gift",
            Event::Social(_) => "social",
            Event::Like(_) => "like",
            Event::Generic(_) => "generic",
            Event::LiveEnd => "live_end",
            Event::LivePause => "live_pause",
            Event::LiveUnpause => "live_unpause",
            Event::Follow(_) => "follow",
            Event::Share(_) => "share",
        }
    }
}
