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

//! Wire schema for the Webcast push protocol.
//!
//! These are hand-written `prost::Message` structs rather than
//! `protoc`-generated code: the wire schema itself is an external artefact
//! (see spec scope), and this workspace has no reproducible `protoc` step.
//! Field numbers mirror the upstream `.proto` layout observed in the
//! reference implementation.

use std::collections::HashMap;

/// The outer envelope carried by every WebSocket message.
#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct PushFrame {
    #[prost(uint64, tag = "1")]
    pub seq_id: u64,
    #[prost(uint64, tag = "2")]
    pub log_id: u64,
    #[prost(uint64, tag = "3")]
    pub service: u64,
    #[prost(uint64, tag = "4")]
    pub method: u64,
    #[prost(map = "string, string", tag = "5")]
    pub headers: HashMap<String, String>,
    #[prost(string, tag = "6")]
    pub payload_type: String,
    #[prost(bytes, tag = "7")]
    pub payload: Vec<u8>,
}

/// A single typed message embedded in a [`FetchResult`].
#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct FetchMessage {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(bytes, tag = "2")]
    pub payload: Vec<u8>,
}

/// The inner envelope found inside a `"msg"` [`PushFrame`].
#[derive(Clone, PartialEq, Debug, Default, ::prost::Message)]
pub struct FetchResult {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<FetchMessage>,
    #[prost(string, tag = "2")]
    pub cursor: String,
    #[prost(bool, tag = "3")]
    pub need_ack: bool,
    #[prost(string, tag = "4")]
    pub internal_ext: String,
    #[prost(string, tag = "5")]
    pub push_server: String,
    #[prost(map = "string, string", tag = "6")]
    pub route_params: HashMap<String, String>,
    /// Not part of the upstream wire message: set locally to `true` only on
    /// the handshake-derived synthetic envelope (spec.md §3 invariant).
    #[prost(bool, tag = "7")]
    pub is_first: bool,
}

/// Two constant metadata sub-messages plus a room id, per spec.md §4.1.
#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct HeartbeatCommon {
    #[prost(string, tag = "1")]
    pub method: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct HeartbeatFrame {
    #[prost(message, optional, tag = "1")]
    pub common: Option<HeartbeatCommon>,
    #[prost(message, optional, tag = "2")]
    pub extra: Option<HeartbeatCommon>,
    #[prost(uint64, tag = "3")]
    pub room_id: u64,
}

/// Per-method payload schemas (spec.md §4.1 "arbitrary per-method
/// payloads"). Minimal field sets; the full wire schema is an external
/// artefact out of this crate's scope (spec.md §1).
#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct BaseMessageWire {
    #[prost(uint64, tag = "1")]
    pub user_id: u64,
    #[prost(string, tag = "2")]
    pub nickname: String,
    #[prost(string, tag = "3")]
    pub display_text_key: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct ControlMessageWire {
    #[prost(message, optional, tag = "1")]
    pub common: Option<BaseMessageWire>,
    #[prost(int32, tag = "2")]
    pub action: i32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct ChatMessageWire {
    #[prost(message, optional, tag = "1")]
    pub common: Option<BaseMessageWire>,
    #[prost(string, tag = "2")]
    pub comment: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct GiftMessageWire {
    #[prost(message, optional, tag = "1")]
    pub common: Option<BaseMessageWire>,
    #[prost(uint64, tag = "2")]
    pub gift_id: u64,
    #[prost(uint32, tag = "3")]
    pub repeat_count: u32,
    #[prost(bool, tag = "4")]
    pub repeat_end: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct MemberMessageWire {
    #[prost(message, optional, tag = "1")]
    pub common: Option<BaseMessageWire>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct SocialMessageWire {
    #[prost(message, optional, tag = "1")]
    pub common: Option<BaseMessageWire>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct LikeMessageWire {
    #[prost(message, optional, tag = "1")]
    pub common: Option<BaseMessageWire>,
    #[prost(uint64, tag = "2")]
    pub total_like_count: u64,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, ::prost::Message)]
pub struct RoomUserSeqMessageWire {
    #[prost(uint32, tag = "1")]
    pub viewer_count: u32,
}

impl HeartbeatFrame {
    pub fn from_defaults(room_id: u64) -> Self {
        HeartbeatFrame {
            common: Some(HeartbeatCommon {
                method: "hb".to_string(),
            }),
            extra: Some(HeartbeatCommon {
                method: "pull".to_string(),
            }),
            room_id,
        }
    }
}
