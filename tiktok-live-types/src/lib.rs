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

//! Wire schema, codec, gift catalog, cookie jar and typed events for the
//! TikTok Live real-time feed.

pub mod codec;
pub mod cookie;
pub mod error;
pub mod events;
pub mod gift;
pub mod wire;

pub use codec::{build_ack_frame, decode_fetch_result, decode_push_frame, encode_push_frame, heartbeat_frame};
pub use cookie::CookieJar;
pub use error::CodecError;
pub use events::{Event, KNOWN_METHODS};
pub use gift::{Gift, GiftCatalog};
pub use wire::{
    BaseMessageWire, ChatMessageWire, ControlMessageWire, FetchMessage, FetchResult,
    GiftMessageWire, LikeMessageWire, MemberMessageWire, PushFrame, RoomUserSeqMessageWire,
    SocialMessageWire,
};
