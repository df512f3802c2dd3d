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

//! Event router (spec.md §4.6).
//!
//! For each received `(push_frame, fetch_result)` translates embedded
//! messages into typed events and derives synthetic events from control
//! signals and display-text heuristics, delivering them in the order
//! `[synthetic?, raw-envelope, proto]` (spec.md §5 "Ordering guarantees").

use prost::Message as _;
use tiktok_live_types::events::{
    BaseMessage, ChatMessage, ControlAction, ControlMessage, Event, GenericMessage, GiftMessage,
    LikeMessage, MemberMessage, SocialMessage, WebsocketResponseEvent,
};
use tiktok_live_types::{
    BaseMessageWire, ChatMessageWire, ControlMessageWire, FetchResult, GiftMessageWire,
    LikeMessageWire, MemberMessageWire, RoomUserSeqMessageWire, SocialMessageWire, KNOWN_METHODS,
};

use crate::event_bus::EventBus;
use crate::handle::Handle;

/// Signal bubbled up to the session engine when a control message demands a
/// state transition (spec.md §4.6 step 5).
#[derive(Debug, PartialEq, Eq)]
pub enum RouterSignal {
    None,
    LiveEnd,
}

fn to_base_message(wire: Option<BaseMessageWire>) -> BaseMessage {
    let wire = wire.unwrap_or_default();
    BaseMessage {
        user_id: Some(wire.user_id),
        nickname: Some(wire.nickname),
        display_text_key: Some(wire.display_text_key),
    }
}

/// Route one `(push_frame, fetch_result)` pair. Returns the most severe
/// signal observed across all embedded messages.
pub fn route(bus: &EventBus, fetch_result: &FetchResult, handle: &Handle, room_id: u64) -> RouterSignal {
    let mut signal = RouterSignal::None;

    if fetch_result.is_first {
        bus.emit(Event::Connect { handle: handle.to_string(), room_id });
    }

    for message in &fetch_result.messages {
        let raw = Event::WebsocketResponse(WebsocketResponseEvent {
            cursor: fetch_result.cursor.clone(),
            method: message.method.clone(),
        });

        if !KNOWN_METHODS.contains(&message.method.as_str()) {
            // Ordering still holds with no synthetic event: raw, then unknown.
            bus.emit(raw);
            bus.emit(Event::Unknown { method: message.method.clone(), raw: message.payload.clone() });
            continue;
        }

        let Some(decoded) = decode_known_method(&message.method, &message.payload, &mut signal) else {
            bus.emit(raw);
            continue;
        };

        // Emission order is `[synthetic-derived?, raw-envelope, proto]`
        // (spec.md §5 "Ordering guarantees").
        for synthetic in decoded.synthetic {
            bus.emit(synthetic);
        }
        bus.emit(raw);
        bus.emit(decoded.proto);
    }

    signal
}

/// A known-method decode result: the typed proto event plus any synthetic
/// events derived from it (control-driven lifecycle events, Follow/Share
/// display-text heuristics).
struct DecodedMessage {
    proto: Event,
    synthetic: Vec<Event>,
}

fn follow_share_synthetic(display_text_key: &Option<String>) -> Vec<Event> {
    let Some(key) = display_text_key else { return Vec::new() };
    let lower = key.to_lowercase();
    if lower.contains("follow") {
        vec![Event::Follow(SocialMessage { common: BaseMessage { display_text_key: Some(key.clone()), ..Default::default() } })]
    } else if lower.contains("share") {
        vec![Event::Share(SocialMessage { common: BaseMessage { display_text_key: Some(key.clone()), ..Default::default() } })]
    } else {
        Vec::new()
    }
}

/// Decode a known method into its proto event and derived synthetic events,
/// without emitting either (the caller controls ordering against the raw
/// envelope event).
fn decode_known_method(method: &str, payload: &[u8], signal: &mut RouterSignal) -> Option<DecodedMessage> {
    match method {
        "WebcastControlMessage" => {
            let wire = ControlMessageWire::decode(payload).ok()?;
            let common = to_base_message(wire.common);
            let key = common.display_text_key.clone();
            let action = ControlAction::from(wire.action);

            let mut synthetic = Vec::new();
            match action {
                ControlAction::StreamEnded | ControlAction::StreamSuspended => {
                    synthetic.push(Event::LiveEnd);
                    *signal = RouterSignal::LiveEnd;
                }
                ControlAction::StreamPaused => synthetic.push(Event::LivePause),
                ControlAction::StreamUnpaused => synthetic.push(Event::LiveUnpause),
                ControlAction::Other(_) => {}
            }

            Some(DecodedMessage { proto: Event::Control(ControlMessage { common, action }), synthetic })
        }
        "WebcastRoomUserSeqMessage" => {
            let wire = RoomUserSeqMessageWire::decode(payload).ok()?;
            Some(DecodedMessage {
                proto: Event::RoomUserSeq(tiktok_live_types::events::RoomUserSeqMessage { viewer_count: wire.viewer_count }),
                synthetic: Vec::new(),
            })
        }
        "WebcastChatMessage" => {
            let wire = ChatMessageWire::decode(payload).ok()?;
            let common = to_base_message(wire.common);
            let synthetic = follow_share_synthetic(&common.display_text_key);
            Some(DecodedMessage { proto: Event::Chat(ChatMessage { common, comment: wire.comment }), synthetic })
        }
        "WebcastMemberMessage" => {
            let wire = MemberMessageWire::decode(payload).ok()?;
            let common = to_base_message(wire.common);
            let synthetic = follow_share_synthetic(&common.display_text_key);
            Some(DecodedMessage { proto: Event::Member(MemberMessage { common }), synthetic })
        }
        "WebcastGiftMessage" => {
            let wire = GiftMessageWire::decode(payload).ok()?;
            let common = to_base_message(wire.common);
            let synthetic = follow_share_synthetic(&common.display_text_key);
            Some(DecodedMessage {
                proto: Event::Gift(GiftMessage {
                    common,
                    gift_id: wire.gift_id,
                    repeat_count: wire.repeat_count,
                    repeat_end: wire.repeat_end,
                }),
                synthetic,
            })
        }
        "WebcastSocialMessage" => {
            let wire = SocialMessageWire::decode(payload).ok()?;
            let common = to_base_message(wire.common);
            let synthetic = follow_share_synthetic(&common.display_text_key);
            Some(DecodedMessage { proto: Event::Social(SocialMessage { common }), synthetic })
        }
        "WebcastLikeMessage" => {
            let wire = LikeMessageWire::decode(payload).ok()?;
            let common = to_base_message(wire.common);
            let synthetic = follow_share_synthetic(&common.display_text_key);
            Some(DecodedMessage { proto: Event::Like(LikeMessage { common, total_like_count: wire.total_like_count }), synthetic })
        }
        other => {
            // Known but not fully modeled (spec.md §1: wire schema is an
            // external artefact); carry only common fields and raw method.
            let common = BaseMessageWire::decode(payload).ok().map(to_base_message).unwrap_or_default();
            let synthetic = follow_share_synthetic(&common.display_text_key);
            Some(DecodedMessage { proto: Event::Generic(GenericMessage { method: other.to_string(), common }), synthetic })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_broadcast::TryRecvError;
    use tiktok_live_types::{FetchMessage, FetchResult};

    fn drain(mut rx: async_broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Overflowed(_)) => continue,
            }
        }
        events
    }

    #[test]
    fn chat_message_emits_raw_then_typed() {
        let (bus, rx) = EventBus::new();
        let handle = Handle::from("someuser");

        let chat = ChatMessageWire {
            common: Some(BaseMessageWire { user_id: 1, nickname: "a".into(), display_text_key: String::new() }),
            comment: "hello".to_string(),
        };
        let fetch_result = FetchResult {
            cursor: "c0".to_string(),
            is_first: true,
            messages: vec![FetchMessage { method: "WebcastChatMessage".to_string(), payload: chat.encode_to_vec() }],
            ..Default::default()
        };

        let signal = route(&bus, &fetch_result, &handle, 42);
        assert_eq!(signal, RouterSignal::None);

        let events = drain(rx);
        assert!(matches!(events[0], Event::Connect { .. }));
        assert!(matches!(events[1], Event::WebsocketResponse(_)));
        match &events[2] {
            Event::Chat(chat) => assert_eq!(chat.comment, "hello"),
            other => panic!("expected Chat event, got {other:?}"),
        }
    }

    #[test]
    fn stream_ended_control_emits_live_end_and_signals_session() {
        let (bus, rx) = EventBus::new();
        let handle = Handle::from("someuser");

        let control = ControlMessageWire { common: None, action: 3 };
        let fetch_result = FetchResult {
            messages: vec![FetchMessage { method: "WebcastControlMessage".to_string(), payload: control.encode_to_vec() }],
            ..Default::default()
        };

        let signal = route(&bus, &fetch_result, &handle, 42);
        assert_eq!(signal, RouterSignal::LiveEnd);

        let events = drain(rx);
        assert!(events.iter().any(|e| matches!(e, Event::LiveEnd)));
    }

    #[test]
    fn follow_synthetic_precedes_raw_and_proto() {
        let (bus, rx) = EventBus::new();
        let handle = Handle::from("someuser");

        let social = SocialMessageWire {
            common: Some(BaseMessageWire { user_id: 1, nickname: "a".into(), display_text_key: "someone_follow_text".into() }),
        };
        let fetch_result = FetchResult {
            messages: vec![FetchMessage { method: "WebcastSocialMessage".to_string(), payload: social.encode_to_vec() }],
            ..Default::default()
        };

        route(&bus, &fetch_result, &handle, 42);
        let events = drain(rx);

        assert!(matches!(events[0], Event::Follow(_)), "expected Follow first, got {:?}", events[0]);
        assert!(matches!(events[1], Event::WebsocketResponse(_)));
        assert!(matches!(events[2], Event::Social(_)));
    }

    #[test]
    fn stream_ended_synthetic_precedes_raw_and_control_proto() {
        let (bus, rx) = EventBus::new();
        let handle = Handle::from("someuser");

        let control = ControlMessageWire { common: None, action: 3 };
        let fetch_result = FetchResult {
            messages: vec![FetchMessage { method: "WebcastControlMessage".to_string(), payload: control.encode_to_vec() }],
            ..Default::default()
        };

        route(&bus, &fetch_result, &handle, 42);
        let events = drain(rx);

        assert!(matches!(events[0], Event::LiveEnd));
        assert!(matches!(events[1], Event::WebsocketResponse(_)));
        assert!(matches!(events[2], Event::Control(_)));
    }

    #[test]
    fn unknown_method_emits_raw_and_unknown_only() {
        let (bus, rx) = EventBus::new();
        let handle = Handle::from("someuser");

        let fetch_result = FetchResult {
            messages: vec![FetchMessage { method: "WebcastTotallyMadeUpMessage".to_string(), payload: vec![] }],
            ..Default::default()
        };

        route(&bus, &fetch_result, &handle, 42);
        let events = drain(rx);
        assert!(matches!(events[0], Event::WebsocketResponse(_)));
        assert!(matches!(events[1], Event::Unknown { .. }));
    }
}
