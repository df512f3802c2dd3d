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

//! Encode/decode of [`PushFrame`] and [`FetchResult`], gzip-gated per the
//! `compress_type` header (spec.md §4.1).

use std::io::Read;

use prost::Message;

use crate::error::CodecError;
use crate::wire::{FetchResult, HeartbeatFrame, PushFrame};

/// Decode a raw WebSocket binary message into a [`PushFrame`].
pub fn decode_push_frame(data: &[u8]) -> Result<PushFrame, CodecError> {
    Ok(PushFrame::decode(data)?)
}

/// Encode a [`PushFrame`] for sending (acks and heartbeats only).
pub fn encode_push_frame(frame: &PushFrame) -> Vec<u8> {
    frame.encode_to_vec()
}

/// Decode the [`FetchResult`] carried by a `"msg"` push frame, gzip-inflating
/// the payload first when `headers["compress_type"] == "gzip"`.
///
/// Missing or `"none"` compress_type parses the payload as-is. Any other
/// value is logged and parsed best-effort without decompression, matching
/// the reference implementation's `# Just pray it works` fallback.
pub fn decode_fetch_result(frame: &PushFrame) -> Result<FetchResult, CodecError> {
    let compress_type = frame.headers.get("compress_type").map(String::as_str);

    let decoded = match compress_type {
        None | Some("none") => FetchResult::decode(frame.payload.as_slice())?,
        Some("gzip") => {
            let inflated = inflate(&frame.payload)?;
            FetchResult::decode(inflated.as_slice())?
        }
        Some(other) => {
            tracing::error!(compress_type = other, "unknown compress_type on push frame");
            FetchResult::decode(frame.payload.as_slice())?
        }
    };

    Ok(decoded)
}

fn inflate(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut gz = flate2::read::GzDecoder::new(payload);
    let mut out = Vec::new();
    gz.read_to_end(&mut out).map_err(CodecError::Inflate)?;
    Ok(out)
}

/// Gzip-compress a payload, used by tests to build synthetic compressed
/// frames and available to callers who want to mirror server compression.
pub fn deflate(payload: &[u8]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(payload).expect("in-memory write cannot fail");
    enc.finish().expect("in-memory finish cannot fail")
}

/// Deterministic heartbeat payload bytes for a given room id (spec.md §4.1,
/// Testable Property 5: pure function of its inputs). `encode_push_frame` is
/// used for acks and heartbeats alike, so the heartbeat payload is carried
/// inside the same outer `PushFrame` envelope as every other message on the
/// socket rather than sent as bare `HeartbeatFrame` bytes.
pub fn heartbeat_frame(room_id: u64) -> Vec<u8> {
    let frame = PushFrame {
        payload_type: "hb".to_string(),
        payload: HeartbeatFrame::from_defaults(room_id).encode_to_vec(),
        ..Default::default()
    };
    encode_push_frame(&frame)
}

/// Build the outgoing ack push frame for a received envelope (spec.md §3
/// invariant: payload is `internal_ext`, or a literal `-` if empty).
pub fn build_ack_frame(log_id: u64, internal_ext: &str) -> PushFrame {
    let payload = if internal_ext.is_empty() {
        b"-".to_vec()
    } else {
        internal_ext.as_bytes().to_vec()
    };

    PushFrame {
        log_id,
        payload_type: "ack".to_string(),
        payload,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_frame_uses_dash_when_internal_ext_empty() {
        let frame = build_ack_frame(42, "");
        assert_eq!(frame.payload, b"-");
        assert_eq!(frame.log_id, 42);
        assert_eq!(frame.payload_type, "ack");
    }

    #[test]
    fn ack_frame_carries_internal_ext() {
        let frame = build_ack_frame(7, "E");
        assert_eq!(frame.payload, b"E");
    }

    #[test]
    fn gzip_round_trip() {
        let result = FetchResult {
            cursor: "c0".to_string(),
            need_ack: true,
            internal_ext: "ext".to_string(),
            ..Default::default()
        };
        let encoded = result.encode_to_vec();
        let compressed = deflate(&encoded);

        let mut frame = PushFrame {
            payload: compressed,
            payload_type: "msg".to_string(),
            ..Default::default()
        };
        frame
            .headers
            .insert("compress_type".to_string(), "gzip".to_string());

        let decoded = decode_fetch_result(&frame).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn uncompressed_round_trip_when_compress_type_none() {
        let result = FetchResult {
            cursor: "c1".to_string(),
            ..Default::default()
        };
        let mut frame = PushFrame {
            payload: result.encode_to_vec(),
            payload_type: "msg".to_string(),
            ..Default::default()
        };
        frame
            .headers
            .insert("compress_type".to_string(), "none".to_string());

        assert_eq!(decode_fetch_result(&frame).unwrap(), result);
    }

    #[test]
    fn heartbeat_frame_is_pure_function_of_room_id() {
        assert_eq!(heartbeat_frame(123), heartbeat_frame(123));
        assert_ne!(heartbeat_frame(123), heartbeat_frame(456));
    }
}
