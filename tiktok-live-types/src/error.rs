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

/// Errors raised by the wire codec (spec.md §4.1).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed push frame: {0}")]
    MalformedFrame(#[from] prost::DecodeError),

    #[error("malformed fetch-result payload: {0}")]
    MalformedPayload(String),

    #[error("failed to gzip-inflate payload: {0}")]
    Inflate(#[source] std::io::Error),
}
