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

//! Real-time session engine for the TikTok Live feed: room resolution,
//! signed handshake, WebSocket session, and typed event router.

pub mod client;
pub mod config;
pub mod defaults;
pub mod error;
pub mod event_bus;
pub mod handle;
pub mod handshake;
pub mod resolver;
pub mod router;
pub mod session;

pub use client::Client;
pub use config::{ClientConfig, StartOptions};
pub use error::{ClientError, SignApiError};
pub use event_bus::EventSubscription;
pub use handle::Handle;

pub use tiktok_live_types::Event;
