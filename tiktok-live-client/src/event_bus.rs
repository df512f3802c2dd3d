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

//! Per-client typed event bus.
//!
//! Grounded on `videocall-client::event_bus` (`async_broadcast` +
//! capacity constant, `subscribe`/`emit` pair), generalized from a single
//! process-wide `Lazy<Sender<ClientEvent>>` to one bus owned per [`crate::client::Client`]
//! instance: spec.md's "exactly one session task per public client" and
//! §5's per-client subscriber table would leak across independent clients
//! under a shared global sender.

use async_broadcast::{broadcast, Receiver, Sender};
use tiktok_live_types::Event;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: Sender<Event>,
}

pub struct EventSubscription(pub Receiver<Event>);

impl EventBus {
    pub fn new() -> (Self, Receiver<Event>) {
        let (mut sender, receiver) = broadcast(EVENT_BUS_CAPACITY);
        sender.set_overflow(true);
        (Self { sender }, receiver)
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription(self.sender.new_receiver())
    }

    /// Best-effort emit: a lagging/disconnected receiver must never stall
    /// or panic the session loop (spec.md §5 "Handlers ... run on the same
    /// scheduler as the session loop").
    pub fn emit(&self, event: Event) {
        let _ = self.sender.try_broadcast(event);
    }
}
