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

//! Gift catalog (spec.md §3 "Gift catalog").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub id: u64,
    pub name: String,
    pub diamond_count: u32,
    pub icon_urls: Vec<String>,
    pub is_repeatable: bool,
}

/// Mapping from gift id to descriptor. Mutated only during connect, then
/// read-only (spec.md §3 invariant).
pub type GiftCatalog = HashMap<u64, Gift>;
