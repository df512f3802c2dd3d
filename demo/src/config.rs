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

//! Demo configuration loading, grounded on `bot/src/config.rs`'s
//! `from_file`/`from_env_or_default` pattern.

use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DemoConfig {
    pub handle: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub sign_api_key: Option<String>,
    #[serde(default)]
    pub fetch_room_info: bool,
    #[serde(default)]
    pub fetch_gift_info: bool,
}

impl DemoConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DemoConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_env_or_default() -> anyhow::Result<Self> {
        if let Ok(config_path) = std::env::var("DEMO_CONFIG_PATH") {
            return Self::from_file(&config_path);
        }

        let handle = std::env::var("TIKTOK_HANDLE")
            .map_err(|_| anyhow::anyhow!("set TIKTOK_HANDLE or DEMO_CONFIG_PATH"))?;

        Ok(DemoConfig {
            handle,
            session_id: std::env::var("TIKTOK_SESSION_ID").ok(),
            sign_api_key: std::env::var("TIKTOK_SIGN_API_KEY").ok(),
            fetch_room_info: std::env::var("FETCH_ROOM_INFO").is_ok(),
            fetch_gift_info: std::env::var("FETCH_GIFT_INFO").is_ok(),
        })
    }
}
