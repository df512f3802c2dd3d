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

mod config;

use config::DemoConfig;
use tiktok_live_client::{Client, ClientConfig, StartOptions};
use tiktok_live_types::Event;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("starting tiktok-live demo client");

    let demo_config = DemoConfig::from_env_or_default()?;

    let client_config = ClientConfig {
        session_id: demo_config.session_id,
        sign_api_key: demo_config.sign_api_key,
        ..Default::default()
    };

    let mut client = Client::new(demo_config.handle.as_str(), client_config)?;

    client.on("chat", |event| {
        if let Event::Chat(chat) = event {
            info!(comment = %chat.comment, "chat");
        }
    });
    client.on("gift", |event| {
        if let Event::Gift(gift) = event {
            info!(gift_id = gift.gift_id, repeat_count = gift.repeat_count, "gift");
        }
    });
    client.on("live_end", |_event| {
        warn!("stream ended");
    });

    let options = StartOptions {
        fetch_room_info: demo_config.fetch_room_info,
        fetch_gift_info: demo_config.fetch_gift_info,
        ..Default::default()
    };

    if let Err(e) = client.run(options).await {
        error!(error = %e, "session ended with an error");
    }

    info!("demo client shut down");
    Ok(())
}
