// discord wiring - gateway client, event handler, and the Platform impl

mod handler;
mod platform;

pub use handler::{Handler, definitions};
pub use platform::Discord;

use crate::Error;
use crate::moderation::Moderator;
use crate::store::ConfigStore;
use serenity::Client;
use serenity::all::GatewayIntents;
use std::sync::Arc;
use tracing::info;

pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
}

/// Connect to the gateway and handle events until ctrl-c.
pub async fn run(token: &str, moderator: Arc<Moderator>, config: Arc<ConfigStore>) -> Result<(), Error> {
    let mut client = Client::builder(token, intents())
        .event_handler(Handler::new(moderator, config))
        .await?;

    let shards = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            shards.shutdown_all().await;
        }
    });

    client.start().await?;
    Ok(())
}
