// command line interface and process bootstrap

use crate::classify::OpenAi;
use crate::discord::{self, Discord};
use crate::moderation::{Moderator, TriggerWords};
use crate::store::Stores;
use crate::Error;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use miette::Result;
use serenity::http::Http;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "modbot", about = "AI content moderation for Discord servers")]
struct Cli {
    /// discord bot token
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// openai api key used for text and image moderation
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// where servers.json, warnings.json and mutes.json live
    #[arg(long, env = "MODBOT_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// only classify messages containing a triggering word
    #[arg(long, env = "USE_TRIGGERING_WORDS", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    use_triggering_words: bool,

    /// comma separated word list for --use-triggering-words
    #[arg(long, env = "TRIGGERING_WORDS")]
    triggering_words: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

async fn load_triggers(enabled: bool, path: Option<&Path>) -> Result<TriggerWords, Error> {
    if !enabled {
        return Ok(TriggerWords::disabled());
    }

    let Some(path) = path else {
        return Ok(TriggerWords::new(Vec::<String>::new()));
    };

    let list = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::TriggerWords {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(TriggerWords::parse(&list))
}

pub async fn run() -> Result<()> {
    // a .env file is optional
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let token = cli.token.ok_or(Error::MissingToken)?;
    let api_key = cli.openai_key.ok_or(Error::MissingApiKey)?;

    let triggers = load_triggers(cli.use_triggering_words, cli.triggering_words.as_deref()).await?;
    if triggers.is_enabled() {
        info!(words = triggers.len(), "triggering word filter on");
    }

    // an unreadable table stops us here rather than being replaced
    let stores = Stores::open(&cli.data_dir).await.map_err(Error::from)?;
    info!(data_dir = %cli.data_dir.display(), "loaded stores");

    let classifier = Arc::new(OpenAi::new(api_key).map_err(Error::from)?);
    let platform = Arc::new(Discord::new(Arc::new(Http::new(&token))));

    let moderator = Moderator::new(
        stores.config.clone(),
        stores.warnings.clone(),
        stores.mutes.clone(),
        classifier,
        platform,
    )
    .with_triggers(triggers);

    Ok(discord::run(&token, Arc::new(moderator), stores.config).await?)
}
