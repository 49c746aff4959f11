use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Storage error: {0}")]
    #[diagnostic(
        code(modbot::store),
        help("fix or move the file aside; it is never overwritten while unreadable")
    )]
    Store(#[from] StoreError),

    #[error("Classifier error: {0}")]
    #[diagnostic(code(modbot::classify))]
    Classify(#[from] ClassifyError),

    #[error("Discord error: {0}")]
    #[diagnostic(code(modbot::discord))]
    Discord(#[from] serenity::Error),

    #[error("Missing Discord bot token")]
    #[diagnostic(code(modbot::config), help("set DISCORD_BOT_TOKEN or pass --token"))]
    MissingToken,

    #[error("Missing OpenAI API key")]
    #[diagnostic(code(modbot::config), help("set OPENAI_API_KEY or pass --openai-key"))]
    MissingApiKey,

    #[error("Could not read triggering words from {path}: {source}")]
    #[diagnostic(code(modbot::config))]
    TriggerWords {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} exists but could not be parsed: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize table: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("moderation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("moderation API returned no results")]
    EmptyResponse,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("missing permission: {0}")]
    Permission(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("role hierarchy: {0}")]
    Hierarchy(String),

    #[error("{0}")]
    Other(String),
}
