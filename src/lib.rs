// modbot library - ai moderation for discord communities

pub mod classify;
pub mod cli;
pub mod commands;
pub mod discord;
pub mod duration;
mod error;
pub mod moderation;
pub mod platform;
pub mod store;
pub mod types;

pub use classify::{Classifier, Image, OpenAi};
pub use duration::{DurationError, MuteDuration};
pub use error::{ClassifyError, Error, PlatformError, StoreError};
pub use moderation::{Action, Moderator, MuteController, MuteError, TriggerWords};
pub use platform::Platform;
pub use store::{CommunityConfig, ConfigStore, MuteStore, Setting, Stores, WarningStore};
