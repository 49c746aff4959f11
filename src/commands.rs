// admin commands - validate, update the community config, and say what happened

use crate::duration::MuteDuration;
use crate::store::{ConfigStore, Setting};
use crate::types::{ChannelId, CommunityId};
use thiserror::Error;
use tracing::info;

pub const HELP: &str = r#"
**Help:**
```
help: Shows this information.
set_warnings <warnings>: Sets the number of warnings a user can have before muting them.
set_mute_time <time>: Sets the amount of time a user is muted for after having too many warnings. Example: 1d, 3m, 5s, 6h
use_warnings <boolean>: Whether to use warnings and mute the user, or just only delete the message.
set_sensitivity <float from 0-1>: The image moderation sensitivity. As sensitivity increases, image moderation becomes more strict, and as sensitivity decreases, image moderation becomes less strict.
set_logs_channel <channel id|none>: The channel id deletions are logged to, or none to stop logging. The bot must be able to view and send messages in this channel.
```

Default settings:
```
set_warnings: 3
set_mute_time: 10m
use_warnings: False
set_sensitivity: 0.5
set_logs_channel: None (will not log any deletions)
```

Also note that the bot's role should be **ABOVE** all other members, in order to create and enforce the muted role.
"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    SetLogsChannel(String),
    UseWarnings(bool),
    SetSensitivity(f64),
    SetWarnings(i64),
    SetMuteTime(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::SetLogsChannel(_) => "set_logs_channel",
            Self::UseWarnings(_) => "use_warnings",
            Self::SetSensitivity(_) => "set_sensitivity",
            Self::SetWarnings(_) => "set_warnings",
            Self::SetMuteTime(_) => "set_mute_time",
        }
    }

    pub fn requires_admin(&self) -> bool {
        !matches!(self, Self::Help)
    }

    /// Turn raw input into a setting, or say what's wrong with it.
    fn setting(&self) -> Result<Option<Setting>, CommandError> {
        let setting = match self {
            Self::Help => return Ok(None),
            Self::SetLogsChannel(raw) => Setting::LogChannel(parse_channel(raw)?),
            Self::UseWarnings(on) => Setting::UseWarnings(*on),
            Self::SetSensitivity(value) => Setting::sensitivity(*value).map_err(|_| {
                CommandError::Validation(
                    "Failed to parse sensitivity. Sensitivity must be a number from 0-1.".into(),
                )
            })?,
            Self::SetWarnings(count) => Setting::warning_threshold(*count).map_err(|_| {
                CommandError::Validation(
                    "Failed to parse warnings. Warnings must be a whole number of at least 1."
                        .into(),
                )
            })?,
            Self::SetMuteTime(raw) => {
                let duration: MuteDuration = raw.trim().parse().map_err(|e| {
                    CommandError::Validation(format!("Invalid duration input: {e}"))
                })?;
                Setting::MuteDuration(duration)
            }
        };

        Ok(Some(setting))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("You do not have permission to use this command.")]
    PermissionDenied,

    #[error("{0}")]
    Validation(String),
}

impl CommandError {
    pub fn reply(&self) -> String {
        match self {
            Self::PermissionDenied => self.to_string(),
            Self::Validation(msg) => format!("**{msg}**"),
        }
    }
}

// "none" turns audit logging off
fn parse_channel(raw: &str) -> Result<Option<ChannelId>, CommandError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Ok(Some(ChannelId(id))),
        _ => Err(CommandError::Validation(
            "Failed to parse logs channel id. Logs Channel ID must be an integer.".into(),
        )),
    }
}

/// Run one command for `community`. Validation happens before anything is
/// written, so a rejected command leaves the config untouched.
pub async fn execute(
    store: &ConfigStore,
    community: CommunityId,
    is_admin: bool,
    command: &Command,
) -> Result<String, CommandError> {
    if command.requires_admin() && !is_admin {
        return Err(CommandError::PermissionDenied);
    }

    let Some(setting) = command.setting()? else {
        return Ok(HELP.to_string());
    };

    let reply = format!("**Successfully set {setting}.**");
    store.set(community, setting).await;
    info!(%community, command = command.name(), "updated community config");

    Ok(reply)
}

/// Like `execute`, but failures become reply text too.
pub async fn respond(
    store: &ConfigStore,
    community: CommunityId,
    is_admin: bool,
    command: &Command,
) -> String {
    execute(store, community, is_admin, command)
        .await
        .unwrap_or_else(|e| e.reply())
}
