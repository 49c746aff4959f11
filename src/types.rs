// platform-neutral ids and message shapes the moderation core works with

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<u64> for $name {
                fn from(id: u64) -> Self {
                    Self(id)
                }
            }
        )*
    };
}

id_type! {
    /// a guild / server
    CommunityId,
    UserId,
    ChannelId,
    MessageId,
    RoleId,
}

impl UserId {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image"))
    }
}

// an inbound message, already stripped of everything the core doesn't need
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub community: CommunityId,
    pub channel: ChannelId,
    pub author: UserId,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewChannel,
    ReadMessageHistory,
    SendMessages,
    Speak,
}

/// Per-channel allow/deny pair applied to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overwrite {
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

impl Overwrite {
    /// what the mute role gets in every channel: can read, can't talk
    pub fn muted() -> Self {
        Self {
            allow: vec![Permission::ViewChannel, Permission::ReadMessageHistory],
            deny: vec![Permission::SendMessages, Permission::Speak],
        }
    }
}
