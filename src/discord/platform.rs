// Platform on top of serenity's http client

use crate::error::PlatformError;
use crate::platform::Platform;
use crate::types::{
    Attachment, ChannelId, CommunityId, Embed, MessageId, Overwrite, Permission, RoleId, UserId,
};
use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateMessage, EditRole};
use serenity::http::{Http, HttpError};
use serenity::model::channel::{PermissionOverwrite, PermissionOverwriteType};
use serenity::model::id as dc;
use serenity::model::permissions::Permissions;
use std::sync::Arc;

// discord json error code for "Missing Permissions", which is also what a
// role hierarchy violation comes back as
const MISSING_PERMISSIONS: isize = 50013;

pub struct Discord {
    http: Arc<Http>,
    client: reqwest::Client,
}

impl Discord {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            client: reqwest::Client::new(),
        }
    }
}

fn platform_error(e: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &e {
        if response.error.code == MISSING_PERMISSIONS {
            return PlatformError::Permission(response.error.message.clone());
        }
        match response.status_code.as_u16() {
            403 => return PlatformError::Permission(response.error.message.clone()),
            404 => return PlatformError::NotFound(response.error.message.clone()),
            _ => {}
        }
    }
    PlatformError::Other(e.to_string())
}

// on role edits and assignments a missing permission means the role sits at
// or above the bot's own highest role
fn hierarchy(e: PlatformError) -> PlatformError {
    match e {
        PlatformError::Permission(msg) => PlatformError::Hierarchy(msg),
        other => other,
    }
}

fn permissions(list: &[Permission]) -> Permissions {
    list.iter().fold(Permissions::empty(), |acc, p| {
        acc | match p {
            Permission::ViewChannel => Permissions::VIEW_CHANNEL,
            Permission::ReadMessageHistory => Permissions::READ_MESSAGE_HISTORY,
            Permission::SendMessages => Permissions::SEND_MESSAGES,
            Permission::Speak => Permissions::SPEAK,
        }
    })
}

fn guild(id: CommunityId) -> dc::GuildId {
    dc::GuildId::new(id.0)
}

fn channel(id: ChannelId) -> dc::ChannelId {
    dc::ChannelId::new(id.0)
}

fn role(id: RoleId) -> dc::RoleId {
    dc::RoleId::new(id.0)
}

#[async_trait]
impl Platform for Discord {
    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        channel(channel_id)
            .delete_message(&self.http, dc::MessageId::new(message.0))
            .await
            .map_err(platform_error)
    }

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<(), PlatformError> {
        channel(channel_id)
            .say(&self.http, text)
            .await
            .map(|_| ())
            .map_err(platform_error)
    }

    async fn send_embed(&self, channel_id: ChannelId, embed: Embed) -> Result<(), PlatformError> {
        let message = CreateMessage::new().embed(
            CreateEmbed::new()
                .title(embed.title)
                .description(embed.description),
        );

        channel(channel_id)
            .send_message(&self.http, message)
            .await
            .map(|_| ())
            .map_err(platform_error)
    }

    async fn download(&self, attachment: &Attachment) -> Result<Vec<u8>, PlatformError> {
        let response = self
            .client
            .get(&attachment.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn find_role(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<Option<RoleId>, PlatformError> {
        let roles = guild(community)
            .roles(&self.http)
            .await
            .map_err(platform_error)?;

        Ok(roles
            .values()
            .find(|r| r.name == name)
            .map(|r| RoleId(r.id.get())))
    }

    async fn create_role(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<RoleId, PlatformError> {
        let created = guild(community)
            .create_role(&self.http, EditRole::new().name(name))
            .await
            .map_err(platform_error)?;

        Ok(RoleId(created.id.get()))
    }

    async fn delete_role(&self, community: CommunityId, role_id: RoleId) -> Result<(), PlatformError> {
        guild(community)
            .delete_role(&self.http, role(role_id))
            .await
            .map_err(platform_error)
    }

    async fn bot_top_role_position(&self, community: CommunityId) -> Result<u16, PlatformError> {
        let me = self
            .http
            .get_current_user()
            .await
            .map_err(platform_error)?;
        let member = guild(community)
            .member(&self.http, me.id)
            .await
            .map_err(platform_error)?;
        let roles = guild(community)
            .roles(&self.http)
            .await
            .map_err(platform_error)?;

        Ok(member
            .roles
            .iter()
            .filter_map(|id| roles.get(id))
            .map(|r| r.position)
            .max()
            .unwrap_or(0))
    }

    async fn set_role_position(
        &self,
        community: CommunityId,
        role_id: RoleId,
        position: u16,
    ) -> Result<(), PlatformError> {
        guild(community)
            .edit_role_position(&self.http, role(role_id), position)
            .await
            .map(|_| ())
            .map_err(|e| hierarchy(platform_error(e)))
    }

    async fn channels(&self, community: CommunityId) -> Result<Vec<ChannelId>, PlatformError> {
        let channels = guild(community)
            .channels(&self.http)
            .await
            .map_err(platform_error)?;

        Ok(channels.keys().map(|id| ChannelId(id.get())).collect())
    }

    async fn set_channel_overwrite(
        &self,
        channel_id: ChannelId,
        role_id: RoleId,
        overwrite: &Overwrite,
    ) -> Result<(), PlatformError> {
        let target = PermissionOverwrite {
            allow: permissions(&overwrite.allow),
            deny: permissions(&overwrite.deny),
            kind: PermissionOverwriteType::Role(role(role_id)),
        };

        channel(channel_id)
            .create_permission(&self.http, target)
            .await
            .map_err(platform_error)
    }

    async fn add_role(
        &self,
        community: CommunityId,
        user: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), PlatformError> {
        self.http
            .add_member_role(
                guild(community),
                dc::UserId::new(user.0),
                role(role_id),
                Some(reason),
            )
            .await
            .map_err(|e| hierarchy(platform_error(e)))
    }

    async fn remove_role(
        &self,
        community: CommunityId,
        user: UserId,
        role_id: RoleId,
    ) -> Result<(), PlatformError> {
        self.http
            .remove_member_role(guild(community), dc::UserId::new(user.0), role(role_id), None)
            .await
            .map_err(platform_error)
    }
}
