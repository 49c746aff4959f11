// what the moderation core needs from the chat platform
// the discord module implements this on top of serenity, tests use a fake

use crate::error::PlatformError;
use crate::types::{
    Attachment, ChannelId, CommunityId, Embed, MessageId, Overwrite, RoleId, UserId,
};
use async_trait::async_trait;

#[async_trait]
pub trait Platform: Send + Sync {
    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError>;

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError>;

    async fn send_embed(&self, channel: ChannelId, embed: Embed) -> Result<(), PlatformError>;

    async fn download(&self, attachment: &Attachment) -> Result<Vec<u8>, PlatformError>;

    async fn find_role(
        &self,
        community: CommunityId,
        name: &str,
    ) -> Result<Option<RoleId>, PlatformError>;

    async fn create_role(&self, community: CommunityId, name: &str)
    -> Result<RoleId, PlatformError>;

    async fn delete_role(&self, community: CommunityId, role: RoleId)
    -> Result<(), PlatformError>;

    /// Position of the bot's own highest role, 0 if it only has @everyone.
    async fn bot_top_role_position(&self, community: CommunityId) -> Result<u16, PlatformError>;

    async fn set_role_position(
        &self,
        community: CommunityId,
        role: RoleId,
        position: u16,
    ) -> Result<(), PlatformError>;

    async fn channels(&self, community: CommunityId) -> Result<Vec<ChannelId>, PlatformError>;

    async fn set_channel_overwrite(
        &self,
        channel: ChannelId,
        role: RoleId,
        overwrite: &Overwrite,
    ) -> Result<(), PlatformError>;

    async fn add_role(
        &self,
        community: CommunityId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), PlatformError>;

    async fn remove_role(
        &self,
        community: CommunityId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError>;
}
