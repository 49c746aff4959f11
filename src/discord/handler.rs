// gateway events -> moderation core / admin commands

use crate::commands::{self, Command};
use crate::moderation::Moderator;
use crate::store::ConfigStore;
use crate::types::{Attachment, ChannelId, CommunityId, Message, MessageId, UserId};
use serenity::all::{
    CommandDataOptionValue, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, CreateInteractionResponse, CreateInteractionResponseMessage,
    EventHandler, Interaction, MessageUpdateEvent, Ready,
};
use serenity::async_trait;
use serenity::model::application::Command as SlashCommand;
use serenity::model::channel::{Attachment as DcAttachment, Message as DcMessage};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Handler {
    moderator: Arc<Moderator>,
    config: Arc<ConfigStore>,
}

impl Handler {
    pub fn new(moderator: Arc<Moderator>, config: Arc<ConfigStore>) -> Self {
        Self { moderator, config }
    }

    async fn moderate(&self, message: Message) {
        let action = self.moderator.moderate(&message).await;
        debug!(
            community = %message.community,
            message = %message.id,
            ?action,
            "moderated message"
        );
    }

    async fn run_command(&self, interaction: &CommandInteraction) -> String {
        let Some(command) = parse_command(interaction) else {
            warn!(name = %interaction.data.name, "unknown or malformed command");
            return "**Unknown command.**".to_string();
        };

        if command == Command::Help {
            return commands::HELP.to_string();
        }

        let Some(guild_id) = interaction.guild_id else {
            return "**This command can only be used in a server.**".to_string();
        };

        let is_admin = interaction
            .member
            .as_ref()
            .and_then(|m| m.permissions)
            .is_some_and(|p| p.administrator());

        commands::respond(
            &self.config,
            CommunityId(guild_id.get()),
            is_admin,
            &command,
        )
        .await
    }
}

fn attachment(a: &DcAttachment) -> Attachment {
    Attachment {
        url: a.url.clone(),
        filename: a.filename.clone(),
        content_type: a.content_type.clone(),
    }
}

// None for DMs and anything a bot (including us) sent
fn inbound(msg: &DcMessage) -> Option<Message> {
    if msg.author.bot {
        return None;
    }
    let guild_id = msg.guild_id?;

    Some(Message {
        id: MessageId(msg.id.get()),
        community: CommunityId(guild_id.get()),
        channel: ChannelId(msg.channel_id.get()),
        author: UserId(msg.author.id.get()),
        content: msg.content.clone(),
        attachments: msg.attachments.iter().map(attachment).collect(),
    })
}

// an update without content has nothing to re-check; one that repeats the
// content already judged (link unfurls) is dropped by the moderator
fn edited(event: &MessageUpdateEvent) -> Option<Message> {
    let author = event.author.as_ref()?;
    if author.bot {
        return None;
    }

    Some(Message {
        id: MessageId(event.id.get()),
        community: CommunityId(event.guild_id?.get()),
        channel: ChannelId(event.channel_id.get()),
        author: UserId(author.id.get()),
        content: event.content.clone()?,
        attachments: event
            .attachments
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(attachment)
            .collect(),
    })
}

fn parse_command(interaction: &CommandInteraction) -> Option<Command> {
    let data = &interaction.data;
    let value = data.options.first().map(|o| &o.value);

    let command = match (data.name.as_str(), value) {
        ("help", _) => Command::Help,
        ("set_logs_channel", Some(CommandDataOptionValue::String(s))) => {
            Command::SetLogsChannel(s.clone())
        }
        ("use_warnings", Some(CommandDataOptionValue::Boolean(b))) => Command::UseWarnings(*b),
        ("set_sensitivity", Some(CommandDataOptionValue::Number(n))) => {
            Command::SetSensitivity(*n)
        }
        ("set_warnings", Some(CommandDataOptionValue::Integer(n))) => Command::SetWarnings(*n),
        ("set_mute_time", Some(CommandDataOptionValue::String(s))) => {
            Command::SetMuteTime(s.clone())
        }
        _ => return None,
    };

    Some(command)
}

fn option(kind: CommandOptionType, name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(kind, name, description).required(true)
}

pub fn definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("help")
            .description("Shows commands and information for the moderation bot."),
        CreateCommand::new("set_logs_channel")
            .description("Set a server wide channel id for logging messages.")
            .add_option(option(
                CommandOptionType::String,
                "logs_channel_id",
                "Logs Channel ID, or none to stop logging",
            )),
        CreateCommand::new("use_warnings")
            .description("Whether to automatically mute users after a certain amount of warnings.")
            .add_option(option(
                CommandOptionType::Boolean,
                "use_warnings",
                "Use Warnings",
            )),
        CreateCommand::new("set_sensitivity")
            .description("Set a server wide image moderation sensitivity.")
            .add_option(option(
                CommandOptionType::Number,
                "sensitivity",
                "Image Moderation Sensitivity",
            )),
        CreateCommand::new("set_warnings")
            .description("Set a server wide warnings limit before muting a member.")
            .add_option(option(
                CommandOptionType::Integer,
                "warning_count",
                "Warning Count",
            )),
        CreateCommand::new("set_mute_time")
            .description("Set a server wide mute time to mute a member for.")
            .add_option(option(CommandOptionType::String, "mute_time", "Mute Time")),
    ]
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, id = %ready.user.id, "logged in");

        match SlashCommand::set_global_commands(&ctx.http, definitions()).await {
            Ok(synced) => info!(count = synced.len(), "synced commands"),
            Err(e) => error!(error = %e, "failed to sync commands"),
        }

        let resumed = self.moderator.mutes().resume_pending().await;
        if resumed > 0 {
            info!(count = resumed, "resumed pending unmutes");
        }
    }

    async fn message(&self, _ctx: Context, msg: DcMessage) {
        if let Some(message) = inbound(&msg) {
            self.moderate(message).await;
        }
    }

    async fn message_update(
        &self,
        _ctx: Context,
        _old: Option<DcMessage>,
        _new: Option<DcMessage>,
        event: MessageUpdateEvent,
    ) {
        if let Some(message) = edited(&event) {
            debug!(message = %message.id, "re-checking edited message");
            self.moderate(message).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let reply = self.run_command(&command).await;
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(reply)
                .ephemeral(true),
        );

        if let Err(e) = command.create_response(&ctx.http, response).await {
            warn!(command = %command.data.name, error = %e, "failed to reply to command");
        }
    }
}
