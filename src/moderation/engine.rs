// turns classifier verdicts into deletions, warnings and mutes

use super::mute::{MuteController, MuteError};
use super::seen::SeenMessages;
use super::triggers::TriggerWords;
use crate::classify::{Classifier, Image};
use crate::error::{ClassifyError, PlatformError};
use crate::platform::Platform;
use crate::store::{CommunityConfig, ConfigStore, MuteStore, Strike, WarningStore};
use crate::types::Message;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

// why a message couldn't be classified
#[derive(Error, Debug)]
enum Unavailable {
    #[error("attachment download failed: {0}")]
    Download(#[from] PlatformError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// What got flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Image,
    Text,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Text => write!(f, "message"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub subject: Subject,
    pub safe: bool,
}

/// What happened to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Safe, or nothing in it to check.
    Passed,
    /// No trigger word, never classified.
    Skipped,
    /// Same message already removed, or already passed unchanged.
    Duplicate,
    /// Classifier (or attachment download) failed; left alone.
    Unavailable,
    /// Deleted, warnings are off for this community.
    Deleted,
    /// Deleted and warned.
    Warned { remaining: u32 },
    /// Deleted and the author was muted.
    Muted,
    /// Deleted, threshold reached, but the mute couldn't be applied.
    MuteFailed,
}

impl Action {
    pub fn deleted(&self) -> bool {
        !matches!(
            self,
            Self::Passed | Self::Skipped | Self::Duplicate | Self::Unavailable
        )
    }
}

pub struct Moderator {
    config: Arc<ConfigStore>,
    warnings: Arc<WarningStore>,
    classifier: Arc<dyn Classifier>,
    platform: Arc<dyn Platform>,
    mutes: MuteController,
    triggers: TriggerWords,
    seen: SeenMessages,
}

impl Moderator {
    pub fn new(
        config: Arc<ConfigStore>,
        warnings: Arc<WarningStore>,
        pending: Arc<MuteStore>,
        classifier: Arc<dyn Classifier>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            mutes: MuteController::new(platform.clone(), pending),
            config,
            warnings,
            classifier,
            platform,
            triggers: TriggerWords::disabled(),
            seen: SeenMessages::default(),
        }
    }

    pub fn with_triggers(mut self, triggers: TriggerWords) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn mutes(&self) -> &MuteController {
        &self.mutes
    }

    /// Full pipeline for one inbound (or edited) message. Copies of the
    /// same message id are handled one at a time, so one message escalates
    /// at most once.
    pub async fn moderate(&self, message: &Message) -> Action {
        // every community gets a config before anything else looks at it
        let config = self.config.get(message.community).await;

        if !self.triggers.matches(&message.content) {
            return Action::Skipped;
        }

        let Some(turn) = self.seen.begin(message).await else {
            debug!(message = %message.id, "already handled");
            return Action::Duplicate;
        };

        let action = self.judge(message, &config).await;
        match action {
            Action::Passed => turn.passed(),
            action if action.deleted() => turn.removed(),
            _ => {}
        }

        action
    }

    async fn judge(&self, message: &Message, config: &CommunityConfig) -> Action {
        match self.classify(message, config).await {
            Ok(Some(verdict)) => self.handle(message, verdict, config).await,
            Ok(None) => Action::Passed,
            Err(reason) => {
                // fail open: moderation being down never blocks chat
                warn!(
                    community = %message.community,
                    message = %message.id,
                    %reason,
                    "could not classify message, leaving it alone"
                );
                Action::Unavailable
            }
        }
    }

    // attachments win over text: if there are any, only the first image is
    // looked at and the text is never checked
    async fn classify(
        &self,
        message: &Message,
        config: &CommunityConfig,
    ) -> Result<Option<Verdict>, Unavailable> {
        if !message.attachments.is_empty() {
            let Some(attachment) = message.attachments.iter().find(|a| a.is_image()) else {
                return Ok(None);
            };

            let bytes = self.platform.download(attachment).await?;
            let image = Image {
                bytes,
                content_type: attachment
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "image/jpeg".to_string()),
            };

            let safe = self
                .classifier
                .is_image_safe(&image, config.image_sensitivity)
                .await?;

            return Ok(Some(Verdict {
                subject: Subject::Image,
                safe,
            }));
        }

        let safe = self
            .classifier
            .is_text_safe(&message.content)
            .await?;

        Ok(Some(Verdict {
            subject: Subject::Text,
            safe,
        }))
    }

    /// Act on a verdict: delete, audit, then warn or mute. Each step runs
    /// after the previous one; platform failures are logged and the rest
    /// still runs.
    pub async fn handle(
        &self,
        message: &Message,
        verdict: Verdict,
        config: &CommunityConfig,
    ) -> Action {
        if verdict.safe {
            return Action::Passed;
        }

        let author = message.author;
        let mention = author.mention();

        if let Err(e) = self
            .platform
            .delete_message(message.channel, message.id)
            .await
        {
            warn!(message = %message.id, error = %e, "failed to delete message");
        }
        info!(
            community = %message.community,
            %author,
            subject = %verdict.subject,
            "deleted inappropriate content"
        );

        if let Some(log_channel) = config.log_channel {
            let line = match verdict.subject {
                Subject::Image => {
                    format!("Deleted an image from {mention} because it was inappropriate.")
                }
                Subject::Text => format!(
                    "Deleted a message from {mention} because it was inappropriate. The message was: '{}'",
                    message.content
                ),
            };
            if let Err(e) = self.platform.send_message(log_channel, &line).await {
                warn!(channel = %log_channel, error = %e, "failed to write audit log");
            }
        }

        let notice = format!(
            "Deleted {mention}'s {} because it was inappropriate.",
            verdict.subject
        );

        if !config.use_warnings {
            self.notify(message, &notice).await;
            return Action::Deleted;
        }

        let strike = self
            .warnings
            .record_offense(message.community, author, config.warning_threshold)
            .await;

        match strike {
            Strike::Warned { remaining, .. } => {
                let text = format!("{notice} {mention} has {remaining} warnings left.");
                self.notify(message, &text).await;
                Action::Warned { remaining }
            }
            Strike::ThresholdReached { threshold } => {
                self.notify(message, &notice).await;

                let reason = format!("sending {threshold} or more inappropriate messages");
                match self
                    .mutes
                    .mute(
                        message.community,
                        author,
                        message.channel,
                        config.mute_duration,
                        &reason,
                    )
                    .await
                {
                    Ok(()) => Action::Muted,
                    Err(e) => {
                        self.mute_failed(message, e).await;
                        Action::MuteFailed
                    }
                }
            }
        }
    }

    async fn notify(&self, message: &Message, text: &str) {
        if let Err(e) = self.platform.send_message(message.channel, text).await {
            warn!(channel = %message.channel, error = %e, "failed to send notice");
        }
    }

    async fn mute_failed(&self, message: &Message, e: MuteError) {
        error!(
            community = %message.community,
            author = %message.author,
            error = %e,
            "failed to mute member"
        );

        if let Some(hint) = e.remediation() {
            self.notify(message, hint).await;
        }
    }
}
