// the "Muted" role: lazy setup, applying it, and lifting it on a timer

use crate::duration::MuteDuration;
use crate::error::PlatformError;
use crate::platform::Platform;
use crate::store::{MuteStore, PendingUnmute};
use crate::types::{ChannelId, CommunityId, Embed, Overwrite, RoleId, UserId};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const MUTE_ROLE: &str = "Muted";

pub const HIERARCHY_HINT: &str =
    "**Failed to mute user, ensure that the bot role is above all other roles.**";

#[derive(Error, Debug)]
pub enum MuteError {
    #[error("the bot's role must be above all other roles to manage the mute role")]
    RoleHierarchy,

    #[error("the mute role could not be restricted in any channel: {0}")]
    Unrestricted(PlatformError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl MuteError {
    /// Text for the channel when an admin needs to fix something.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::RoleHierarchy
            | Self::Unrestricted(_)
            | Self::Platform(PlatformError::Hierarchy(_)) => Some(HIERARCHY_HINT),
            _ => None,
        }
    }
}

type TimerKey = (CommunityId, UserId);

#[derive(Default)]
struct Roles {
    ready: HashMap<CommunityId, RoleId>,
    // created by us, but positioning or overwrites never finished and the
    // role couldn't be deleted again
    unfinished: HashMap<CommunityId, RoleId>,
}

#[derive(Clone)]
pub struct MuteController {
    platform: Arc<dyn Platform>,
    pending: Arc<MuteStore>,
    // doubles as the setup lock, so two first mutes can't both create a role
    roles: Arc<Mutex<Roles>>,
    timers: Arc<SyncMutex<HashMap<TimerKey, JoinHandle<()>>>>,
}

impl MuteController {
    pub fn new(platform: Arc<dyn Platform>, pending: Arc<MuteStore>) -> Self {
        Self {
            platform,
            pending,
            roles: Arc::default(),
            timers: Arc::default(),
        }
    }

    /// Find or create the mute role. A new role is placed just under the
    /// bot's highest role and denied send/speak in every channel; that setup
    /// happens once per community. A role whose setup failed is deleted, or
    /// set up again on the next call if it couldn't be.
    pub async fn ensure_mute_role(&self, community: CommunityId) -> Result<RoleId, MuteError> {
        let mut roles = self.roles.lock().await;
        if let Some(role) = roles.ready.get(&community) {
            return Ok(*role);
        }

        let found = self.platform.find_role(community, MUTE_ROLE).await?;
        match found {
            Some(role) if roles.unfinished.get(&community) != Some(&role) => {
                debug!(%community, %role, "reusing existing mute role");
                roles.ready.insert(community, role);
                return Ok(role);
            }
            _ => {}
        }

        // bot has nothing above @everyone, it could never apply the role
        let top = self.platform.bot_top_role_position(community).await?;
        if top == 0 {
            return Err(MuteError::RoleHierarchy);
        }

        let role = match found {
            Some(role) => role,
            None => self.platform.create_role(community, MUTE_ROLE).await?,
        };

        if let Err(e) = self.restrict(community, role, top).await {
            match self.platform.delete_role(community, role).await {
                Ok(()) => {
                    roles.unfinished.remove(&community);
                }
                Err(delete) => {
                    warn!(%community, %role, error = %delete, "could not remove half set up mute role");
                    roles.unfinished.insert(community, role);
                }
            }
            return Err(e);
        }

        roles.unfinished.remove(&community);
        roles.ready.insert(community, role);
        Ok(role)
    }

    // position the role under the bot and deny talking everywhere; at least
    // one channel has to take the overwrite
    async fn restrict(&self, community: CommunityId, role: RoleId, top: u16) -> Result<(), MuteError> {
        let position = top.saturating_sub(1).max(1);
        if let Err(e) = self
            .platform
            .set_role_position(community, role, position)
            .await
        {
            warn!(%community, %role, error = %e, "could not position mute role");
            return Err(MuteError::RoleHierarchy);
        }

        let overwrite = Overwrite::muted();
        let channels = self.platform.channels(community).await?;
        let mut restricted = channels.is_empty();
        let mut last_error = None;

        for channel in channels {
            match self
                .platform
                .set_channel_overwrite(channel, role, &overwrite)
                .await
            {
                Ok(()) => restricted = true,
                Err(e) => {
                    warn!(%community, %channel, error = %e, "could not set mute overwrite");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !restricted => Err(MuteError::Unrestricted(e)),
            _ => {
                info!(%community, %role, position, "created mute role");
                Ok(())
            }
        }
    }

    async fn forget_role(&self, community: CommunityId, role: RoleId) {
        let mut roles = self.roles.lock().await;
        if roles.ready.get(&community) == Some(&role) {
            roles.ready.remove(&community);
        }
    }

    /// Apply the mute role, announce it in `channel`, and schedule the
    /// unmute. Returns once the mute is in place; the unmute runs on its own
    /// task.
    pub async fn mute(
        &self,
        community: CommunityId,
        user: UserId,
        channel: ChannelId,
        duration: MuteDuration,
        reason: &str,
    ) -> Result<(), MuteError> {
        let mut role = self.ensure_mute_role(community).await?;
        if let Err(e) = self.platform.add_role(community, user, role, reason).await {
            let PlatformError::NotFound(_) = e else {
                return Err(e.into());
            };
            // the cached role may have been deleted by hand, set it up again once
            debug!(%community, %role, "mute role missing, recreating");
            self.forget_role(community, role).await;
            role = self.ensure_mute_role(community).await?;
            self.platform.add_role(community, user, role, reason).await?;
        }
        info!(%community, %user, %duration, reason, "muted member");

        let embed = Embed::new(
            "Muted User",
            format!("{} was muted for {reason}. Muted for {duration}.", user.mention()),
        );
        if let Err(e) = self.platform.send_embed(channel, embed).await {
            warn!(%channel, error = %e, "failed to announce mute");
        }

        let delay = duration.as_duration();
        let unmute_at = TimeDelta::from_std(delay)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let pending = PendingUnmute {
            role,
            channel,
            unmute_at,
        };

        self.pending.insert(community, user, pending.clone()).await;
        self.schedule(community, user, pending, delay);

        Ok(())
    }

    /// Re-arm timers for mutes that were active when the process last
    /// stopped. Overdue ones are lifted right away.
    pub async fn resume_pending(&self) -> usize {
        let pending = self.pending.all().await;
        let now = Utc::now();

        for (community, user, entry) in &pending {
            let delay = (entry.unmute_at - now).to_std().unwrap_or(Duration::ZERO);
            debug!(%community, %user, ?delay, "resuming pending unmute");
            self.schedule(*community, *user, entry.clone(), delay);
        }

        pending.len()
    }

    /// Drop a scheduled unmute. The member stays muted.
    pub async fn cancel(&self, community: CommunityId, user: UserId) -> bool {
        let handle = self.lock_timers().remove(&(community, user));
        let cancelled = handle.map(|h| h.abort()).is_some();
        self.pending.remove(community, user).await;
        cancelled
    }

    pub fn is_scheduled(&self, community: CommunityId, user: UserId) -> bool {
        self.lock_timers().contains_key(&(community, user))
    }

    fn schedule(&self, community: CommunityId, user: UserId, entry: PendingUnmute, delay: Duration) {
        // hold the map while spawning so an already-due timer can't finish
        // and clean up before its handle is recorded
        let mut timers = self.lock_timers();

        let this = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.lift(community, user, entry).await;
        });

        // a fresh mute replaces whatever timer the member already had
        if let Some(previous) = timers.insert((community, user), handle) {
            previous.abort();
        }
    }

    // best effort: a member who left or a role we can no longer touch is
    // logged and forgotten
    async fn lift(&self, community: CommunityId, user: UserId, entry: PendingUnmute) {
        match self.platform.remove_role(community, user, entry.role).await {
            Ok(()) => {
                info!(%community, %user, "unmuted member");
                let embed = Embed::new("Mute Over!", format!("{} is now unmuted.", user.mention()));
                if let Err(e) = self.platform.send_embed(entry.channel, embed).await {
                    warn!(channel = %entry.channel, error = %e, "failed to announce unmute");
                }
            }
            Err(e) => warn!(%community, %user, error = %e, "failed to lift mute"),
        }

        self.pending.remove(community, user).await;
        self.lock_timers().remove(&(community, user));
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<TimerKey, JoinHandle<()>>> {
        // a panic while holding this lock leaves the map itself intact
        self.timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
