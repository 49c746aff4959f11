// active mutes and when they end, so a restart can still lift them

use super::file::JsonFile;
use crate::error::StoreError;
use crate::types::{ChannelId, CommunityId, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUnmute {
    pub role: RoleId,
    /// where the "mute over" notice goes
    pub channel: ChannelId,
    pub unmute_at: DateTime<Utc>,
}

pub type MuteTable = BTreeMap<CommunityId, BTreeMap<UserId, PendingUnmute>>;

pub struct MuteStore {
    table: RwLock<MuteTable>,
    file: Option<JsonFile>,
}

impl MuteStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = JsonFile::new(path);
        let table: MuteTable = file.load().await?;
        debug!(path = %file.path().display(), communities = table.len(), "loaded pending unmutes");

        Ok(Self {
            table: RwLock::new(table),
            file: Some(file),
        })
    }

    /// A table that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            table: RwLock::default(),
            file: None,
        }
    }

    pub async fn insert(&self, community: CommunityId, user: UserId, pending: PendingUnmute) {
        let mut table = self.table.write().await;
        table.entry(community).or_default().insert(user, pending);
        self.commit(&table).await;
    }

    pub async fn remove(&self, community: CommunityId, user: UserId) -> Option<PendingUnmute> {
        let mut table = self.table.write().await;
        let users = table.get_mut(&community)?;
        let removed = users.remove(&user)?;
        if users.is_empty() {
            table.remove(&community);
        }

        self.commit(&table).await;
        Some(removed)
    }

    pub async fn get(&self, community: CommunityId, user: UserId) -> Option<PendingUnmute> {
        self.table
            .read()
            .await
            .get(&community)
            .and_then(|users| users.get(&user))
            .cloned()
    }

    pub async fn all(&self) -> Vec<(CommunityId, UserId, PendingUnmute)> {
        self.table
            .read()
            .await
            .iter()
            .flat_map(|(community, users)| {
                users
                    .iter()
                    .map(move |(user, pending)| (*community, *user, pending.clone()))
            })
            .collect()
    }

    async fn commit(&self, table: &MuteTable) {
        let Some(file) = &self.file else { return };
        if let Err(e) = file.save(table).await {
            error!(error = %e, "failed to persist pending unmutes");
        }
    }
}
