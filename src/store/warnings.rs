// per-community, per-user warning counters

use super::file::JsonFile;
use crate::error::StoreError;
use crate::types::{CommunityId, UserId};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, error};

pub type WarningTable = BTreeMap<CommunityId, BTreeMap<UserId, u32>>;

/// Outcome of one confirmed offense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// Still under the threshold.
    Warned { count: u32, remaining: u32 },
    /// Threshold hit. The counter is already back at zero.
    ThresholdReached { threshold: u32 },
}

/// The whole escalation rule: bump the count, and if that reaches the
/// threshold, wrap it back to zero. Returns the count to store.
pub fn escalate(count: u32, threshold: u32) -> (u32, Strike) {
    let threshold = threshold.max(1);
    let count = count.saturating_add(1);

    if count >= threshold {
        (0, Strike::ThresholdReached { threshold })
    } else {
        (
            count,
            Strike::Warned {
                count,
                remaining: threshold - count,
            },
        )
    }
}

pub struct WarningStore {
    table: RwLock<WarningTable>,
    file: Option<JsonFile>,
}

impl WarningStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = JsonFile::new(path);
        let table: WarningTable = file.load().await?;
        debug!(path = %file.path().display(), communities = table.len(), "loaded warnings");

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

    pub async fn count(&self, community: CommunityId, user: UserId) -> u32 {
        self.table
            .read()
            .await
            .get(&community)
            .and_then(|users| users.get(&user))
            .copied()
            .unwrap_or(0)
    }

    pub async fn ledger(&self, community: CommunityId) -> BTreeMap<UserId, u32> {
        self.table
            .read()
            .await
            .get(&community)
            .cloned()
            .unwrap_or_default()
    }

    /// Record an offense and apply the escalation rule as one step: the
    /// write lock covers read, update and persist, so concurrent offenses
    /// from the same user can't lose an increment and the stored count
    /// never sits at the threshold.
    pub async fn record_offense(
        &self,
        community: CommunityId,
        user: UserId,
        threshold: u32,
    ) -> Strike {
        let mut table = self.table.write().await;
        let slot = table.entry(community).or_default().entry(user).or_insert(0);

        let (next, strike) = escalate(*slot, threshold);
        *slot = next;
        debug!(%community, %user, count = next, ?strike, "recorded offense");

        self.commit(&table).await;
        strike
    }

    pub async fn persist(&self) -> Result<(), StoreError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let table = self.table.read().await;
        file.save(&*table).await
    }

    async fn commit(&self, table: &WarningTable) {
        let Some(file) = &self.file else { return };
        if let Err(e) = file.save(table).await {
            error!(error = %e, "failed to persist warnings");
        }
    }
}
