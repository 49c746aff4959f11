// per-community settings, created on first sight with defaults

use super::file::JsonFile;
use crate::duration::MuteDuration;
use crate::error::StoreError;
use crate::types::{ChannelId, CommunityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};

pub type ConfigTable = BTreeMap<CommunityId, CommunityConfig>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    pub warning_threshold: u32,
    pub mute_duration: MuteDuration,
    pub use_warnings: bool,
    pub image_sensitivity: f32,
    pub log_channel: Option<ChannelId>,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            warning_threshold: 3,
            mute_duration: MuteDuration::default(),
            use_warnings: false,
            image_sensitivity: 0.5,
            log_channel: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingError {
    #[error("sensitivity must be a number from 0-1, got {0}")]
    Sensitivity(f64),

    #[error("warnings must be at least 1, got {0}")]
    Threshold(i64),
}

/// One validated change to a community's settings. The constructors are the
/// only way to build the constrained variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    LogChannel(Option<ChannelId>),
    UseWarnings(bool),
    ImageSensitivity(f32),
    WarningThreshold(u32),
    MuteDuration(MuteDuration),
}

impl Setting {
    pub fn sensitivity(value: f64) -> Result<Self, SettingError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(SettingError::Sensitivity(value));
        }
        Ok(Self::ImageSensitivity(value as f32))
    }

    pub fn warning_threshold(value: i64) -> Result<Self, SettingError> {
        match u32::try_from(value) {
            Ok(n) if n >= 1 => Ok(Self::WarningThreshold(n)),
            _ => Err(SettingError::Threshold(value)),
        }
    }

    fn apply(&self, config: &mut CommunityConfig) {
        match *self {
            Self::LogChannel(channel) => config.log_channel = channel,
            Self::UseWarnings(on) => config.use_warnings = on,
            Self::ImageSensitivity(s) => config.image_sensitivity = s,
            Self::WarningThreshold(n) => config.warning_threshold = n,
            Self::MuteDuration(d) => config.mute_duration = d,
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogChannel(Some(c)) => write!(f, "logs channel id to: {c}"),
            Self::LogChannel(None) => write!(f, "logs channel to: none"),
            Self::UseWarnings(on) => write!(f, "use_warnings to: {on}"),
            Self::ImageSensitivity(s) => write!(f, "image moderation sensitivity to: {s}"),
            Self::WarningThreshold(n) => write!(f, "warnings to: {n}"),
            Self::MuteDuration(d) => write!(f, "mute time to: {d}"),
        }
    }
}

pub struct ConfigStore {
    table: RwLock<ConfigTable>,
    file: Option<JsonFile>,
}

impl ConfigStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = JsonFile::new(path);
        let table: ConfigTable = file.load().await?;
        debug!(path = %file.path().display(), communities = table.len(), "loaded community configs");

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

    /// Settings for a community, materializing (and persisting) the defaults
    /// the first time a community is seen.
    pub async fn get(&self, community: CommunityId) -> CommunityConfig {
        if let Some(config) = self.table.read().await.get(&community) {
            return config.clone();
        }

        let mut table = self.table.write().await;
        // someone else may have created it while we waited for the lock
        if let Some(config) = table.get(&community) {
            return config.clone();
        }

        let config = CommunityConfig::default();
        table.insert(community, config.clone());
        debug!(%community, "new community, using default config");
        self.commit(&table).await;

        config
    }

    pub async fn contains(&self, community: CommunityId) -> bool {
        self.table.read().await.contains_key(&community)
    }

    pub async fn set(&self, community: CommunityId, setting: Setting) -> CommunityConfig {
        let mut table = self.table.write().await;
        let config = table.entry(community).or_default();
        setting.apply(config);
        let updated = config.clone();

        self.commit(&table).await;
        updated
    }

    pub async fn persist(&self) -> Result<(), StoreError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let table = self.table.read().await;
        file.save(&*table).await
    }

    // the in-memory table stays authoritative if the write fails
    async fn commit(&self, table: &ConfigTable) {
        let Some(file) = &self.file else { return };
        if let Err(e) = file.save(table).await {
            error!(error = %e, "failed to persist community configs");
        }
    }
}
