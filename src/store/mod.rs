// persistent tables - each owns its data and a single write lock

mod config;
mod file;
mod mutes;
mod warnings;

pub use config::{CommunityConfig, ConfigStore, ConfigTable, Setting, SettingError};
pub use file::JsonFile;
pub use mutes::{MuteStore, MuteTable, PendingUnmute};
pub use warnings::{Strike, WarningStore, WarningTable, escalate};

use crate::error::StoreError;
use std::path::Path;
use std::sync::Arc;

pub const CONFIG_FILE: &str = "servers.json";
pub const WARNINGS_FILE: &str = "warnings.json";
pub const MUTES_FILE: &str = "mutes.json";

/// All three tables, loaded from one data directory.
#[derive(Clone)]
pub struct Stores {
    pub config: Arc<ConfigStore>,
    pub warnings: Arc<WarningStore>,
    pub mutes: Arc<MuteStore>,
}

impl Stores {
    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        Ok(Self {
            config: Arc::new(ConfigStore::open(dir.join(CONFIG_FILE)).await?),
            warnings: Arc::new(WarningStore::open(dir.join(WARNINGS_FILE)).await?),
            mutes: Arc::new(MuteStore::open(dir.join(MUTES_FILE)).await?),
        })
    }
}
