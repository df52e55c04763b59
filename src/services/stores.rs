use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::db::DatabaseConnection;
use crate::db::repository::{
    HistoryRepositoryImpl, PositionRepositoryImpl, PreferenceRepositoryImpl,
    SkipConfigRepositoryImpl,
};
use crate::models::{FolderId, HistoryEntry, PreferenceSet, SkipConfig, StoredPosition, VideoId};

/// Resume positions keyed by video
#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn get(&self, video: &VideoId) -> Result<Option<StoredPosition>>;
    async fn set(&self, video: &VideoId, position: f64, duration: f64) -> Result<()>;
    async fn clear(&self, video: &VideoId) -> Result<()>;
}

/// Watch history for local videos
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get(&self, video: &VideoId) -> Result<Option<HistoryEntry>>;
    /// Insert, or update the existing row for `entry.video`
    async fn add(&self, entry: HistoryEntry) -> Result<()>;
    async fn update_overlay(
        &self,
        video: &VideoId,
        path: Option<&Path>,
        visible: bool,
        offset_ms: i64,
    ) -> Result<()>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Missing rows yield an empty set
    async fn get(&self, video: &VideoId) -> Result<PreferenceSet>;
    async fn save(&self, video: &VideoId, preferences: &PreferenceSet) -> Result<()>;
}

#[async_trait]
pub trait SkipConfigStore: Send + Sync {
    /// Missing rows yield an inert config
    async fn get(&self, folder: &FolderId) -> Result<SkipConfig>;
    async fn save(&self, folder: &FolderId, config: &SkipConfig) -> Result<()>;
}

/// The durable stores a controller reads and writes
#[derive(Clone)]
pub struct SessionStores {
    pub positions: Arc<dyn PositionStore>,
    pub history: Arc<dyn HistoryStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub skip_configs: Arc<dyn SkipConfigStore>,
}

impl SessionStores {
    /// SQLite-backed stores sharing one connection
    pub fn from_database(db: DatabaseConnection) -> Self {
        Self {
            positions: Arc::new(PositionRepositoryImpl::new(db.clone())),
            history: Arc::new(HistoryRepositoryImpl::new(db.clone())),
            preferences: Arc::new(PreferenceRepositoryImpl::new(db.clone())),
            skip_configs: Arc::new(SkipConfigRepositoryImpl::new(db)),
        }
    }
}

impl std::fmt::Debug for SessionStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStores").finish_non_exhaustive()
    }
}
