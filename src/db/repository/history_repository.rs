use super::BaseRepository;
use crate::db::DatabaseConnection;
use crate::db::entities::{WatchHistory, WatchHistoryActiveModel, WatchHistoryModel, watch_history};
use crate::models::{HistoryEntry, VideoId};
use crate::services::HistoryStore;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, Order, QueryOrder, QuerySelect, Set};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct HistoryRepositoryImpl {
    base: BaseRepository,
}

impl HistoryRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Most recently played entries first
    pub async fn find_recent(&self, limit: u64) -> Result<Vec<HistoryEntry>> {
        Ok(WatchHistory::find()
            .order_by(watch_history::Column::LastPlayedAt, Order::Desc)
            .limit(limit)
            .all(self.base.db.as_ref())
            .await?
            .into_iter()
            .map(to_entry)
            .collect())
    }
}

fn to_entry(model: WatchHistoryModel) -> HistoryEntry {
    HistoryEntry {
        video: VideoId::new(model.video_id),
        file_name: model.file_name,
        position_ms: model.position_ms,
        duration_ms: model.duration_ms,
        last_played_at: model.last_played_at.and_utc(),
        folder_name: model.folder_name,
        danmu_path: model.danmu_path.map(PathBuf::from),
        danmu_visible: model.danmu_visible,
        danmu_offset_ms: model.danmu_offset_ms,
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[async_trait]
impl HistoryStore for HistoryRepositoryImpl {
    async fn get(&self, video: &VideoId) -> Result<Option<HistoryEntry>> {
        Ok(WatchHistory::find_by_id(video.as_str())
            .one(self.base.db.as_ref())
            .await?
            .map(to_entry))
    }

    async fn add(&self, entry: HistoryEntry) -> Result<()> {
        let existing = WatchHistory::find_by_id(entry.video.as_str())
            .one(self.base.db.as_ref())
            .await?;
        let last_played_at = entry.last_played_at.naive_utc();

        if let Some(model) = existing {
            let mut active_model: WatchHistoryActiveModel = model.into();
            active_model.file_name = Set(entry.file_name);
            active_model.folder_name = Set(entry.folder_name);
            active_model.position_ms = Set(entry.position_ms);
            active_model.duration_ms = Set(entry.duration_ms);
            active_model.last_played_at = Set(last_played_at);

            // Overlay fields only change when an overlay is actually loaded
            if let Some(path) = entry.danmu_path.as_deref() {
                active_model.danmu_path = Set(Some(path_to_string(path)));
                active_model.danmu_visible = Set(entry.danmu_visible);
                active_model.danmu_offset_ms = Set(entry.danmu_offset_ms);
            }

            active_model.update(self.base.db.as_ref()).await?;
        } else {
            let active_model = WatchHistoryActiveModel {
                video_id: Set(entry.video.as_str().to_string()),
                file_name: Set(entry.file_name),
                folder_name: Set(entry.folder_name),
                position_ms: Set(entry.position_ms),
                duration_ms: Set(entry.duration_ms),
                last_played_at: Set(last_played_at),
                danmu_path: Set(entry.danmu_path.as_deref().map(path_to_string)),
                danmu_visible: Set(entry.danmu_visible),
                danmu_offset_ms: Set(entry.danmu_offset_ms),
            };
            active_model.insert(self.base.db.as_ref()).await?;
        }

        Ok(())
    }

    async fn update_overlay(
        &self,
        video: &VideoId,
        path: Option<&Path>,
        visible: bool,
        offset_ms: i64,
    ) -> Result<()> {
        let Some(model) = WatchHistory::find_by_id(video.as_str())
            .one(self.base.db.as_ref())
            .await?
        else {
            debug!("No history row for {}, overlay state not recorded", video);
            return Ok(());
        };

        let mut active_model: WatchHistoryActiveModel = model.into();
        active_model.danmu_path = Set(path.map(path_to_string));
        active_model.danmu_visible = Set(visible);
        active_model.danmu_offset_ms = Set(offset_ms);
        active_model.update(self.base.db.as_ref()).await?;

        Ok(())
    }
}
