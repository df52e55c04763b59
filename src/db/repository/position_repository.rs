use super::{BaseRepository, seconds_to_ms};
use crate::db::DatabaseConnection;
use crate::db::entities::{PlaybackPosition, PlaybackPositionActiveModel};
use crate::models::{StoredPosition, VideoId};
use crate::services::PositionStore;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[derive(Debug)]
pub struct PositionRepositoryImpl {
    base: BaseRepository,
}

impl PositionRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl PositionStore for PositionRepositoryImpl {
    async fn get(&self, video: &VideoId) -> Result<Option<StoredPosition>> {
        Ok(PlaybackPosition::find_by_id(video.as_str())
            .one(self.base.db.as_ref())
            .await?
            .map(|model| StoredPosition {
                position: model.position_seconds(),
                duration: model.duration_seconds(),
            }))
    }

    async fn set(&self, video: &VideoId, position: f64, duration: f64) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();
        let existing = PlaybackPosition::find_by_id(video.as_str())
            .one(self.base.db.as_ref())
            .await?;

        if let Some(model) = existing {
            let mut active_model: PlaybackPositionActiveModel = model.into();
            active_model.position_ms = Set(seconds_to_ms(position));
            active_model.duration_ms = Set(seconds_to_ms(duration));
            active_model.updated_at = Set(now);
            active_model.update(self.base.db.as_ref()).await?;
        } else {
            let active_model = PlaybackPositionActiveModel {
                video_id: Set(video.as_str().to_string()),
                position_ms: Set(seconds_to_ms(position)),
                duration_ms: Set(seconds_to_ms(duration)),
                updated_at: Set(now),
            };
            active_model.insert(self.base.db.as_ref()).await?;
        }

        Ok(())
    }

    async fn clear(&self, video: &VideoId) -> Result<()> {
        PlaybackPosition::delete_by_id(video.as_str())
            .exec(self.base.db.as_ref())
            .await?;
        Ok(())
    }
}
