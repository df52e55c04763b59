use super::BaseRepository;
use crate::db::DatabaseConnection;
use crate::db::entities::{FolderSkipConfig, FolderSkipConfigActiveModel, FolderSkipConfigModel};
use crate::models::{FolderId, SkipConfig};
use crate::services::SkipConfigStore;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[derive(Debug)]
pub struct SkipConfigRepositoryImpl {
    base: BaseRepository,
}

impl SkipConfigRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

fn to_config(model: FolderSkipConfigModel) -> SkipConfig {
    SkipConfig {
        skip_intro_sec: model.skip_intro_sec.max(0) as u32,
        skip_outro_sec: model.skip_outro_sec.max(0) as u32,
        auto_skip_chapter: model.auto_skip_chapter,
        chapter_index: model.chapter_index.max(0) as u32,
    }
}

fn clamp(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[async_trait]
impl SkipConfigStore for SkipConfigRepositoryImpl {
    async fn get(&self, folder: &FolderId) -> Result<SkipConfig> {
        Ok(FolderSkipConfig::find_by_id(folder.as_str())
            .one(self.base.db.as_ref())
            .await?
            .map(to_config)
            .unwrap_or_default())
    }

    async fn save(&self, folder: &FolderId, config: &SkipConfig) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();
        let existing = FolderSkipConfig::find_by_id(folder.as_str())
            .one(self.base.db.as_ref())
            .await?;

        if let Some(model) = existing {
            let mut active_model: FolderSkipConfigActiveModel = model.into();
            active_model.skip_intro_sec = Set(clamp(config.skip_intro_sec));
            active_model.skip_outro_sec = Set(clamp(config.skip_outro_sec));
            active_model.auto_skip_chapter = Set(config.auto_skip_chapter);
            active_model.chapter_index = Set(clamp(config.chapter_index));
            active_model.updated_at = Set(now);
            active_model.update(self.base.db.as_ref()).await?;
        } else {
            let active_model = FolderSkipConfigActiveModel {
                folder_id: Set(folder.as_str().to_string()),
                skip_intro_sec: Set(clamp(config.skip_intro_sec)),
                skip_outro_sec: Set(clamp(config.skip_outro_sec)),
                auto_skip_chapter: Set(config.auto_skip_chapter),
                chapter_index: Set(clamp(config.chapter_index)),
                updated_at: Set(now),
            };
            active_model.insert(self.base.db.as_ref()).await?;
        }

        Ok(())
    }
}
