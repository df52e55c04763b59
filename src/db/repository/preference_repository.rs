use super::BaseRepository;
use crate::db::DatabaseConnection;
use crate::db::entities::{VideoPreference, VideoPreferenceActiveModel, VideoPreferenceModel};
use crate::models::{PreferenceSet, SubtitleBorderStyle, VideoId};
use crate::services::PreferenceStore;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug)]
pub struct PreferenceRepositoryImpl {
    base: BaseRepository,
}

impl PreferenceRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

fn to_preferences(model: VideoPreferenceModel) -> PreferenceSet {
    let border_style = model.border_style.as_deref().and_then(|raw| {
        raw.parse::<SubtitleBorderStyle>()
            .map_err(|e| warn!("Ignoring stored border style for {}: {}", model.video_id, e))
            .ok()
    });

    PreferenceSet {
        style_override: model.style_override,
        subtitle_scale: model.subtitle_scale,
        subtitle_position: model.subtitle_position,
        subtitle_delay: model.subtitle_delay,
        external_subtitle: model.external_subtitle.map(PathBuf::from),
        subtitle_track: model.subtitle_track,
        text_color: model.text_color,
        border_color: model.border_color,
        back_color: model.back_color,
        border_style,
    }
}

fn apply(active_model: &mut VideoPreferenceActiveModel, preferences: &PreferenceSet) {
    active_model.style_override = Set(preferences.style_override);
    active_model.subtitle_scale = Set(preferences.subtitle_scale);
    active_model.subtitle_position = Set(preferences.subtitle_position);
    active_model.subtitle_delay = Set(preferences.subtitle_delay);
    active_model.external_subtitle = Set(preferences
        .external_subtitle
        .as_ref()
        .map(|p| p.to_string_lossy().to_string()));
    active_model.subtitle_track = Set(preferences.subtitle_track);
    active_model.text_color = Set(preferences.text_color.clone());
    active_model.border_color = Set(preferences.border_color.clone());
    active_model.back_color = Set(preferences.back_color.clone());
    active_model.border_style = Set(preferences.border_style.map(|s| s.as_str().to_string()));
    active_model.updated_at = Set(chrono::Utc::now().naive_utc());
}

#[async_trait]
impl PreferenceStore for PreferenceRepositoryImpl {
    async fn get(&self, video: &VideoId) -> Result<PreferenceSet> {
        Ok(VideoPreference::find_by_id(video.as_str())
            .one(self.base.db.as_ref())
            .await?
            .map(to_preferences)
            .unwrap_or_default())
    }

    async fn save(&self, video: &VideoId, preferences: &PreferenceSet) -> Result<()> {
        let existing = VideoPreference::find_by_id(video.as_str())
            .one(self.base.db.as_ref())
            .await?;

        if let Some(model) = existing {
            let mut active_model: VideoPreferenceActiveModel = model.into();
            apply(&mut active_model, preferences);
            active_model.update(self.base.db.as_ref()).await?;
        } else {
            let mut active_model = VideoPreferenceActiveModel {
                video_id: Set(video.as_str().to_string()),
                ..Default::default()
            };
            apply(&mut active_model, preferences);
            active_model.insert(self.base.db.as_ref()).await?;
        }

        Ok(())
    }
}
