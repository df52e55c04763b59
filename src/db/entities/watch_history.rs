use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "watch_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub video_id: String,
    pub file_name: String,
    pub folder_name: String,
    pub position_ms: i64,
    pub duration_ms: i64,
    pub last_played_at: DateTime,
    pub danmu_path: Option<String>,
    pub danmu_visible: bool,
    pub danmu_offset_ms: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Progress as a fraction (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        if self.duration_ms > 0 {
            (self.position_ms as f32 / self.duration_ms as f32).min(1.0)
        } else {
            0.0
        }
    }
}
