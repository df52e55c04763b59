use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub video_id: String,
    pub style_override: Option<bool>,
    pub subtitle_scale: Option<f64>,
    pub subtitle_position: Option<i64>,
    pub subtitle_delay: Option<f64>,
    pub external_subtitle: Option<String>,
    pub subtitle_track: Option<i64>,
    pub text_color: Option<String>,
    pub border_color: Option<String>,
    pub back_color: Option<String>,
    pub border_style: Option<String>, // 'outline-and-shadow' | 'opaque-box' | 'background-box'
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
