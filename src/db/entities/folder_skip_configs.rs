use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "folder_skip_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub folder_id: String,
    pub skip_intro_sec: i32,
    pub skip_outro_sec: i32,
    pub auto_skip_chapter: bool,
    pub chapter_index: i32,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
