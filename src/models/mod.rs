mod identifiers;
pub mod preferences;
pub mod session;

pub use identifiers::{FolderId, VideoId};
pub use preferences::{PreferenceSet, SubtitleBorderStyle};
pub use session::{ResumePrompt, Session, SessionSnapshot, SessionState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Folder-scoped skip automation settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipConfig {
    pub skip_intro_sec: u32,
    pub skip_outro_sec: u32,
    pub auto_skip_chapter: bool,
    pub chapter_index: u32,
}

impl SkipConfig {
    pub fn is_inert(&self) -> bool {
        self.skip_intro_sec == 0 && self.skip_outro_sec == 0 && !self.auto_skip_chapter
    }
}

/// A persisted resume point. `duration` is 0 when it was never known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredPosition {
    pub position: f64,
    pub duration: f64,
}

/// Watch history row for a local video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub video: VideoId,
    pub file_name: String,
    pub position_ms: i64,
    pub duration_ms: i64,
    pub last_played_at: DateTime<Utc>,
    pub folder_name: String,
    /// Caption/comment overlay source loaded for this video
    pub danmu_path: Option<PathBuf>,
    pub danmu_visible: bool,
    pub danmu_offset_ms: i64,
}
