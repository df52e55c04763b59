pub mod folder_skip_configs;
pub mod playback_positions;
pub mod video_preferences;
pub mod watch_history;

// Re-export entities for convenience
pub use folder_skip_configs::{
    ActiveModel as FolderSkipConfigActiveModel, Entity as FolderSkipConfig,
    Model as FolderSkipConfigModel,
};
pub use playback_positions::{
    ActiveModel as PlaybackPositionActiveModel, Entity as PlaybackPosition,
    Model as PlaybackPositionModel,
};
pub use video_preferences::{
    ActiveModel as VideoPreferenceActiveModel, Entity as VideoPreference,
    Model as VideoPreferenceModel,
};
pub use watch_history::{
    ActiveModel as WatchHistoryActiveModel, Entity as WatchHistory, Model as WatchHistoryModel,
};
