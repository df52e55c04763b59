use serde::{Deserialize, Serialize};

/// Everything an engine reports, as one tagged type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    SurfaceReady,
    FileLoaded,
    ProgressUpdate { position: f64, duration: f64 },
    PlaybackStateChanged { is_playing: bool },
    BufferingStateChanged { is_buffering: bool },
    EndOfFile,
    Error { message: String },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::SurfaceReady => "surface_ready",
            EngineEvent::FileLoaded => "file_loaded",
            EngineEvent::ProgressUpdate { .. } => "progress_update",
            EngineEvent::PlaybackStateChanged { .. } => "playback_state_changed",
            EngineEvent::BufferingStateChanged { .. } => "buffering_state_changed",
            EngineEvent::EndOfFile => "end_of_file",
            EngineEvent::Error { .. } => "error",
        }
    }
}
