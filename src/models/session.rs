use std::fmt;
use std::path::PathBuf;
use tokio::time::Instant;

use super::{FolderId, VideoId};
use crate::player::AspectMode;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loading,
    AwaitingResumeDecision,
    Playing,
    Paused,
    Seeking,
    Stalled,
    Ended,
    Error(String),
    Destroyed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Loading => write!(f, "loading"),
            SessionState::AwaitingResumeDecision => write!(f, "awaiting-resume-decision"),
            SessionState::Playing => write!(f, "playing"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Seeking => write!(f, "seeking"),
            SessionState::Stalled => write!(f, "stalled"),
            SessionState::Ended => write!(f, "ended"),
            SessionState::Error(message) => write!(f, "error: {}", message),
            SessionState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// One playback attempt for a single video, bounded by `token`
#[derive(Debug, Clone)]
pub struct Session {
    pub token: u64,
    pub video: VideoId,
    pub is_remote: bool,
    pub folder_id: Option<FolderId>,
    /// Seconds
    pub position: f64,
    /// Seconds, 0 until the engine reports it
    pub duration: f64,
    pub playing: bool,
    pub speed: f64,
    pub aspect_mode: AspectMode,
    pub state: SessionState,
}

impl Session {
    pub fn idle() -> Self {
        Self {
            token: 0,
            video: VideoId::new(""),
            is_remote: false,
            folder_id: None,
            position: 0.0,
            duration: 0.0,
            playing: false,
            speed: 1.0,
            aspect_mode: AspectMode::default(),
            state: SessionState::Idle,
        }
    }

    /// Only sessions with real progress are worth persisting
    pub fn has_progress(&self) -> bool {
        self.duration > 0.0 && self.position > 0.0
    }

    pub fn position_ms(&self) -> i64 {
        (self.position * 1000.0).round() as i64
    }

    pub fn duration_ms(&self) -> i64 {
        (self.duration * 1000.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResumePrompt {
    pub visible: bool,
    pub stored_position: f64,
    pub deadline: Instant,
}

/// Point-in-time view of the controller, returned to the owner on request
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: Session,
    pub resume_prompt: Option<ResumePrompt>,
    pub buffering: bool,
    pub series_index: Option<usize>,
    pub series_len: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub overlay_path: Option<PathBuf>,
    pub overlay_visible: bool,
}
