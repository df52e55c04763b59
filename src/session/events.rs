use tokio::sync::mpsc;
use tracing::trace;

use super::timers::TimerKind;
use crate::models::{SessionState, VideoId};
use crate::player::EngineEvent;

/// Messages produced inside the controller's own sequencing context
#[derive(Debug)]
pub enum ControllerMessage {
    Engine { token: u64, event: EngineEvent },
    Timer { token: u64, kind: TimerKind },
}

/// Transient, user-facing notices
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Runtime engine error; playback may continue
    EngineError(String),
    /// Episode navigation hit the start or end of the series
    NoMoreEpisodes,
    /// The video could not be resolved or the engine rejected it
    LoadFailed(String),
}

/// Everything the owner of a session may want to render
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    ResumePromptShown {
        stored_position: f64,
    },
    ResumePromptHidden,
    BufferingChanged(bool),
    EpisodeChanged {
        video: VideoId,
        has_previous: bool,
        has_next: bool,
    },
    Notice(Notice),
}

/// Where an engine delivers its events for one loaded file.
///
/// Every sink is bound to the session token it was minted for; the
/// controller drops events whose token no longer matches.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    token: u64,
    sender: mpsc::UnboundedSender<ControllerMessage>,
}

impl EngineEventSink {
    pub(crate) fn new(token: u64, sender: mpsc::UnboundedSender<ControllerMessage>) -> Self {
        Self { token, sender }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Returns false once the controller is gone
    pub fn emit(&self, event: EngineEvent) -> bool {
        trace!("Engine event {} for token {}", event.name(), self.token);
        self.sender
            .send(ControllerMessage::Engine {
                token: self.token,
                event,
            })
            .is_ok()
    }
}
