//! Scripted replay of engine events and user commands against a session.
//!
//! A script names a video, an optional series and a list of steps. Engine
//! steps are delivered through whatever sink the controller handed to the
//! engine most recently, so they always carry the current token.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::{SessionSnapshot, SubtitleBorderStyle, VideoId};
use crate::player::{AspectMode, Chapter, EngineEvent, MediaEngine};
use crate::session::{EngineEventSink, LoadRequest, SessionHandle};
use crate::utils::SessionResult;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub video: String,
    /// Inferred from the identifier when absent
    #[serde(default)]
    pub remote: Option<bool>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub siblings: Vec<String>,
    /// Chapters the logging engine reports
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    Engine(EngineEvent),
    Command(ReplayCommand),
    WaitMs(u64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayCommand {
    Load { video: String },
    SeekTo { position: f64 },
    SeekBy { delta: f64 },
    TogglePlayPause,
    SetSpeed { speed: f64 },
    SetAspectMode { mode: AspectMode },
    PreviousEpisode,
    NextEpisode,
    ConfirmRestart,
    DismissResumePrompt,
    Stop,
    SetOverlayVisible { visible: bool },
    SetOverlayOffset { offset_ms: i64 },
}

impl ReplayScript {
    pub async fn from_file(path: &Path) -> SessionResult<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load_request(&self) -> LoadRequest {
        let mut request = LoadRequest::new(self.video.as_str());
        if let Some(remote) = self.remote {
            request = request.remote(remote);
        }
        if let Some(folder) = &self.folder {
            request = request.with_folder(folder.as_str());
        }
        if !self.siblings.is_empty() {
            request = request.with_siblings(
                self.siblings
                    .iter()
                    .map(|s| VideoId::new(s.as_str()))
                    .collect(),
            );
        }
        request
    }
}

#[derive(Default)]
struct LoggingEngineInner {
    sink: Option<EngineEventSink>,
    calls: Vec<String>,
}

/// Engine that only records what it was asked to do
#[derive(Clone, Default)]
pub struct LoggingEngine {
    chapters: Arc<Vec<Chapter>>,
    inner: Arc<Mutex<LoggingEngineInner>>,
}

impl LoggingEngine {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self {
            chapters: Arc::new(chapters),
            inner: Arc::default(),
        }
    }

    /// Deliver an event through the current sink; false before any load
    pub async fn emit(&self, event: EngineEvent) -> bool {
        match &self.inner.lock().await.sink {
            Some(sink) => sink.emit(event),
            None => false,
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.inner.lock().await.calls.clone()
    }

    async fn record(&self, call: String) -> Result<()> {
        info!("engine <- {}", call);
        self.inner.lock().await.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl MediaEngine for LoggingEngine {
    async fn load(
        &self,
        source: &str,
        start_position: f64,
        events: EngineEventSink,
    ) -> Result<()> {
        self.inner.lock().await.sink = Some(events);
        self.record(format!("load({}, {:.1})", source, start_position))
            .await
    }

    async fn seek_to(&self, position: f64, precise: bool) -> Result<()> {
        self.record(format!("seek_to({:.1}, {})", position, precise))
            .await
    }

    async fn seek_by(&self, delta: f64) -> Result<()> {
        self.record(format!("seek_by({:+.1})", delta)).await
    }

    async fn toggle_play_pause(&self) -> Result<()> {
        self.record("toggle_play_pause".to_string()).await
    }

    async fn set_speed(&self, speed: f64) -> Result<()> {
        self.record(format!("set_speed({})", speed)).await
    }

    async fn set_aspect_mode(&self, mode: AspectMode) -> Result<()> {
        self.record(format!("set_aspect_mode({})", mode.label()))
            .await
    }

    async fn set_shader_chain(&self, shaders: &[String]) -> Result<()> {
        self.record(format!("set_shader_chain({})", shaders.join(",")))
            .await
    }

    async fn set_subtitle_style_override(&self, enabled: bool) -> Result<()> {
        self.record(format!("set_subtitle_style_override({})", enabled))
            .await
    }

    async fn set_subtitle_scale(&self, scale: f64) -> Result<()> {
        self.record(format!("set_subtitle_scale({})", scale)).await
    }

    async fn set_subtitle_vertical_position(&self, position: i64) -> Result<()> {
        self.record(format!("set_subtitle_vertical_position({})", position))
            .await
    }

    async fn set_subtitle_delay(&self, seconds: f64) -> Result<()> {
        self.record(format!("set_subtitle_delay({})", seconds))
            .await
    }

    async fn add_external_subtitle(&self, path: &Path) -> Result<()> {
        self.record(format!("add_external_subtitle({})", path.display()))
            .await
    }

    async fn select_subtitle_track(&self, track_id: i64) -> Result<()> {
        self.record(format!("select_subtitle_track({})", track_id))
            .await
    }

    async fn set_subtitle_text_color(&self, color: &str) -> Result<()> {
        self.record(format!("set_subtitle_text_color({})", color))
            .await
    }

    async fn set_subtitle_border_color(&self, color: &str) -> Result<()> {
        self.record(format!("set_subtitle_border_color({})", color))
            .await
    }

    async fn set_subtitle_back_color(&self, color: &str) -> Result<()> {
        self.record(format!("set_subtitle_back_color({})", color))
            .await
    }

    async fn set_subtitle_border_style(&self, style: SubtitleBorderStyle) -> Result<()> {
        self.record(format!("set_subtitle_border_style({})", style.as_str()))
            .await
    }

    async fn chapters(&self) -> Vec<Chapter> {
        self.chapters.as_ref().clone()
    }

    async fn destroy(&self) {
        let mut inner = self.inner.lock().await;
        inner.sink = None;
        inner.calls.push("destroy".to_string());
        info!("engine <- destroy");
    }
}

async fn apply_command(handle: &SessionHandle, command: ReplayCommand) -> SessionResult<()> {
    match command {
        ReplayCommand::Load { video } => handle.load(LoadRequest::new(video.as_str())).await,
        ReplayCommand::SeekTo { position } => handle.seek_to(position).await,
        ReplayCommand::SeekBy { delta } => handle.seek_by(delta).await,
        ReplayCommand::TogglePlayPause => handle.toggle_play_pause().await,
        ReplayCommand::SetSpeed { speed } => handle.set_speed(speed).await,
        ReplayCommand::SetAspectMode { mode } => handle.set_aspect_mode(mode).await,
        ReplayCommand::PreviousEpisode => handle.previous_episode().await.map(|_| ()),
        ReplayCommand::NextEpisode => handle.next_episode().await.map(|_| ()),
        ReplayCommand::ConfirmRestart => handle.confirm_restart().await,
        ReplayCommand::DismissResumePrompt => handle.dismiss_resume_prompt().await,
        ReplayCommand::Stop => handle.stop().await,
        ReplayCommand::SetOverlayVisible { visible } => handle.set_overlay_visible(visible).await,
        ReplayCommand::SetOverlayOffset { offset_ms } => {
            handle.set_overlay_offset(offset_ms).await
        }
    }
}

/// Load the script's video, run every step and return the final snapshot.
/// Failing commands are logged and the replay continues.
pub async fn run(
    script: &ReplayScript,
    handle: &SessionHandle,
    engine: &LoggingEngine,
) -> SessionResult<SessionSnapshot> {
    handle.load(script.load_request()).await?;

    for step in &script.steps {
        match step.clone() {
            ReplayStep::Engine(event) => {
                if !engine.emit(event.clone()).await {
                    warn!("No active engine sink for {}", event.name());
                }
            }
            ReplayStep::Command(command) => {
                info!("command {:?}", command);
                if let Err(e) = apply_command(handle, command).await {
                    warn!("Command failed: {}", e);
                }
            }
            ReplayStep::WaitMs(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
    }

    handle.snapshot().await
}
