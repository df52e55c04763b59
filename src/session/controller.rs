use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::events::{ControllerMessage, EngineEventSink, Notice, SessionEvent};
use super::persistence::{PersistenceQueue, PersistenceWorker, history_entry};
use super::preferences::PreferenceRestorer;
use super::resume::{ResumeNegotiator, StartDecision};
use super::series_cursor::SeriesCursor;
use super::skip::{SkipAction, SkipAutomation};
use super::stall::StallDetector;
use super::timers::{SessionTimers, TimerKind};
use crate::config::Config;
use crate::models::{
    FolderId, HistoryEntry, PreferenceSet, ResumePrompt, Session, SessionSnapshot, SessionState,
    VideoId,
};
use crate::player::{AspectMode, EngineEvent, MediaEngine, OverlaySync};
use crate::services::{SeriesResolver, SessionStores, is_remote_identifier};
use crate::utils::{SessionError, SessionResult};

/// What to play, and where it belongs
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub video: VideoId,
    pub is_remote: bool,
    pub folder_id: Option<FolderId>,
    /// Explicit sibling list; resolved from the video when absent
    pub siblings: Option<Vec<VideoId>>,
}

impl LoadRequest {
    /// Remote-ness is inferred from the identifier
    pub fn new(video: impl Into<VideoId>) -> Self {
        let video = video.into();
        Self {
            is_remote: is_remote_identifier(video.as_str()),
            video,
            folder_id: None,
            siblings: None,
        }
    }

    pub fn remote(mut self, is_remote: bool) -> Self {
        self.is_remote = is_remote;
        self
    }

    pub fn with_folder(mut self, folder_id: impl Into<FolderId>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    pub fn with_siblings(mut self, siblings: Vec<VideoId>) -> Self {
        self.siblings = Some(siblings);
        self
    }
}

/// Commands that can be sent to the session controller
#[derive(Debug)]
pub enum SessionCommand {
    /// Start a new session for a video
    Load {
        request: LoadRequest,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    SeekTo {
        position: f64,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    SeekBy {
        delta: f64,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    TogglePlayPause {
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    SetSpeed {
        speed: f64,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    SetAspectMode {
        mode: AspectMode,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    SetShaderChain {
        shaders: Vec<String>,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    /// Switch to the previous sibling; false at the start of the series
    PreviousEpisode {
        respond_to: oneshot::Sender<SessionResult<bool>>,
    },
    /// Switch to the next sibling; false at the end of the series
    NextEpisode {
        respond_to: oneshot::Sender<SessionResult<bool>>,
    },
    /// Answer the resume prompt with "start over"
    ConfirmRestart {
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    /// Close the resume prompt and keep playing from the stored position
    DismissResumePrompt {
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    /// Persist and pause
    Stop {
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    SetOverlayVisible {
        visible: bool,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    SetOverlayOffset {
        offset_ms: i64,
        respond_to: oneshot::Sender<SessionResult<()>>,
    },
    Snapshot {
        respond_to: oneshot::Sender<SessionSnapshot>,
    },
    Teardown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Transient per-session flags, reset on every load
#[derive(Debug, Default)]
struct SessionFlags {
    file_loaded: bool,
    /// The engine rejected `load`; no engine commands until the next load
    engine_failed: bool,
    started_from_stored: bool,
    first_progress_seen: bool,
    /// The next progress update is mirrored to the overlay
    seek_pending: bool,
}

#[derive(Debug, Default)]
struct OverlayState {
    loaded: bool,
    path: Option<PathBuf>,
    visible: bool,
    offset_ms: i64,
}

/// Controller that owns one playback session at a time and processes
/// commands, engine events and timer firings in order
pub struct SessionController {
    config: Config,
    engine: Box<dyn MediaEngine>,
    resolver: Arc<dyn SeriesResolver>,
    overlay: Arc<dyn OverlaySync>,

    commands: mpsc::UnboundedReceiver<SessionCommand>,
    inbox: mpsc::UnboundedReceiver<ControllerMessage>,
    inbox_sender: mpsc::UnboundedSender<ControllerMessage>,
    events: mpsc::UnboundedSender<SessionEvent>,

    persistence: PersistenceQueue,
    persistence_worker: Option<PersistenceWorker>,
    persistence_task: Option<JoinHandle<()>>,
    timers: SessionTimers,

    session: Session,
    flags: SessionFlags,
    resume_prompt: Option<ResumePrompt>,
    overlay_state: OverlayState,
    preferences: PreferenceSet,
    history: Option<HistoryEntry>,
    surface_initialized: bool,

    negotiator: ResumeNegotiator,
    stall: StallDetector,
    skip: SkipAutomation,
    cursor: SeriesCursor,
    restorer: PreferenceRestorer,
}

impl SessionController {
    pub fn new(
        config: Config,
        engine: Box<dyn MediaEngine>,
        stores: SessionStores,
        resolver: Arc<dyn SeriesResolver>,
        overlay: Arc<dyn OverlaySync>,
    ) -> (SessionHandle, SessionController) {
        let (sender, commands) = mpsc::unbounded_channel();
        let (inbox_sender, inbox) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (persistence, worker) = PersistenceWorker::new(stores);

        let controller = SessionController {
            negotiator: ResumeNegotiator::new(&config.resume),
            stall: StallDetector::new(config.stall.threshold()),
            timers: SessionTimers::new(inbox_sender.clone()),
            config,
            engine,
            resolver,
            overlay,
            commands,
            inbox,
            inbox_sender,
            events: events_tx,
            persistence,
            persistence_worker: Some(worker),
            persistence_task: None,
            session: Session::idle(),
            flags: SessionFlags::default(),
            resume_prompt: None,
            overlay_state: OverlayState::default(),
            preferences: PreferenceSet::default(),
            history: None,
            surface_initialized: false,
            skip: SkipAutomation::default(),
            cursor: SeriesCursor::default(),
            restorer: PreferenceRestorer::default(),
        };
        let handle = SessionHandle {
            sender,
            event_receiver: Arc::new(Mutex::new(Some(events_rx))),
        };

        (handle, controller)
    }

    /// Run the controller event loop until every handle is dropped
    pub async fn run(mut self) {
        debug!("SessionController event loop started");

        if let Some(worker) = self.persistence_worker.take() {
            self.persistence_task = Some(tokio::spawn(worker.run()));
        }

        loop {
            tokio::select! {
                // Engine events and timers already in flight go first
                biased;
                Some(message) = self.inbox.recv() => self.handle_message(message).await,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }
        }

        if self.session.state != SessionState::Destroyed {
            debug!("All session handles dropped, tearing down");
            self.teardown().await;
        }

        debug!("SessionController event loop terminated");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Load {
                request,
                respond_to,
            } => {
                let result = self.load(request).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::SeekTo {
                position,
                respond_to,
            } => {
                trace!("Seeking to {:.3}s", position);
                let result = match self.ensure_loaded() {
                    Ok(()) => self.seek(position, true).await,
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            SessionCommand::SeekBy { delta, respond_to } => {
                trace!("Seeking by {:+.3}s", delta);
                let result = self.seek_by(delta).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::TogglePlayPause { respond_to } => {
                trace!("Toggling play/pause");
                let result = match self.ensure_loaded() {
                    Ok(()) => self
                        .engine
                        .toggle_play_pause()
                        .await
                        .map_err(|e| SessionError::Engine(e.to_string())),
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            SessionCommand::SetSpeed { speed, respond_to } => {
                trace!("Setting playback speed to {}", speed);
                let result = self.set_speed(speed).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::SetAspectMode { mode, respond_to } => {
                trace!("Setting aspect mode to {}", mode.label());
                let result = self.set_aspect_mode(mode).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::SetShaderChain {
                shaders,
                respond_to,
            } => {
                trace!("Setting shader chain ({} shaders)", shaders.len());
                let result = self.set_shader_chain(shaders).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::PreviousEpisode { respond_to } => {
                let result = self.navigate(false).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::NextEpisode { respond_to } => {
                let result = self.navigate(true).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::ConfirmRestart { respond_to } => {
                let result = self.confirm_restart().await;
                let _ = respond_to.send(result);
            }
            SessionCommand::DismissResumePrompt { respond_to } => {
                let result = self.ensure_alive().map(|()| self.hide_resume_prompt());
                let _ = respond_to.send(result);
            }
            SessionCommand::Stop { respond_to } => {
                let result = self.stop().await;
                let _ = respond_to.send(result);
            }
            SessionCommand::SetOverlayVisible {
                visible,
                respond_to,
            } => {
                let result = self.update_overlay(|state| state.visible = visible);
                let _ = respond_to.send(result);
            }
            SessionCommand::SetOverlayOffset {
                offset_ms,
                respond_to,
            } => {
                let result = self.update_overlay(|state| state.offset_ms = offset_ms);
                let _ = respond_to.send(result);
            }
            SessionCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
            SessionCommand::Teardown { respond_to } => {
                self.teardown().await;
                let _ = respond_to.send(());
            }
        }
    }

    async fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Engine { token, event } => {
                if !self.is_current(token) {
                    trace!(
                        "Discarding stale {} (token {}, current {})",
                        event.name(),
                        token,
                        self.session.token
                    );
                    return;
                }
                self.handle_engine_event(event).await;
            }
            ControllerMessage::Timer { token, kind } => {
                if !self.is_current(token) {
                    trace!("Discarding stale {:?} timer (token {})", kind, token);
                    return;
                }
                self.handle_timer(kind).await;
            }
        }
    }

    fn is_current(&self, token: u64) -> bool {
        token == self.session.token
            && self.session.state != SessionState::Destroyed
            && !self.flags.engine_failed
    }

    // Load

    async fn load(&mut self, request: LoadRequest) -> SessionResult<()> {
        self.ensure_alive()?;

        let source = match resolve_source(&request.video, request.is_remote).await {
            Ok(source) => source,
            Err(e) => {
                warn!("Cannot play {}: {}", request.video, e);
                self.emit(SessionEvent::Notice(Notice::LoadFailed(e.to_string())));
                return Err(e);
            }
        };

        // Leaving a session in place counts as a stop for the old video
        if self.session.token > 0 {
            self.persist();
        }

        let LoadRequest {
            video,
            is_remote,
            folder_id,
            siblings,
        } = request;

        let token = self.session.token + 1;
        self.timers.reset_session();
        self.hide_resume_prompt();
        self.stall.reset();
        self.restorer.clear();
        self.flags = SessionFlags::default();
        self.overlay_state = OverlayState::default();

        self.cursor = self.series_for(&video, siblings).await;

        let context = self
            .persistence
            .load_context(&video, folder_id.as_ref())
            .await;
        self.skip.reset(context.skip_config);
        self.preferences = context.preferences;
        self.history = context.history;

        let stored_duration = context.position.map(|p| p.duration).unwrap_or(0.0);
        let decision = self.negotiator.negotiate(
            context.position.map(|p| p.position),
            stored_duration,
            Instant::now(),
        );
        let start_position = decision.start_position();

        self.session = Session {
            token,
            video,
            is_remote,
            folder_id,
            position: start_position,
            duration: 0.0,
            playing: false,
            speed: self.session.speed,
            aspect_mode: self.session.aspect_mode,
            state: self.session.state.clone(),
        };
        self.set_state(SessionState::Loading);

        if let StartDecision::FromStored { position, prompt } = decision {
            self.flags.started_from_stored = true;
            self.timers.schedule(
                token,
                TimerKind::ResumePromptDeadline,
                self.negotiator.prompt_timeout(),
            );
            self.resume_prompt = Some(prompt);
            self.emit(SessionEvent::ResumePromptShown {
                stored_position: position,
            });
        }

        info!(
            "Loading {} (token {}) from {:.1}s",
            self.session.video, token, start_position
        );

        let sink = EngineEventSink::new(token, self.inbox_sender.clone());
        if let Err(e) = self.engine.load(&source, start_position, sink).await {
            let message = e.to_string();
            error!("Engine rejected {}: {}", self.session.video, message);
            self.flags.engine_failed = true;
            self.timers.reset_session();
            self.hide_resume_prompt();
            self.set_state(SessionState::Error(message.clone()));
            self.emit(SessionEvent::Notice(Notice::LoadFailed(message.clone())));
            return Err(SessionError::EngineInit(message));
        }

        self.emit(SessionEvent::EpisodeChanged {
            video: self.session.video.clone(),
            has_previous: self.cursor.has_previous(),
            has_next: self.cursor.has_next(),
        });

        Ok(())
    }

    async fn series_for(&mut self, video: &VideoId, siblings: Option<Vec<VideoId>>) -> SeriesCursor {
        if let Some(items) = siblings.filter(|items| !items.is_empty()) {
            return SeriesCursor::new(items, video);
        }

        // Episode switches keep the list they navigated through
        if self.cursor.contains(video) {
            let mut cursor = std::mem::take(&mut self.cursor);
            cursor.update_current(video);
            return cursor;
        }

        let items = self.resolver.resolve(video).await.unwrap_or_else(|e| {
            warn!("Failed to resolve series for {}: {}", video, e);
            Vec::new()
        });
        debug!("Resolved {} siblings for {}", items.len(), video);
        SeriesCursor::new(items, video)
    }

    async fn navigate(&mut self, forward: bool) -> SessionResult<bool> {
        self.ensure_alive()?;

        let target = if forward {
            self.cursor.peek_next()
        } else {
            self.cursor.peek_previous()
        };

        match target {
            Some(video) => {
                self.switch_episode(video).await?;
                Ok(true)
            }
            None => {
                debug!("No {} episode", if forward { "next" } else { "previous" });
                self.emit(SessionEvent::Notice(Notice::NoMoreEpisodes));
                Ok(false)
            }
        }
    }

    async fn switch_episode(&mut self, video: VideoId) -> SessionResult<()> {
        info!("Switching episode to {}", video);
        let request = LoadRequest {
            is_remote: is_remote_identifier(video.as_str()),
            video,
            folder_id: self.session.folder_id.clone(),
            siblings: None,
        };
        self.load(request).await
    }

    // Engine events

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::SurfaceReady => self.initialize_surface().await,
            EngineEvent::FileLoaded => self.on_file_loaded().await,
            EngineEvent::ProgressUpdate { position, duration } => {
                self.on_progress(position, duration).await
            }
            EngineEvent::PlaybackStateChanged { is_playing } => {
                self.on_playback_state_changed(is_playing)
            }
            EngineEvent::BufferingStateChanged { is_buffering } => {
                if let Some(flag) = self.stall.on_buffering(is_buffering) {
                    self.apply_buffering(flag);
                }
            }
            EngineEvent::EndOfFile => self.on_end_of_file(),
            EngineEvent::Error { message } => {
                warn!("Engine error for {}: {}", self.session.video, message);
                self.set_state(SessionState::Error(message.clone()));
                self.emit(SessionEvent::Notice(Notice::EngineError(message)));
            }
        }
    }

    /// Applies the configured shader chain once per controller
    pub async fn initialize_surface(&mut self) {
        if self.surface_initialized {
            trace!("Surface already initialized");
            return;
        }
        self.surface_initialized = true;

        let shaders = self.config.engine.shader_chain.clone();
        if shaders.is_empty() {
            return;
        }
        if let Err(e) = self.engine.set_shader_chain(&shaders).await {
            warn!("Failed to apply shader chain: {}", e);
        }
    }

    async fn on_file_loaded(&mut self) {
        if self.flags.file_loaded {
            trace!("Duplicate file-loaded for token {}", self.session.token);
            return;
        }
        self.flags.file_loaded = true;
        self.session.playing = true;

        let state = if self.resume_prompt.is_some() {
            SessionState::AwaitingResumeDecision
        } else {
            SessionState::Playing
        };
        self.set_state(state);

        let token = self.session.token;
        self.timers
            .schedule(token, TimerKind::SkipReady, self.config.skip.ready_grace());

        self.restorer.start(&self.preferences);
        if let Some(delay) = self.restorer.next_delay(&self.config.preferences) {
            self.timers.schedule(token, TimerKind::PreferenceStep, delay);
        }

        self.load_overlay().await;
    }

    async fn load_overlay(&mut self) {
        let path = resolve_overlay_path(
            &self.session.video,
            self.session.is_remote,
            self.history.as_ref(),
            &self.config.overlay.sidecar_extensions,
        )
        .await;

        if !self.overlay.load_for(&self.session.video, path.as_deref()) {
            debug!("No overlay for {}", self.session.video);
            return;
        }

        let (visible, offset_ms) = self
            .history
            .as_ref()
            .filter(|entry| entry.danmu_path.is_some())
            .map(|entry| (entry.danmu_visible, entry.danmu_offset_ms))
            .unwrap_or((true, 0));
        debug!("Overlay loaded for {} from {:?}", self.session.video, path);

        self.overlay_state = OverlayState {
            loaded: true,
            path,
            visible,
            offset_ms,
        };
        self.overlay.set_speed(self.session.speed);
        self.overlay.resume();
    }

    async fn on_progress(&mut self, position: f64, duration: f64) {
        self.session.position = position;
        if duration > 0.0 {
            self.session.duration = duration;
        }

        if matches!(self.session.state, SessionState::Error(_)) {
            info!("Progress resumed after engine error");
            self.set_state(self.resting_state());
        }

        if !self.flags.first_progress_seen {
            self.flags.first_progress_seen = true;
            if self.flags.started_from_stored && self.negotiator.is_short(self.session.duration) {
                debug!(
                    "Duration {:.1}s is short content, restarting from zero",
                    self.session.duration
                );
                self.hide_resume_prompt();
                if let Err(e) = self.seek(0.0, true).await {
                    warn!("Failed to restart short content: {}", e);
                }
                return;
            }
        }

        if let Some(flag) = self
            .stall
            .on_progress(position, self.session.playing, Instant::now())
        {
            self.apply_buffering(flag);
        }

        if self.flags.seek_pending {
            self.flags.seek_pending = false;
            self.overlay.seek_to(self.session.position_ms());
            if self.session.state == SessionState::Seeking {
                self.set_state(self.resting_state());
            }
        }

        match self.skip.on_progress(position, self.session.duration) {
            SkipAction::None => {}
            SkipAction::SeekTo(target) => {
                if let Err(e) = self.seek(target, true).await {
                    warn!("Skip seek to {:.1}s failed: {}", target, e);
                }
            }
            SkipAction::NextEpisode => match self.cursor.peek_next() {
                Some(next) => {
                    if let Err(e) = self.switch_episode(next).await {
                        warn!("Failed to advance past outro: {}", e);
                    }
                }
                None => debug!("Outro reached with no next episode"),
            },
        }
    }

    fn on_playback_state_changed(&mut self, is_playing: bool) {
        let was_playing = self.session.playing;
        self.session.playing = is_playing;

        if is_playing {
            self.overlay.resume();
        } else {
            self.overlay.pause();
        }

        match self.session.state {
            SessionState::Playing | SessionState::Paused | SessionState::Stalled => {
                self.set_state(self.resting_state());
            }
            SessionState::Ended if is_playing => self.set_state(SessionState::Playing),
            _ => {}
        }

        if was_playing && !is_playing {
            self.persist();
        }
    }

    fn on_end_of_file(&mut self) {
        info!("Finished {}", self.session.video);
        self.session.playing = false;
        self.hide_resume_prompt();
        self.overlay.pause();
        self.persistence.clear_position(&self.session.video);
        self.set_state(SessionState::Ended);
    }

    fn apply_buffering(&mut self, flagged: bool) {
        debug!("Buffering indicator {}", if flagged { "on" } else { "off" });
        self.emit(SessionEvent::BufferingChanged(flagged));

        if flagged && self.session.state == SessionState::Playing {
            self.set_state(SessionState::Stalled);
        } else if !flagged && self.session.state == SessionState::Stalled {
            self.set_state(self.resting_state());
        }
    }

    // Timers

    async fn handle_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::ResumePromptDeadline => {
                debug!("Resume prompt timed out");
                self.hide_resume_prompt();
            }
            TimerKind::SkipReady => {
                let chapters = if self.skip.config().auto_skip_chapter {
                    self.engine.chapters().await
                } else {
                    Vec::new()
                };
                debug!("Skip automation ready ({} chapters)", chapters.len());
                self.skip.mark_ready(chapters);
            }
            TimerKind::PreferenceStep => {
                if let Some(step) = self.restorer.pop() {
                    trace!("Restoring {}", step.name());
                    if let Err(e) = step.apply(self.engine.as_ref()).await {
                        warn!("Failed to restore {}: {}", step.name(), e);
                    }
                }
                if let Some(delay) = self.restorer.next_delay(&self.config.preferences) {
                    self.timers
                        .schedule(self.session.token, TimerKind::PreferenceStep, delay);
                }
            }
        }
    }

    // User commands

    async fn seek(&mut self, position: f64, precise: bool) -> SessionResult<()> {
        let mut target = position.max(0.0);
        if self.session.duration > 0.0 {
            target = target.min(self.session.duration);
        }

        self.engine
            .seek_to(target, precise)
            .await
            .map_err(|e| SessionError::Engine(e.to_string()))?;

        self.session.position = target;
        self.mark_seeking();
        Ok(())
    }

    async fn seek_by(&mut self, delta: f64) -> SessionResult<()> {
        self.ensure_loaded()?;
        self.engine
            .seek_by(delta)
            .await
            .map_err(|e| SessionError::Engine(e.to_string()))?;
        self.mark_seeking();
        Ok(())
    }

    fn mark_seeking(&mut self) {
        self.flags.seek_pending = true;
        if matches!(
            self.session.state,
            SessionState::Playing | SessionState::Paused | SessionState::Stalled
        ) {
            self.set_state(SessionState::Seeking);
        }
    }

    async fn set_speed(&mut self, speed: f64) -> SessionResult<()> {
        self.ensure_loaded()?;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SessionError::Engine(format!("invalid playback speed {}", speed)));
        }

        self.engine
            .set_speed(speed)
            .await
            .map_err(|e| SessionError::Engine(e.to_string()))?;
        self.session.speed = speed;
        self.overlay.set_speed(speed);
        Ok(())
    }

    async fn set_aspect_mode(&mut self, mode: AspectMode) -> SessionResult<()> {
        self.ensure_loaded()?;
        self.engine
            .set_aspect_mode(mode)
            .await
            .map_err(|e| SessionError::Engine(e.to_string()))?;
        self.session.aspect_mode = mode;
        Ok(())
    }

    async fn set_shader_chain(&mut self, shaders: Vec<String>) -> SessionResult<()> {
        self.ensure_alive()?;
        self.engine
            .set_shader_chain(&shaders)
            .await
            .map_err(|e| SessionError::Engine(e.to_string()))?;
        self.config.engine.shader_chain = shaders;
        Ok(())
    }

    async fn confirm_restart(&mut self) -> SessionResult<()> {
        self.ensure_loaded()?;
        if self.resume_prompt.is_none() {
            trace!("Restart requested without a resume prompt");
            return Ok(());
        }

        info!("Restarting {} from the beginning", self.session.video);
        self.hide_resume_prompt();
        self.persistence.clear_position(&self.session.video);
        self.seek(0.0, true).await
    }

    async fn stop(&mut self) -> SessionResult<()> {
        self.ensure_loaded()?;
        self.persist();

        if self.session.playing {
            self.engine
                .toggle_play_pause()
                .await
                .map_err(|e| SessionError::Engine(e.to_string()))?;
        }
        Ok(())
    }

    fn update_overlay(&mut self, change: impl FnOnce(&mut OverlayState)) -> SessionResult<()> {
        self.ensure_alive()?;
        change(&mut self.overlay_state);

        if self.session.token > 0 && !self.session.is_remote && self.overlay_state.loaded {
            self.persistence.update_overlay(
                &self.session.video,
                self.overlay_state.path.clone(),
                self.overlay_state.visible,
                self.overlay_state.offset_ms,
            );
        }
        Ok(())
    }

    fn hide_resume_prompt(&mut self) {
        if self.resume_prompt.take().is_none() {
            return;
        }
        self.emit(SessionEvent::ResumePromptHidden);
        if self.session.state == SessionState::AwaitingResumeDecision {
            self.set_state(self.resting_state());
        }
    }

    /// Write position, and history for local videos, when there is progress
    fn persist(&mut self) {
        if self.session.state == SessionState::Ended || !self.session.has_progress() {
            trace!("Nothing to persist for {}", self.session.video);
            return;
        }

        let video = &self.session.video;
        debug!(
            "Persisting {} at {:.1}s/{:.1}s",
            video, self.session.position, self.session.duration
        );
        self.persistence
            .save_position(video, self.session.position, self.session.duration);

        if !self.session.is_remote {
            let (path, visible, offset_ms) = if self.overlay_state.loaded {
                (
                    self.overlay_state.path.clone(),
                    self.overlay_state.visible,
                    self.overlay_state.offset_ms,
                )
            } else {
                (None, true, 0)
            };
            self.persistence.record_history(history_entry(
                video,
                self.session.position_ms(),
                self.session.duration_ms(),
                path,
                visible,
                offset_ms,
            ));
        }
    }

    async fn teardown(&mut self) {
        if self.session.state == SessionState::Destroyed {
            trace!("Teardown on destroyed session ignored");
            return;
        }

        info!("Tearing down session for {}", self.session.video);
        self.persist();
        self.hide_resume_prompt();
        self.restorer.clear();
        self.timers.shutdown().await;
        self.engine.destroy().await;

        self.persistence.flush().await;
        self.persistence.close();
        if let Some(task) = self.persistence_task.take() {
            if let Err(e) = task.await {
                warn!("Persistence worker ended abnormally: {}", e);
            }
        }

        self.set_state(SessionState::Destroyed);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.clone(),
            resume_prompt: self.resume_prompt.clone(),
            buffering: self.stall.is_flagged(),
            series_index: self.cursor.index(),
            series_len: self.cursor.len(),
            has_previous: self.cursor.has_previous(),
            has_next: self.cursor.has_next(),
            overlay_path: self.overlay_state.path.clone(),
            overlay_visible: self.overlay_state.loaded && self.overlay_state.visible,
        }
    }

    // Helpers

    fn ensure_alive(&self) -> SessionResult<()> {
        if self.session.state == SessionState::Destroyed {
            return Err(SessionError::SessionDestroyed);
        }
        Ok(())
    }

    fn ensure_loaded(&self) -> SessionResult<()> {
        self.ensure_alive()?;
        if self.session.token == 0 {
            return Err(SessionError::Engine("no video loaded".to_string()));
        }
        if self.flags.engine_failed {
            return Err(SessionError::EngineInit(
                "the engine rejected the current video".to_string(),
            ));
        }
        Ok(())
    }

    fn resting_state(&self) -> SessionState {
        if self.session.playing && self.stall.is_flagged() {
            SessionState::Stalled
        } else if self.session.playing {
            SessionState::Playing
        } else {
            SessionState::Paused
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.session.state == state {
            return;
        }
        debug!("Session state {} -> {}", self.session.state, state);
        self.session.state = state.clone();
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Turn an identifier into something the engine can open
async fn resolve_source(video: &VideoId, is_remote: bool) -> SessionResult<String> {
    let raw = video.as_str().trim();
    if raw.is_empty() {
        return Err(SessionError::IdentifierResolution(
            "empty video identifier".to_string(),
        ));
    }

    if is_remote {
        Url::parse(raw).map_err(|e| {
            SessionError::IdentifierResolution(format!("invalid URL {}: {}", raw, e))
        })?;
        return Ok(raw.to_string());
    }

    let path = if raw.starts_with("file://") {
        Url::parse(raw)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .ok_or_else(|| {
                SessionError::IdentifierResolution(format!("invalid file URL {}", raw))
            })?
    } else {
        PathBuf::from(raw)
    };

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(SessionError::IdentifierResolution(format!(
            "{} does not exist",
            path.display()
        )));
    }

    Ok(path.to_string_lossy().into_owned())
}

/// The history's overlay file if it still exists, else a sidecar next to
/// the video with the same stem
async fn resolve_overlay_path(
    video: &VideoId,
    is_remote: bool,
    history: Option<&HistoryEntry>,
    extensions: &[String],
) -> Option<PathBuf> {
    if let Some(path) = history.and_then(|entry| entry.danmu_path.as_ref()) {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Some(path.clone());
        }
        debug!("Stored overlay {:?} is gone", path);
    }

    if is_remote {
        return None;
    }

    for extension in extensions {
        let candidate = video.as_path().with_extension(extension);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }

    None
}

/// Handle to send commands to the session controller
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::UnboundedSender<SessionCommand>,
    event_receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<SessionEvent>>>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("sender", &"<UnboundedSender>")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl SessionHandle {
    /// Take the session event receiver (can only be done once)
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.event_receiver
            .lock()
            .ok()
            .and_then(|mut receiver| receiver.take())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> SessionResult<T> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .map_err(|_| SessionError::ControllerClosed)?;
        response.await.map_err(|_| SessionError::ControllerClosed)
    }

    /// Start a new session; fails without touching the current one when the
    /// video cannot be resolved
    pub async fn load(&self, request: LoadRequest) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::Load {
            request,
            respond_to,
        })
        .await?
    }

    pub async fn seek_to(&self, position: f64) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::SeekTo {
            position,
            respond_to,
        })
        .await?
    }

    pub async fn seek_by(&self, delta: f64) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::SeekBy { delta, respond_to })
            .await?
    }

    pub async fn toggle_play_pause(&self) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::TogglePlayPause { respond_to })
            .await?
    }

    pub async fn set_speed(&self, speed: f64) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::SetSpeed { speed, respond_to })
            .await?
    }

    pub async fn set_aspect_mode(&self, mode: AspectMode) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::SetAspectMode { mode, respond_to })
            .await?
    }

    pub async fn set_shader_chain(&self, shaders: Vec<String>) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::SetShaderChain {
            shaders,
            respond_to,
        })
        .await?
    }

    pub async fn previous_episode(&self) -> SessionResult<bool> {
        self.request(|respond_to| SessionCommand::PreviousEpisode { respond_to })
            .await?
    }

    pub async fn next_episode(&self) -> SessionResult<bool> {
        self.request(|respond_to| SessionCommand::NextEpisode { respond_to })
            .await?
    }

    pub async fn confirm_restart(&self) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::ConfirmRestart { respond_to })
            .await?
    }

    pub async fn dismiss_resume_prompt(&self) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::DismissResumePrompt { respond_to })
            .await?
    }

    pub async fn stop(&self) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::Stop { respond_to })
            .await?
    }

    pub async fn set_overlay_visible(&self, visible: bool) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::SetOverlayVisible {
            visible,
            respond_to,
        })
        .await?
    }

    pub async fn set_overlay_offset(&self, offset_ms: i64) -> SessionResult<()> {
        self.request(|respond_to| SessionCommand::SetOverlayOffset {
            offset_ms,
            respond_to,
        })
        .await?
    }

    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        self.request(|respond_to| SessionCommand::Snapshot { respond_to })
            .await
    }

    /// One-shot teardown; repeated calls and calls after the controller
    /// has stopped are no-ops
    pub async fn teardown(&self) -> SessionResult<()> {
        match self
            .request(|respond_to| SessionCommand::Teardown { respond_to })
            .await
        {
            Ok(()) | Err(SessionError::ControllerClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
