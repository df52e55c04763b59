use super::mocks::{MemoryStores, MockEngine, RecordingOverlay};
use playback_session::config::Config;
use playback_session::models::SessionSnapshot;
use playback_session::player::EngineEvent;
use playback_session::services::{NoSeries, SeriesResolver};
use playback_session::session::{SessionEvent, SessionHandle, spawn_session};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct TestSessionBuilder {
    config: Config,
    engine: MockEngine,
    stores: MemoryStores,
    overlay: RecordingOverlay,
    resolver: Arc<dyn SeriesResolver>,
}

impl TestSessionBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            engine: MockEngine::new(),
            stores: MemoryStores::default(),
            overlay: RecordingOverlay::new(true),
            resolver: Arc::new(NoSeries),
        }
    }

    pub fn with_config(mut self, change: impl FnOnce(&mut Config)) -> Self {
        change(&mut self.config);
        self
    }

    pub fn with_engine(mut self, engine: MockEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_overlay(mut self, overlay: RecordingOverlay) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SeriesResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Seed stores before the controller starts
    pub fn stores(&self) -> &MemoryStores {
        &self.stores
    }

    pub fn spawn(self) -> TestSession {
        let handle = spawn_session(
            self.config,
            Box::new(self.engine.clone()),
            self.stores.session_stores(),
            self.resolver,
            Arc::new(self.overlay.clone()),
        );
        let events = handle
            .take_event_receiver()
            .expect("event receiver already taken");

        TestSession {
            handle,
            engine: self.engine,
            stores: self.stores,
            overlay: self.overlay,
            events,
        }
    }
}

pub struct TestSession {
    pub handle: SessionHandle,
    pub engine: MockEngine,
    pub stores: MemoryStores,
    pub overlay: RecordingOverlay,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl TestSession {
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot().await.expect("controller alive")
    }

    /// Emit through the current sink and wait until the controller handled it
    pub async fn emit(&self, event: EngineEvent) -> SessionSnapshot {
        assert!(self.engine.emit(event), "no engine sink to emit through");
        self.snapshot().await
    }

    pub async fn progress(&self, position: f64, duration: f64) -> SessionSnapshot {
        self.emit(EngineEvent::ProgressUpdate { position, duration })
            .await
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Let every runnable task (persistence worker included) finish, moving
/// the paused clock by `ms`
pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
