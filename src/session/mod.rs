//! The playback session controller and the delegates it composes.
//!
//! A [`SessionController`] is an actor: it owns the current [`Session`],
//! the engine and every delegate, and handles user commands, engine events
//! and timer firings one at a time. Owners talk to it through a cloneable
//! [`SessionHandle`].
//!
//! [`Session`]: crate::models::Session

mod controller;
mod events;
mod persistence;
mod preferences;
mod resume;
mod series_cursor;
mod skip;
mod stall;
mod timers;

pub use controller::{LoadRequest, SessionCommand, SessionController, SessionHandle};
pub use events::{EngineEventSink, Notice, SessionEvent};
pub use preferences::{PreferenceRestorer, PreferenceStep};
pub use resume::{ResumeNegotiator, StartDecision};
pub use series_cursor::SeriesCursor;
pub use skip::{SkipAction, SkipAutomation};
pub use stall::StallDetector;
pub use timers::TimerKind;

use std::sync::Arc;

use crate::config::Config;
use crate::player::{MediaEngine, OverlaySync};
use crate::services::{SeriesResolver, SessionStores};

/// Create a controller and run it on the current tokio runtime
pub fn spawn_session(
    config: Config,
    engine: Box<dyn MediaEngine>,
    stores: SessionStores,
    resolver: Arc<dyn SeriesResolver>,
    overlay: Arc<dyn OverlaySync>,
) -> SessionHandle {
    let (handle, controller) = SessionController::new(config, engine, stores, resolver, overlay);
    tokio::spawn(controller.run());
    handle
}
