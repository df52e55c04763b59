use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use super::{AspectMode, Chapter};
use crate::models::{SubtitleBorderStyle, VideoId};
use crate::session::EngineEventSink;

/// Decode/render engine driven by the session controller.
///
/// Events flow back through the [`EngineEventSink`] handed over on `load`;
/// a new sink is minted for every load, so events from a previous file are
/// recognisably stale.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn load(&self, source: &str, start_position: f64, events: EngineEventSink)
    -> Result<()>;
    async fn seek_to(&self, position: f64, precise: bool) -> Result<()>;
    async fn seek_by(&self, delta: f64) -> Result<()>;
    async fn toggle_play_pause(&self) -> Result<()>;
    async fn set_speed(&self, speed: f64) -> Result<()>;
    async fn set_aspect_mode(&self, mode: AspectMode) -> Result<()>;
    async fn set_shader_chain(&self, shaders: &[String]) -> Result<()>;
    async fn set_subtitle_style_override(&self, enabled: bool) -> Result<()>;
    async fn set_subtitle_scale(&self, scale: f64) -> Result<()>;
    async fn set_subtitle_vertical_position(&self, position: i64) -> Result<()>;
    async fn set_subtitle_delay(&self, seconds: f64) -> Result<()>;
    async fn add_external_subtitle(&self, path: &Path) -> Result<()>;
    async fn select_subtitle_track(&self, track_id: i64) -> Result<()>;
    async fn set_subtitle_text_color(&self, color: &str) -> Result<()>;
    async fn set_subtitle_border_color(&self, color: &str) -> Result<()>;
    async fn set_subtitle_back_color(&self, color: &str) -> Result<()>;
    async fn set_subtitle_border_style(&self, style: SubtitleBorderStyle) -> Result<()>;
    async fn chapters(&self) -> Vec<Chapter>;
    async fn destroy(&self);
}

/// Caption/comment overlay kept in lockstep with playback
pub trait OverlaySync: Send + Sync {
    /// Load the overlay for `video`; returns whether a source is now active
    fn load_for(&self, video: &VideoId, source: Option<&Path>) -> bool;
    fn resume(&self);
    fn pause(&self);
    fn seek_to(&self, position_ms: i64);
    fn set_speed(&self, speed: f64);
}

/// Overlay used when the owner renders no captions or comments
#[derive(Debug, Default)]
pub struct NoOverlay;

impl OverlaySync for NoOverlay {
    fn load_for(&self, _video: &VideoId, _source: Option<&Path>) -> bool {
        false
    }
    fn resume(&self) {}
    fn pause(&self) {}
    fn seek_to(&self, _position_ms: i64) {}
    fn set_speed(&self, _speed: f64) {}
}
