use anyhow::Result;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PreferenceTimingConfig;
use crate::models::{PreferenceSet, SubtitleBorderStyle};
use crate::player::MediaEngine;

/// One engine call restoring a stored display preference
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceStep {
    StyleOverride(bool),
    SubtitleScale(f64),
    VerticalPosition(i64),
    SubtitleDelay(f64),
    ExternalSubtitle(PathBuf),
    SubtitleTrack(i64),
    TextColor(String),
    BorderColor(String),
    BackColor(String),
    BorderStyle(SubtitleBorderStyle),
}

impl PreferenceStep {
    pub fn name(&self) -> &'static str {
        match self {
            PreferenceStep::StyleOverride(_) => "style override",
            PreferenceStep::SubtitleScale(_) => "subtitle scale",
            PreferenceStep::VerticalPosition(_) => "vertical position",
            PreferenceStep::SubtitleDelay(_) => "subtitle delay",
            PreferenceStep::ExternalSubtitle(_) => "external subtitle",
            PreferenceStep::SubtitleTrack(_) => "subtitle track",
            PreferenceStep::TextColor(_) => "text color",
            PreferenceStep::BorderColor(_) => "border color",
            PreferenceStep::BackColor(_) => "back color",
            PreferenceStep::BorderStyle(_) => "border style",
        }
    }

    /// Delay before this step relative to the previous one.
    /// Track lists are populated late, so track selection waits longer.
    pub fn delay(&self, timing: &PreferenceTimingConfig) -> Duration {
        match self {
            PreferenceStep::SubtitleTrack(_) => timing.track_delay(),
            _ => timing.step_delay(),
        }
    }

    pub async fn apply(&self, engine: &dyn MediaEngine) -> Result<()> {
        match self {
            PreferenceStep::StyleOverride(enabled) => {
                engine.set_subtitle_style_override(*enabled).await
            }
            PreferenceStep::SubtitleScale(scale) => engine.set_subtitle_scale(*scale).await,
            PreferenceStep::VerticalPosition(position) => {
                engine.set_subtitle_vertical_position(*position).await
            }
            PreferenceStep::SubtitleDelay(seconds) => engine.set_subtitle_delay(*seconds).await,
            PreferenceStep::ExternalSubtitle(path) => {
                if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                    warn!("External subtitle {:?} no longer exists, skipping", path);
                    return Ok(());
                }
                engine.add_external_subtitle(path).await
            }
            PreferenceStep::SubtitleTrack(track_id) => engine.select_subtitle_track(*track_id).await,
            PreferenceStep::TextColor(color) => engine.set_subtitle_text_color(color).await,
            PreferenceStep::BorderColor(color) => engine.set_subtitle_border_color(color).await,
            PreferenceStep::BackColor(color) => engine.set_subtitle_back_color(color).await,
            PreferenceStep::BorderStyle(style) => engine.set_subtitle_border_style(*style).await,
        }
    }
}

/// Ordered queue of preference steps for the current session.
///
/// The controller pops one step per timer firing, which keeps the steps
/// strictly ordered and lets a new load drop whatever is left.
#[derive(Debug, Default)]
pub struct PreferenceRestorer {
    steps: VecDeque<PreferenceStep>,
}

impl PreferenceRestorer {
    /// Build the fixed-order plan. Border style is always applied.
    pub fn plan(preferences: &PreferenceSet) -> VecDeque<PreferenceStep> {
        let mut steps = VecDeque::new();

        if let Some(enabled) = preferences.style_override {
            steps.push_back(PreferenceStep::StyleOverride(enabled));
        }
        if let Some(scale) = preferences.subtitle_scale {
            steps.push_back(PreferenceStep::SubtitleScale(scale));
        }
        if let Some(position) = preferences.subtitle_position {
            steps.push_back(PreferenceStep::VerticalPosition(position));
        }
        if let Some(delay) = preferences.subtitle_delay {
            steps.push_back(PreferenceStep::SubtitleDelay(delay));
        }
        if let Some(path) = &preferences.external_subtitle {
            steps.push_back(PreferenceStep::ExternalSubtitle(path.clone()));
        }
        if let Some(track_id) = preferences.subtitle_track {
            steps.push_back(PreferenceStep::SubtitleTrack(track_id));
        }
        if let Some(color) = &preferences.text_color {
            steps.push_back(PreferenceStep::TextColor(color.clone()));
        }
        if let Some(color) = &preferences.border_color {
            steps.push_back(PreferenceStep::BorderColor(color.clone()));
        }
        if let Some(color) = &preferences.back_color {
            steps.push_back(PreferenceStep::BackColor(color.clone()));
        }
        steps.push_back(PreferenceStep::BorderStyle(
            preferences.border_style.unwrap_or_default(),
        ));

        steps
    }

    /// Replace any pending steps with a fresh plan
    pub fn start(&mut self, preferences: &PreferenceSet) {
        self.steps = Self::plan(preferences);
        debug!("Restoring {} display preference steps", self.steps.len());
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }

    /// Delay until the next pending step, if any
    pub fn next_delay(&self, timing: &PreferenceTimingConfig) -> Option<Duration> {
        self.steps.front().map(|step| step.delay(timing))
    }

    pub fn pop(&mut self) -> Option<PreferenceStep> {
        self.steps.pop_front()
    }
}
