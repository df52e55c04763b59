use tracing::debug;

use crate::models::SkipConfig;
use crate::player::Chapter;

/// What skip automation wants done after a progress update
#[derive(Debug, Clone, PartialEq)]
pub enum SkipAction {
    None,
    SeekTo(f64),
    NextEpisode,
}

/// Intro/outro skipping for one session.
///
/// Nothing fires until [`SkipAutomation::mark_ready`] is called, which the
/// controller does after the post-load grace delay. Each trigger fires at
/// most once per session.
#[derive(Debug, Default)]
pub struct SkipAutomation {
    config: SkipConfig,
    chapters: Vec<Chapter>,
    ready: bool,
    intro_triggered: bool,
    outro_triggered: bool,
}

impl SkipAutomation {
    /// Start a new session with the folder's config
    pub fn reset(&mut self, config: SkipConfig) {
        *self = Self {
            config,
            ..Self::default()
        };
    }

    pub fn config(&self) -> &SkipConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn mark_ready(&mut self, chapters: Vec<Chapter>) {
        self.ready = true;
        self.chapters = chapters;
    }

    pub fn on_progress(&mut self, position: f64, duration: f64) -> SkipAction {
        if !self.ready || self.config.is_inert() {
            return SkipAction::None;
        }

        if !self.intro_triggered {
            if let Some(action) = self.check_intro(position) {
                return action;
            }
        }

        self.check_outro(position, duration)
    }

    fn check_intro(&mut self, position: f64) -> Option<SkipAction> {
        if self.config.auto_skip_chapter && !self.chapters.is_empty() {
            self.intro_triggered = true;
            let index = (self.config.chapter_index as usize).min(self.chapters.len() - 1);
            let target = self.chapters[index].start_seconds;

            // Only ever skip forward
            if target > position {
                debug!(
                    "Auto-skipping to chapter {} ({}) at {:.1}s",
                    index, self.chapters[index].title, target
                );
                return Some(SkipAction::SeekTo(target));
            }
            debug!("Chapter {} starts before {:.1}s, not skipping", index, position);
            return None;
        }

        let intro = f64::from(self.config.skip_intro_sec);
        if intro > 0.0 && position < intro {
            self.intro_triggered = true;
            debug!("Skipping intro to {:.1}s", intro);
            return Some(SkipAction::SeekTo(intro));
        }

        None
    }

    fn check_outro(&mut self, position: f64, duration: f64) -> SkipAction {
        let outro = f64::from(self.config.skip_outro_sec);
        if outro <= 0.0 || duration <= 0.0 || self.outro_triggered {
            return SkipAction::None;
        }

        if duration - position <= outro {
            self.outro_triggered = true;
            debug!("Reached outro at {:.1}s of {:.1}s", position, duration);
            return SkipAction::NextEpisode;
        }

        SkipAction::None
    }
}
