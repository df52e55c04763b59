use std::time::Duration;
use tokio::time::Instant;

use crate::config::ResumeConfig;
use crate::models::ResumePrompt;

/// Where playback of a freshly loaded video begins
#[derive(Debug, Clone, PartialEq)]
pub enum StartDecision {
    FromZero,
    FromStored {
        position: f64,
        prompt: ResumePrompt,
    },
}

impl StartDecision {
    pub fn start_position(&self) -> f64 {
        match self {
            StartDecision::FromZero => 0.0,
            StartDecision::FromStored { position, .. } => *position,
        }
    }
}

/// Decides between resuming and starting over.
pub struct ResumeNegotiator {
    /// Stored positions at or below this count as "not started"
    min_resume_seconds: f64,
    /// Media shorter than this always starts at zero
    short_content_seconds: f64,
    prompt_timeout: Duration,
}

impl ResumeNegotiator {
    pub fn new(config: &ResumeConfig) -> Self {
        Self {
            min_resume_seconds: config.min_resume_seconds,
            short_content_seconds: config.short_content_seconds,
            prompt_timeout: config.prompt_timeout(),
        }
    }

    pub fn prompt_timeout(&self) -> Duration {
        self.prompt_timeout
    }

    /// A known duration below the short-content threshold
    pub fn is_short(&self, duration: f64) -> bool {
        duration > 0.0 && duration < self.short_content_seconds
    }

    /// `duration` is 0 when it is not known yet
    pub fn negotiate(&self, stored_position: Option<f64>, duration: f64, now: Instant) -> StartDecision {
        if self.is_short(duration) {
            return StartDecision::FromZero;
        }

        match stored_position {
            Some(position) if position > self.min_resume_seconds => StartDecision::FromStored {
                position,
                prompt: ResumePrompt {
                    visible: true,
                    stored_position: position,
                    deadline: now + self.prompt_timeout,
                },
            },
            _ => StartDecision::FromZero,
        }
    }
}
