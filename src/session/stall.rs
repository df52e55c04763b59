use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Flags playback that reports progress without the position moving.
///
/// Explicit buffering reports from the engine override the heuristic.
/// Every method returns `Some(flag)` only when the flag changes.
#[derive(Debug)]
pub struct StallDetector {
    threshold: Duration,
    last_position: Option<f64>,
    last_position_at: Instant,
    flagged: bool,
}

impl StallDetector {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_position: None,
            last_position_at: Instant::now(),
            flagged: false,
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn reset(&mut self) {
        self.last_position = None;
        self.last_position_at = Instant::now();
        self.flagged = false;
    }

    pub fn on_progress(&mut self, position: f64, playing: bool, now: Instant) -> Option<bool> {
        if self.last_position != Some(position) {
            self.last_position = Some(position);
            self.last_position_at = now;
            return self.set_flag(false);
        }

        let stuck_for = now.saturating_duration_since(self.last_position_at);
        if playing && stuck_for >= self.threshold && !self.flagged {
            debug!("Position stuck at {:.3}s for {:?}", position, stuck_for);
            return self.set_flag(true);
        }

        None
    }

    pub fn on_buffering(&mut self, is_buffering: bool) -> Option<bool> {
        self.set_flag(is_buffering)
    }

    fn set_flag(&mut self, flagged: bool) -> Option<bool> {
        if self.flagged == flagged {
            return None;
        }
        self.flagged = flagged;
        Some(flagged)
    }
}
