use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

use super::events::ControllerMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    ResumePromptDeadline,
    SkipReady,
    PreferenceStep,
}

/// Every timer the controller owns.
///
/// Timers of the current session hang off a child token that is replaced on
/// every load; teardown cancels the root and waits for all of them.
pub struct SessionTimers {
    root: CancellationToken,
    session: CancellationToken,
    tracker: TaskTracker,
    sender: mpsc::UnboundedSender<ControllerMessage>,
}

impl SessionTimers {
    pub fn new(sender: mpsc::UnboundedSender<ControllerMessage>) -> Self {
        let root = CancellationToken::new();
        let session = root.child_token();
        Self {
            root,
            session,
            tracker: TaskTracker::new(),
            sender,
        }
    }

    /// Cancel everything scheduled for the previous session
    pub fn reset_session(&mut self) {
        self.session.cancel();
        self.session = self.root.child_token();
    }

    pub fn schedule(&self, token: u64, kind: TimerKind, delay: Duration) {
        let cancel = self.session.clone();
        let sender = self.sender.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!("Timer {:?} for token {} cancelled", kind, token);
                }
                _ = tokio::time::sleep(delay) => {
                    let _ = sender.send(ControllerMessage::Timer { token, kind });
                }
            }
        });
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    pub async fn shutdown(&self) {
        self.root.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl std::fmt::Debug for SessionTimers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTimers")
            .field("pending", &self.tracker.len())
            .field("cancelled", &self.root.is_cancelled())
            .finish()
    }
}
