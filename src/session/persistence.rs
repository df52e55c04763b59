use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::models::{
    FolderId, HistoryEntry, PreferenceSet, SkipConfig, StoredPosition, VideoId,
};
use crate::services::SessionStores;

/// Everything the controller reads from the stores when a video loads
#[derive(Debug, Clone, Default)]
pub struct StoredContext {
    pub position: Option<StoredPosition>,
    pub preferences: PreferenceSet,
    pub skip_config: SkipConfig,
    pub history: Option<HistoryEntry>,
}

/// Queued store operations, applied strictly in order
#[derive(Debug)]
enum PersistenceRequest {
    SavePosition {
        video: VideoId,
        position: f64,
        duration: f64,
    },
    ClearPosition {
        video: VideoId,
    },
    RecordHistory(HistoryEntry),
    UpdateOverlay {
        video: VideoId,
        path: Option<PathBuf>,
        visible: bool,
        offset_ms: i64,
    },
    LoadContext {
        video: VideoId,
        folder: Option<FolderId>,
        respond_to: oneshot::Sender<StoredContext>,
    },
    Flush {
        respond_to: oneshot::Sender<()>,
    },
}

/// Sending half of the persistence worker.
///
/// Writes are fire-and-forget. Reads travel through the same queue, so a
/// read always observes every write queued before it.
#[derive(Debug)]
pub struct PersistenceQueue {
    sender: Option<mpsc::UnboundedSender<PersistenceRequest>>,
}

impl PersistenceQueue {
    fn send(&self, request: PersistenceRequest) {
        match &self.sender {
            Some(sender) => {
                if sender.send(request).is_err() {
                    warn!("Persistence worker is gone, dropping request");
                }
            }
            None => trace!("Persistence queue closed, dropping {:?}", request),
        }
    }

    pub fn save_position(&self, video: &VideoId, position: f64, duration: f64) {
        self.send(PersistenceRequest::SavePosition {
            video: video.clone(),
            position,
            duration,
        });
    }

    pub fn clear_position(&self, video: &VideoId) {
        self.send(PersistenceRequest::ClearPosition {
            video: video.clone(),
        });
    }

    pub fn record_history(&self, entry: HistoryEntry) {
        self.send(PersistenceRequest::RecordHistory(entry));
    }

    pub fn update_overlay(
        &self,
        video: &VideoId,
        path: Option<PathBuf>,
        visible: bool,
        offset_ms: i64,
    ) {
        self.send(PersistenceRequest::UpdateOverlay {
            video: video.clone(),
            path,
            visible,
            offset_ms,
        });
    }

    /// Falls back to an empty context when the worker is unavailable
    pub async fn load_context(&self, video: &VideoId, folder: Option<&FolderId>) -> StoredContext {
        let (respond_to, response) = oneshot::channel();
        self.send(PersistenceRequest::LoadContext {
            video: video.clone(),
            folder: folder.cloned(),
            respond_to,
        });
        response.await.unwrap_or_default()
    }

    /// Wait until every request queued so far has been applied
    pub async fn flush(&self) {
        let (respond_to, response) = oneshot::channel();
        self.send(PersistenceRequest::Flush { respond_to });
        let _ = response.await;
    }

    /// Stop accepting requests; the worker drains what is queued and exits
    pub fn close(&mut self) {
        self.sender = None;
    }
}

/// Applies persistence requests one at a time against the stores
pub struct PersistenceWorker {
    stores: SessionStores,
    receiver: mpsc::UnboundedReceiver<PersistenceRequest>,
}

impl PersistenceWorker {
    pub fn new(stores: SessionStores) -> (PersistenceQueue, PersistenceWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            PersistenceQueue {
                sender: Some(sender),
            },
            PersistenceWorker { stores, receiver },
        )
    }

    pub async fn run(mut self) {
        debug!("Persistence worker started");

        while let Some(request) = self.receiver.recv().await {
            self.handle(request).await;
        }

        debug!("Persistence worker stopped");
    }

    async fn handle(&self, request: PersistenceRequest) {
        match request {
            PersistenceRequest::SavePosition {
                video,
                position,
                duration,
            } => {
                trace!("Saving position {:.1}s/{:.1}s for {}", position, duration, video);
                if let Err(e) = self.stores.positions.set(&video, position, duration).await {
                    warn!("Failed to save position for {}: {}", video, e);
                }
            }
            PersistenceRequest::ClearPosition { video } => {
                trace!("Clearing position for {}", video);
                if let Err(e) = self.stores.positions.clear(&video).await {
                    warn!("Failed to clear position for {}: {}", video, e);
                }
            }
            PersistenceRequest::RecordHistory(entry) => {
                let video = entry.video.clone();
                if let Err(e) = self.stores.history.add(entry).await {
                    warn!("Failed to record history for {}: {}", video, e);
                }
            }
            PersistenceRequest::UpdateOverlay {
                video,
                path,
                visible,
                offset_ms,
            } => {
                if let Err(e) = self
                    .stores
                    .history
                    .update_overlay(&video, path.as_deref(), visible, offset_ms)
                    .await
                {
                    warn!("Failed to update overlay state for {}: {}", video, e);
                }
            }
            PersistenceRequest::LoadContext {
                video,
                folder,
                respond_to,
            } => {
                let context = self.load_context(&video, folder.as_ref()).await;
                let _ = respond_to.send(context);
            }
            PersistenceRequest::Flush { respond_to } => {
                let _ = respond_to.send(());
            }
        }
    }

    async fn load_context(&self, video: &VideoId, folder: Option<&FolderId>) -> StoredContext {
        let position = self.stores.positions.get(video).await.unwrap_or_else(|e| {
            warn!("Failed to read stored position for {}: {}", video, e);
            None
        });

        let preferences = self.stores.preferences.get(video).await.unwrap_or_else(|e| {
            warn!("Failed to read preferences for {}: {}", video, e);
            PreferenceSet::default()
        });

        let skip_config = match folder {
            Some(folder) => self.stores.skip_configs.get(folder).await.unwrap_or_else(|e| {
                warn!("Failed to read skip config for {}: {}", folder, e);
                SkipConfig::default()
            }),
            None => SkipConfig::default(),
        };

        let history = self.stores.history.get(video).await.unwrap_or_else(|e| {
            warn!("Failed to read history for {}: {}", video, e);
            None
        });

        StoredContext {
            position,
            preferences,
            skip_config,
            history,
        }
    }
}

/// History row for the current state of a local video
pub(crate) fn history_entry(
    video: &VideoId,
    position_ms: i64,
    duration_ms: i64,
    overlay_path: Option<PathBuf>,
    overlay_visible: bool,
    overlay_offset_ms: i64,
) -> HistoryEntry {
    HistoryEntry {
        video: video.clone(),
        file_name: video.file_name(),
        position_ms,
        duration_ms,
        last_played_at: Utc::now(),
        folder_name: video.folder_name(),
        danmu_path: overlay_path,
        danmu_visible: overlay_visible,
        danmu_offset_ms: overlay_offset_ms,
    }
}
