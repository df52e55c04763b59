use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::VideoId;
use crate::utils::natural_cmp;

/// Resolves the ordered sibling list a video belongs to
#[async_trait]
pub trait SeriesResolver: Send + Sync {
    async fn resolve(&self, video: &VideoId) -> Result<Vec<VideoId>>;
}

/// Resolver for standalone videos with no siblings
#[derive(Debug, Default)]
pub struct NoSeries;

#[async_trait]
impl SeriesResolver for NoSeries {
    async fn resolve(&self, _video: &VideoId) -> Result<Vec<VideoId>> {
        Ok(Vec::new())
    }
}

const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "m4v", "avi", "mov", "wmv", "flv", "webm", "ts", "m2ts", "rmvb", "mpg", "mpeg",
];

/// Treats every video file in the same directory as one series,
/// ordered naturally by file name
#[derive(Debug, Clone)]
pub struct FolderSeriesResolver {
    extensions: Vec<String>,
}

impl Default for FolderSeriesResolver {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl FolderSeriesResolver {
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        }
    }

    fn is_video(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SeriesResolver for FolderSeriesResolver {
    async fn resolve(&self, video: &VideoId) -> Result<Vec<VideoId>> {
        if is_remote_identifier(video.as_str()) {
            return Ok(Vec::new());
        }

        let Some(dir) = video.as_path().parent() else {
            return Ok(Vec::new());
        };

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory {:?}", dir))?;

        let mut files: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && self.is_video(&path) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| {
            let a_name = a.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            let b_name = b.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            natural_cmp(&a_name, &b_name)
        });

        debug!("Resolved {} siblings in {:?}", files.len(), dir);

        Ok(files
            .into_iter()
            .map(|path| VideoId::new(path.to_string_lossy().to_string()))
            .collect())
    }
}

/// URL-shaped identifiers (other than `file://`) are remote.
/// Single-letter schemes are Windows drive letters, not URLs.
pub fn is_remote_identifier(id: &str) -> bool {
    match url::Url::parse(id) {
        Ok(url) => url.scheme().len() > 1 && url.scheme() != "file",
        Err(_) => false,
    }
}
