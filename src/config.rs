use anyhow::{Context, Result};
use dirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resume: ResumeConfig,

    #[serde(default)]
    pub stall: StallConfig,

    #[serde(default)]
    pub skip: SkipConfigDefaults,

    #[serde(default)]
    pub preferences: PreferenceTimingConfig,

    #[serde(default)]
    pub overlay: OverlayConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeConfig {
    /// Stored positions at or below this are treated as "not started"
    #[serde(default = "default_min_resume_seconds")]
    pub min_resume_seconds: f64,

    /// Media shorter than this never resumes
    #[serde(default = "default_short_content_seconds")]
    pub short_content_seconds: f64,

    #[serde(default = "default_prompt_timeout_ms")]
    pub prompt_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StallConfig {
    #[serde(default = "default_stall_threshold_ms")]
    pub threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipConfigDefaults {
    /// Grace period after a file loads before skip automation may seek
    #[serde(default = "default_ready_grace_ms")]
    pub ready_grace_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceTimingConfig {
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Track enumeration finishes late, so track selection waits longer
    #[serde(default = "default_track_delay_ms")]
    pub track_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_sidecar_extensions")]
    pub sidecar_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub shader_chain: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Resolved database location, falling back to the platform data dir
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => {
                let data_dir = dirs::data_dir().context("Failed to get data directory")?;
                Ok(data_dir.join("playback-session").join("data.db"))
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("playback-session").join("config.toml"))
    }
}

impl ResumeConfig {
    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.prompt_timeout_ms)
    }
}

impl StallConfig {
    pub fn threshold(&self) -> Duration {
        Duration::from_millis(self.threshold_ms)
    }
}

impl SkipConfigDefaults {
    pub fn ready_grace(&self) -> Duration {
        Duration::from_millis(self.ready_grace_ms)
    }
}

impl PreferenceTimingConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn track_delay(&self) -> Duration {
        Duration::from_millis(self.track_delay_ms)
    }
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            min_resume_seconds: default_min_resume_seconds(),
            short_content_seconds: default_short_content_seconds(),
            prompt_timeout_ms: default_prompt_timeout_ms(),
        }
    }
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_stall_threshold_ms(),
        }
    }
}

impl Default for SkipConfigDefaults {
    fn default() -> Self {
        Self {
            ready_grace_ms: default_ready_grace_ms(),
        }
    }
}

impl Default for PreferenceTimingConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            track_delay_ms: default_track_delay_ms(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            sidecar_extensions: default_sidecar_extensions(),
        }
    }
}

// Default value functions
fn default_min_resume_seconds() -> f64 { 5.0 }
fn default_short_content_seconds() -> f64 { 30.0 }
fn default_prompt_timeout_ms() -> u64 { 5000 }
fn default_stall_threshold_ms() -> u64 { 200 }
fn default_ready_grace_ms() -> u64 { 1000 }
fn default_step_delay_ms() -> u64 { 100 }
fn default_track_delay_ms() -> u64 { 800 }
fn default_sidecar_extensions() -> Vec<String> {
    vec!["xml".to_string(), "ass".to_string(), "json".to_string()]
}
