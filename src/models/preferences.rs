use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// How subtitle borders are drawn by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtitleBorderStyle {
    #[default]
    OutlineAndShadow,
    OpaqueBox,
    BackgroundBox,
}

impl SubtitleBorderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleBorderStyle::OutlineAndShadow => "outline-and-shadow",
            SubtitleBorderStyle::OpaqueBox => "opaque-box",
            SubtitleBorderStyle::BackgroundBox => "background-box",
        }
    }
}

impl FromStr for SubtitleBorderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outline-and-shadow" => Ok(SubtitleBorderStyle::OutlineAndShadow),
            "opaque-box" => Ok(SubtitleBorderStyle::OpaqueBox),
            "background-box" => Ok(SubtitleBorderStyle::BackgroundBox),
            other => Err(format!("unknown subtitle border style: {other}")),
        }
    }
}

/// Per-video display preferences. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceSet {
    /// Force the user's subtitle styling over styles embedded in the track
    pub style_override: Option<bool>,
    pub subtitle_scale: Option<f64>,
    /// Vertical position, 0 = top, 100 = bottom
    pub subtitle_position: Option<i64>,
    /// Seconds, may be negative
    pub subtitle_delay: Option<f64>,
    pub external_subtitle: Option<PathBuf>,
    pub subtitle_track: Option<i64>,
    pub text_color: Option<String>,
    pub border_color: Option<String>,
    pub back_color: Option<String>,
    pub border_style: Option<SubtitleBorderStyle>,
}

impl PreferenceSet {
    pub fn is_empty(&self) -> bool {
        self == &PreferenceSet::default()
    }
}
