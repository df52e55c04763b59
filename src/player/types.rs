/// Common types shared by engine implementations
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AspectMode {
    #[default]
    Fit, // Fit entire video in window (may show black bars)
    Fill,     // Fill window (may crop video)
    Stretch,  // Ignore source aspect ratio
    Ratio16_9,
    Ratio4_3,
    Ratio2_35,
}

impl AspectMode {
    pub fn label(&self) -> &'static str {
        match self {
            AspectMode::Fit => "Fit",
            AspectMode::Fill => "Fill",
            AspectMode::Stretch => "Stretch",
            AspectMode::Ratio16_9 => "16:9",
            AspectMode::Ratio4_3 => "4:3",
            AspectMode::Ratio2_35 => "2.35:1",
        }
    }
}

/// Chapter metadata reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub start_seconds: f64,
    pub title: String,
}

impl Chapter {
    pub fn new(start_seconds: f64, title: impl Into<String>) -> Self {
        Self {
            start_seconds,
            title: title.into(),
        }
    }
}
