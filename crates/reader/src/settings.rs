// ABOUTME: Reader settings as stored by the extension (theme, typography, speech, API key).
// ABOUTME: Loaded from and saved to camelCase JSON; missing keys fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// User preferences. Read-only from the pipeline's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderSettings {
    pub theme: Theme,
    pub font_family: String,
    pub font_size: u32,
    pub line_height: f32,
    pub speech_rate: f32,
    pub speech_pitch: f32,
    #[serde(rename = "voiceURI")]
    pub voice_uri: String,
    pub gemini_api_key: String,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_family: "Georgia, serif".to_string(),
            font_size: 18,
            line_height: 1.5,
            speech_rate: 1.0,
            speech_pitch: 1.0,
            voice_uri: String::new(),
            gemini_api_key: String::new(),
        }
    }
}

impl ReaderSettings {
    /// Load settings from a JSON file. Keys absent from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::configuration(
                "LoadSettings",
                Some(anyhow::anyhow!("reading {}: {}", path.display(), e)),
            )
        })?;
        Self::from_json(&raw)
    }

    /// Parse settings from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(raw)
            .map_err(|e| ExtractError::configuration("LoadSettings", Some(e.into())))
    }

    /// Write settings as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ExtractError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ExtractError::configuration("SaveSettings", Some(e.into())))?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| ExtractError::configuration("SaveSettings", Some(e.into())))
    }

    /// The Gemini API key, or `None` when it is blank.
    pub fn credential(&self) -> Option<&str> {
        let key = self.gemini_api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}
