// ABOUTME: The platform speech engine adapter trait and the values passed across it.
// ABOUTME: Also converts reader settings into per-utterance voice settings.

use zen_reader::ReaderSettings;

use crate::error::SpeechError;
use crate::narrator::EventSink;

/// A voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub uri: String,
    pub name: String,
    pub lang: String,
}

/// Rate, pitch and voice preference for narration.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub voice_uri: Option<String>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            voice_uri: None,
        }
    }
}

fn positive_or_default(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

impl From<&ReaderSettings> for VoiceSettings {
    fn from(settings: &ReaderSettings) -> Self {
        let voice_uri = settings.voice_uri.trim();
        Self {
            rate: positive_or_default(settings.speech_rate),
            pitch: positive_or_default(settings.speech_pitch),
            voice_uri: (!voice_uri.is_empty()).then(|| voice_uri.to_string()),
        }
    }
}

/// One request to speak.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<Voice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Word,
    Sentence,
}

/// Events the engine reports for an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Started,
    Boundary {
        kind: BoundaryKind,
        char_index: usize,
        char_length: usize,
    },
    Ended,
    Error(String),
}

/// A platform text-to-speech backend.
///
/// Implementations report progress for an utterance through the [`EventSink`]
/// they are handed in [`SpeechEngine::speak`]. Events may arrive from any
/// thread, including synchronously from inside `speak`.
pub trait SpeechEngine: Send + Sync + 'static {
    fn voices(&self) -> Vec<Voice>;

    fn speak(&self, utterance: Utterance, sink: EventSink) -> Result<(), SpeechError>;

    fn pause(&self);

    fn resume(&self);

    /// Drop the current and any queued utterances.
    fn cancel(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn voice_settings_from_reader_settings() {
        let settings = ReaderSettings {
            speech_rate: 1.25,
            speech_pitch: 0.9,
            voice_uri: "Google UK English Female".to_string(),
            ..Default::default()
        };

        assert_eq!(
            VoiceSettings::from(&settings),
            VoiceSettings {
                rate: 1.25,
                pitch: 0.9,
                voice_uri: Some("Google UK English Female".to_string()),
            }
        );
    }

    #[test]
    fn zero_rate_and_blank_voice_use_defaults() {
        let settings = ReaderSettings {
            speech_rate: 0.0,
            speech_pitch: f32::NAN,
            voice_uri: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(VoiceSettings::from(&settings), VoiceSettings::default());
    }
}
