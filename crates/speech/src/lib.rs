// ABOUTME: Text-to-speech narration for extracted articles.
// ABOUTME: Wraps a platform SpeechEngine in a Narrator state machine with word-boundary events.

//! Narration of reader content.
//!
//! A [`SpeechScript`] is built from article HTML, then handed to a
//! [`Narrator`], which drives any [`SpeechEngine`] implementation and
//! broadcasts [`NarrationEvent`]s for state changes and spoken words.
//!
//! ```no_run
//! use zen_speech::{Narrator, SpeechEngine, SpeechScript, VoiceSettings};
//!
//! fn read_aloud<E: SpeechEngine>(engine: E, html: &str) -> Result<(), zen_speech::SpeechError> {
//!     let narrator = Narrator::new(engine);
//!     narrator.speak(SpeechScript::from_html(html), &VoiceSettings::default())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod narrator;
pub mod script;

pub use engine::{BoundaryKind, EngineEvent, SpeechEngine, Utterance, Voice, VoiceSettings};
pub use error::SpeechError;
pub use narrator::{EventSink, NarrationEvent, Narrator, PlaybackState};
pub use script::{prepare_text, SpeechScript, WordSpan};
