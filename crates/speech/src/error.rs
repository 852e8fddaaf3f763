// ABOUTME: Error type for narration failures.
// ABOUTME: Engine errors carry the platform message; they never come from the extraction pipeline.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    /// The engine refused or failed to start an utterance.
    #[error("speech engine error: {0}")]
    Engine(String),
}
