// ABOUTME: Narrator state machine driving a SpeechEngine (Idle, Speaking, Paused, Stopped).
// ABOUTME: Filters events from cancelled or superseded utterances and broadcasts state changes and word boundaries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::engine::{BoundaryKind, EngineEvent, SpeechEngine, Utterance, VoiceSettings};
use crate::error::SpeechError;
use crate::script::SpeechScript;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
    Paused,
    Stopped,
}

/// What subscribers see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    StateChanged(PlaybackState),
    /// A word boundary, in char offsets of the script text.
    Word {
        char_index: usize,
        char_length: usize,
        word_index: Option<usize>,
    },
    Failed(String),
}

struct Current {
    id: u64,
    token: CancellationToken,
    script: SpeechScript,
}

#[derive(Default)]
struct Inner {
    state: PlaybackState,
    current: Option<Current>,
}

struct Shared {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
    events: broadcast::Sender<NarrationEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: NarrationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_state(&self, inner: &mut Inner, state: PlaybackState) {
        if inner.state != state {
            inner.state = state;
            self.publish(NarrationEvent::StateChanged(state));
        }
    }

    fn handle(&self, utterance_id: u64, event: EngineEvent) {
        let mut inner = self.lock();
        let word_index = match &inner.current {
            Some(current) if current.id == utterance_id => match &event {
                EngineEvent::Boundary { char_index, .. } => {
                    current.script.word_at(*char_index).map(|(idx, _)| idx)
                }
                _ => None,
            },
            _ => {
                tracing::trace!(utterance_id, ?event, "dropping stale engine event");
                return;
            }
        };

        match event {
            EngineEvent::Started => self.set_state(&mut inner, PlaybackState::Speaking),
            EngineEvent::Boundary {
                kind: BoundaryKind::Word,
                char_index,
                char_length,
            } => self.publish(NarrationEvent::Word {
                char_index,
                char_length,
                word_index,
            }),
            EngineEvent::Boundary { .. } => {}
            EngineEvent::Ended => {
                inner.current = None;
                self.set_state(&mut inner, PlaybackState::Idle);
            }
            EngineEvent::Error(message) => {
                tracing::warn!(utterance_id, error = %message, "speech engine error");
                inner.current = None;
                self.publish(NarrationEvent::Failed(message));
                self.set_state(&mut inner, PlaybackState::Idle);
            }
        }
    }
}

/// Handle an engine uses to report events for one utterance.
///
/// Events sent after the utterance was stopped or replaced are ignored.
#[derive(Clone)]
pub struct EventSink {
    utterance_id: u64,
    token: CancellationToken,
    shared: Weak<Shared>,
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("utterance_id", &self.utterance_id)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

impl EventSink {
    pub fn utterance_id(&self) -> u64 {
        self.utterance_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the utterance is stopped or superseded.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn emit(&self, event: EngineEvent) {
        if self.token.is_cancelled() {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.handle(self.utterance_id, event);
        }
    }
}

/// Reads a script aloud through a [`SpeechEngine`].
pub struct Narrator<E: SpeechEngine> {
    engine: E,
    shared: Arc<Shared>,
}

impl<E: SpeechEngine> Narrator<E> {
    pub fn new(engine: E) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                next_id: AtomicU64::new(1),
                events,
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.lock().state
    }

    /// True while an utterance is active, paused or not.
    pub fn is_speaking(&self) -> bool {
        matches!(self.state(), PlaybackState::Speaking | PlaybackState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state() == PlaybackState::Paused
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NarrationEvent> {
        self.shared.events.subscribe()
    }

    /// Stop whatever is playing and start reading `script`.
    ///
    /// An empty script only stops playback.
    pub fn speak(&self, script: SpeechScript, voice: &VoiceSettings) -> Result<(), SpeechError> {
        self.stop();
        if script.is_empty() {
            return Ok(());
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let selected = voice
            .voice_uri
            .as_deref()
            .and_then(|uri| self.engine.voices().into_iter().find(|v| v.uri == uri));

        let utterance = Utterance {
            id,
            text: script.text().to_string(),
            rate: voice.rate,
            pitch: voice.pitch,
            voice: selected,
        };
        let sink = EventSink {
            utterance_id: id,
            token: token.clone(),
            shared: Arc::downgrade(&self.shared),
        };

        self.shared.lock().current = Some(Current { id, token, script });

        tracing::debug!(utterance_id = id, chars = utterance.text.chars().count(), "starting narration");
        if let Err(err) = self.engine.speak(utterance, sink) {
            let mut inner = self.shared.lock();
            if inner.current.as_ref().is_some_and(|c| c.id == id) {
                if let Some(current) = inner.current.take() {
                    current.token.cancel();
                }
            }
            self.shared.publish(NarrationEvent::Failed(err.to_string()));
            self.shared.set_state(&mut inner, PlaybackState::Idle);
            return Err(err);
        }
        Ok(())
    }

    /// Pause. Only has an effect while speaking.
    pub fn pause(&self) {
        {
            let mut inner = self.shared.lock();
            if inner.state != PlaybackState::Speaking {
                return;
            }
            self.shared.set_state(&mut inner, PlaybackState::Paused);
        }
        self.engine.pause();
    }

    /// Resume. Only has an effect while paused.
    pub fn resume(&self) {
        {
            let mut inner = self.shared.lock();
            if inner.state != PlaybackState::Paused {
                return;
            }
            self.shared.set_state(&mut inner, PlaybackState::Speaking);
        }
        self.engine.resume();
    }

    /// Cancel the current utterance and move to `Stopped`.
    pub fn stop(&self) {
        {
            let mut inner = self.shared.lock();
            if let Some(current) = inner.current.take() {
                current.token.cancel();
            }
            self.shared.set_state(&mut inner, PlaybackState::Stopped);
        }
        self.engine.cancel();
    }

    /// Play/pause button: pause or resume an active utterance, otherwise speak `script`.
    pub fn toggle(&self, script: SpeechScript, voice: &VoiceSettings) -> Result<(), SpeechError> {
        match self.state() {
            PlaybackState::Speaking => {
                self.pause();
                Ok(())
            }
            PlaybackState::Paused => {
                self.resume();
                Ok(())
            }
            PlaybackState::Idle | PlaybackState::Stopped => self.speak(script, voice),
        }
    }
}

impl<E: SpeechEngine> Drop for Narrator<E> {
    fn drop(&mut self) {
        let active = self.shared.lock().current.take();
        if let Some(current) = active {
            current.token.cancel();
            self.engine.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Voice;
    use pretty_assertions::assert_eq;
    use tokio::sync::broadcast::error::TryRecvError;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Speak(Utterance),
        Pause,
        Resume,
        Cancel,
    }

    #[derive(Default)]
    struct FakeEngine {
        calls: Mutex<Vec<Call>>,
        sinks: Mutex<Vec<EventSink>>,
        start_immediately: bool,
        fail: bool,
    }

    impl FakeEngine {
        fn starting() -> Self {
            Self {
                start_immediately: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn sink(&self, n: usize) -> EventSink {
            self.sinks.lock().unwrap()[n].clone()
        }
    }

    impl SpeechEngine for FakeEngine {
        fn voices(&self) -> Vec<Voice> {
            vec![Voice {
                uri: "voice-a".to_string(),
                name: "Voice A".to_string(),
                lang: "en-US".to_string(),
            }]
        }

        fn speak(&self, utterance: Utterance, sink: EventSink) -> Result<(), SpeechError> {
            if self.fail {
                return Err(SpeechError::Engine("no audio device".to_string()));
            }
            self.calls.lock().unwrap().push(Call::Speak(utterance));
            if self.start_immediately {
                sink.emit(EngineEvent::Started);
            }
            self.sinks.lock().unwrap().push(sink);
            Ok(())
        }

        fn pause(&self) {
            self.calls.lock().unwrap().push(Call::Pause);
        }

        fn resume(&self) {
            self.calls.lock().unwrap().push(Call::Resume);
        }

        fn cancel(&self) {
            self.calls.lock().unwrap().push(Call::Cancel);
        }
    }

    fn drain(rx: &mut broadcast::Receiver<NarrationEvent>) -> Vec<NarrationEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return events,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    #[test]
    fn starts_idle() {
        let narrator = Narrator::new(FakeEngine::default());
        assert_eq!(narrator.state(), PlaybackState::Idle);
        assert!(!narrator.is_speaking());
        assert!(!narrator.is_paused());
    }

    #[test]
    fn speak_cancels_previous_then_speaks() {
        let narrator = Narrator::new(FakeEngine::starting());
        let voice = VoiceSettings {
            rate: 1.5,
            pitch: 0.8,
            voice_uri: Some("voice-a".to_string()),
        };

        narrator.speak(SpeechScript::new("Hello   world"), &voice).unwrap();

        let calls = narrator.engine().calls();
        assert_eq!(calls[0], Call::Cancel);
        match &calls[1] {
            Call::Speak(utterance) => {
                assert_eq!(utterance.text, "Hello world");
                assert_eq!(utterance.rate, 1.5);
                assert_eq!(utterance.pitch, 0.8);
                assert_eq!(utterance.voice.as_ref().map(|v| v.name.as_str()), Some("Voice A"));
            }
            other => panic!("expected speak, got {:?}", other),
        }
        assert_eq!(narrator.state(), PlaybackState::Speaking);
    }

    #[test]
    fn unknown_voice_uses_engine_default() {
        let narrator = Narrator::new(FakeEngine::starting());
        let voice = VoiceSettings {
            voice_uri: Some("missing".to_string()),
            ..Default::default()
        };
        narrator.speak(SpeechScript::new("Hi"), &voice).unwrap();

        match &narrator.engine().calls()[1] {
            Call::Speak(utterance) => assert_eq!(utterance.voice, None),
            other => panic!("expected speak, got {:?}", other),
        }
    }

    #[test]
    fn empty_script_does_not_reach_engine() {
        let narrator = Narrator::new(FakeEngine::starting());
        narrator
            .speak(SpeechScript::from_html("<p> </p>"), &VoiceSettings::default())
            .unwrap();

        assert_eq!(narrator.engine().calls(), vec![Call::Cancel]);
        assert_eq!(narrator.state(), PlaybackState::Stopped);
    }

    #[test]
    fn pause_only_while_speaking_and_resume_only_while_paused() {
        let narrator = Narrator::new(FakeEngine::starting());

        narrator.pause();
        narrator.resume();
        assert!(narrator.engine().calls().is_empty());

        narrator.speak(SpeechScript::new("Hello"), &VoiceSettings::default()).unwrap();
        narrator.resume();
        narrator.pause();
        narrator.pause();
        assert_eq!(narrator.state(), PlaybackState::Paused);
        assert!(narrator.is_speaking());

        narrator.resume();
        assert_eq!(narrator.state(), PlaybackState::Speaking);

        let calls = narrator.engine().calls();
        assert_eq!(&calls[2..], &[Call::Pause, Call::Resume]);
    }

    #[test]
    fn toggle_cycles_through_states() {
        let narrator = Narrator::new(FakeEngine::starting());
        let script = SpeechScript::new("Read me");
        let voice = VoiceSettings::default();

        narrator.toggle(script.clone(), &voice).unwrap();
        assert_eq!(narrator.state(), PlaybackState::Speaking);
        narrator.toggle(script.clone(), &voice).unwrap();
        assert_eq!(narrator.state(), PlaybackState::Paused);
        narrator.toggle(script.clone(), &voice).unwrap();
        assert_eq!(narrator.state(), PlaybackState::Speaking);

        narrator.stop();
        assert_eq!(narrator.state(), PlaybackState::Stopped);
        narrator.toggle(script, &voice).unwrap();
        assert_eq!(narrator.state(), PlaybackState::Speaking);
    }

    #[test]
    fn stop_cancels_and_ignores_late_events() {
        let narrator = Narrator::new(FakeEngine::starting());
        let mut rx = narrator.subscribe();

        narrator.speak(SpeechScript::new("one two"), &VoiceSettings::default()).unwrap();
        let sink = narrator.engine().sink(0);
        narrator.stop();

        assert!(sink.is_cancelled());
        sink.emit(EngineEvent::Ended);
        sink.emit(EngineEvent::Boundary {
            kind: BoundaryKind::Word,
            char_index: 4,
            char_length: 3,
        });

        assert_eq!(narrator.state(), PlaybackState::Stopped);
        assert_eq!(
            drain(&mut rx),
            vec![
                NarrationEvent::StateChanged(PlaybackState::Stopped),
                NarrationEvent::StateChanged(PlaybackState::Speaking),
                NarrationEvent::StateChanged(PlaybackState::Stopped),
            ]
        );
    }

    #[test]
    fn superseded_utterance_events_are_ignored() {
        let narrator = Narrator::new(FakeEngine::starting());
        let voice = VoiceSettings::default();

        narrator.speak(SpeechScript::new("first"), &voice).unwrap();
        narrator.speak(SpeechScript::new("second"), &voice).unwrap();
        let old = narrator.engine().sink(0);
        let new = narrator.engine().sink(1);
        assert_ne!(old.utterance_id(), new.utterance_id());

        old.emit(EngineEvent::Ended);
        assert_eq!(narrator.state(), PlaybackState::Speaking);

        new.emit(EngineEvent::Ended);
        assert_eq!(narrator.state(), PlaybackState::Idle);
    }

    #[test]
    fn word_boundaries_are_broadcast_with_word_index() {
        let narrator = Narrator::new(FakeEngine::starting());
        narrator
            .speak(SpeechScript::new("alpha beta gamma"), &VoiceSettings::default())
            .unwrap();
        let mut rx = narrator.subscribe();
        let sink = narrator.engine().sink(0);

        sink.emit(EngineEvent::Boundary {
            kind: BoundaryKind::Sentence,
            char_index: 0,
            char_length: 16,
        });
        sink.emit(EngineEvent::Boundary {
            kind: BoundaryKind::Word,
            char_index: 6,
            char_length: 4,
        });
        sink.emit(EngineEvent::Ended);

        assert_eq!(
            drain(&mut rx),
            vec![
                NarrationEvent::Word {
                    char_index: 6,
                    char_length: 4,
                    word_index: Some(1),
                },
                NarrationEvent::StateChanged(PlaybackState::Idle),
            ]
        );
    }

    #[test]
    fn engine_error_returns_to_idle() {
        let narrator = Narrator::new(FakeEngine::starting());
        let mut rx = narrator.subscribe();
        narrator.speak(SpeechScript::new("text"), &VoiceSettings::default()).unwrap();

        narrator
            .engine()
            .sink(0)
            .emit(EngineEvent::Error("synthesis-failed".to_string()));

        assert_eq!(narrator.state(), PlaybackState::Idle);
        let events = drain(&mut rx);
        assert!(events.contains(&NarrationEvent::Failed("synthesis-failed".to_string())));
    }

    #[test]
    fn rejected_speak_reports_error() {
        let engine = FakeEngine {
            fail: true,
            ..Default::default()
        };
        let narrator = Narrator::new(engine);

        let err = narrator
            .speak(SpeechScript::new("text"), &VoiceSettings::default())
            .unwrap_err();

        assert_eq!(err, SpeechError::Engine("no audio device".to_string()));
        assert_eq!(narrator.state(), PlaybackState::Idle);
    }

    #[test]
    fn drop_cancels_active_utterance() {
        let narrator = Narrator::new(FakeEngine::starting());
        narrator.speak(SpeechScript::new("bye"), &VoiceSettings::default()).unwrap();
        let sink = narrator.engine().sink(0);

        drop(narrator);
        assert!(sink.is_cancelled());
    }
}
