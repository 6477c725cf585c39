use std::rc::Rc;

use speech_core::{VoiceDescriptor, VoiceRecord};

/// Identifies one utterance handed to a [`SpeechPlatform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub(crate) u64);

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "utterance#{}", self.0)
    }
}

/// A fully resolved utterance, ready for the platform.
///
/// The text is already sanitized and the numbers already clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,

    pub text: String,

    /// `None` means the platform default voice.
    pub voice: Option<VoiceDescriptor>,

    pub lang: Option<String>,

    pub rate: f32,

    pub pitch: f32,

    pub volume: f32,
}

/// Lifecycle events the platform reports for an utterance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UtteranceEvent {
    Start,
    Pause,
    Resume,
    End,

    /// Synthesis failed or was interrupted. Carries the platform error code.
    Error(String),
}

impl UtteranceEvent {
    /// After `End` or `Error` the platform will not report anything more for the utterance.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error(_))
    }
}

/// Called by the platform for every lifecycle event of an utterance.
pub type UtteranceCallback = Rc<dyn Fn(UtteranceId, UtteranceEvent)>;

/// The platform speech-synthesis API, as seen by [`crate::SpeechController`].
///
/// On the web this is `window.speechSynthesis`, see `WebSpeechPlatform`.
pub trait SpeechPlatform: 'static {
    /// Queue an utterance. Lifecycle events are reported through `on_event`.
    fn speak(&self, utterance: &Utterance, on_event: UtteranceCallback) -> speech_core::Result<()>;

    /// Drop everything queued, including what is being said right now.
    fn cancel(&self);

    fn pause(&self);

    fn resume(&self);

    fn is_speaking(&self) -> bool;

    fn is_paused(&self) -> bool;

    /// Are there utterances queued that have not started yet?
    fn is_pending(&self) -> bool;

    /// The voices currently known to the platform.
    ///
    /// The list may be empty until the platform has finished populating it,
    /// see [`Self::on_voices_changed`].
    fn voices(&self) -> speech_core::Result<Vec<VoiceRecord>>;

    /// Call `callback` once, the next time the voice list changes.
    ///
    /// Replaces any callback registered earlier.
    fn on_voices_changed(&self, callback: Box<dyn FnOnce()>) -> speech_core::Result<()>;

    /// Drop a callback registered with [`Self::on_voices_changed`] without calling it.
    fn clear_voices_changed(&self);
}
