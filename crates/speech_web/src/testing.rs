//! A scriptable in-memory [`SpeechPlatform`] for tests.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use speech_core::{SpeechError, VoiceRecord};

use crate::{SpeechPlatform, Utterance, UtteranceCallback, UtteranceEvent, UtteranceId};

/// Records everything the controller asks of it, and only reports
/// lifecycle events when the test says so.
///
/// Cheap to clone; clones share state, so keep one clone in the test
/// and hand the other to the controller.
#[derive(Clone, Default)]
pub struct FakePlatform {
    inner: Rc<RefCell<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    voices: Vec<VoiceRecord>,
    voices_error: Option<SpeechError>,
    voice_queries: usize,
    voices_changed: Option<Box<dyn FnOnce()>>,

    queue: VecDeque<Utterance>,
    callbacks: HashMap<UtteranceId, UtteranceCallback>,
    spoken: Vec<Utterance>,
    speaking: bool,
    paused: bool,
    cancel_count: usize,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform whose voice list is populated from the start.
    pub fn with_voices(voices: Vec<VoiceRecord>) -> Self {
        let platform = Self::default();
        platform.inner.borrow_mut().voices = voices;
        platform
    }

    /// Replace the voice list without announcing it.
    pub fn set_voices(&self, voices: Vec<VoiceRecord>) {
        self.inner.borrow_mut().voices = voices;
    }

    /// Replace the voice list and fire the pending voices-changed callback, if any.
    pub fn populate_voices(&self, voices: Vec<VoiceRecord>) {
        let callback = {
            let mut state = self.inner.borrow_mut();
            state.voices = voices;
            state.voices_changed.take()
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Make every following voice query fail with `error`.
    pub fn fail_voices(&self, error: SpeechError) {
        self.inner.borrow_mut().voices_error = Some(error);
    }

    /// Is someone waiting for the voice list to change?
    pub fn has_voices_listener(&self) -> bool {
        self.inner.borrow().voices_changed.is_some()
    }

    /// How many times the voice list was read.
    pub fn voice_queries(&self) -> usize {
        self.inner.borrow().voice_queries
    }

    /// Utterances queued and not yet finished, oldest first.
    pub fn queued(&self) -> Vec<Utterance> {
        self.inner.borrow().queue.iter().cloned().collect()
    }

    /// Every utterance ever handed to the platform.
    pub fn spoken(&self) -> Vec<Utterance> {
        self.inner.borrow().spoken.clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.inner.borrow().cancel_count
    }

    /// Start saying the oldest queued utterance.
    pub fn start(&self) {
        let id = {
            let mut state = self.inner.borrow_mut();
            state.speaking = true;
            state.queue.front().map(|utterance| utterance.id)
        };
        if let Some(id) = id {
            self.emit(id, UtteranceEvent::Start);
        }
    }

    /// Finish the oldest queued utterance.
    pub fn finish(&self) {
        self.finish_with(UtteranceEvent::End);
    }

    /// Fail the oldest queued utterance with the given error code.
    pub fn fail(&self, code: &str) {
        self.finish_with(UtteranceEvent::Error(code.to_owned()));
    }

    fn finish_with(&self, event: UtteranceEvent) {
        let id = {
            let mut state = self.inner.borrow_mut();
            let id = state.queue.pop_front().map(|utterance| utterance.id);
            state.speaking = false;
            id
        };
        if let Some(id) = id {
            self.emit(id, event);
        }
    }

    /// Report `event` for any utterance ever spoken, cancelled ones included.
    pub fn emit(&self, id: UtteranceId, event: UtteranceEvent) {
        let callback = self.inner.borrow().callbacks.get(&id).cloned();
        if let Some(callback) = callback {
            callback(id, event);
        }
    }
}

impl SpeechPlatform for FakePlatform {
    fn speak(&self, utterance: &Utterance, on_event: UtteranceCallback) -> speech_core::Result<()> {
        let mut state = self.inner.borrow_mut();
        state.callbacks.insert(utterance.id, on_event);
        state.queue.push_back(utterance.clone());
        state.spoken.push(utterance.clone());
        Ok(())
    }

    fn cancel(&self) {
        let mut state = self.inner.borrow_mut();
        state.queue.clear();
        state.speaking = false;
        state.paused = false;
        state.cancel_count += 1;
    }

    fn pause(&self) {
        self.inner.borrow_mut().paused = true;
    }

    fn resume(&self) {
        self.inner.borrow_mut().paused = false;
    }

    fn is_speaking(&self) -> bool {
        self.inner.borrow().speaking
    }

    fn is_paused(&self) -> bool {
        self.inner.borrow().paused
    }

    fn is_pending(&self) -> bool {
        let state = self.inner.borrow();
        let in_progress = usize::from(state.speaking);
        state.queue.len() > in_progress
    }

    fn voices(&self) -> speech_core::Result<Vec<VoiceRecord>> {
        let mut state = self.inner.borrow_mut();
        state.voice_queries += 1;
        match &state.voices_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.voices.clone()),
        }
    }

    fn on_voices_changed(&self, callback: Box<dyn FnOnce()>) -> speech_core::Result<()> {
        self.inner.borrow_mut().voices_changed = Some(callback);
        Ok(())
    }

    fn clear_voices_changed(&self) {
        let callback = self.inner.borrow_mut().voices_changed.take();
        drop(callback);
    }
}
