use std::{cell::RefCell, rc::Rc};

use speech_core::{
    SpeechError, SpeechRequest, StateCallback, StateHandlers, SubscriptionId, VoiceDescriptor,
    find_voice, notify_all, sanitize_text, sort_voices,
};

use crate::{SpeechPlatform, Utterance, UtteranceCallback, UtteranceEvent, UtteranceId};

/// The one authoritative wrapper around the platform speech API.
///
/// Create one per page, with [`Self::new`], and hand clones of it to whoever needs it.
/// When you are done, call [`Self::dispose`]; after that every call fails with
/// [`SpeechError::Disposed`].
///
/// This is cheap to clone (ref-counted). It is not `Send`: like the browser API it wraps,
/// it lives on the single-threaded event loop.
pub struct SpeechController<P: SpeechPlatform> {
    inner: Rc<Inner<P>>,
}

impl<P: SpeechPlatform> Clone for SpeechController<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct Inner<P> {
    platform: P,

    state: RefCell<ControllerState>,

    /// Resolved once the platform has populated its voice list. Never re-armed.
    voices_ready: tokio::sync::OnceCell<()>,
}

#[derive(Default)]
struct ControllerState {
    disposed: bool,

    next_utterance: u64,

    /// Bumped by every `cancel` and every non-queued `speak`.
    /// A `speak` that waited for the voice list only goes ahead if this has not moved.
    generation: u64,

    /// Utterances handed to the platform that have not ended yet.
    /// More than one only when queuing was requested.
    live: Vec<UtteranceId>,

    /// What we last reported to subscribers.
    speaking: bool,

    /// `pause` lowered the reported flag while speaking, so `resume` may raise it again.
    paused_while_speaking: bool,

    /// Once non-empty, never invalidated (until disposed).
    voices: Option<Rc<[VoiceDescriptor]>>,

    subscribers: StateHandlers,
}

impl ControllerState {
    /// Returns the new value if it changed.
    fn set_speaking(&mut self, speaking: bool) -> Option<bool> {
        (self.speaking != speaking).then(|| {
            self.speaking = speaking;
            speaking
        })
    }
}

impl<P: SpeechPlatform> SpeechController<P> {
    pub fn new(platform: P) -> Self {
        Self {
            inner: Rc::new(Inner {
                platform,
                state: Default::default(),
                voices_ready: tokio::sync::OnceCell::new(),
            }),
        }
    }

    /// The platform we are wrapping.
    pub fn platform(&self) -> &P {
        &self.inner.platform
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().disposed
    }

    fn ensure_alive(&self) -> speech_core::Result<()> {
        if self.is_disposed() {
            Err(SpeechError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Say something.
    ///
    /// Blank text (after sanitization) is ignored.
    /// Unless [`SpeechRequest::queue`] is set, whatever is being said right now is cancelled.
    ///
    /// The voice is picked by exact name, then by language tag, else the platform default.
    /// The voice list is only loaded when the request asks for a voice or a language.
    ///
    /// # Errors
    /// [`SpeechError::Disposed`] once disposed, or whatever the platform reports.
    pub async fn speak(&self, request: SpeechRequest) -> speech_core::Result<()> {
        self.ensure_alive()?;

        let request = request.clamped();
        let text = sanitize_text(&request.text);
        if text.is_empty() {
            log::debug!("Ignoring blank speech request");
            return Ok(());
        }

        let generation = {
            let mut state = self.inner.state.borrow_mut();
            if !request.queue {
                state.generation += 1;
            }
            state.generation
        };

        let voice = if request.voice_name().is_some() || request.lang_tag().is_some() {
            let voices = self.get_voices().await?;
            find_voice(&voices, request.voice_name(), request.lang_tag()).cloned()
        } else {
            None
        };

        // We may have been disposed while waiting for the voice list.
        self.ensure_alive()?;

        if self.inner.state.borrow().generation != generation {
            log::debug!("Dropping speech request superseded while loading voices");
            return Ok(());
        }

        if let Some(name) = request.voice_name()
            && voice.as_ref().is_none_or(|voice| voice.name != name)
        {
            log::debug!("No voice named {name:?}, using {voice:?} instead");
        }

        let lang = request
            .lang_tag()
            .map(str::to_owned)
            .or_else(|| voice.as_ref().map(|voice| voice.lang.clone()));

        if !request.queue {
            self.inner.platform.cancel();
            self.inner.state.borrow_mut().live.clear();
        }

        let id = {
            let mut state = self.inner.state.borrow_mut();
            let id = UtteranceId(state.next_utterance);
            state.next_utterance += 1;
            state.live.push(id);
            id
        };

        let utterance = Utterance {
            id,
            text,
            voice,
            lang,
            rate: request.rate,
            pitch: request.pitch,
            volume: request.volume,
        };

        log::debug!(
            "Speaking {id}: {} chars, voice {:?}",
            utterance.text.len(),
            utterance.voice.as_ref().map(|voice| voice.name.as_str())
        );

        if let Err(err) = self
            .inner
            .platform
            .speak(&utterance, self.utterance_callback())
        {
            log::warn!("Failed to speak {id}: {err}");
            self.end_utterance(id);
            return Err(err);
        }

        Ok(())
    }

    /// Stop speaking and drop everything queued.
    ///
    /// # Errors
    /// [`SpeechError::Disposed`] once disposed.
    pub fn cancel(&self) -> speech_core::Result<()> {
        self.ensure_alive()?;
        self.inner.platform.cancel();

        let change = {
            let mut state = self.inner.state.borrow_mut();
            state.generation += 1;
            state.live.clear();
            state.paused_while_speaking = false;
            state.set_speaking(false)
        };
        self.notify(change);
        Ok(())
    }

    /// # Errors
    /// [`SpeechError::Disposed`] once disposed.
    pub fn pause(&self) -> speech_core::Result<()> {
        self.ensure_alive()?;
        self.inner.platform.pause();

        let change = {
            let mut state = self.inner.state.borrow_mut();
            if state.speaking {
                state.paused_while_speaking = true;
            }
            state.set_speaking(false)
        };
        self.notify(change);
        Ok(())
    }

    /// # Errors
    /// [`SpeechError::Disposed`] once disposed.
    pub fn resume(&self) -> speech_core::Result<()> {
        self.ensure_alive()?;
        self.inner.platform.resume();

        let change = {
            let mut state = self.inner.state.borrow_mut();
            let was_speaking = std::mem::take(&mut state.paused_while_speaking);
            if was_speaking && !state.live.is_empty() {
                state.set_speaking(true)
            } else {
                None
            }
        };
        self.notify(change);
        Ok(())
    }

    /// Is the platform paused? `false` once disposed.
    pub fn is_paused(&self) -> bool {
        !self.is_disposed() && self.inner.platform.is_paused()
    }

    /// Are there utterances waiting to be spoken? `false` once disposed.
    pub fn is_pending(&self) -> bool {
        !self.is_disposed() && self.inner.platform.is_pending()
    }

    /// Is the platform speaking? `false` once disposed.
    pub fn is_speaking(&self) -> bool {
        !self.is_disposed() && self.inner.platform.is_speaking()
    }

    pub fn is_speaking_or_pending(&self) -> bool {
        self.is_speaking() || self.is_pending()
    }

    /// The available voices, most useful first.
    ///
    /// The first call waits until the platform has populated its voice list.
    /// After that the same list is returned every time.
    ///
    /// If the platform fails to list its voices, the failure is logged and an empty
    /// list is returned (and the next call tries again).
    ///
    /// # Errors
    /// Only [`SpeechError::Disposed`].
    pub async fn get_voices(&self) -> speech_core::Result<Rc<[VoiceDescriptor]>> {
        self.ensure_alive()?;
        if let Some(voices) = self.cached_voices() {
            return Ok(voices);
        }

        let loaded = self
            .inner
            .voices_ready
            .get_or_try_init(|| self.wait_for_voices())
            .await
            .and_then(|()| self.inner.platform.voices());

        self.ensure_alive()?;

        // Someone else may have filled the cache while we were waiting.
        if let Some(voices) = self.cached_voices() {
            return Ok(voices);
        }

        let voices: Rc<[VoiceDescriptor]> = match loaded {
            Ok(records) => {
                let mut voices: Vec<VoiceDescriptor> =
                    records.into_iter().map(VoiceDescriptor::from).collect();
                sort_voices(&mut voices);
                log::debug!("Loaded {} speech voices", voices.len());
                voices.into()
            }
            Err(err) => {
                log::warn!("Failed to load speech voices: {err}");
                Vec::new().into()
            }
        };

        self.inner.state.borrow_mut().voices = Some(Rc::clone(&voices));
        Ok(voices)
    }

    fn cached_voices(&self) -> Option<Rc<[VoiceDescriptor]>> {
        self.inner
            .state
            .borrow()
            .voices
            .as_ref()
            .filter(|voices| !voices.is_empty())
            .map(Rc::clone)
    }

    /// Browsers populate the voice list lazily, and announce it with `voiceschanged`.
    async fn wait_for_voices(&self) -> speech_core::Result<()> {
        if !self.inner.platform.voices()?.is_empty() {
            return Ok(());
        }

        log::debug!("Waiting for the platform to populate its voice list…");
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner.platform.on_voices_changed(Box::new(move || {
            tx.send(()).ok();
        }))?;

        rx.await.map_err(|err| {
            log::debug!("Voice list listener detached: {err}");
            SpeechError::Disposed
        })
    }

    /// Call `callback` with `true` when speech starts and `false` when it stops.
    ///
    /// # Errors
    /// [`SpeechError::Disposed`] once disposed.
    pub fn subscribe(
        &self,
        callback: impl Fn(bool) + 'static,
    ) -> speech_core::Result<SubscriptionId> {
        self.ensure_alive()?;
        let callback: StateCallback = Rc::new(callback);
        Ok(self.inner.state.borrow_mut().subscribers.insert(callback))
    }

    /// Returns `false` if there was no such subscription.
    ///
    /// # Errors
    /// [`SpeechError::Disposed`] once disposed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> speech_core::Result<bool> {
        self.ensure_alive()?;
        Ok(self.inner.state.borrow_mut().subscribers.remove(id))
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.borrow().subscribers.len()
    }

    /// Stop speaking, detach from the platform, and forget everything.
    ///
    /// Calling this more than once does nothing.
    pub fn dispose(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.live.clear();
            state.speaking = false;
            state.voices = None;
            state.subscribers.clear();
        }

        self.inner.platform.cancel();

        // Wakes up anyone still waiting for the voice list.
        self.inner.platform.clear_voices_changed();

        log::debug!("Speech controller disposed");
    }

    fn utterance_callback(&self) -> UtteranceCallback {
        let inner = Rc::downgrade(&self.inner);
        Rc::new(move |id, event| {
            if let Some(inner) = inner.upgrade() {
                Self { inner }.on_utterance_event(id, event);
            }
        })
    }

    fn on_utterance_event(&self, id: UtteranceId, event: UtteranceEvent) {
        let is_live = {
            let state = self.inner.state.borrow();
            !state.disposed && state.live.contains(&id)
        };

        if !is_live {
            // Superseded or cancelled: the platform reports these as errors too.
            log::trace!("Ignoring {event:?} for stale {id}");
            return;
        }

        if let UtteranceEvent::Error(code) = &event {
            log::warn!("Speech synthesis failed for {id}: {code}");
        }

        match event {
            UtteranceEvent::Start | UtteranceEvent::Resume => {
                let change = self.inner.state.borrow_mut().set_speaking(true);
                self.notify(change);
            }
            UtteranceEvent::Pause => {
                let change = self.inner.state.borrow_mut().set_speaking(false);
                self.notify(change);
            }
            UtteranceEvent::End | UtteranceEvent::Error(_) => self.end_utterance(id),
        }
    }

    fn end_utterance(&self, id: UtteranceId) {
        let change = {
            let mut state = self.inner.state.borrow_mut();
            state.live.retain(|live| *live != id);
            if state.live.is_empty() {
                state.paused_while_speaking = false;
                state.set_speaking(false)
            } else {
                None
            }
        };
        self.notify(change);
    }

    fn notify(&self, change: Option<bool>) {
        let Some(speaking) = change else {
            return;
        };
        let callbacks = self.inner.state.borrow().subscribers.snapshot();
        notify_all(&callbacks, speaking);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use speech_core::VoiceRecord;

    use super::*;
    use crate::testing::FakePlatform;

    fn record(name: &str, lang: &str, default: bool, local_service: bool) -> VoiceRecord {
        VoiceRecord {
            name: name.to_owned(),
            lang: lang.to_owned(),
            voice_uri: format!("urn:voice:{name}"),
            default,
            local_service,
        }
    }

    fn voices() -> Vec<VoiceRecord> {
        vec![
            record("Amélie", "fr-CA", false, true),
            record("Daniel", "en-GB", true, false),
            record("Samantha", "en-US", false, false),
            record("Alex", "en-US", false, false),
        ]
    }

    fn controller(platform: &FakePlatform) -> SpeechController<FakePlatform> {
        SpeechController::new(platform.clone())
    }

    fn record_states(controller: &SpeechController<FakePlatform>) -> Rc<RefCell<Vec<bool>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        controller
            .subscribe(move |speaking| sink.borrow_mut().push(speaking))
            .expect("controller is alive");
        seen
    }

    fn speak(controller: &SpeechController<FakePlatform>, request: SpeechRequest) {
        pollster::block_on(controller.speak(request)).expect("speak should succeed");
    }

    #[test]
    fn speak_sanitizes_and_clamps() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        speak(
            &controller,
            SpeechRequest::new("  <b>bold</b> move ")
                .rate(42.0)
                .volume(-3.0),
        );

        let queued = platform.queued();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].text, "&lt;b&gt;bold&lt;/b&gt; move");
        assert_eq!(queued[0].rate, 10.0);
        assert_eq!(queued[0].volume, 0.0);
        assert_eq!(queued[0].voice, None);
        assert_eq!(platform.voice_queries(), 0, "no voice requested, no voice lookup");
    }

    #[test]
    fn blank_text_is_a_no_op() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        speak(&controller, SpeechRequest::new("   \n"));

        assert!(platform.spoken().is_empty());
        assert_eq!(platform.cancel_count(), 0);
    }

    #[test]
    fn second_speak_supersedes_the_first() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        speak(&controller, SpeechRequest::new("first"));
        speak(&controller, SpeechRequest::new("second"));

        let queued = platform.queued();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].text, "second");
    }

    /// Park `speak` on the voice list, which the platform has not populated yet.
    fn speak_waiting_for_voices(
        controller: &SpeechController<FakePlatform>,
        request: SpeechRequest,
    ) -> std::pin::Pin<Box<impl Future<Output = speech_core::Result<()>>>> {
        let controller = controller.clone();
        let mut future = Box::pin(async move { controller.speak(request).await });
        let waker = std::task::Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        assert!(future.as_mut().poll(&mut cx).is_pending());
        future
    }

    #[test]
    fn later_speak_wins_over_one_waiting_for_voices() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        let first =
            speak_waiting_for_voices(&controller, SpeechRequest::new("first").lang("en-US"));
        speak(&controller, SpeechRequest::new("second"));

        platform.populate_voices(voices());
        pollster::block_on(first).expect("a superseded request is not an error");

        let texts: Vec<String> = platform.queued().into_iter().map(|u| u.text).collect();
        assert_eq!(texts, ["second"]);
    }

    #[test]
    fn cancel_drops_a_speak_waiting_for_voices() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        let seen = record_states(&controller);

        let waiting =
            speak_waiting_for_voices(&controller, SpeechRequest::new("hello").lang("en-US"));
        controller.cancel().expect("alive");

        platform.populate_voices(voices());
        pollster::block_on(waiting).expect("a cancelled request is not an error");

        assert!(platform.spoken().is_empty());
        assert!(!controller.is_speaking_or_pending());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn queued_requests_do_not_cancel() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        speak(&controller, SpeechRequest::new("first"));
        speak(&controller, SpeechRequest::new("second").queue(true));

        let texts: Vec<String> = platform.queued().into_iter().map(|u| u.text).collect();
        assert_eq!(texts, ["first", "second"]);
        assert!(controller.is_pending());
    }

    #[test]
    fn speak_cancel_cycle_notifies_once_each_way() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        let seen = record_states(&controller);

        speak(&controller, SpeechRequest::new("hello"));
        platform.start();
        controller.cancel().expect("alive");

        // The platform reports the cancelled utterance as interrupted:
        let id = platform.spoken()[0].id;
        platform.emit(id, UtteranceEvent::Error("interrupted".to_owned()));

        assert_eq!(*seen.borrow(), [true, false]);
    }

    #[test]
    fn utterance_end_reports_idle() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        let seen = record_states(&controller);

        speak(&controller, SpeechRequest::new("one"));
        speak(&controller, SpeechRequest::new("two").queue(true));
        platform.start();
        platform.finish();
        assert_eq!(*seen.borrow(), [true], "still one utterance to go");

        platform.start();
        platform.fail("synthesis-failed");
        assert_eq!(*seen.borrow(), [true, false]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let id = controller
            .subscribe({
                let seen = Rc::clone(&seen);
                move |speaking| seen.borrow_mut().push(speaking)
            })
            .expect("alive");

        speak(&controller, SpeechRequest::new("hello"));
        platform.start();
        assert!(controller.unsubscribe(id).expect("alive"));
        controller.cancel().expect("alive");

        assert_eq!(*seen.borrow(), [true]);
        assert_eq!(controller.subscriber_count(), 0);
        assert!(!controller.unsubscribe(id).expect("alive"));
    }

    #[test]
    fn panicking_subscriber_does_not_break_others() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        controller
            .subscribe(|_| panic!("subscriber bug"))
            .expect("alive");
        let seen = record_states(&controller);

        speak(&controller, SpeechRequest::new("hello"));
        platform.start();

        assert_eq!(*seen.borrow(), [true]);
    }

    #[test]
    fn pause_and_resume_flip_the_reported_state() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        let seen = record_states(&controller);

        speak(&controller, SpeechRequest::new("hello"));
        platform.start();
        controller.pause().expect("alive");
        assert!(controller.is_paused());
        controller.resume().expect("alive");
        assert!(!controller.is_paused());

        assert_eq!(*seen.borrow(), [true, false, true]);
    }

    #[test]
    fn resume_before_start_stays_idle() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        let seen = record_states(&controller);

        speak(&controller, SpeechRequest::new("hello"));
        controller.pause().expect("alive");
        controller.resume().expect("alive");
        assert!(seen.borrow().is_empty(), "nothing was spoken yet");

        platform.start();
        assert_eq!(*seen.borrow(), [true]);
    }

    #[test]
    fn resume_after_cancel_stays_idle() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        let seen = record_states(&controller);

        speak(&controller, SpeechRequest::new("hello"));
        platform.start();
        controller.pause().expect("alive");
        controller.cancel().expect("alive");
        speak(&controller, SpeechRequest::new("again"));
        controller.resume().expect("alive");

        assert_eq!(*seen.borrow(), [true, false]);
    }

    #[test]
    fn voices_are_sorted_and_cached() {
        let platform = FakePlatform::with_voices(voices());
        let controller = controller(&platform);

        let first = pollster::block_on(controller.get_voices()).expect("alive");
        let second = pollster::block_on(controller.get_voices()).expect("alive");

        assert!(Rc::ptr_eq(&first, &second), "second call must hit the cache");
        let names: Vec<&str> = first.iter().map(|v| v.name.as_str()).collect();
        similar_asserts::assert_eq!(names, ["Daniel", "Amélie", "Samantha", "Alex"]);

        let queries = platform.voice_queries();
        pollster::block_on(controller.get_voices()).expect("alive");
        assert_eq!(platform.voice_queries(), queries, "no re-fetch");
    }

    #[test]
    fn voices_wait_for_the_platform_to_populate() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        let waiting = controller.clone();
        let mut future = Box::pin(waiting.get_voices());

        // Drive the future until it is parked on the readiness signal.
        let waker = std::task::Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        assert!(future.as_mut().poll(&mut cx).is_pending());
        assert!(platform.has_voices_listener());

        platform.populate_voices(voices());

        let loaded = pollster::block_on(future).expect("alive");
        assert_eq!(loaded.len(), 4);
        assert!(!platform.has_voices_listener(), "the listener is one-shot");
    }

    #[test]
    fn concurrent_voice_requests_share_one_wait() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        let (a, b) = (controller.clone(), controller.clone());
        let mut first = Box::pin(a.get_voices());
        let mut second = Box::pin(b.get_voices());

        let waker = std::task::Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        assert!(first.as_mut().poll(&mut cx).is_pending());
        assert!(second.as_mut().poll(&mut cx).is_pending());
        assert!(platform.has_voices_listener());

        platform.populate_voices(voices());

        let first = pollster::block_on(first).expect("alive");
        let second = pollster::block_on(second).expect("alive");
        assert_eq!(first.len(), 4);
        assert!(Rc::ptr_eq(&first, &second), "both callers get the same list");
    }

    #[test]
    fn voice_failure_degrades_to_empty_list() {
        let platform = FakePlatform::new();
        platform.fail_voices(SpeechError::Platform("boom".to_owned()));
        let controller = controller(&platform);

        let voices = pollster::block_on(controller.get_voices()).expect("not an error");
        assert!(voices.is_empty());
    }

    #[test]
    fn unknown_voice_falls_back_to_language() {
        let platform = FakePlatform::with_voices(voices());
        let controller = controller(&platform);

        speak(
            &controller,
            SpeechRequest::new("hi").voice("Unknown Voice").lang("en-US"),
        );
        let utterance = &platform.queued()[0];
        assert_eq!(
            utterance.voice.as_ref().map(|v| v.name.as_str()),
            Some("Samantha")
        );
        assert_eq!(utterance.lang.as_deref(), Some("en-US"));

        speak(
            &controller,
            SpeechRequest::new("salut").voice("Unknown Voice").lang("fr-FR"),
        );
        let utterance = &platform.queued()[0];
        assert_eq!(utterance.voice, None, "platform default");
        assert_eq!(utterance.lang.as_deref(), Some("fr-FR"));
    }

    #[test]
    fn exact_voice_name_sets_language() {
        let platform = FakePlatform::with_voices(voices());
        let controller = controller(&platform);

        speak(&controller, SpeechRequest::new("hi").voice("Amélie"));
        let utterance = &platform.queued()[0];
        assert_eq!(utterance.lang.as_deref(), Some("fr-CA"));
    }

    #[test]
    fn dispose_fails_fast_and_is_idempotent() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);
        record_states(&controller);

        controller.dispose();
        controller.dispose();

        assert_eq!(
            pollster::block_on(controller.speak(SpeechRequest::new("hi"))),
            Err(SpeechError::Disposed)
        );
        assert_eq!(controller.cancel(), Err(SpeechError::Disposed));
        assert_eq!(
            pollster::block_on(controller.get_voices()).map(|v| v.len()),
            Err(SpeechError::Disposed)
        );
        assert_eq!(controller.subscribe(|_| {}), Err(SpeechError::Disposed));
        assert!(!controller.is_speaking());
        assert!(!controller.is_speaking_or_pending());
        assert_eq!(controller.subscriber_count(), 0);
        assert_eq!(platform.cancel_count(), 1, "second dispose is a no-op");
    }

    #[test]
    fn queries_report_idle_after_dispose() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        speak(&controller, SpeechRequest::new("one"));
        speak(&controller, SpeechRequest::new("two").queue(true));
        controller.pause().expect("alive");
        assert!(controller.is_paused());
        assert!(controller.is_pending());

        controller.dispose();

        // Even if the platform keeps going behind our back:
        for utterance in platform.spoken() {
            SpeechPlatform::speak(&platform, &utterance, Rc::new(|_, _| {})).expect("fake");
        }
        SpeechPlatform::pause(&platform);
        platform.start();
        assert!(SpeechPlatform::is_paused(&platform));
        assert!(SpeechPlatform::is_pending(&platform));

        assert!(!controller.is_paused());
        assert!(!controller.is_pending());
        assert!(!controller.is_speaking());
        assert!(!controller.is_speaking_or_pending());
    }

    #[test]
    fn dispose_releases_voice_waiters() {
        let platform = FakePlatform::new();
        let controller = controller(&platform);

        let waiting = controller.clone();
        let mut future = Box::pin(waiting.get_voices());
        let waker = std::task::Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        assert!(future.as_mut().poll(&mut cx).is_pending());

        controller.dispose();
        assert!(!platform.has_voices_listener());
        assert_eq!(
            pollster::block_on(future).map(|v| v.len()),
            Err(SpeechError::Disposed)
        );
    }
}
