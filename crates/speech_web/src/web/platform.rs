use std::{cell::RefCell, collections::HashMap, rc::Rc};

use speech_core::{SpeechError, VoiceDescriptor, VoiceRecord};
use wasm_bindgen::prelude::*;
use web_sys::{SpeechSynthesisUtterance, SpeechSynthesisVoice};

use super::{platform_error, string_from_js_value};
use crate::{SpeechPlatform, Utterance, UtteranceCallback, UtteranceEvent, UtteranceId};

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// [`SpeechPlatform`] backed by the browser's `window.speechSynthesis`.
pub struct WebSpeechPlatform {
    synthesis: web_sys::SpeechSynthesis,

    /// Keeps the JS callbacks of each utterance alive until it has ended.
    utterances: Rc<RefCell<HashMap<UtteranceId, UtteranceHandlers>>>,

    voices_changed: RefCell<Option<EventClosure>>,
}

struct UtteranceHandlers {
    _utterance: SpeechSynthesisUtterance,
    _closures: Vec<EventClosure>,
}

impl WebSpeechPlatform {
    /// Grab `window.speechSynthesis`.
    ///
    /// # Errors
    /// [`SpeechError::Unsupported`] if there is no window, or it has no speech synthesis.
    pub fn new() -> Result<Self, SpeechError> {
        let window = web_sys::window().ok_or(SpeechError::Unsupported)?;
        let synthesis = window.speech_synthesis().map_err(|err| {
            log::warn!(
                "window.speechSynthesis is not available: {}",
                string_from_js_value(&err)
            );
            SpeechError::Unsupported
        })?;

        Ok(Self {
            synthesis,
            utterances: Default::default(),
            voices_changed: Default::default(),
        })
    }

    fn platform_voices(&self) -> Vec<SpeechSynthesisVoice> {
        self.synthesis
            .get_voices()
            .iter()
            .filter_map(|voice| voice.dyn_into::<SpeechSynthesisVoice>().ok())
            .collect()
    }

    /// Voices are matched by URI first, since names are not guaranteed to be unique.
    fn find_platform_voice(&self, voice: &VoiceDescriptor) -> Option<SpeechSynthesisVoice> {
        let voices = self.platform_voices();
        voices
            .iter()
            .find(|candidate| candidate.voice_uri() == voice.voice_uri)
            .or_else(|| voices.iter().find(|candidate| candidate.name() == voice.name))
            .cloned()
    }
}

impl SpeechPlatform for WebSpeechPlatform {
    fn speak(&self, utterance: &Utterance, on_event: UtteranceCallback) -> speech_core::Result<()> {
        let id = utterance.id;
        let web_utterance =
            SpeechSynthesisUtterance::new_with_text(&utterance.text).map_err(|err| platform_error(&err))?;

        web_utterance.set_rate(utterance.rate);
        web_utterance.set_pitch(utterance.pitch);
        web_utterance.set_volume(utterance.volume);
        if let Some(lang) = &utterance.lang {
            web_utterance.set_lang(lang);
        }
        if let Some(voice) = &utterance.voice {
            match self.find_platform_voice(voice) {
                Some(platform_voice) => web_utterance.set_voice(Some(&platform_voice)),
                None => log::debug!("Voice {:?} is gone, using the default", voice.name),
            }
        }

        type SetHandler = fn(&SpeechSynthesisUtterance, Option<&js_sys::Function>);
        type ToEvent = fn(&web_sys::Event) -> UtteranceEvent;
        let handlers: [(SetHandler, ToEvent); 5] = [
            (SpeechSynthesisUtterance::set_onstart, |_| UtteranceEvent::Start),
            (SpeechSynthesisUtterance::set_onpause, |_| UtteranceEvent::Pause),
            (SpeechSynthesisUtterance::set_onresume, |_| UtteranceEvent::Resume),
            (SpeechSynthesisUtterance::set_onend, |_| UtteranceEvent::End),
            (SpeechSynthesisUtterance::set_onerror, error_event),
        ];

        let mut closures = Vec::with_capacity(handlers.len());
        for (set_handler, to_event) in handlers {
            let on_event = Rc::clone(&on_event);
            let utterances = Rc::clone(&self.utterances);
            let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
                let event = to_event(&event);
                if event.is_terminal() {
                    release_later(&utterances, id);
                }
                on_event(id, event);
            }) as Box<dyn FnMut(web_sys::Event)>);

            set_handler(&web_utterance, Some(closure.as_ref().unchecked_ref()));
            closures.push(closure);
        }

        self.utterances.borrow_mut().insert(
            id,
            UtteranceHandlers {
                _utterance: web_utterance.clone(),
                _closures: closures,
            },
        );

        self.synthesis.speak(&web_utterance);
        Ok(())
    }

    fn cancel(&self) {
        // The browser reports every dropped utterance with an `error` event,
        // which releases its handlers.
        self.synthesis.cancel();
    }

    fn pause(&self) {
        self.synthesis.pause();
    }

    fn resume(&self) {
        self.synthesis.resume();
    }

    fn is_speaking(&self) -> bool {
        self.synthesis.speaking()
    }

    fn is_paused(&self) -> bool {
        self.synthesis.paused()
    }

    fn is_pending(&self) -> bool {
        self.synthesis.pending()
    }

    fn voices(&self) -> speech_core::Result<Vec<VoiceRecord>> {
        Ok(self
            .platform_voices()
            .into_iter()
            .map(|voice| VoiceRecord {
                name: voice.name(),
                lang: voice.lang(),
                voice_uri: voice.voice_uri(),
                default: voice.default(),
                local_service: voice.local_service(),
            })
            .collect())
    }

    fn on_voices_changed(&self, callback: Box<dyn FnOnce()>) -> speech_core::Result<()> {
        self.clear_voices_changed();

        let mut callback = Some(callback);
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            if let Some(callback) = callback.take() {
                callback();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        // The browser removes the listener after it fires.
        let options = web_sys::AddEventListenerOptions::default();
        options.set_once(true);

        let target: &web_sys::EventTarget = &self.synthesis;
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                "voiceschanged",
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(|err| platform_error(&err))?;

        self.voices_changed.replace(Some(closure));
        Ok(())
    }

    fn clear_voices_changed(&self) {
        let closure = self.voices_changed.take();
        if let Some(closure) = closure {
            let target: &web_sys::EventTarget = &self.synthesis;
            if let Err(err) = target.remove_event_listener_with_callback(
                "voiceschanged",
                closure.as_ref().unchecked_ref(),
            ) {
                log::warn!(
                    "Failed to detach voiceschanged listener: {}",
                    string_from_js_value(&err)
                );
            }
        }
    }
}

impl Drop for WebSpeechPlatform {
    fn drop(&mut self) {
        self.clear_voices_changed();
    }
}

fn error_event(event: &web_sys::Event) -> UtteranceEvent {
    let code = event
        .dyn_ref::<web_sys::SpeechSynthesisErrorEvent>()
        .map(|event| format!("{:?}", event.error()))
        .unwrap_or_else(|| event.type_());
    UtteranceEvent::Error(code)
}

/// We are called from inside one of the closures we want to drop,
/// so let the current call finish first.
fn release_later(utterances: &Rc<RefCell<HashMap<UtteranceId, UtteranceHandlers>>>, id: UtteranceId) {
    let utterances = Rc::clone(utterances);
    wasm_bindgen_futures::spawn_local(async move {
        utterances.borrow_mut().remove(&id);
    });
}
