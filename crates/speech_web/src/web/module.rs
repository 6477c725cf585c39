use speech_core::{SpeechError, SpeechRequest, SubscriptionId, VoiceRecord};
use wasm_bindgen::prelude::*;

use super::{WebLogger, WebSpeechPlatform, string_from_js_value};
use crate::SpeechController;

/// The controller, as seen from JavaScript.
///
/// This is the fixed surface the host side loads across the module boundary.
/// Requests and voice lists cross as JSON strings:
///
/// ```js
/// import init, { SpeechSynthesisModule } from "./pkg/speech_web.js";
/// await init();
/// const speech = new SpeechSynthesisModule();
/// const id = speech.subscribe((speaking) => console.log("speaking:", speaking));
/// await speech.speak(JSON.stringify({ text: "Hello!", rate: 1.2 }));
/// const voices = JSON.parse(await speech.getVoices());
/// speech.unsubscribe(id);
/// speech.dispose();
/// ```
#[wasm_bindgen]
pub struct SpeechSynthesisModule {
    controller: SpeechController<WebSpeechPlatform>,
}

#[wasm_bindgen]
impl SpeechSynthesisModule {
    /// # Errors
    /// If the browser has no speech synthesis.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Self, JsValue> {
        let platform = WebSpeechPlatform::new().map_err(to_js_error)?;
        Ok(Self {
            controller: SpeechController::new(platform),
        })
    }

    /// Resolves once the utterance has been handed to the browser.
    pub fn speak(&self, request_json: &str) -> js_sys::Promise {
        let controller = self.controller.clone();
        let request = serde_json::from_str::<SpeechRequest>(request_json)
            .map_err(|err| SpeechError::Decode(err.to_string()));

        wasm_bindgen_futures::future_to_promise(async move {
            controller.speak(request.map_err(to_js_error)?).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// # Errors
    /// Once disposed.
    pub fn cancel(&self) -> Result<(), JsValue> {
        self.controller.cancel().map_err(to_js_error)
    }

    /// # Errors
    /// Once disposed.
    pub fn pause(&self) -> Result<(), JsValue> {
        self.controller.pause().map_err(to_js_error)
    }

    /// # Errors
    /// Once disposed.
    pub fn resume(&self) -> Result<(), JsValue> {
        self.controller.resume().map_err(to_js_error)
    }

    pub fn speaking(&self) -> bool {
        self.controller.is_speaking()
    }

    pub fn paused(&self) -> bool {
        self.controller.is_paused()
    }

    pub fn pending(&self) -> bool {
        self.controller.is_pending()
    }

    /// Resolves to a JSON array of `{ name, lang, voiceURI, default, localService }`.
    #[wasm_bindgen(js_name = getVoices)]
    pub fn get_voices(&self) -> js_sys::Promise {
        let controller = self.controller.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let voices = controller.get_voices().await.map_err(to_js_error)?;
            let records: Vec<VoiceRecord> = voices.iter().map(VoiceRecord::from).collect();
            let json = serde_json::to_string(&records)
                .map_err(|err| to_js_error(SpeechError::Decode(err.to_string())))?;
            Ok(JsValue::from_str(&json))
        })
    }

    /// `callback` is called with `true` when speech starts and `false` when it stops.
    ///
    /// Returns a handle for [`Self::unsubscribe`].
    ///
    /// # Errors
    /// Once disposed.
    pub fn subscribe(&self, callback: js_sys::Function) -> Result<u32, JsValue> {
        let id = self
            .controller
            .subscribe(move |speaking| {
                if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_bool(speaking)) {
                    log::error!(
                        "State-change subscriber threw: {}",
                        string_from_js_value(&err)
                    );
                }
            })
            .map_err(to_js_error)?;
        Ok(id.raw())
    }

    /// Returns `false` if there was no such subscription.
    ///
    /// # Errors
    /// Once disposed.
    pub fn unsubscribe(&self, id: u32) -> Result<bool, JsValue> {
        self.controller
            .unsubscribe(SubscriptionId::from_raw(id))
            .map_err(to_js_error)
    }

    pub fn dispose(&self) {
        self.controller.dispose();
    }
}

/// Send `log` output of this module to the browser console.
///
/// `level` is one of `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
#[wasm_bindgen(js_name = installLogger)]
pub fn install_logger(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);
    WebLogger::init(filter).ok();
}

fn to_js_error(err: SpeechError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
