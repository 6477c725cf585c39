//! `window.speechSynthesis` bindings (compiling to WASM).

mod module;
mod platform;
mod web_logger;

pub use module::SpeechSynthesisModule;
pub use platform::WebSpeechPlatform;
pub use web_logger::WebLogger;

use wasm_bindgen::JsValue;

pub(crate) fn string_from_js_value(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:#?}"))
}

pub(crate) fn platform_error(value: &JsValue) -> speech_core::SpeechError {
    speech_core::SpeechError::Platform(string_from_js_value(value))
}
