//! Host-side access to browser speech synthesis.
//!
//! The host never touches the platform speech API itself. It loads a speech module
//! (the `wasm-bindgen` output of `speech_web`) on first use and forwards every call
//! across that boundary:
//!
//! * [`add_speech_synthesis`] registers the service and returns [`SpeechServices`].
//! * [`SpeechServices::synthesizer`] hands out a [`SpeechSynthesizerProxy`], which
//!   implements [`SpeechSynthesizer`].
//! * The proxy clamps and sanitizes requests before they cross, maps voice records to
//!   [`speech_core::VoiceDescriptor`]s, and turns the module's state-change events back
//!   into host-side listeners.
//!
//! Which module is loaded is decided by a [`ModuleLoader`]. On the web that is
//! `JsModuleLoader`, which `import()`s the module from [`SpeechSynthesisOptions`]'
//! location. [`LocalModuleLoader`] wraps a controller living in the same process.
//!
//! ```
//! use speech_core::SpeechRequest;
//! use speech_host::{LocalModuleLoader, SpeechSynthesizer as _, add_speech_synthesis};
//! use speech_web::{SpeechController, testing::FakePlatform};
//! use tokio_util::sync::CancellationToken;
//!
//! let controller = SpeechController::new(FakePlatform::new());
//! let services = add_speech_synthesis(LocalModuleLoader::new(controller.clone()), |_| {});
//! let speech = services.synthesizer();
//! let cancel = CancellationToken::new();
//!
//! pollster::block_on(async {
//!     speech
//!         .add_state_listener(|speaking| println!("speaking: {speaking}"), &cancel)
//!         .await?;
//!     speech.speak(SpeechRequest::new("Hello!"), &cancel).await?;
//!     speech.dispose().await
//! })
//! .unwrap();
//! controller.dispose();
//! ```
//!
//! ## Feature flags
#![cfg_attr(feature = "document-features", doc = document_features::document_features!())]
//!

mod local;
mod module;
mod options;
mod services;
mod synthesizer;

#[cfg(target_arch = "wasm32")]
mod js;

pub use local::{LocalModule, LocalModuleLoader};
pub use module::{ModuleLoader, SpeechModule};
pub use options::{
    DEFAULT_MODULE_FILE_NAME, DEFAULT_RESOURCE_PATH, ModuleLocation, SpeechSynthesisOptions,
};
pub use services::{SpeechServices, add_speech_synthesis};
pub use synthesizer::{ListenerId, SpeechSynthesizer, SpeechSynthesizerProxy};

#[cfg(target_arch = "wasm32")]
pub use js::{JsModule, JsModuleLoader};
