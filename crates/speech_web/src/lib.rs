//! Browser-side speech synthesis.
//!
//! [`SpeechController`] is the one authoritative wrapper around the platform
//! speech API. It creates and cancels utterances, tracks the speaking state,
//! loads and caches the voice list, and tells subscribers when speech starts
//! and stops.
//!
//! The platform itself sits behind the [`SpeechPlatform`] trait. When compiling to
//! `wasm32`, `WebSpeechPlatform` drives `window.speechSynthesis`, and
//! `SpeechSynthesisModule` exports the controller to JavaScript.
//!
//! ```
//! # #[cfg(feature = "testing")] {
//! use speech_core::SpeechRequest;
//! use speech_web::{SpeechController, testing::FakePlatform};
//!
//! let controller = SpeechController::new(FakePlatform::new());
//! controller.subscribe(|speaking| println!("speaking: {speaking}")).unwrap();
//! pollster::block_on(controller.speak(SpeechRequest::new("Hello!"))).unwrap();
//! controller.dispose();
//! # }
//! ```
//!
//! ## Feature flags
#![cfg_attr(feature = "document-features", doc = document_features::document_features!())]
//!

mod controller;
mod platform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use controller::SpeechController;
pub use platform::{SpeechPlatform, Utterance, UtteranceCallback, UtteranceEvent, UtteranceId};
pub use speech_core::StateCallback;

#[cfg(target_arch = "wasm32")]
pub use web::{SpeechSynthesisModule, WebLogger, WebSpeechPlatform};
