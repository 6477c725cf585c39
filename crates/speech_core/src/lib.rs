//! Types shared by both sides of the speech bridge.
//!
//! The browser side (`speech_web`) owns the platform speech handle and the
//! host side (`speech_host`) proxies calls to it across a module boundary.
//! Everything that crosses that boundary is defined here:
//!
//! * [`VoiceRecord`] is the raw voice record as the browser reports it,
//!   and [`VoiceDescriptor`] is the immutable value object built from it.
//! * [`SpeechRequest`] describes one utterance. Its numeric parameters are
//!   clamped, never rejected.
//! * [`SpeechError`] is the one error type used on both sides.
//! * [`StateHandlers`] is the table of state-change callbacks, keyed by
//!   [`SubscriptionId`], that both sides keep.
//!
//! ## Feature flags
#![cfg_attr(feature = "document-features", doc = document_features::document_features!())]
//!

mod error;
mod handlers;
mod request;
mod sanitize;
mod subscription;
mod voice;

pub use error::{Result, SpeechError};
pub use handlers::{StateCallback, StateHandlers, notify_all};
pub use request::{PITCH_RANGE, RATE_RANGE, SpeechRequest, VOLUME_RANGE};
pub use sanitize::sanitize_text;
pub use subscription::SubscriptionId;
pub use voice::{VoiceDescriptor, VoiceRecord, find_voice, sort_voices};
