use speech_core::{Result, SpeechRequest, StateCallback, SubscriptionId, VoiceRecord};

use crate::ModuleLocation;

/// The fixed function surface of the browser-side speech module.
///
/// Every call crosses the module boundary, so every call is async and fallible.
/// Implemented by [`crate::LocalModule`] (same process) and, on the web,
/// `JsModule` (the `wasm-bindgen` output loaded with `import()`).
#[expect(async_fn_in_trait)]
pub trait SpeechModule {
    async fn speak(&self, request: SpeechRequest) -> Result<()>;

    async fn cancel(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    async fn is_speaking(&self) -> Result<bool>;

    async fn is_paused(&self) -> Result<bool>;

    async fn is_pending(&self) -> Result<bool>;

    /// Raw voice records, already sorted by the controller.
    async fn get_voices(&self) -> Result<Vec<VoiceRecord>>;

    /// Register a reverse callback for state changes.
    async fn subscribe(&self, callback: StateCallback) -> Result<SubscriptionId>;

    /// Fails with [`speech_core::SpeechError::Disconnected`] if the other side is gone.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// Release this module. Later calls fail with [`speech_core::SpeechError::Disconnected`].
    async fn dispose(&self) -> Result<()>;
}

/// Resolves a [`ModuleLocation`] into a loaded [`SpeechModule`].
#[expect(async_fn_in_trait)]
pub trait ModuleLoader {
    type Module: SpeechModule;

    async fn load(&self, location: &ModuleLocation) -> Result<Self::Module>;
}
