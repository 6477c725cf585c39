use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use speech_core::{
    Result, SpeechError, SpeechRequest, StateCallback, StateHandlers, SubscriptionId,
    VoiceDescriptor, notify_all, sanitize_text,
};
use tokio_util::sync::CancellationToken;

use crate::{ModuleLoader, ModuleLocation, SpeechModule};

/// Handle to a listener added with [`SpeechSynthesizer::add_state_listener`].
pub type ListenerId = SubscriptionId;

/// What the host can do with speech.
///
/// Every call takes a [`CancellationToken`]. Cancelling it makes the pending call
/// return [`SpeechError::Cancelled`], but the platform may still carry out the
/// operation.
///
/// Unless stated otherwise, every method fails with:
/// * [`SpeechError::Disposed`] once [`Self::dispose`] has been called,
/// * [`SpeechError::Cancelled`] if `cancel` fires first,
/// * [`SpeechError::Module`] if the speech module could not be loaded or called.
#[expect(async_fn_in_trait)]
pub trait SpeechSynthesizer {
    /// Say something. Unless [`SpeechRequest::queue`] is set, this interrupts
    /// whatever is being said.
    ///
    /// # Errors
    /// See the trait docs, plus [`SpeechError::Platform`] if the platform refuses the utterance.
    async fn speak(&self, request: SpeechRequest, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    /// See the trait docs.
    async fn cancel(&self, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    /// See the trait docs.
    async fn pause(&self, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    /// See the trait docs.
    async fn resume(&self, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    /// See the trait docs.
    async fn is_speaking(&self, cancel: &CancellationToken) -> Result<bool>;

    /// # Errors
    /// See the trait docs.
    async fn is_paused(&self, cancel: &CancellationToken) -> Result<bool>;

    /// # Errors
    /// See the trait docs.
    async fn is_pending(&self, cancel: &CancellationToken) -> Result<bool>;

    /// # Errors
    /// See the trait docs.
    async fn is_speaking_or_pending(&self, cancel: &CancellationToken) -> Result<bool>;

    /// The available voices, preferred ones first.
    ///
    /// A platform that fails to list its voices yields an empty list, not an error.
    ///
    /// # Errors
    /// See the trait docs, plus [`SpeechError::Decode`] for a malformed voice list.
    async fn get_voices(&self, cancel: &CancellationToken) -> Result<Rc<[VoiceDescriptor]>>;

    /// Call `listener` with `true` when speech starts and `false` when it stops.
    ///
    /// # Errors
    /// See the trait docs. The listener is not added on error.
    async fn add_state_listener(
        &self,
        listener: impl Fn(bool) + 'static,
        cancel: &CancellationToken,
    ) -> Result<ListenerId>;

    /// Returns `false` if there was no such listener.
    ///
    /// # Errors
    /// See the trait docs. The listener is removed even if releasing the module's
    /// callback fails; the release is retried when the last listener leaves again.
    async fn remove_state_listener(
        &self,
        id: ListenerId,
        cancel: &CancellationToken,
    ) -> Result<bool>;

    /// Release the module. Calling this more than once does nothing.
    ///
    /// # Errors
    /// If the module fails to dispose. The synthesizer counts as disposed regardless.
    async fn dispose(&self) -> Result<()>;
}

/// Forwards [`SpeechSynthesizer`] calls to a [`SpeechModule`], loading it on first use.
///
/// Hand one out per consumer with [`crate::SpeechServices::synthesizer`].
pub struct SpeechSynthesizerProxy<L: ModuleLoader> {
    loader: Rc<L>,
    location: ModuleLocation,

    /// Loaded at most once. Held across the load so concurrent callers wait for it.
    module: tokio::sync::Mutex<Option<Rc<L::Module>>>,

    /// Only ever holds a non-empty list.
    voices: RefCell<Option<Rc<[VoiceDescriptor]>>>,

    listeners: Rc<RefCell<StateHandlers>>,

    /// The one reverse callback registered with the module while there are listeners.
    registration: tokio::sync::Mutex<Option<SubscriptionId>>,

    disposed: Cell<bool>,
}

impl<L: ModuleLoader> SpeechSynthesizerProxy<L> {
    pub fn new(loader: Rc<L>, location: ModuleLocation) -> Self {
        Self {
            loader,
            location,
            module: Default::default(),
            voices: Default::default(),
            listeners: Default::default(),
            registration: Default::default(),
            disposed: Cell::new(false),
        }
    }

    pub fn location(&self) -> &ModuleLocation {
        &self.location
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.disposed.get() {
            Err(SpeechError::Disposed)
        } else {
            Ok(())
        }
    }

    async fn module(&self) -> Result<Rc<L::Module>> {
        self.ensure_alive()?;
        let mut slot = self.module.lock().await;
        self.ensure_alive()?;

        if let Some(module) = slot.as_ref() {
            return Ok(Rc::clone(module));
        }

        log::debug!("Loading speech module from {}…", self.location);
        let module = Rc::new(self.loader.load(&self.location).await?);

        if self.disposed.get() {
            module.dispose().await.ok();
            return Err(SpeechError::Disposed);
        }

        *slot = Some(Rc::clone(&module));
        Ok(module)
    }

    /// The module, if it has been loaded.
    async fn loaded_module(&self) -> Option<Rc<L::Module>> {
        self.module.lock().await.clone()
    }

    async fn run<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.ensure_alive()?;
        cancel
            .run_until_cancelled(call)
            .await
            .unwrap_or(Err(SpeechError::Cancelled))
    }

    fn bridge(&self) -> StateCallback {
        let listeners = Rc::downgrade(&self.listeners);
        Rc::new(move |speaking| {
            if let Some(listeners) = listeners.upgrade() {
                let callbacks = listeners.borrow().snapshot();
                notify_all(&callbacks, speaking);
            }
        })
    }

    async fn unregister(module: &L::Module, registration: SubscriptionId) -> Result<()> {
        match module.unsubscribe(registration).await {
            Ok(()) => Ok(()),
            Err(SpeechError::Disconnected) => {
                log::debug!("Speech module already gone when removing state callback {registration}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl<L: ModuleLoader> SpeechSynthesizer for SpeechSynthesizerProxy<L> {
    async fn speak(&self, request: SpeechRequest, cancel: &CancellationToken) -> Result<()> {
        let request = request.clamped();
        let request = SpeechRequest {
            text: sanitize_text(&request.text),
            ..request
        };
        self.run(cancel, async { self.module().await?.speak(request).await })
            .await
    }

    async fn cancel(&self, cancel: &CancellationToken) -> Result<()> {
        self.run(cancel, async { self.module().await?.cancel().await })
            .await
    }

    async fn pause(&self, cancel: &CancellationToken) -> Result<()> {
        self.run(cancel, async { self.module().await?.pause().await })
            .await
    }

    async fn resume(&self, cancel: &CancellationToken) -> Result<()> {
        self.run(cancel, async { self.module().await?.resume().await })
            .await
    }

    async fn is_speaking(&self, cancel: &CancellationToken) -> Result<bool> {
        self.run(cancel, async { self.module().await?.is_speaking().await })
            .await
    }

    async fn is_paused(&self, cancel: &CancellationToken) -> Result<bool> {
        self.run(cancel, async { self.module().await?.is_paused().await })
            .await
    }

    async fn is_pending(&self, cancel: &CancellationToken) -> Result<bool> {
        self.run(cancel, async { self.module().await?.is_pending().await })
            .await
    }

    async fn is_speaking_or_pending(&self, cancel: &CancellationToken) -> Result<bool> {
        self.run(cancel, async {
            let module = self.module().await?;
            Ok(module.is_speaking().await? || module.is_pending().await?)
        })
        .await
    }

    async fn get_voices(&self, cancel: &CancellationToken) -> Result<Rc<[VoiceDescriptor]>> {
        self.ensure_alive()?;
        if let Some(voices) = self.voices.borrow().as_ref() {
            return Ok(Rc::clone(voices));
        }

        let records = self
            .run(cancel, async { self.module().await?.get_voices().await })
            .await?;
        let voices: Rc<[VoiceDescriptor]> = records.into_iter().map(VoiceDescriptor::from).collect();

        if !voices.is_empty() && !self.disposed.get() {
            *self.voices.borrow_mut() = Some(Rc::clone(&voices));
        }
        Ok(voices)
    }

    async fn add_state_listener(
        &self,
        listener: impl Fn(bool) + 'static,
        cancel: &CancellationToken,
    ) -> Result<ListenerId> {
        self.run(cancel, async {
            let mut registration = self.registration.lock().await;
            if registration.is_none() {
                let module = self.module().await?;
                let id = module.subscribe(self.bridge()).await?;
                log::debug!("Registered state callback {id} with the speech module");
                *registration = Some(id);
            }
            Ok(self.listeners.borrow_mut().insert(Rc::new(listener)))
        })
        .await
    }

    async fn remove_state_listener(
        &self,
        id: ListenerId,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.run(cancel, async {
            let mut registration = self.registration.lock().await;
            let removed = self.listeners.borrow_mut().remove(id);

            if self.listeners.borrow().is_empty()
                && let Some(registered) = *registration
            {
                // Keep the registration on failure, so the bridge is not registered twice.
                if let Some(module) = self.loaded_module().await {
                    Self::unregister(&module, registered).await?;
                }
                *registration = None;
            }
            Ok(removed)
        })
        .await
    }

    async fn dispose(&self) -> Result<()> {
        if self.disposed.replace(true) {
            return Ok(());
        }

        let registration = self.registration.lock().await.take();
        let module = self.module.lock().await.take();
        self.listeners.borrow_mut().clear();
        self.voices.borrow_mut().take();

        if let Some(module) = module {
            if let Some(registered) = registration
                && let Err(err) = Self::unregister(&module, registered).await
            {
                log::warn!("Failed to remove state callback {registered}: {err}");
            }
            module.dispose().await?;
        }

        log::debug!("Speech synthesizer disposed");
        Ok(())
    }
}
