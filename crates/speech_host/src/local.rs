use std::cell::{Cell, RefCell};

use speech_core::{Result, SpeechError, SpeechRequest, StateCallback, SubscriptionId, VoiceRecord};
use speech_web::{SpeechController, SpeechPlatform};

use crate::{ModuleLoader, ModuleLocation, SpeechModule};

/// Hands out [`LocalModule`]s wrapping one shared [`SpeechController`].
///
/// The controller is created once, by whoever owns the page, and passed in here.
pub struct LocalModuleLoader<P: SpeechPlatform> {
    controller: SpeechController<P>,
}

impl<P: SpeechPlatform> LocalModuleLoader<P> {
    pub fn new(controller: SpeechController<P>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &SpeechController<P> {
        &self.controller
    }
}

impl<P: SpeechPlatform> ModuleLoader for LocalModuleLoader<P> {
    type Module = LocalModule<P>;

    async fn load(&self, location: &ModuleLocation) -> Result<LocalModule<P>> {
        if self.controller.is_disposed() {
            return Err(SpeechError::Disposed);
        }
        log::debug!("Using the in-process speech controller in place of {location}");
        Ok(LocalModule::new(self.controller.clone()))
    }
}

/// A [`SpeechModule`] that calls the controller directly, in the same process.
///
/// Disposing the module releases the subscriptions it made, but leaves the
/// shared controller running.
pub struct LocalModule<P: SpeechPlatform> {
    controller: SpeechController<P>,
    subscriptions: RefCell<Vec<SubscriptionId>>,
    disposed: Cell<bool>,
}

impl<P: SpeechPlatform> LocalModule<P> {
    pub fn new(controller: SpeechController<P>) -> Self {
        Self {
            controller,
            subscriptions: Default::default(),
            disposed: Cell::new(false),
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.disposed.get() {
            Err(SpeechError::Disconnected)
        } else {
            Ok(())
        }
    }
}

impl<P: SpeechPlatform> SpeechModule for LocalModule<P> {
    async fn speak(&self, request: SpeechRequest) -> Result<()> {
        self.ensure_connected()?;
        self.controller.speak(request).await
    }

    async fn cancel(&self) -> Result<()> {
        self.ensure_connected()?;
        self.controller.cancel()
    }

    async fn pause(&self) -> Result<()> {
        self.ensure_connected()?;
        self.controller.pause()
    }

    async fn resume(&self) -> Result<()> {
        self.ensure_connected()?;
        self.controller.resume()
    }

    async fn is_speaking(&self) -> Result<bool> {
        self.ensure_connected()?;
        Ok(self.controller.is_speaking())
    }

    async fn is_paused(&self) -> Result<bool> {
        self.ensure_connected()?;
        Ok(self.controller.is_paused())
    }

    async fn is_pending(&self) -> Result<bool> {
        self.ensure_connected()?;
        Ok(self.controller.is_pending())
    }

    async fn get_voices(&self) -> Result<Vec<VoiceRecord>> {
        self.ensure_connected()?;
        let voices = self.controller.get_voices().await?;
        Ok(voices.iter().map(VoiceRecord::from).collect())
    }

    async fn subscribe(&self, callback: StateCallback) -> Result<SubscriptionId> {
        self.ensure_connected()?;
        let id = self.controller.subscribe(move |speaking| callback(speaking))?;
        self.subscriptions.borrow_mut().push(id);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.ensure_connected()?;
        self.subscriptions.borrow_mut().retain(|sub| *sub != id);
        // The browser side may have been torn down underneath us.
        self.controller
            .unsubscribe(id)
            .map(|_| ())
            .map_err(SpeechError::disposed_as_disconnected)
    }

    async fn dispose(&self) -> Result<()> {
        if self.disposed.replace(true) {
            return Ok(());
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        for id in subscriptions {
            self.controller.unsubscribe(id).ok();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use speech_web::testing::FakePlatform;

    use super::*;

    #[test]
    fn dispose_releases_subscriptions_but_not_the_controller() {
        let controller = SpeechController::new(FakePlatform::new());
        let module = LocalModule::new(controller.clone());

        pollster::block_on(module.subscribe(Rc::new(|_| {}))).expect("connected");
        assert_eq!(controller.subscriber_count(), 1);

        pollster::block_on(module.dispose()).expect("first dispose");
        pollster::block_on(module.dispose()).expect("second dispose is a no-op");

        assert_eq!(controller.subscriber_count(), 0);
        assert!(!controller.is_disposed());
        assert_eq!(
            pollster::block_on(module.cancel()),
            Err(SpeechError::Disconnected)
        );
    }

    #[test]
    fn unsubscribe_after_teardown_reports_disconnection() {
        let controller = SpeechController::new(FakePlatform::new());
        let module = LocalModule::new(controller.clone());

        let id = pollster::block_on(module.subscribe(Rc::new(|_| {}))).expect("connected");
        controller.dispose();

        assert_eq!(
            pollster::block_on(module.unsubscribe(id)),
            Err(SpeechError::Disconnected)
        );
    }

    #[test]
    fn other_calls_after_teardown_report_disposed() {
        let controller = SpeechController::new(FakePlatform::new());
        let module = LocalModule::new(controller.clone());
        controller.dispose();

        assert_eq!(
            pollster::block_on(module.speak(SpeechRequest::new("late"))),
            Err(SpeechError::Disposed)
        );
        assert_eq!(
            pollster::block_on(module.subscribe(Rc::new(|_| {}))),
            Err(SpeechError::Disposed)
        );
    }

    #[test]
    fn loader_refuses_a_disposed_controller() {
        let controller = SpeechController::new(FakePlatform::new());
        let loader = LocalModuleLoader::new(controller.clone());
        assert!(pollster::block_on(loader.load(&ModuleLocation::default())).is_ok());

        controller.dispose();
        assert!(matches!(
            pollster::block_on(loader.load(&ModuleLocation::default())),
            Err(SpeechError::Disposed)
        ));
    }
}
