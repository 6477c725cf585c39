use std::rc::Rc;

use crate::{ModuleLoader, SpeechSynthesisOptions, SpeechSynthesizerProxy};

/// Register speech synthesis with the host.
///
/// `configure` gets a chance to change the default [`SpeechSynthesisOptions`].
///
/// ```
/// use speech_host::{LocalModuleLoader, add_speech_synthesis};
/// use speech_web::{SpeechController, testing::FakePlatform};
///
/// let controller = SpeechController::new(FakePlatform::new());
/// let services = add_speech_synthesis(LocalModuleLoader::new(controller), |options| {
///     options.resource_path = Some("/static".to_owned());
/// });
/// assert_eq!(services.synthesizer().location().url(), "/static/speech_web.js");
/// ```
pub fn add_speech_synthesis<L: ModuleLoader>(
    loader: L,
    configure: impl FnOnce(&mut SpeechSynthesisOptions),
) -> SpeechServices<L> {
    let mut options = SpeechSynthesisOptions::default();
    configure(&mut options);
    SpeechServices::new(loader, options)
}

/// Hands out [`SpeechSynthesizerProxy`]s sharing one loader and one set of options.
pub struct SpeechServices<L: ModuleLoader> {
    loader: Rc<L>,
    options: SpeechSynthesisOptions,
}

impl<L: ModuleLoader> SpeechServices<L> {
    pub fn new(loader: L, options: SpeechSynthesisOptions) -> Self {
        log::debug!("Speech module will be loaded from {}", options.location());
        Self {
            loader: Rc::new(loader),
            options,
        }
    }

    pub fn options(&self) -> &SpeechSynthesisOptions {
        &self.options
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// A new synthesizer. Each one loads its own module instance on first use,
    /// and must be disposed on its own.
    pub fn synthesizer(&self) -> SpeechSynthesizerProxy<L> {
        SpeechSynthesizerProxy::new(Rc::clone(&self.loader), self.options.location())
    }
}
