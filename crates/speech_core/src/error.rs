/// Everything that can go wrong when talking to the speech platform.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    /// The controller, module or adapter has been disposed.
    #[error("the speech synthesizer has been disposed")]
    Disposed,

    /// The caller cancelled the pending call.
    ///
    /// The platform may still carry out the operation.
    #[error("the speech call was cancelled")]
    Cancelled,

    /// The other side of the module boundary is gone.
    #[error("the speech module is disconnected")]
    Disconnected,

    /// The environment has no speech-synthesis support.
    #[error("speech synthesis is not supported in this environment")]
    Unsupported,

    /// The platform speech API raised an error.
    #[error("speech platform error: {0}")]
    Platform(String),

    /// Loading or calling into the boundary module failed.
    #[error("speech module error: {0}")]
    Module(String),

    /// A payload crossing the boundary could not be decoded.
    #[error("failed to decode speech payload: {0}")]
    Decode(String),
}

/// Shorthand for results carrying a [`SpeechError`].
pub type Result<T, E = SpeechError> = std::result::Result<T, E>;

impl SpeechError {
    /// Rebuild an error that crossed the module boundary as its message.
    ///
    /// The browser side reports errors as their [`std::fmt::Display`] text.
    /// A disposed controller comes back as [`Self::Disposed`]; anything else is a
    /// [`Self::Module`] error.
    pub fn from_module_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message == Self::Disposed.to_string() {
            Self::Disposed
        } else {
            Self::Module(message)
        }
    }

    /// When unsubscribing, a disposed controller means the other side is gone.
    #[must_use]
    pub fn disposed_as_disconnected(self) -> Self {
        match self {
            Self::Disposed => Self::Disconnected,
            err => err,
        }
    }
}
