use std::ops::RangeInclusive;

/// Valid speaking rates. `1.0` is normal speed.
pub const RATE_RANGE: RangeInclusive<f32> = 0.1..=10.0;

/// Valid pitches. `1.0` is normal pitch.
pub const PITCH_RANGE: RangeInclusive<f32> = 0.0..=2.0;

/// Valid volumes, from silent to full.
pub const VOLUME_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// One thing to say, and how to say it.
///
/// Built per call and never persisted:
///
/// ```
/// # use speech_core::SpeechRequest;
/// let request = SpeechRequest::new("Hello!").voice("Samantha").rate(1.5).queue(true);
/// assert_eq!(request.voice.as_deref(), Some("Samantha"));
/// ```
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechRequest {
    /// What to say.
    pub text: String,

    /// Name of the voice to use. Falls back to [`Self::lang`], then the platform default.
    pub voice: Option<String>,

    /// Speaking rate, see [`RATE_RANGE`].
    pub rate: f32,

    /// See [`PITCH_RANGE`].
    pub pitch: f32,

    /// See [`VOLUME_RANGE`].
    pub volume: f32,

    /// BCP 47 language tag, e.g. `en-US`.
    pub lang: Option<String>,

    /// If `false`, this request cancels whatever is currently being said.
    /// If `true`, it is queued after it.
    pub queue: bool,
}

impl Default for SpeechRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            lang: None,
            queue: false,
        }
    }
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn voice(mut self, name: impl Into<String>) -> Self {
        self.voice = Some(name.into());
        self
    }

    #[inline]
    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    #[inline]
    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    #[inline]
    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    #[inline]
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    #[inline]
    pub fn queue(mut self, queue: bool) -> Self {
        self.queue = queue;
        self
    }

    /// Move every numeric parameter into its valid range.
    ///
    /// Out-of-range values snap to the nearest bound.
    /// `NaN` and infinities snap to the default of `1.0`, which is inside every range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.rate = clamp_or_default(self.rate, &RATE_RANGE);
        self.pitch = clamp_or_default(self.pitch, &PITCH_RANGE);
        self.volume = clamp_or_default(self.volume, &VOLUME_RANGE);
        self
    }

    /// Blank voice and language names mean "not set".
    pub fn voice_name(&self) -> Option<&str> {
        non_blank(self.voice.as_deref())
    }

    /// See [`Self::voice_name`].
    pub fn lang_tag(&self) -> Option<&str> {
        non_blank(self.lang.as_deref())
    }
}

fn clamp_or_default(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        1.0
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
