use std::cmp::Reverse;

/// A voice as the browser reports it (`SpeechSynthesisVoice`).
///
/// This is the shape that crosses the module boundary, so the field names
/// follow the browser API.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceRecord {
    pub name: String,

    pub lang: String,

    #[serde(rename = "voiceURI")]
    pub voice_uri: String,

    pub default: bool,

    pub local_service: bool,
}

/// Immutable snapshot of one available synthesis voice.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoiceDescriptor {
    /// Human readable name, e.g. `"Google US English"`.
    pub name: String,

    /// BCP 47 language tag, e.g. `"en-US"`.
    pub lang: String,

    /// Platform identifier of the voice.
    pub voice_uri: String,

    /// Is this the platform default voice?
    pub is_default: bool,

    /// Is this voice synthesized on the device rather than by a remote service?
    pub local_service: bool,
}

impl From<VoiceRecord> for VoiceDescriptor {
    fn from(record: VoiceRecord) -> Self {
        let VoiceRecord {
            name,
            lang,
            voice_uri,
            default,
            local_service,
        } = record;

        Self {
            name: name.trim().to_owned(),
            // Some platforms report `en_US` instead of `en-US`.
            lang: lang.trim().replace('_', "-"),
            voice_uri: voice_uri.trim().to_owned(),
            is_default: default,
            local_service,
        }
    }
}

impl From<&VoiceDescriptor> for VoiceRecord {
    fn from(voice: &VoiceDescriptor) -> Self {
        Self {
            name: voice.name.clone(),
            lang: voice.lang.clone(),
            voice_uri: voice.voice_uri.clone(),
            default: voice.is_default,
            local_service: voice.local_service,
        }
    }
}

/// Sort voices so the most useful come first.
///
/// The platform default voice goes first, then local voices, then by language tag.
/// The sort is stable, so voices that compare equal keep the platform order.
pub fn sort_voices(voices: &mut [VoiceDescriptor]) {
    voices.sort_by(|a, b| {
        (Reverse(a.is_default), Reverse(a.local_service), &a.lang).cmp(&(
            Reverse(b.is_default),
            Reverse(b.local_service),
            &b.lang,
        ))
    });
}

/// Find the voice to use for a request.
///
/// An exact name match wins. Otherwise the first voice with the given language tag
/// (ignoring ASCII case). `None` means "use the platform default".
pub fn find_voice<'a>(
    voices: &'a [VoiceDescriptor],
    name: Option<&str>,
    lang: Option<&str>,
) -> Option<&'a VoiceDescriptor> {
    if let Some(name) = name
        && let Some(voice) = voices.iter().find(|voice| voice.name == name)
    {
        return Some(voice);
    }

    let lang = lang?;
    voices
        .iter()
        .find(|voice| voice.lang.eq_ignore_ascii_case(lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, lang: &str, is_default: bool, local_service: bool) -> VoiceDescriptor {
        VoiceDescriptor {
            name: name.to_owned(),
            lang: lang.to_owned(),
            voice_uri: format!("urn:voice:{name}"),
            is_default,
            local_service,
        }
    }

    #[test]
    fn sort_order() {
        let mut voices = vec![
            voice("fr-local", "fr", false, true),
            voice("en-default", "en", true, false),
            voice("en-neither", "en", false, false),
        ];
        sort_voices(&mut voices);

        let names: Vec<&str> = voices.iter().map(|v| v.name.as_str()).collect();
        similar_asserts::assert_eq!(names, ["en-default", "fr-local", "en-neither"]);
    }

    #[test]
    fn sort_breaks_ties_by_language() {
        let mut voices = vec![
            voice("c", "sv-SE", false, true),
            voice("a", "de-DE", false, true),
            voice("b", "de-DE", false, true),
        ];
        sort_voices(&mut voices);

        let names: Vec<&str> = voices.iter().map(|v| v.name.as_str()).collect();
        similar_asserts::assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn exact_name_wins() {
        let voices = [
            voice("Alice", "en-GB", true, true),
            voice("Bob", "en-US", false, true),
        ];
        let found = find_voice(&voices, Some("Bob"), Some("en-GB")).map(|v| v.name.as_str());
        assert_eq!(found, Some("Bob"));
    }

    #[test]
    fn unknown_name_falls_back_to_language() {
        let voices = [
            voice("Alice", "en-GB", true, true),
            voice("Bob", "en-US", false, true),
            voice("Carol", "en-US", false, false),
        ];
        let found =
            find_voice(&voices, Some("Unknown Voice"), Some("en-US")).map(|v| v.name.as_str());
        assert_eq!(found, Some("Bob"));

        let found = find_voice(&voices, None, Some("EN-us")).map(|v| v.name.as_str());
        assert_eq!(found, Some("Bob"));
    }

    #[test]
    fn nothing_matches_means_platform_default() {
        let voices = [voice("Alice", "en-GB", true, true)];
        assert_eq!(find_voice(&voices, Some("Unknown Voice"), Some("en-US")), None);
        assert_eq!(find_voice(&voices, Some("Unknown Voice"), None), None);
        assert_eq!(find_voice(&[], None, None), None);
    }

    #[test]
    fn records_become_lookup_safe_descriptors() {
        let record = VoiceRecord {
            name: " Google español ".to_owned(),
            lang: "es_ES".to_owned(),
            voice_uri: "Google español".to_owned(),
            default: false,
            local_service: false,
        };
        let descriptor = VoiceDescriptor::from(record);
        assert_eq!(descriptor.name, "Google español");
        assert_eq!(descriptor.lang, "es-ES");

        let back = VoiceRecord::from(&descriptor);
        assert_eq!(back.lang, "es-ES");
        assert!(!back.default);
    }

    #[test]
    fn record_uses_browser_field_names() {
        let record: VoiceRecord = serde_json::from_str(
            r#"{"name":"Alex","lang":"en-US","voiceURI":"com.apple.alex","default":true,"localService":true}"#,
        )
        .expect("valid voice json");
        assert_eq!(record.voice_uri, "com.apple.alex");
        assert!(record.default && record.local_service);
    }
}
