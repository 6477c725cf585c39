/// Where `wasm-bindgen` puts the generated JavaScript by default.
pub const DEFAULT_RESOURCE_PATH: &str = "./pkg";

/// File name `wasm-bindgen` gives the JavaScript glue of the `speech_web` crate.
pub const DEFAULT_MODULE_FILE_NAME: &str = "speech_web.js";

/// Configuration of the speech services.
///
/// Both settings are optional; leave them unset to load the module from
/// `./pkg/speech_web.js`.
///
/// Can be read from a config file:
///
/// ```
/// # use speech_host::SpeechSynthesisOptions;
/// let options: SpeechSynthesisOptions =
///     serde_json::from_str(r#"{ "resource_path": "/static/speech" }"#).unwrap();
/// assert_eq!(options.location().url(), "/static/speech/speech_web.js");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SpeechSynthesisOptions {
    /// Directory or URL prefix the module is served from.
    pub resource_path: Option<String>,

    /// File name of the module inside [`Self::resource_path`].
    pub module_file_name: Option<String>,
}

impl SpeechSynthesisOptions {
    /// Where to load the module from, with defaults filled in.
    pub fn location(&self) -> ModuleLocation {
        ModuleLocation {
            resource_path: non_blank(self.resource_path.as_deref())
                .unwrap_or(DEFAULT_RESOURCE_PATH)
                .to_owned(),
            file_name: non_blank(self.module_file_name.as_deref())
                .unwrap_or(DEFAULT_MODULE_FILE_NAME)
                .to_owned(),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Resolved location of the speech module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleLocation {
    pub resource_path: String,
    pub file_name: String,
}

impl ModuleLocation {
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.resource_path.trim_end_matches('/'),
            self.file_name.trim_start_matches('/')
        )
    }
}

impl Default for ModuleLocation {
    fn default() -> Self {
        SpeechSynthesisOptions::default().location()
    }
}

impl std::fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_wasm_bindgen_output() {
        assert_eq!(ModuleLocation::default().url(), "./pkg/speech_web.js");
    }

    #[test]
    fn overrides_are_joined_with_one_slash() {
        let options = SpeechSynthesisOptions {
            resource_path: Some("https://cdn.example.com/speech/".to_owned()),
            module_file_name: Some("/speech.js".to_owned()),
        };
        assert_eq!(
            options.location().url(),
            "https://cdn.example.com/speech/speech.js"
        );
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let options = SpeechSynthesisOptions {
            resource_path: Some("  ".to_owned()),
            module_file_name: Some(String::new()),
        };
        assert_eq!(options.location(), ModuleLocation::default());
    }
}
