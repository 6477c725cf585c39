/// Implements [`log::Log`] by writing to `console.debug`, `console.info`, etc.
///
/// Nothing in this crate installs it; call [`WebLogger::init`] once at startup.
pub struct WebLogger {
    filter: log::LevelFilter,
}

impl WebLogger {
    /// Install a new `WebLogger` as the global logger.
    ///
    /// # Errors
    /// If a logger was already installed.
    pub fn init(filter: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_max_level(filter);
        log::set_boxed_logger(Box::new(Self::new(filter)))
    }

    /// Create a [`WebLogger`] without installing it.
    pub fn new(filter: log::LevelFilter) -> Self {
        Self { filter }
    }
}

impl log::Log for WebLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = if record.level() == log::Level::Error {
            format!("ERROR: [{}] {}", record.target(), record.args())
        } else {
            format!("[{}] {}", record.target(), record.args())
        };

        match console_method(record.level()) {
            ConsoleMethod::Trace => console::trace(&msg),
            ConsoleMethod::Debug => console::debug(&msg),
            ConsoleMethod::Info => console::info(&msg),
            ConsoleMethod::Warn => console::warn(&msg),
        }
    }

    fn flush(&self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConsoleMethod {
    Trace,
    Debug,
    Info,
    Warn,
}

/// Errors go to `console.warn`: some wasm hosts crash on `console.error`.
fn console_method(level: log::Level) -> ConsoleMethod {
    match level {
        log::Level::Trace => ConsoleMethod::Trace,
        log::Level::Debug => ConsoleMethod::Debug,
        log::Level::Info => ConsoleMethod::Info,
        log::Level::Warn | log::Level::Error => ConsoleMethod::Warn,
    }
}

mod console {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        /// Includes a stack trace.
        #[wasm_bindgen(js_namespace = console)]
        pub fn trace(s: &str);

        #[wasm_bindgen(js_namespace = console)]
        pub fn debug(s: &str);

        #[wasm_bindgen(js_namespace = console)]
        pub fn info(s: &str);

        #[wasm_bindgen(js_namespace = console)]
        pub fn warn(s: &str);
    }
}

#[test]
fn test_console_method() {
    assert_eq!(console_method(log::Level::Trace), ConsoleMethod::Trace);
    assert_eq!(console_method(log::Level::Debug), ConsoleMethod::Debug);
    assert_eq!(console_method(log::Level::Info), ConsoleMethod::Info);
    assert_eq!(console_method(log::Level::Error), ConsoleMethod::Warn);
}
