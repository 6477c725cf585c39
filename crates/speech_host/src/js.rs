//! Loading the `wasm-bindgen` output of `speech_web` with a dynamic `import()`.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use js_sys::{Function, Promise, Reflect};
use speech_core::{Result, SpeechError, SpeechRequest, StateCallback, SubscriptionId, VoiceRecord};
use wasm_bindgen::{JsCast as _, JsValue, closure::Closure};
use wasm_bindgen_futures::JsFuture;

use crate::{ModuleLoader, ModuleLocation, SpeechModule};

/// Imports the speech module from its [`ModuleLocation`] and constructs a
/// `SpeechSynthesisModule` from it.
#[derive(Default)]
pub struct JsModuleLoader {
    _private: (),
}

impl JsModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleLoader for JsModuleLoader {
    type Module = JsModule;

    async fn load(&self, location: &ModuleLocation) -> Result<JsModule> {
        let url = location.url();
        log::debug!("Importing speech module from {url}…");

        let import = Function::new_with_args("url", "return import(url)");
        let namespace = import
            .call1(&JsValue::NULL, &JsValue::from_str(&url))
            .map_err(module_error)?;
        let namespace = resolve(namespace)
            .await
            .map_err(|err| SpeechError::Module(format!("failed to import {url}: {err}")))?;

        // `wasm-bindgen --target web` exports the wasm initializer as `default`.
        if let Ok(init) = Reflect::get(&namespace, &JsValue::from_str("default"))
            && let Some(init) = init.dyn_ref::<Function>()
        {
            resolve(init.call0(&JsValue::NULL).map_err(module_error)?).await?;
        }

        let class = Reflect::get(&namespace, &JsValue::from_str("SpeechSynthesisModule"))
            .ok()
            .and_then(|class| class.dyn_into::<Function>().ok())
            .ok_or_else(|| {
                SpeechError::Module(format!("{url} does not export SpeechSynthesisModule"))
            })?;

        let module = Reflect::construct(&class, &js_sys::Array::new()).map_err(module_error)?;

        log::debug!("Speech module loaded from {url}");
        Ok(JsModule {
            module,
            callbacks: Default::default(),
            disposed: Cell::new(false),
        })
    }
}

/// A `SpeechSynthesisModule` instance living on the JavaScript side.
pub struct JsModule {
    module: JsValue,

    /// Reverse callbacks handed to JavaScript, kept alive until unsubscribed.
    callbacks: RefCell<HashMap<SubscriptionId, Closure<dyn Fn(bool)>>>,

    disposed: Cell<bool>,
}

impl JsModule {
    fn method(&self, name: &str) -> Result<Function> {
        if self.disposed.get() {
            return Err(SpeechError::Disconnected);
        }
        Reflect::get(&self.module, &JsValue::from_str(name))
            .map_err(module_error)?
            .dyn_into::<Function>()
            .map_err(|value| {
                SpeechError::Module(format!("speech module member {name:?} is not a function: {value:?}"))
            })
    }

    fn call0(&self, name: &str) -> Result<JsValue> {
        self.method(name)?.call0(&self.module).map_err(module_error)
    }

    fn call1(&self, name: &str, arg: &JsValue) -> Result<JsValue> {
        self.method(name)?.call1(&self.module, arg).map_err(module_error)
    }

    fn call_bool(&self, name: &str) -> Result<bool> {
        let value = self.call0(name)?;
        value
            .as_bool()
            .ok_or_else(|| SpeechError::Decode(format!("{name} returned {value:?}")))
    }
}

impl SpeechModule for JsModule {
    async fn speak(&self, request: SpeechRequest) -> Result<()> {
        let json =
            serde_json::to_string(&request).map_err(|err| SpeechError::Decode(err.to_string()))?;
        resolve(self.call1("speak", &JsValue::from_str(&json))?).await?;
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        self.call0("cancel").map(|_| ())
    }

    async fn pause(&self) -> Result<()> {
        self.call0("pause").map(|_| ())
    }

    async fn resume(&self) -> Result<()> {
        self.call0("resume").map(|_| ())
    }

    async fn is_speaking(&self) -> Result<bool> {
        self.call_bool("speaking")
    }

    async fn is_paused(&self) -> Result<bool> {
        self.call_bool("paused")
    }

    async fn is_pending(&self) -> Result<bool> {
        self.call_bool("pending")
    }

    async fn get_voices(&self) -> Result<Vec<VoiceRecord>> {
        let json = resolve(self.call0("getVoices")?).await?;
        let json = json
            .as_string()
            .ok_or_else(|| SpeechError::Decode(format!("getVoices resolved to {json:?}")))?;
        serde_json::from_str(&json).map_err(|err| SpeechError::Decode(err.to_string()))
    }

    async fn subscribe(&self, callback: StateCallback) -> Result<SubscriptionId> {
        let closure = Closure::<dyn Fn(bool)>::new(move |speaking| callback(speaking));
        let id = self.call1("subscribe", closure.as_ref())?;
        let id = id
            .as_f64()
            .ok_or_else(|| SpeechError::Decode(format!("subscribe returned {id:?}")))?;
        let id = SubscriptionId::from_raw(id as u32);
        self.callbacks.borrow_mut().insert(id, closure);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        // A disposed controller took its subscribers with it.
        let result = self
            .call1("unsubscribe", &JsValue::from(id.raw()))
            .map(|_| ())
            .map_err(SpeechError::disposed_as_disconnected);

        // JavaScript still holds the callback unless it let go of it.
        if matches!(result, Ok(()) | Err(SpeechError::Disconnected)) {
            self.callbacks.borrow_mut().remove(&id);
        }
        result
    }

    async fn dispose(&self) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }
        let result = self.call0("dispose");
        self.disposed.set(true);
        self.callbacks.borrow_mut().clear();
        result.map(|_| ())
    }
}

/// Awaits `value` if it is a promise.
async fn resolve(value: JsValue) -> Result<JsValue> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await.map_err(module_error),
        Err(value) => Ok(value),
    }
}

fn module_error(value: JsValue) -> SpeechError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"));

    SpeechError::from_module_message(message)
}
