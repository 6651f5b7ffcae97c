use bridge_core::BridgeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::{JsCast, JsValue};

/// Problems setting up a `Playground`, before any program runs.
#[derive(Error, Eq, Clone, PartialEq, Debug)]
pub enum WebError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("no element with id \"{0}\"")]
    MissingElement(String),

    #[error("element \"{0}\" is not a <{1}>")]
    WrongElement(String, &'static str),

    #[error("invalid playground config: {0}")]
    Config(String),

    #[error("couldn't register {0} listener: {1}")]
    Listener(String, String),
}

impl From<WebError> for JsValue {
    fn from(value: WebError) -> Self {
        js_sys::Error::new(&value.to_string()).into()
    }
}

/// A `BridgeError` as JS sees it: a rejected `Playground.run()` promise carries one of these.
#[wasm_bindgen(inspectable, getter_with_clone)]
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JsBridgeError {
    pub kind: String,
    pub message: String,
}

impl From<BridgeError> for JsBridgeError {
    fn from(value: BridgeError) -> Self {
        JsBridgeError {
            kind: value.kind().into(),
            message: value.to_string(),
        }
    }
}

/// Best-effort human readable text for a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    match value.as_string() {
        Some(s) => s,
        None => format!("{:?}", value),
    }
}
