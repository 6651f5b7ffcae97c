use async_trait::async_trait;
use bridge_core::{ExecutionModule, ModuleError, ModuleLoader};
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Url;

use crate::error::describe;

#[wasm_bindgen(inline_js = "export function import_module(url) { return import(url); }")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn import_module(url: &str) -> Result<Promise, JsValue>;
}

/// Loads an ES module with a dynamic `import()` and picks its interpreter export.
/// The browser's module map caches the import itself; `ModuleCache` keeps us from asking twice.
pub struct DynamicImportLoader {
    url: String,
    entry_point: String,
    initialize: bool,
}

impl DynamicImportLoader {
    pub fn new(url: impl Into<String>, entry_point: impl Into<String>, initialize: bool) -> Self {
        Self {
            url: url.into(),
            entry_point: entry_point.into(),
            initialize,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl ModuleLoader for DynamicImportLoader {
    type Module = JsModule;

    async fn load(&self) -> Result<JsModule, ModuleError> {
        let url = resolve_module_url(&self.url)?;
        let import_failed = |e: JsValue| ModuleError(format!("import of {} failed: {}", url, describe(&e)));
        let namespace = JsFuture::from(import_module(&url).map_err(import_failed)?)
            .await
            .map_err(import_failed)?;

        if self.initialize {
            let init = exported_fn(&namespace, "default")?;
            let ready = init.call0(&JsValue::UNDEFINED).map_err(|e| ModuleError(describe(&e)))?;
            settle(ready)
                .await
                .map_err(|e| ModuleError(format!("module initialization failed: {}", describe(&e))))?;
        }

        Ok(JsModule {
            entry: exported_fn(&namespace, &self.entry_point)?,
        })
    }
}

/// The interpreter's entry point: takes the program source, returns (or resolves to) a string.
pub struct JsModule {
    entry: Function,
}

#[async_trait(?Send)]
impl ExecutionModule for JsModule {
    async fn interpret(&self, source: &str) -> Result<String, ModuleError> {
        let result = self
            .entry
            .call1(&JsValue::UNDEFINED, &JsValue::from_str(source))
            .map_err(|e| ModuleError(describe(&e)))?;
        let result = settle(result).await.map_err(|e| ModuleError(describe(&e)))?;
        result
            .as_string()
            .ok_or_else(|| ModuleError(format!("entry point returned a non-string value: {:?}", result)))
    }
}

/// Make `url` absolute against the document's base URI.
///
/// `import()` resolves relative specifiers against the module that calls it, which is a
/// wasm-bindgen snippet file rather than the page, so relative URLs have to be resolved here.
/// Outside a document (a worker, say) the URL is used as given.
pub fn resolve_module_url(url: &str) -> Result<String, ModuleError> {
    let base = match web_sys::window().and_then(|w| w.document()) {
        Some(document) => document.base_uri().map_err(|e| ModuleError(describe(&e)))?,
        None => None,
    };
    match base {
        Some(base) => Url::new_with_base(url, &base)
            .map(|resolved| resolved.href())
            .map_err(|e| ModuleError(format!("bad module url {}: {}", url, describe(&e)))),
        None => Ok(url.to_string()),
    }
}

fn exported_fn(namespace: &JsValue, name: &str) -> Result<Function, ModuleError> {
    Reflect::get(namespace, &JsValue::from_str(name))
        .map_err(|e| ModuleError(describe(&e)))?
        .dyn_into::<Function>()
        .map_err(|_| ModuleError(format!("module has no exported function `{}`", name)))
}

// Await `value` if it's a promise, otherwise hand it back
async fn settle(value: JsValue) -> Result<JsValue, JsValue> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}
