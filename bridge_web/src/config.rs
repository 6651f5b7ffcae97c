use serde::Deserialize;
use wasm_bindgen::JsValue;

use crate::error::WebError;

/// Which elements a `Playground` binds to, and where its execution module comes from.
/// Every field is optional on the JS side.
#[derive(Deserialize, Clone, Eq, PartialEq, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaygroundConfig {
    pub input_id: String,
    pub output_id: String,
    pub run_id: String,
    /// Resolved against the document's base URI, then passed to `import()`.
    pub module_url: String,
    pub entry_point: String,
    /// DOM event that counts as an input change: `change` fires on blur, `input` on every edit.
    pub input_event: String,
    /// Call the module's `default` export once after importing it. Needed for modules built
    /// with `wasm-pack --target web`, which have to fetch and instantiate their wasm first.
    pub initialize: bool,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            input_id: "program-input".into(),
            output_id: "program-output".into(),
            run_id: "run-program".into(),
            module_url: "./node_modules/nakala_wasm/nakala_wasm.js".into(),
            entry_point: "wasm_interpret".into(),
            input_event: "change".into(),
            initialize: false,
        }
    }
}

impl PlaygroundConfig {
    pub fn from_js(value: JsValue) -> Result<Self, WebError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(|e| WebError::Config(e.to_string()))
    }
}
