mod config;
mod dom;
mod error;
mod module;

use std::rc::Rc;

use bridge_core::{Bridge, BridgeState};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{console, Event, HtmlButtonElement, HtmlTextAreaElement};

pub use config::PlaygroundConfig;
pub use dom::{ButtonTrigger, TextAreaOutput};
pub use error::{JsBridgeError, WebError};
pub use module::{resolve_module_url, DynamicImportLoader, JsModule};

pub type WebBridge = Bridge<DynamicImportLoader>;

/// A bridge bound to an input textarea, a run button and an output textarea on the page.
/// Freeing it from JS detaches its listeners, so several playgrounds can share one page.
#[wasm_bindgen]
pub struct Playground {
    bridge: Rc<WebBridge>,
    input: HtmlTextAreaElement,
    run_button: HtmlButtonElement,
    input_event: String,
    on_input: Closure<dyn FnMut(Event)>,
    on_run: Closure<dyn FnMut(Event)>,
}

#[wasm_bindgen]
impl Playground {
    /// `config` is a plain object of `PlaygroundConfig` fields, or undefined for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<Playground, JsValue> {
        Ok(Self::mount(PlaygroundConfig::from_js(config)?)?)
    }

    /// Same as clicking the run button. Resolves once the output is shown, rejects with a
    /// `JsBridgeError`.
    pub fn run(&self) -> js_sys::Promise {
        let bridge = Rc::clone(&self.bridge);
        future_to_promise(async move {
            match bridge.on_run_requested().await {
                Ok(()) => Ok(JsValue::UNDEFINED),
                Err(err) => Err(JsBridgeError::from(err).into()),
            }
        })
    }

    #[wasm_bindgen(getter, js_name = programText)]
    pub fn program_text(&self) -> String {
        self.bridge.program_text().into_string()
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.bridge.state() == BridgeState::Running
    }

    #[wasm_bindgen(getter, js_name = moduleLoaded)]
    pub fn module_loaded(&self) -> bool {
        self.bridge.modules().is_loaded()
    }
}

impl Playground {
    pub fn mount(config: PlaygroundConfig) -> Result<Self, WebError> {
        let document = dom::document()?;
        let input: HtmlTextAreaElement = dom::element_by_id(&document, &config.input_id, "textarea")?;
        let output: HtmlTextAreaElement = dom::element_by_id(&document, &config.output_id, "textarea")?;
        let run_button: HtmlButtonElement = dom::element_by_id(&document, &config.run_id, "button")?;

        let loader = DynamicImportLoader::new(&config.module_url, &config.entry_point, config.initialize);
        let bridge = Rc::new(
            Bridge::new(loader, TextAreaOutput(output)).with_trigger(ButtonTrigger(run_button.clone())),
        );
        // The textarea may be prefilled, and that never fires a change event
        bridge.on_input_change(input.value());

        let on_input = {
            let bridge = Rc::clone(&bridge);
            let input = input.clone();
            Closure::wrap(Box::new(move |_ev: Event| {
                let text = input.value();
                console::log_1(&JsValue::from_str(&text));
                bridge.on_input_change(text);
            }) as Box<dyn FnMut(_)>)
        };

        let on_run = {
            let bridge = Rc::clone(&bridge);
            Closure::wrap(Box::new(move |_ev: Event| {
                let bridge = Rc::clone(&bridge);
                spawn_local(async move {
                    // Already rendered to the output, this is for the developer console
                    if let Err(err) = bridge.on_run_requested().await {
                        console::error_1(&JsValue::from_str(&err.to_string()));
                    }
                });
            }) as Box<dyn FnMut(_)>)
        };

        input
            .add_event_listener_with_callback(&config.input_event, on_input.as_ref().unchecked_ref())
            .map_err(|e| WebError::Listener(config.input_event.clone(), error::describe(&e)))?;
        if let Err(e) = run_button.add_event_listener_with_callback("click", on_run.as_ref().unchecked_ref()) {
            let _ = input.remove_event_listener_with_callback(&config.input_event, on_input.as_ref().unchecked_ref());
            return Err(WebError::Listener("click".into(), error::describe(&e)));
        }

        Ok(Self {
            bridge,
            input,
            run_button,
            input_event: config.input_event,
            on_input,
            on_run,
        })
    }

    pub fn bridge(&self) -> &Rc<WebBridge> {
        &self.bridge
    }
}

impl Drop for Playground {
    fn drop(&mut self) {
        let _ = self
            .input
            .remove_event_listener_with_callback(&self.input_event, self.on_input.as_ref().unchecked_ref());
        let _ = self
            .run_button
            .remove_event_listener_with_callback("click", self.on_run.as_ref().unchecked_ref());
    }
}
