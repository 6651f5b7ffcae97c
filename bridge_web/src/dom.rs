use bridge_core::{OutputSurface, RunTrigger, SurfaceError};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlButtonElement, HtmlTextAreaElement};

use crate::error::WebError;

pub(crate) fn document() -> Result<Document, WebError> {
    web_sys::window()
        .ok_or(WebError::NoWindow)?
        .document()
        .ok_or(WebError::NoDocument)
}

pub(crate) fn element_by_id<T: JsCast>(
    document: &Document,
    id: &str,
    tag: &'static str,
) -> Result<T, WebError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| WebError::MissingElement(id.into()))?
        .dyn_into::<T>()
        .map_err(|_| WebError::WrongElement(id.into(), tag))
}

/// Shows program output by replacing a `<textarea>`'s value.
pub struct TextAreaOutput(pub HtmlTextAreaElement);

impl OutputSurface for TextAreaOutput {
    fn show(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.0.set_value(text);
        Ok(())
    }
}

pub struct ButtonTrigger(pub HtmlButtonElement);

impl RunTrigger for ButtonTrigger {
    fn set_enabled(&mut self, enabled: bool) {
        self.0.set_disabled(!enabled)
    }
}
