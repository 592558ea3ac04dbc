use log::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::Array;
use web_sys::{Document, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;

pub const ANIMATED_SELECTOR: &str = ".service-card, .testimonial-card, .product-card, .process-step";
pub const ENTERED_CLASS: &str = "animate-in";

/// Pulls the bottom edge of the viewport in by `bottom_px`.
pub fn root_margin(bottom_px: u32) -> String {
    if bottom_px == 0 {
        "0px 0px 0px 0px".to_string()
    } else {
        format!("0px 0px -{}px 0px", bottom_px)
    }
}

/// Owns the observer; dropping it stops all observation.
pub struct Reveal {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

impl Drop for Reveal {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

pub fn init(document: &Document, config: &SiteConfig) -> Result<Option<Reveal>, SiteError> {
    let elements = dom::query_all(document, ANIMATED_SELECTOR)?;
    if elements.is_empty() {
        return Ok(None);
    }

    let callback = Closure::wrap(Box::new(move |entries: Array| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            // Entered is sticky; leaving the viewport does not undo it.
            if entry.is_intersecting() {
                let _ = entry.target().class_list().add_1(ENTERED_CLASS);
            }
        }
    }) as Box<dyn FnMut(Array)>);

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(config.reveal_threshold));
    options.set_root_margin(&root_margin(config.reveal_bottom_margin_px));
    let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;

    for element in &elements {
        observer.observe(element);
    }
    debug!("Observing {} animated elements", elements.len());

    Ok(Some(Reveal {
        observer,
        _callback: callback,
    }))
}
