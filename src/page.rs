//! Startup wiring for the whole page.

use std::rc::Rc;

use log::{debug, error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::js_sys::Reflect;
use web_sys::{Document, ErrorEvent, HtmlElement, KeyboardEvent, Window};

use crate::config::SiteConfig;
use crate::dom::{self, Listener};
use crate::error::SiteError;
use crate::form::{self, Submitter};
use crate::share;
use crate::validation::{LoosePhoneRule, Validator};
use crate::{counter, nav, reveal};

const LOADING_CLASS: &str = "loading";
const SKIP_LINK_CLASS: &str = "skip-link";

/// Everything attached to the page. Dropping it detaches all of it.
pub struct Site {
    _listeners: Vec<Listener>,
    _reveal: Option<reveal::Reveal>,
    _globals: Globals,
}

impl Site {
    /// Keeps the wiring alive for the rest of the page's life.
    pub fn leak(self) {
        std::mem::forget(self);
    }
}

/// Functions published on `window` for inline `onclick` handlers.
struct Globals {
    window: Window,
    installed: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl Globals {
    fn new(window: &Window) -> Self {
        Self {
            window: window.clone(),
            installed: Vec::new(),
        }
    }

    fn install<F>(&mut self, name: &'static str, f: F) -> Result<(), SiteError>
    where
        F: FnMut() + 'static,
    {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        Reflect::set(&self.window, &JsValue::from_str(name), closure.as_ref())?;
        self.installed.push((name, closure));
        Ok(())
    }
}

impl Drop for Globals {
    fn drop(&mut self) {
        for (name, _) in &self.installed {
            let _ = Reflect::delete_property(&self.window, &JsValue::from_str(name));
        }
    }
}

fn install_globals(window: &Window, document: &Document, config: &Rc<SiteConfig>) -> Result<Globals, SiteError> {
    let mut globals = Globals::new(window);

    {
        let (window, document, config) = (window.clone(), document.clone(), config.clone());
        globals.install("scrollToForm", move || share::scroll_to_form(&window, &document, &config))?;
    }
    {
        let (window, config) = (window.clone(), config.clone());
        globals.install("callNow", move || {
            if let Err(e) = share::call_now(&window, &config) {
                error!("callNow failed: {}", e);
            }
        })?;
    }
    {
        let window = window.clone();
        globals.install("shareOnFacebook", move || {
            if let Err(e) = share::share_on_facebook(&window) {
                error!("shareOnFacebook failed: {}", e);
            }
        })?;
    }
    {
        let (window, config) = (window.clone(), config.clone());
        globals.install("shareOnTwitter", move || {
            if let Err(e) = share::share_on_twitter(&window, &config) {
                error!("shareOnTwitter failed: {}", e);
            }
        })?;
    }
    globals.install("openContactModal", share::open_contact_modal)?;

    Ok(globals)
}

fn supports_service_worker(window: &Window) -> bool {
    Reflect::has(&window.navigator(), &JsValue::from_str("serviceWorker")).unwrap_or(false)
}

fn register_service_worker(window: &Window, path: String) {
    let container = window.navigator().service_worker();
    spawn_local(async move {
        match JsFuture::from(container.register(&path)).await {
            Ok(_) => info!("ServiceWorker registration successful"),
            Err(e) => info!("ServiceWorker registration failed: {:?}", e),
        }
    });
}

/// Work that waits for the `load` event.
fn on_page_loaded(window: &Window, document: &Document, config: &SiteConfig) {
    if let Some(performance) = window.performance() {
        info!("Page loaded in {}ms", performance.now().round());
    }
    if let Some(body) = document.body() {
        let _ = body.class_list().remove_1(LOADING_CLASS);
    }
    if supports_service_worker(window) {
        register_service_worker(window, config.service_worker_path.clone());
    }
}

fn skip_link_focused(document: &Document) -> bool {
    document
        .active_element()
        .map(|el| el.class_list().contains(SKIP_LINK_CLASS))
        .unwrap_or(false)
}

pub fn init(window: &Window, config: SiteConfig, submitter: Rc<dyn Submitter>) -> Result<Site, SiteError> {
    let document = window.document().ok_or(SiteError::NoDocument)?;
    let config = Rc::new(config);
    let body = document.body().ok_or(SiteError::NoBody)?;
    body.class_list().add_1(LOADING_CLASS)?;

    let mut listeners = nav::init(window, &document, &config)?;

    let validator = Validator::new(Rc::new(LoosePhoneRule {
        min_length: config.phone_min_length,
    }));
    listeners.extend(form::init(&document, &config, validator, submitter)?);

    let reveal = reveal::init(&document, &config)?;
    counter::init(&document, &config)?;

    listeners.push(Listener::new(window, "error", |event| {
        match event.dyn_ref::<ErrorEvent>() {
            Some(event) => gloo_console::error!("JavaScript error:", event.error()),
            None => gloo_console::error!("JavaScript error:", event.clone()),
        }
    })?);

    let key_document = document.clone();
    listeners.push(Listener::new(&document, "keydown", move |event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if key.key() == "Tab" && !key.shift_key() && skip_link_focused(&key_document) {
            event.prevent_default();
            if let Some(main) = dom::query(&key_document, "main").and_then(|el| el.dyn_into::<HtmlElement>().ok()) {
                let _ = main.focus();
            }
        }
    })?);

    if document.ready_state() == "complete" {
        on_page_loaded(window, &document, &config);
    } else {
        let (load_window, load_document, load_config) = (window.clone(), document.clone(), config.clone());
        listeners.push(Listener::new(window, "load", move |_| {
            on_page_loaded(&load_window, &load_document, &load_config);
        })?);
    }

    let globals = install_globals(window, &document, &config)?;

    debug!("Site wired with {} listeners", listeners.len());
    Ok(Site {
        _listeners: listeners,
        _reveal: reveal,
        _globals: globals,
    })
}
