use std::rc::Rc;

use log::debug;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Window};

use crate::config::SiteConfig;
use crate::dom::{self, Listener};
use crate::error::SiteError;

pub const HEADER_SELECTOR: &str = ".main-header";
pub const NAV_LINK_SELECTOR: &str = ".nav-link";
pub const MOBILE_MENU_SELECTOR: &str = ".navbar-collapse";
const MENU_OPEN_CLASS: &str = "show";
const ELEVATED_CLASS: &str = "shadow-lg";
const ELEVATED_BACKGROUND: &str = "rgba(255, 255, 255, 0.95)";
const ELEVATED_BLUR: &str = "blur(10px)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderStyle {
    Default,
    Elevated,
}

pub fn header_style(scroll_y: f64, threshold: f64) -> HeaderStyle {
    if scroll_y > threshold {
        HeaderStyle::Elevated
    } else {
        HeaderStyle::Default
    }
}

/// Selector for an in-page anchor, or None when the link leaves the page
/// or points at nothing (`#`).
pub fn anchor_selector(href: &str) -> Option<&str> {
    if href.starts_with('#') && href.len() > 1 {
        Some(href)
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkClick<'a> {
    /// Let the browser navigate.
    Follow,
    /// Suppress the jump and scroll to the selector, if any.
    ScrollTo(Option<&'a str>),
}

pub fn link_click(href: &str) -> LinkClick<'_> {
    if href.starts_with('#') {
        LinkClick::ScrollTo(anchor_selector(href))
    } else {
        LinkClick::Follow
    }
}

pub fn scroll_destination(target_offset_top: f64, header_offset: f64) -> f64 {
    target_offset_top - header_offset
}

fn apply_header_style(header: &HtmlElement, style: HeaderStyle) {
    let css = header.style();
    match style {
        HeaderStyle::Elevated => {
            let _ = header.class_list().add_1(ELEVATED_CLASS);
            let _ = css.set_property("background-color", ELEVATED_BACKGROUND);
            let _ = css.set_property("backdrop-filter", ELEVATED_BLUR);
        }
        HeaderStyle::Default => {
            let _ = header.class_list().remove_1(ELEVATED_CLASS);
            let _ = css.remove_property("background-color");
            let _ = css.remove_property("backdrop-filter");
        }
    }
}

fn close_mobile_menu(menu: &Element) {
    if menu.class_list().contains(MENU_OPEN_CLASS) {
        debug!("Collapsing mobile menu");
        let _ = menu.class_list().remove_1(MENU_OPEN_CLASS);
    }
}

pub fn init(window: &Window, document: &Document, config: &SiteConfig) -> Result<Vec<Listener>, SiteError> {
    let mut listeners = Vec::new();

    if let Some(header) = dom::query(document, HEADER_SELECTOR).and_then(|el| el.dyn_into::<HtmlElement>().ok()) {
        let threshold = config.header_scroll_threshold;
        let scroll_window = window.clone();
        listeners.push(Listener::new(window, "scroll", move |_| {
            let scroll_y = scroll_window.scroll_y().unwrap_or(0.0);
            apply_header_style(&header, header_style(scroll_y, threshold));
        })?);
    }

    let menu = Rc::new(dom::query(document, MOBILE_MENU_SELECTOR));
    let header_offset = config.header_offset;
    for link in dom::query_all(document, NAV_LINK_SELECTOR)? {
        let window = window.clone();
        let document = document.clone();
        let menu = menu.clone();
        let click_link = link.clone();
        listeners.push(Listener::new(&link, "click", move |event| {
            let href = click_link.get_attribute("href").unwrap_or_default();
            if let LinkClick::ScrollTo(selector) = link_click(&href) {
                event.prevent_default();
                let target = selector
                    .and_then(|selector| dom::query(&document, selector))
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok());
                if let Some(target) = target {
                    dom::smooth_scroll_to(&window, scroll_destination(target.offset_top() as f64, header_offset));
                }
            }
            if let Some(menu) = &*menu {
                close_mobile_menu(menu);
            }
        })?);
    }

    debug!("Navigation wired with {} listeners", listeners.len());
    Ok(listeners)
}
