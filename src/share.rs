use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, Window};

use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;

pub const FORM_SECTION_SELECTOR: &str = ".estimate-form";
const FACEBOOK_SHARER: &str = "https://www.facebook.com/sharer/sharer.php";
const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet";
const POPUP_FEATURES: &str = "width=600,height=400";

pub fn facebook_share_url(page_url: &str) -> String {
    format!("{}?u={}", FACEBOOK_SHARER, urlencoding::encode(page_url))
}

pub fn twitter_share_url(page_url: &str, text: &str) -> String {
    format!(
        "{}?url={}&text={}",
        TWITTER_INTENT,
        urlencoding::encode(page_url),
        urlencoding::encode(text)
    )
}

pub fn tel_href(number: &str) -> String {
    format!("tel:{}", number)
}

pub fn scroll_to_form(window: &Window, document: &Document, config: &SiteConfig) {
    let Some(section) = dom::query(document, FORM_SECTION_SELECTOR)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        debug!("No {} to scroll to", FORM_SECTION_SELECTOR);
        return;
    };

    dom::smooth_scroll_to(window, section.offset_top() as f64 - config.form_scroll_offset);

    Timeout::new(config.focus_settle_ms, move || {
        let first_input = section
            .query_selector("input")
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        if let Some(input) = first_input {
            let _ = input.focus();
        }
    })
    .forget();
}

pub fn call_now(window: &Window, config: &SiteConfig) -> Result<(), SiteError> {
    info!("Dialing {}", config.phone_number);
    window.location().set_href(&tel_href(&config.phone_number))?;
    Ok(())
}

fn open_popup(window: &Window, url: &str) -> Result<(), SiteError> {
    if window
        .open_with_url_and_target_and_features(url, "_blank", POPUP_FEATURES)?
        .is_none()
    {
        warn!("Share popup was blocked");
    }
    Ok(())
}

pub fn share_on_facebook(window: &Window) -> Result<(), SiteError> {
    let page_url = window.location().href()?;
    open_popup(window, &facebook_share_url(&page_url))
}

pub fn share_on_twitter(window: &Window, config: &SiteConfig) -> Result<(), SiteError> {
    let page_url = window.location().href()?;
    open_popup(window, &twitter_share_url(&page_url, &config.share_text))
}

pub fn open_contact_modal() {
    info!("Contact modal would open here");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facebook_url_encodes_page() {
        assert_eq!(
            facebook_share_url("https://mainelyroofing.com/?a=1&b=2"),
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fmainelyroofing.com%2F%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn twitter_url_carries_text() {
        let url = twitter_share_url("https://mainelyroofing.com/", "Roofs, ME");
        assert_eq!(
            url,
            "https://twitter.com/intent/tweet?url=https%3A%2F%2Fmainelyroofing.com%2F&text=Roofs%2C%20ME"
        );
    }

    #[test]
    fn dial_link_keeps_number_as_is() {
        let config = SiteConfig::default();
        assert_eq!(tel_href(&config.phone_number), "tel:(207)351-7663");
    }
}
