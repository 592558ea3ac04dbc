use log::{error, info, Level};
use serde::Deserialize;
use web_sys::Document;

use crate::error::SiteError;

/// Id of the optional `<script type="application/json">` block that overrides defaults.
pub const CONFIG_ELEMENT_ID: &str = "site-config";

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

/// Every tunable the controllers read. Defaults match the live site.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub header_scroll_threshold: f64,
    pub header_offset: f64,
    pub form_scroll_offset: f64,
    pub focus_settle_ms: u32,
    pub submit_delay_ms: u32,
    pub notification_timeout_ms: u32,
    pub counter_tick_ms: u32,
    pub counter_steps: u32,
    pub stagger_step_ms: u32,
    pub reveal_threshold: f64,
    pub reveal_bottom_margin_px: u32,
    pub phone_min_length: usize,
    pub phone_number: String,
    pub share_text: String,
    pub service_worker_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            header_scroll_threshold: 100.0,
            header_offset: 80.0,
            form_scroll_offset: 100.0,
            focus_settle_ms: 500,
            submit_delay_ms: 2000,
            notification_timeout_ms: 5000,
            counter_tick_ms: 20,
            counter_steps: 100,
            stagger_step_ms: 100,
            reveal_threshold: 0.1,
            reveal_bottom_margin_px: 50,
            phone_min_length: 10,
            phone_number: "(207)351-7663".to_string(),
            share_text: "Check out Mainely Roofing LLC - Professional Roofing Services in Portland, ME"
                .to_string(),
            service_worker_path: "/sw.js".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_json(raw: &str) -> Result<Self, SiteError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Overrides from `raw`; a bad block is logged and the defaults are used.
    pub fn from_overrides(raw: &str) -> Self {
        match Self::from_json(raw) {
            Ok(config) => config,
            Err(e) => {
                error!("Ignoring site config overrides: {}", e);
                Self::default()
            }
        }
    }

    /// Reads `script#site-config` if the page carries one, defaults otherwise.
    pub fn from_document(document: &Document) -> Self {
        match document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content())
        {
            Some(raw) if !raw.trim().is_empty() => {
                info!("Loading site config overrides");
                Self::from_overrides(&raw)
            }
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_site() {
        let config = SiteConfig::default();
        assert_eq!(config.header_scroll_threshold, 100.0);
        assert_eq!(config.header_offset, 80.0);
        assert_eq!(config.submit_delay_ms, 2000);
        assert_eq!(config.notification_timeout_ms, 5000);
        assert_eq!(config.phone_number, "(207)351-7663");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = SiteConfig::from_json(r#"{"submit_delay_ms": 10, "phone_number": "555"}"#)
            .expect("parse");
        assert_eq!(config.submit_delay_ms, 10);
        assert_eq!(config.phone_number, "555");
        assert_eq!(config.counter_tick_ms, 20);
        assert_eq!(config.service_worker_path, "/sw.js");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = SiteConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, SiteError::Config(_)));
    }

    #[test]
    fn bad_override_falls_back_to_defaults() {
        let config = SiteConfig::from_overrides(r#"{"submit_delay_ms": 1500, "phone_min_length": "10"}"#);
        assert_eq!(config, SiteConfig::default());

        let config = SiteConfig::from_overrides("{not json");
        assert_eq!(config.submit_delay_ms, 2000);
    }

    #[test]
    fn good_override_is_applied() {
        let config = SiteConfig::from_overrides(r#"{"phone_min_length": 11}"#);
        assert_eq!(config.phone_min_length, 11);
    }
}
