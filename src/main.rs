use std::rc::Rc;

use log::{error, info};
use web_sys::window;

mod config;
mod counter;
mod dom;
mod error;
mod form;
mod nav;
mod page;
mod reveal;
mod share;
mod validation;
mod components {
    pub mod notification;
}

use config::SiteConfig;
use error::SiteError;
use form::SimulatedSubmitter;

fn start() -> Result<(), SiteError> {
    let window = window().ok_or(SiteError::NoWindow)?;
    let document = window.document().ok_or(SiteError::NoDocument)?;

    let config = SiteConfig::from_document(&document);
    let submitter = Rc::new(SimulatedSubmitter {
        delay_ms: config.submit_delay_ms,
    });

    page::init(&window, config, submitter)?.leak();
    Ok(())
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("Starting site scripts");
    if let Err(e) = start() {
        error!("Site scripts not started: {}", e);
    }
}
