use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::config::SiteConfig;
use crate::dom;
use crate::error::SiteError;

pub const COUNTER_ATTR: &str = "data-count";
pub const STAGGERED_SELECTOR: &str = ".service-card";

/// Integer prefix of `raw`, read the way browsers read `parseInt`.
pub fn parse_count(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    // Only overflow can fail here; clamp like a huge float target would.
    Some(sign * digits.parse::<i64>().unwrap_or(i64::MAX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Show(i64),
    Done(i64),
}

/// Linear count from 0 to `target` in fixed increments.
#[derive(Debug, Clone)]
pub struct CounterAnimation {
    target: i64,
    increment: f64,
    current: f64,
}

impl CounterAnimation {
    pub fn new(target: i64, steps: u32) -> Self {
        Self {
            target,
            increment: target as f64 / steps.max(1) as f64,
            current: 0.0,
        }
    }

    /// True when there is nothing to count, e.g. a zero target.
    pub fn is_finished(&self) -> bool {
        self.current >= self.target as f64
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn tick(&mut self) -> Tick {
        self.current += self.increment;
        if self.is_finished() {
            Tick::Done(self.target)
        } else {
            Tick::Show(self.current.floor() as i64)
        }
    }
}

pub fn stagger_delay(index: usize, step_ms: u32) -> String {
    format!("{}ms", index as u64 * step_ms as u64)
}

fn start_counter(element: Element, mut animation: CounterAnimation, tick_ms: u32) {
    if animation.is_finished() {
        element.set_text_content(Some(&animation.target().to_string()));
        return;
    }

    let handle: Rc<RefCell<Option<Interval>>> = Rc::new(RefCell::new(None));
    let handle_clone = handle.clone();
    let interval = Interval::new(tick_ms, move || match animation.tick() {
        Tick::Show(value) => element.set_text_content(Some(&value.to_string())),
        Tick::Done(target) => {
            element.set_text_content(Some(&target.to_string()));
            if let Some(interval) = handle_clone.borrow_mut().take() {
                drop(interval);
            }
        }
    });
    *handle.borrow_mut() = Some(interval);
}

pub fn init(document: &Document, config: &SiteConfig) -> Result<(), SiteError> {
    for element in dom::query_all(document, &format!("[{}]", COUNTER_ATTR))? {
        let raw = element.get_attribute(COUNTER_ATTR).unwrap_or_default();
        match parse_count(&raw) {
            Some(target) => {
                start_counter(element, CounterAnimation::new(target, config.counter_steps), config.counter_tick_ms)
            }
            None => warn!("Skipping counter with non-numeric {}=\"{}\"", COUNTER_ATTR, raw),
        }
    }

    let cards = dom::query_all(document, STAGGERED_SELECTOR)?;
    for (index, card) in cards.iter().enumerate() {
        if let Some(card) = card.dyn_ref::<HtmlElement>() {
            card.style()
                .set_property("animation-delay", &stagger_delay(index, config.stagger_step_ms))?;
        }
    }
    debug!("Staggered {} cards", cards.len());
    Ok(())
}
