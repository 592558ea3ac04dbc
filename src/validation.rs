//! Field rules for the estimate form.

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[1-9][0-9]{0,15}$").expect("phone pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid phone number")]
    InvalidPhone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Tel,
    Other,
}

impl FieldKind {
    /// Maps an input's `type` attribute.
    pub fn from_input_type(input_type: &str) -> Self {
        match input_type {
            "email" => FieldKind::Email,
            "tel" => FieldKind::Tel,
            _ => FieldKind::Other,
        }
    }
}

/// What the rules need to know about a field at blur time.
#[derive(Debug, Clone)]
pub struct FieldInput<'a> {
    pub kind: FieldKind,
    pub required: bool,
    pub value: &'a str,
}

pub trait PhoneRule {
    fn accepts(&self, raw: &str) -> bool;
}

/// Plausibility check only: optional `+`, no leading zero, at most 16 digits,
/// and at least `min_length` characters once separators are stripped.
#[derive(Debug, Clone)]
pub struct LoosePhoneRule {
    pub min_length: usize,
}

impl Default for LoosePhoneRule {
    fn default() -> Self {
        Self { min_length: 10 }
    }
}

impl PhoneRule for LoosePhoneRule {
    fn accepts(&self, raw: &str) -> bool {
        let cleaned = strip_phone_separators(raw);
        PHONE_PATTERN.is_match(&cleaned) && cleaned.chars().count() >= self.min_length
    }
}

pub fn strip_phone_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

#[derive(Clone)]
pub struct Validator {
    phone_rule: Rc<dyn PhoneRule>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Rc::new(LoosePhoneRule::default()))
    }
}

impl Validator {
    pub fn new(phone_rule: Rc<dyn PhoneRule>) -> Self {
        Self { phone_rule }
    }

    /// Applies the rules in order and stops at the first failure.
    pub fn validate(&self, field: &FieldInput<'_>) -> Result<(), FieldError> {
        let value = field.value.trim();

        if field.required && value.is_empty() {
            return Err(FieldError::Required);
        }
        if value.is_empty() {
            return Ok(());
        }

        match field.kind {
            FieldKind::Email if !is_valid_email(value) => Err(FieldError::InvalidEmail),
            FieldKind::Tel if !self.phone_rule.accepts(value) => Err(FieldError::InvalidPhone),
            _ => Ok(()),
        }
    }
}
