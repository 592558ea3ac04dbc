//! Estimate form: inline field errors and the submit cycle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use gloo_timers::future::TimeoutFuture;
use log::{debug, error, info, warn};
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement,
};

use crate::components::notification::{self, Notice};
use crate::config::SiteConfig;
use crate::dom::{self, Listener};
use crate::error::SiteError;
use crate::validation::{FieldError, FieldInput, FieldKind, Validator};

pub const FORM_ID: &str = "estimateForm";
pub const VALIDATED_FIELDS: &str = "input[required], select[required]";
const SUBMIT_BUTTON: &str = "button[type=\"submit\"]";
const INVALID_CLASS: &str = "is-invalid";
const FEEDBACK_CLASS: &str = "invalid-feedback";
const BUSY_LABEL_HTML: &str = r#"<i class="fas fa-spinner fa-spin me-2"></i>Sending..."#;

/// Name/value pairs of the named controls at submit time.
pub type FormPayload = Vec<(String, String)>;

pub type SubmitFuture = LocalBoxFuture<'static, Result<(), SubmitError>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rejected by the form service: {0}")]
    Rejected(String),
    #[error("the form service timed out")]
    Timeout,
}

/// Delivers a filled-in form somewhere.
pub trait Submitter {
    fn submit(&self, payload: FormPayload) -> SubmitFuture;
}

/// Stand-in for a real form backend: waits, then always succeeds.
pub struct SimulatedSubmitter {
    pub delay_ms: u32,
}

impl Submitter for SimulatedSubmitter {
    fn submit(&self, payload: FormPayload) -> SubmitFuture {
        let delay_ms = self.delay_ms;
        async move {
            debug!("Simulating submission of {} fields", payload.len());
            TimeoutFuture::new(delay_ms).await;
            Ok(())
        }
        .boxed_local()
    }
}

/// The form as seen by the submit cycle.
pub trait FormView {
    fn is_busy(&self) -> bool;
    fn payload(&self) -> FormPayload;
    /// Disables the submit control and shows the busy label.
    fn enter_busy(&self);
    /// Re-enables the submit control with its original label.
    fn leave_busy(&self);
    fn reset(&self);
    fn notify(&self, notice: Notice);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    Failed(SubmitError),
    /// A submission was already in flight.
    Ignored,
}

pub async fn run_submission<V>(view: &V, submitter: &dyn Submitter) -> SubmitOutcome
where
    V: FormView + ?Sized,
{
    if view.is_busy() {
        debug!("Submit ignored, form is busy");
        return SubmitOutcome::Ignored;
    }

    view.enter_busy();
    match submitter.submit(view.payload()).await {
        Ok(()) => {
            info!("Estimate request submitted");
            view.notify(Notice::Success);
            view.reset();
            view.leave_busy();
            SubmitOutcome::Submitted
        }
        Err(e) => {
            error!("Estimate request failed: {}", e);
            view.notify(Notice::Failure(e.to_string()));
            view.leave_busy();
            SubmitOutcome::Failed(e)
        }
    }
}

/// A form control as the browser's form-data rules see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: String,
    pub value: String,
    pub disabled: bool,
    pub role: ControlRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRole {
    Value,
    Checkable { checked: bool },
    /// Buttons and file pickers contribute no text value.
    Excluded,
}

impl ControlRole {
    pub fn from_input_type(input_type: &str, checked: bool) -> Self {
        match input_type {
            "checkbox" | "radio" => ControlRole::Checkable { checked },
            "submit" | "button" | "reset" | "image" | "file" => ControlRole::Excluded,
            _ => ControlRole::Value,
        }
    }
}

/// Keeps what a native submit would send: named, enabled, and checked when checkable.
pub fn collect_payload<I>(controls: I) -> FormPayload
where
    I: IntoIterator<Item = Control>,
{
    controls
        .into_iter()
        .filter(|c| !c.name.is_empty() && !c.disabled)
        .filter(|c| match c.role {
            ControlRole::Value => true,
            ControlRole::Checkable { checked } => checked,
            ControlRole::Excluded => false,
        })
        .map(|c| (c.name, c.value))
        .collect()
}

/// A validated control and its inline error.
pub trait FieldView {
    fn kind(&self) -> FieldKind;
    fn is_required(&self) -> bool;
    fn value(&self) -> String;
    /// Shows `message`; callers clear any previous error first.
    fn show_error(&self, message: &str);
    fn clear_error(&self);
}

/// Blur handling: re-run the rules and leave at most one error behind.
pub fn check_field<F>(field: &F, validator: &Validator) -> Result<(), FieldError>
where
    F: FieldView + ?Sized,
{
    let value = field.value();
    let result = validator.validate(&FieldInput {
        kind: field.kind(),
        required: field.is_required(),
        value: &value,
    });
    field.clear_error();
    if let Err(e) = &result {
        field.show_error(&e.to_string());
    }
    result
}

/// Input handling: drop the error without re-validating.
pub fn edit_field<F>(field: &F)
where
    F: FieldView + ?Sized,
{
    field.clear_error();
}

/// Reads what the rules need from an `<input>`, `<select>` or `<textarea>`.
fn field_value(field: &Element) -> Option<(FieldKind, String)> {
    if let Some(input) = field.dyn_ref::<HtmlInputElement>() {
        return Some((FieldKind::from_input_type(&input.type_()), input.value()));
    }
    if let Some(select) = field.dyn_ref::<HtmlSelectElement>() {
        return Some((FieldKind::Other, select.value()));
    }
    field
        .dyn_ref::<HtmlTextAreaElement>()
        .map(|area| (FieldKind::Other, area.value()))
}

fn control(el: &Element) -> Option<Control> {
    let name = el.get_attribute("name")?;
    let (role, value) = if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        (ControlRole::from_input_type(&input.type_(), input.checked()), input.value())
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        (ControlRole::Value, select.value())
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        (ControlRole::Value, area.value())
    } else {
        return None;
    };
    Some(Control {
        name,
        value,
        // Also true inside a disabled fieldset.
        disabled: el.matches(":disabled").unwrap_or(false),
        role,
    })
}

fn show_field_error(document: &Document, field: &Element, message: &str) -> Result<(), SiteError> {
    field.class_list().add_1(INVALID_CLASS)?;

    let feedback = document.create_element("div")?;
    feedback.set_class_name(FEEDBACK_CLASS);
    feedback.set_text_content(Some(message));
    field.insert_adjacent_element("afterend", &feedback)?;
    Ok(())
}

fn clear_field_error(field: &Element) {
    let _ = field.class_list().remove_1(INVALID_CLASS);
    if let Some(next) = field.next_element_sibling() {
        if next.class_list().contains(FEEDBACK_CLASS) {
            next.remove();
        }
    }
}

#[derive(Clone)]
struct DomField {
    document: Document,
    element: Element,
}

impl FieldView for DomField {
    fn kind(&self) -> FieldKind {
        field_value(&self.element)
            .map(|(kind, _)| kind)
            .unwrap_or(FieldKind::Other)
    }

    fn is_required(&self) -> bool {
        self.element.has_attribute("required")
    }

    fn value(&self) -> String {
        field_value(&self.element)
            .map(|(_, value)| value)
            .unwrap_or_default()
    }

    fn show_error(&self, message: &str) {
        if let Err(e) = show_field_error(&self.document, &self.element, message) {
            warn!("Could not show field error: {}", e);
        }
    }

    fn clear_error(&self) {
        clear_field_error(&self.element);
    }
}

#[derive(Clone)]
struct EstimateForm {
    document: Document,
    form: HtmlFormElement,
    button: Option<HtmlButtonElement>,
    busy: Rc<Cell<bool>>,
    original_label: Rc<RefCell<Option<String>>>,
    notification_timeout_ms: u32,
}

impl FormView for EstimateForm {
    fn is_busy(&self) -> bool {
        self.busy.get()
    }

    fn payload(&self) -> FormPayload {
        collect_payload(
            dom::query_all_within(&self.form, "[name]")
                .iter()
                .filter_map(control),
        )
    }

    fn enter_busy(&self) {
        self.busy.set(true);
        if let Some(button) = &self.button {
            *self.original_label.borrow_mut() = button.text_content();
            button.set_disabled(true);
            button.set_inner_html(BUSY_LABEL_HTML);
        }
    }

    fn leave_busy(&self) {
        if let Some(button) = &self.button {
            let label = self.original_label.borrow_mut().take();
            button.set_text_content(label.as_deref());
            button.set_disabled(false);
        }
        self.busy.set(false);
    }

    fn reset(&self) {
        self.form.reset();
        for field in dom::query_all_within(&self.form, &format!(".{}", INVALID_CLASS)) {
            clear_field_error(&field);
        }
    }

    fn notify(&self, notice: Notice) {
        if let Err(e) = notification::show(&self.document, notice, self.notification_timeout_ms) {
            error!("Could not show notification: {}", e);
        }
    }
}

pub fn init(
    document: &Document,
    config: &SiteConfig,
    validator: Validator,
    submitter: Rc<dyn Submitter>,
) -> Result<Vec<Listener>, SiteError> {
    let mut listeners = Vec::new();

    let form = document
        .get_element_by_id(FORM_ID)
        .and_then(|el| el.dyn_into::<HtmlFormElement>().ok());
    if let Some(form) = form {
        let button = form
            .query_selector(SUBMIT_BUTTON)?
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok());
        let view = EstimateForm {
            document: document.clone(),
            form: form.clone(),
            button,
            busy: Rc::new(Cell::new(false)),
            original_label: Rc::default(),
            notification_timeout_ms: config.notification_timeout_ms,
        };
        listeners.push(Listener::new(&form, "submit", move |event| {
            event.prevent_default();
            let view = view.clone();
            let submitter = submitter.clone();
            spawn_local(async move {
                run_submission(&view, submitter.as_ref()).await;
            });
        })?);
    } else {
        debug!("No #{} on this page", FORM_ID);
    }

    for element in dom::query_all(document, VALIDATED_FIELDS)? {
        let field = DomField {
            document: document.clone(),
            element: element.clone(),
        };

        let blur_field = field.clone();
        let blur_validator = validator.clone();
        listeners.push(Listener::new(&element, "blur", move |_| {
            let _ = check_field(&blur_field, &blur_validator);
        })?);

        listeners.push(Listener::new(&element, "input", move |_| {
            edit_field(&field);
        })?);
    }

    debug!("Form handling wired with {} listeners", listeners.len());
    Ok(listeners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Busy,
        Idle,
        Reset,
        Notified(Notice),
    }

    #[derive(Default)]
    struct RecordingView {
        busy: Cell<bool>,
        steps: RefCell<Vec<Step>>,
    }

    impl RecordingView {
        fn steps(&self) -> Vec<Step> {
            self.steps.borrow().clone()
        }
    }

    impl FormView for RecordingView {
        fn is_busy(&self) -> bool {
            self.busy.get()
        }

        fn payload(&self) -> FormPayload {
            vec![("name".to_string(), "Pat".to_string())]
        }

        fn enter_busy(&self) {
            self.busy.set(true);
            self.steps.borrow_mut().push(Step::Busy);
        }

        fn leave_busy(&self) {
            self.busy.set(false);
            self.steps.borrow_mut().push(Step::Idle);
        }

        fn reset(&self) {
            self.steps.borrow_mut().push(Step::Reset);
        }

        fn notify(&self, notice: Notice) {
            self.steps.borrow_mut().push(Step::Notified(notice));
        }
    }

    struct Instant(Result<(), SubmitError>);

    impl Submitter for Instant {
        fn submit(&self, _payload: FormPayload) -> SubmitFuture {
            futures::future::ready(self.0.clone()).boxed_local()
        }
    }

    /// Resolves when the test sends on the channel.
    struct Gated(RefCell<Option<oneshot::Receiver<Result<(), SubmitError>>>>);

    impl Submitter for Gated {
        fn submit(&self, _payload: FormPayload) -> SubmitFuture {
            let rx = self.0.borrow_mut().take();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(Err(SubmitError::Timeout)),
                    None => Err(SubmitError::Rejected("submitted twice".to_string())),
                }
            }
            .boxed_local()
        }
    }

    #[test]
    fn success_notifies_once_then_resets_and_restores() {
        let view = RecordingView::default();
        let outcome = block_on(run_submission(&view, &Instant(Ok(()))));

        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert_eq!(
            view.steps(),
            vec![Step::Busy, Step::Notified(Notice::Success), Step::Reset, Step::Idle]
        );
        assert!(!view.is_busy());
    }

    #[test]
    fn failure_keeps_fields_and_restores_button() {
        let view = RecordingView::default();
        let err = SubmitError::Network("offline".to_string());
        let outcome = block_on(run_submission(&view, &Instant(Err(err.clone()))));

        assert_eq!(outcome, SubmitOutcome::Failed(err.clone()));
        assert_eq!(
            view.steps(),
            vec![Step::Busy, Step::Notified(Notice::Failure(err.to_string())), Step::Idle]
        );
    }

    #[test]
    fn busy_while_in_flight_and_second_submit_is_ignored() {
        let (tx, rx) = oneshot::channel();
        let view = Rc::new(RecordingView::default());
        let submitter = Rc::new(Gated(RefCell::new(Some(rx))));

        let mut pool = LocalPool::new();
        let first = {
            let view = view.clone();
            let submitter = submitter.clone();
            pool.spawner()
                .spawn_local_with_handle(async move { run_submission(&*view, &*submitter).await })
                .expect("spawn")
        };
        pool.run_until_stalled();

        assert!(view.is_busy());
        assert_eq!(view.steps(), vec![Step::Busy]);

        let second = block_on(run_submission(&*view, &*submitter));
        assert_eq!(second, SubmitOutcome::Ignored);
        assert_eq!(view.steps(), vec![Step::Busy]);

        tx.send(Ok(())).expect("send");
        let outcome = pool.run_until(first);
        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert!(!view.is_busy());
        let notices = view
            .steps()
            .into_iter()
            .filter(|s| matches!(s, Step::Notified(_)))
            .count();
        assert_eq!(notices, 1);
    }

    struct FakeField {
        kind: FieldKind,
        value: RefCell<String>,
        errors: RefCell<Vec<String>>,
    }

    impl FakeField {
        fn new(kind: FieldKind, value: &str) -> Self {
            Self {
                kind,
                value: RefCell::new(value.to_string()),
                errors: RefCell::new(Vec::new()),
            }
        }

        fn errors(&self) -> Vec<String> {
            self.errors.borrow().clone()
        }
    }

    impl FieldView for FakeField {
        fn kind(&self) -> FieldKind {
            self.kind
        }

        fn is_required(&self) -> bool {
            true
        }

        fn value(&self) -> String {
            self.value.borrow().clone()
        }

        fn show_error(&self, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }

        fn clear_error(&self) {
            self.errors.borrow_mut().clear();
        }
    }

    #[test]
    fn repeated_blur_leaves_one_error() {
        let field = FakeField::new(FieldKind::Other, "");
        let validator = Validator::default();

        assert_eq!(check_field(&field, &validator), Err(FieldError::Required));
        assert_eq!(check_field(&field, &validator), Err(FieldError::Required));
        assert_eq!(field.errors(), vec!["This field is required".to_string()]);
    }

    #[test]
    fn typing_clears_error_without_revalidating() {
        let field = FakeField::new(FieldKind::Email, "a@b");
        let validator = Validator::default();

        assert_eq!(check_field(&field, &validator), Err(FieldError::InvalidEmail));
        assert_eq!(field.errors().len(), 1);

        *field.value.borrow_mut() = "a@".to_string();
        edit_field(&field);
        assert!(field.errors().is_empty());
    }

    #[test]
    fn valid_blur_clears_previous_error() {
        let field = FakeField::new(FieldKind::Tel, "123");
        let validator = Validator::default();

        assert_eq!(check_field(&field, &validator), Err(FieldError::InvalidPhone));
        *field.value.borrow_mut() = "(207) 351-7663".to_string();
        assert_eq!(check_field(&field, &validator), Ok(()));
        assert!(field.errors().is_empty());
    }

    fn named_control(name: &str, value: &str, role: ControlRole) -> Control {
        Control {
            name: name.to_string(),
            value: value.to_string(),
            disabled: false,
            role,
        }
    }

    #[test]
    fn payload_sends_only_the_checked_radio() {
        let payload = collect_payload(vec![
            named_control("roof", "shingle", ControlRole::from_input_type("radio", true)),
            named_control("roof", "metal", ControlRole::from_input_type("radio", false)),
        ]);
        assert_eq!(payload, vec![("roof".to_string(), "shingle".to_string())]);
    }

    #[test]
    fn payload_skips_disabled_unchecked_and_buttons() {
        let mut disabled = named_control("notes", "old", ControlRole::Value);
        disabled.disabled = true;

        let payload = collect_payload(vec![
            named_control("name", "Pat", ControlRole::from_input_type("text", false)),
            disabled,
            named_control("newsletter", "on", ControlRole::from_input_type("checkbox", false)),
            named_control("gutters", "on", ControlRole::from_input_type("checkbox", true)),
            named_control("send", "Send", ControlRole::from_input_type("submit", false)),
            named_control("", "anonymous", ControlRole::Value),
        ]);
        assert_eq!(
            payload,
            vec![
                ("name".to_string(), "Pat".to_string()),
                ("gutters".to_string(), "on".to_string()),
            ]
        );
    }
}
