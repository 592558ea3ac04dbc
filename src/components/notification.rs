use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, MouseEvent};
use yew::prelude::*;
use yew::AppHandle;
use yew_hooks::prelude::*;

use crate::error::SiteError;

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Success,
    Failure(String),
}

#[derive(Properties, PartialEq)]
pub struct NotificationProps {
    pub notice: Notice,
    pub timeout_ms: u32,
    pub on_close: Callback<()>,
}

#[function_component(Notification)]
pub fn notification(props: &NotificationProps) -> Html {
    {
        let on_close = props.on_close.clone();
        use_timeout(move || on_close.emit(()), props.timeout_ms);
    }

    let close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| on_close.emit(()))
    };

    let (alert_class, icon, title, message) = match &props.notice {
        Notice::Success => (
            "alert-success",
            "fa-check-circle",
            "Success!",
            "Your estimate request has been submitted. We'll contact you soon!".to_string(),
        ),
        Notice::Failure(reason) => (
            "alert-danger",
            "fa-exclamation-triangle",
            "Sorry!",
            format!("We couldn't send your request ({}). Please call us instead.", reason),
        ),
    };

    html! {
        <div
            class={classes!("alert", alert_class, "alert-dismissible", "fade", "show", "position-fixed")}
            style="top: 100px; right: 20px; z-index: 9999; min-width: 300px;"
            role="alert"
        >
            <i class={classes!("fas", icon, "me-2")}></i>
            <strong>{title}</strong>{" "}{message}
            <button type="button" class="btn-close" aria-label="Close" onclick={close}></button>
        </div>
    }
}

/// Mounts an independent banner on `<body>`. It removes itself after
/// `timeout_ms` or when its close button is clicked.
pub fn show(document: &Document, notice: Notice, timeout_ms: u32) -> Result<(), SiteError> {
    let body = document.body().ok_or(SiteError::NoBody)?;
    let host = document.create_element("div")?;
    host.set_class_name("notification-host");
    body.append_child(&host)?;

    let handle: Rc<RefCell<Option<AppHandle<Notification>>>> = Rc::default();
    let on_close = {
        let handle = handle.clone();
        let host = host.clone();
        Callback::from(move |_: ()| {
            let handle = handle.clone();
            let host = host.clone();
            // Unmount outside the component's own callback.
            spawn_local(async move {
                let app = handle.borrow_mut().take();
                if let Some(app) = app {
                    debug!("Removing notification");
                    app.destroy();
                    host.remove();
                }
            });
        })
    };

    let app = yew::Renderer::<Notification>::with_root_and_props(
        host,
        NotificationProps { notice, timeout_ms, on_close },
    )
    .render();
    *handle.borrow_mut() = Some(app);
    Ok(())
}
