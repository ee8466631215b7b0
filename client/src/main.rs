mod app;
mod config;
mod controls;
mod logging;
mod mapbox;
mod playback;
mod runtime;
mod surface;

use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

use terrasync_shared::ViewerConfig;

use crate::app::App;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();

    let loaded = config::load();
    let level = loaded
        .as_ref()
        .map(ViewerConfig::log_level)
        .unwrap_or("info");
    logging::init(level);
    let config = loaded.unwrap_or_else(|error| {
        tracing::warn!(%error, "TERRASYNC_CONFIG rejected, using defaults");
        ViewerConfig::default()
    });

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        tracing::error!("no mount target");
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop an earlier mount first so its effects tear their maps down.
        drop(slot.borrow_mut().take());
        let handle = mount_to(target, move || view! { <App config=config /> });
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
