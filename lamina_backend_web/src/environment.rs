// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page visibility and viewport tracking.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};

use kurbo::Size;
use lamina_core::env::Viewport;

/// A change in the browser environment, ready to hand to
/// [`UpdateManager::visibility_changed`] or
/// [`UpdateManager::viewport_changed`].
///
/// [`UpdateManager::visibility_changed`]: lamina_core::manager::UpdateManager::visibility_changed
/// [`UpdateManager::viewport_changed`]: lamina_core::manager::UpdateManager::viewport_changed
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnvironmentEvent {
    /// The document became visible (`true`) or hidden (`false`).
    Visibility(bool),
    /// The window was resized or its pixel ratio changed.
    Viewport(Viewport),
}

/// Listens for `visibilitychange` on the document and `resize` on the
/// window, forwarding each as an [`EnvironmentEvent`].
///
/// Listeners are removed when the watcher is dropped.
pub struct EnvironmentWatcher {
    window: web_sys::Window,
    document: web_sys::Document,
    on_visibility: Closure<dyn FnMut()>,
    on_resize: Closure<dyn FnMut()>,
}

impl EnvironmentWatcher {
    /// Installs the listeners.
    ///
    /// Returns `None` outside a window context (e.g. in a worker).
    pub fn new(callback: impl FnMut(EnvironmentEvent) + 'static) -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;

        let callback: Rc<RefCell<dyn FnMut(EnvironmentEvent)>> = Rc::new(RefCell::new(callback));

        let visibility_doc = document.clone();
        let visibility_cb = callback.clone();
        let on_visibility = Closure::wrap(Box::new(move || {
            let visible = !visibility_doc.hidden();
            if let Ok(mut cb) = visibility_cb.try_borrow_mut() {
                cb(EnvironmentEvent::Visibility(visible));
            }
        }) as Box<dyn FnMut()>);

        let resize_window = window.clone();
        let on_resize = Closure::wrap(Box::new(move || {
            let viewport = viewport_of(&resize_window);
            if let Ok(mut cb) = callback.try_borrow_mut() {
                cb(EnvironmentEvent::Viewport(viewport));
            }
        }) as Box<dyn FnMut()>);

        if let Err(err) = document.add_event_listener_with_callback(
            "visibilitychange",
            on_visibility.as_ref().unchecked_ref(),
        ) {
            tracing::error!(?err, "failed to listen for visibilitychange");
        }
        if let Err(err) =
            window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
        {
            tracing::error!(?err, "failed to listen for resize");
        }

        Some(Self {
            window,
            document,
            on_visibility,
            on_resize,
        })
    }

    /// Whether the document is currently visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.document.hidden()
    }

    /// The current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        viewport_of(&self.window)
    }
}

fn viewport_of(window: &web_sys::Window) -> Viewport {
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    let size = Size::new(
        dimension(window.inner_width()),
        dimension(window.inner_height()),
    );
    Viewport::new(size).with_pixel_ratio(window.device_pixel_ratio())
}

impl Drop for EnvironmentWatcher {
    fn drop(&mut self) {
        _ = self.document.remove_event_listener_with_callback(
            "visibilitychange",
            self.on_visibility.as_ref().unchecked_ref(),
        );
        _ = self
            .window
            .remove_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref());
    }
}

impl core::fmt::Debug for EnvironmentWatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EnvironmentWatcher").finish_non_exhaustive()
    }
}
