// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout` / `requestAnimationFrame` host.
//!
//! [`WebHost`] arms at most one browser timer and one animation frame on
//! behalf of an [`UpdateManager`]. When either fires, the host forwards a
//! [`Trigger`] to the callback it was built with; the embedder hands it to
//! [`UpdateManager::dispatch`].
//!
//! Animation-frame callbacks receive a [`DOMHighResTimeStamp`][mdn]
//! (milliseconds from the same origin as `performance.now()`), which becomes
//! the [`Trigger::Display`] frame time in microsecond ticks.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`UpdateManager`]: lamina_core::manager::UpdateManager
//! [`UpdateManager::dispatch`]: lamina_core::manager::UpdateManager::dispatch

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use lamina_core::host::{FrameHandle, Host, TimerHandle, Trigger};
use lamina_core::time::{Duration, HostTime, Timebase};

// Direct global bindings instead of `web_sys::Window` methods; the globals
// exist in both window and worker scopes.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, millis: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type Dispatch = RefCell<Box<dyn FnMut(Trigger)>>;

/// A [`Host`] driven by the browser event loop.
///
/// Dropping the host cancels whatever it still has armed.
pub struct WebHost {
    dispatch: Rc<Dispatch>,
    on_timeout: Closure<dyn FnMut()>,
    on_frame: Closure<dyn FnMut(f64)>,
    timer: Option<i32>,
    frame: Option<i32>,
}

impl WebHost {
    /// Creates a host that forwards fired triggers to `dispatch`.
    ///
    /// `dispatch` runs on a fresh browser task, never from inside
    /// [`set_timer`](Host::set_timer) or [`request_frame`](Host::request_frame).
    pub fn new(dispatch: impl FnMut(Trigger) + 'static) -> Self {
        let dispatch: Rc<Dispatch> = Rc::new(RefCell::new(Box::new(dispatch)));

        let weak = Rc::downgrade(&dispatch);
        let on_timeout = Closure::wrap(Box::new(move || {
            forward(&weak, Trigger::Process);
        }) as Box<dyn FnMut()>);

        let weak = Rc::downgrade(&dispatch);
        let on_frame = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            forward(&weak, Trigger::Display(crate::millis_to_host_time(timestamp_ms)));
        }) as Box<dyn FnMut(f64)>);

        Self {
            dispatch,
            on_timeout,
            on_frame,
            timer: None,
            frame: None,
        }
    }

    /// Whether a timer is armed and has not been cleared.
    ///
    /// A timer that already fired still counts until the manager clears or
    /// re-arms it.
    #[must_use]
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether a frame is requested and has not been cancelled.
    #[must_use]
    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }
}

fn forward(dispatch: &Weak<Dispatch>, trigger: Trigger) {
    let Some(dispatch) = dispatch.upgrade() else {
        return;
    };
    // Nested delivery (a callback fired from inside another) is dropped.
    let Ok(mut dispatch) = dispatch.try_borrow_mut() else {
        tracing::warn!(?trigger, "trigger delivered re-entrantly; dropped");
        return;
    };
    (*dispatch)(trigger);
}

impl Host for WebHost {
    fn now(&self) -> HostTime {
        crate::now()
    }

    fn timebase(&self) -> Timebase {
        crate::timebase()
    }

    fn set_timer(&mut self, delay: Duration) -> TimerHandle {
        let millis = crate::delay_to_timeout_millis(delay);
        let id = set_timeout(self.on_timeout.as_ref().unchecked_ref(), millis);
        self.timer = Some(id);
        tracing::trace!(millis, id, "setTimeout");
        TimerHandle(id)
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        clear_timeout(handle.0);
        if self.timer == Some(handle.0) {
            self.timer = None;
        }
    }

    fn request_frame(&mut self) -> FrameHandle {
        let id = request_animation_frame(self.on_frame.as_ref().unchecked_ref());
        self.frame = Some(id);
        FrameHandle(id)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        cancel_animation_frame(handle.0);
        if self.frame == Some(handle.0) {
            self.frame = None;
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        if let Some(id) = self.timer.take() {
            clear_timeout(id);
        }
        if let Some(id) = self.frame.take() {
            cancel_animation_frame(id);
        }
    }
}

impl core::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebHost")
            .field("timer", &self.timer)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
