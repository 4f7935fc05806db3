// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for lamina.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebHost`]: a [`Host`] backed by `setTimeout` and
//!   `requestAnimationFrame`, forwarding [`Trigger`]s to a callback
//! - [`EnvironmentWatcher`]: `visibilitychange` and `resize` listeners
//!
//! A typical embedding shares the tree and manager behind an `Rc<RefCell<_>>`
//! and dispatches from the callbacks:
//!
//! ```rust,ignore
//! let app = Rc::new(RefCell::new(None::<(NodeTree, UpdateManager<WebHost>)>));
//! let weak = Rc::downgrade(&app);
//! let host = WebHost::new(move |trigger| {
//!     if let Some(app) = weak.upgrade()
//!         && let Some((tree, manager)) = &mut *app.borrow_mut()
//!     {
//!         manager.dispatch(tree, trigger);
//!     }
//! });
//! ```

mod environment;
mod host;

pub use environment::{EnvironmentEvent, EnvironmentWatcher};
pub use host::WebHost;
pub use lamina_core::host::{Host, Trigger};

use lamina_core::time::{Duration, HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    millis_to_host_time(host::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// Converts a `DOMHighResTimeStamp` (milliseconds) to microsecond ticks.
pub(crate) fn millis_to_host_time(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "DOMHighResTimeStamp is a small positive f64; µs fits in u64"
    )]
    let us = (ms.max(0.0) * 1000.0) as u64;
    HostTime(us)
}

/// Converts a microsecond delay to the whole milliseconds `setTimeout`
/// takes, rounding up so a timer never fires early.
pub(crate) fn delay_to_timeout_millis(delay: Duration) -> i32 {
    let ms = delay.ticks().div_ceil(1000);
    i32::try_from(ms).unwrap_or(i32::MAX)
}
