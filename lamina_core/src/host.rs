// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract: clock, delay timers, and frame callbacks.
//!
//! The [`UpdateManager`](crate::manager::UpdateManager) never blocks or
//! spawns. It asks its [`Host`] to arm at most one delay timer (for the next
//! process pass) and at most one frame callback (for the next display pass),
//! and the host hands the corresponding [`Trigger`] back through
//! [`UpdateManager::dispatch`](crate::manager::UpdateManager::dispatch) when
//! it fires. Because the manager owns the host, a host cannot call back into
//! the manager synchronously; it queues the trigger and the embedding event
//! loop dispatches it on its next turn.
//!
//! Backend crates provide real hosts (`lamina_backend_web::WebHost`).
//! [`ManualHost`] is the deterministic in-process implementation used by
//! tests and simulations.

use std::cell::Cell;
use std::rc::Rc;

use crate::time::{Duration, HostTime, Timebase};

/// Identifier of an armed delay timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

/// Identifier of a requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// A host callback delivered back to the update manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The process delay timer fired.
    Process,
    /// A frame callback fired with the host's frame timestamp.
    Display(HostTime),
}

/// The event loop the update manager schedules against.
pub trait Host {
    /// Current monotonic time.
    fn now(&self) -> HostTime;

    /// Tick units of [`now`](Self::now).
    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }

    /// Arms a one-shot timer that delivers [`Trigger::Process`] after `delay`.
    fn set_timer(&mut self, delay: Duration) -> TimerHandle;

    /// Disarms a timer. Unknown or already-fired handles are ignored.
    fn clear_timer(&mut self, handle: TimerHandle);

    /// Requests a one-shot frame callback that delivers [`Trigger::Display`].
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancels a frame callback. Unknown or already-fired handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// A shared, manually advanced clock.
///
/// Clones observe the same time, so a test (or a node hook simulating
/// expensive work) can advance the clock a [`ManualHost`] reads.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    /// A clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        HostTime(self.0.get())
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get().saturating_add(by.ticks()));
    }

    /// Moves the clock to `time` if that is later than now.
    pub fn advance_to(&self, time: HostTime) {
        if time.ticks() > self.0.get() {
            self.0.set(time.ticks());
        }
    }
}

/// A deterministic host driven by hand.
///
/// Armed triggers are recorded rather than fired; [`next_trigger`] takes the
/// one that would fire first, moving the clock forward to its due time.
///
/// [`next_trigger`]: Self::next_trigger
#[derive(Debug)]
pub struct ManualHost {
    clock: ManualClock,
    timebase: Timebase,
    frame_interval: Duration,
    next_handle: i32,
    timer: Option<(TimerHandle, HostTime)>,
    frame: Option<FrameHandle>,
    timers_armed: u32,
    frames_requested: u32,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    /// A host at time zero whose frames fire immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(ManualClock::new())
    }

    /// A host reading a shared clock.
    #[must_use]
    pub fn with_clock(clock: ManualClock) -> Self {
        Self {
            clock,
            timebase: Timebase::NANOS,
            frame_interval: Duration::ZERO,
            next_handle: 1,
            timer: None,
            frame: None,
            timers_armed: 0,
            frames_requested: 0,
        }
    }

    /// Aligns frame callbacks to multiples of `interval` (a simulated vsync).
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Reports `timebase` as the unit of this host's ticks.
    #[must_use]
    pub fn with_timebase(mut self, timebase: Timebase) -> Self {
        self.timebase = timebase;
        self
    }

    /// A handle to the clock this host reads.
    #[must_use]
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// The armed timer and its due time.
    #[must_use]
    pub fn pending_timer(&self) -> Option<(TimerHandle, HostTime)> {
        self.timer
    }

    /// The requested frame callback.
    #[must_use]
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    /// Total timers armed so far.
    #[must_use]
    pub fn timers_armed(&self) -> u32 {
        self.timers_armed
    }

    /// Total frame callbacks requested so far.
    #[must_use]
    pub fn frames_requested(&self) -> u32 {
        self.frames_requested
    }

    /// Takes the trigger that fires first, advancing the clock to it.
    ///
    /// Frames fire at the next vsync boundary; timers at their due time.
    /// When both are pending the earlier one wins.
    pub fn next_trigger(&mut self) -> Option<Trigger> {
        let frame_due = self.frame.map(|_| self.next_vsync());
        match (self.timer, frame_due) {
            (Some((_, timer_due)), Some(frame_due)) if timer_due < frame_due => {
                self.fire_timer(timer_due)
            }
            (_, Some(frame_due)) => {
                self.frame = None;
                self.clock.advance_to(frame_due);
                Some(Trigger::Display(frame_due))
            }
            (Some((_, timer_due)), None) => self.fire_timer(timer_due),
            (None, None) => None,
        }
    }

    fn fire_timer(&mut self, due: HostTime) -> Option<Trigger> {
        self.timer = None;
        self.clock.advance_to(due);
        Some(Trigger::Process)
    }

    fn next_vsync(&self) -> HostTime {
        let now = self.clock.now().ticks();
        let interval = self.frame_interval.ticks();
        if interval == 0 {
            return HostTime(now);
        }
        HostTime((now / interval + 1) * interval)
    }

    fn allocate_handle(&mut self) -> i32 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        handle
    }
}

impl Host for ManualHost {
    fn now(&self) -> HostTime {
        self.clock.now()
    }

    fn timebase(&self) -> Timebase {
        self.timebase
    }

    fn set_timer(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.allocate_handle());
        let due = self.clock.now() + delay;
        self.timer = Some((handle, due));
        self.timers_armed += 1;
        handle
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        if self.timer.is_some_and(|(armed, _)| armed == handle) {
            self.timer = None;
        }
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.allocate_handle());
        self.frame = Some(handle);
        self.frames_requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.frame == Some(handle) {
            self.frame = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_clock_is_observed_by_host() {
        let host = ManualHost::new();
        let clock = host.clock();
        clock.advance(Duration(250));
        assert_eq!(host.now(), HostTime(250));
        clock.advance_to(HostTime(100));
        assert_eq!(host.now(), HostTime(250), "clock never runs backwards");
    }

    #[test]
    fn timer_fires_at_its_due_time() {
        let mut host = ManualHost::new();
        host.set_timer(Duration(40));
        assert_eq!(host.next_trigger(), Some(Trigger::Process));
        assert_eq!(host.now(), HostTime(40));
        assert_eq!(host.next_trigger(), None);
    }

    #[test]
    fn cleared_handles_do_not_fire() {
        let mut host = ManualHost::new();
        let timer = host.set_timer(Duration(10));
        let frame = host.request_frame();
        host.clear_timer(timer);
        host.cancel_frame(frame);
        assert_eq!(host.next_trigger(), None);
        assert_eq!(host.timers_armed(), 1);
        assert_eq!(host.frames_requested(), 1);
    }

    #[test]
    fn frames_align_to_vsync() {
        let mut host = ManualHost::new().with_frame_interval(Duration(16));
        host.clock().advance(Duration(5));
        host.request_frame();
        assert_eq!(host.next_trigger(), Some(Trigger::Display(HostTime(16))));
        assert_eq!(host.now(), HostTime(16));
    }

    #[test]
    fn earlier_trigger_fires_first() {
        let mut host = ManualHost::new().with_frame_interval(Duration(16));
        host.set_timer(Duration(4));
        host.request_frame();
        assert_eq!(host.next_trigger(), Some(Trigger::Process));
        assert_eq!(host.next_trigger(), Some(Trigger::Display(HostTime(16))));
    }

    #[test]
    fn stale_handles_are_ignored() {
        let mut host = ManualHost::new();
        let old = host.set_timer(Duration(10));
        let new = host.set_timer(Duration(20));
        assert_ne!(old, new);
        host.clear_timer(old);
        assert_eq!(host.pending_timer().map(|(h, _)| h), Some(new));
    }
}
