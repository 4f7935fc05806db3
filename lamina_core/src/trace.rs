// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the update loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`UpdateManager`](crate::manager::UpdateManager) calls as it arms
//! triggers, runs passes, and adapts its delay. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Text logging (power transitions, isolated root failures) goes through the
//! `tracing` crate instead and is independent of this feature.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use crate::time::{Duration, HostTime};
use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which pass is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Logical-state pass (resize, scroll, change, animate).
    Process,
    /// Visual-output pass (layout, render, composite).
    Display,
}

/// Which pending trigger an event concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// The delay timer that fires a process pass.
    ProcessTimer,
    /// The frame callback that fires a display pass.
    DisplayFrame,
}

/// What happened to a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerAction {
    /// The trigger was armed with the host.
    Scheduled,
    /// The trigger was cancelled before it fired.
    Cancelled,
    /// The host delivered the trigger.
    Fired,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassBeginEvent {
    /// Monotonic pass counter, shared by process and display passes.
    pub pass_index: u64,
    /// Which pass is starting.
    pub kind: PassKind,
    /// Host time at the start of the pass.
    pub timestamp: HostTime,
    /// Whether the pass runs inline for an immediate update.
    pub immediate: bool,
}

/// Marks the end of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which pass is ending.
    pub kind: PassKind,
    /// Host time at the end of the pass.
    pub timestamp: HostTime,
    /// Number of roots cascaded.
    pub roots: u32,
    /// Number of roots whose cascade failed.
    pub failures: u32,
}

/// Emitted when a process pass changes the adaptive update delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayChangedEvent {
    /// Pass counter of the measured pass.
    pub pass_index: u64,
    /// Delay before the pass.
    pub previous: Duration,
    /// Delay after adaptation.
    pub current: Duration,
    /// Measured pass duration.
    pub elapsed: Duration,
}

/// Emitted when a trigger is scheduled, cancelled, or fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Which trigger.
    pub kind: TriggerKind,
    /// What happened to it.
    pub action: TriggerAction,
    /// Host time of the action.
    pub timestamp: HostTime,
    /// Requested delay, for scheduled process timers.
    pub delay: Duration,
}

/// Emitted when the host environment changes visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityEvent {
    /// Host time of the transition.
    pub timestamp: HostTime,
    /// The new visibility.
    pub visible: bool,
}

/// Emitted when one root's cascade fails and the pass continues without it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootFailureEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which pass.
    pub kind: PassKind,
    /// The failing root.
    pub root: NodeId,
    /// The node whose hook failed, if known.
    pub node: Option<NodeId>,
    /// Host time the failure was observed.
    pub timestamp: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives update-loop trace events.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when a pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a pass ends.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called after a process pass adapts the update delay.
    fn on_delay_changed(&mut self, e: &DelayChangedEvent) {
        _ = e;
    }

    /// Called when a trigger is scheduled, cancelled, or fired.
    fn on_trigger(&mut self, e: &TriggerEvent) {
        _ = e;
    }

    /// Called on visibility transitions.
    fn on_visibility(&mut self, e: &VisibilityEvent) {
        _ = e;
    }

    /// Called when a root's cascade fails.
    fn on_root_failure(&mut self, e: &RootFailureEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Zero-overhead tracing wrapper.
///
/// When the `trace` feature is off every method is an empty inline function.
/// When on, each method checks whether a sink is present and dispatches.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer with no sink.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Records the start of a pass.
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Records the end of a pass.
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Records a delay adaptation.
    #[inline]
    pub fn delay_changed(&mut self, e: &DelayChangedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delay_changed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Records a trigger action.
    #[inline]
    pub fn trigger(&mut self, e: &TriggerEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_trigger(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Records a visibility transition.
    #[inline]
    pub fn visibility(&mut self, e: &VisibilityEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_visibility(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Records an isolated root failure.
    #[inline]
    pub fn root_failure(&mut self, e: &RootFailureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_root_failure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
