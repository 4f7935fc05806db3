// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! and durations are converted to microseconds using a [`Timebase`].

use std::io::Write;

use lamina_core::time::{Duration, HostTime, Timebase};
use lamina_core::trace::{
    DelayChangedEvent, PassBeginEvent, PassEndEvent, PassKind, RootFailureEvent, TraceSink,
    TriggerAction, TriggerEvent, TriggerKind, VisibilityEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn at(&self, t: HostTime) -> f64 {
        self.us(t.ticks())
    }

    fn span(&self, d: Duration) -> f64 {
        self.us(d.ticks())
    }
}

fn pass_name(kind: PassKind) -> &'static str {
    match kind {
        PassKind::Process => "process",
        PassKind::Display => "display",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let immediate = if e.immediate { " immediate" } else { "" };
        let _ = writeln!(
            self.writer,
            "[pass:begin] #{} {}{immediate} at {:.1}µs",
            e.pass_index,
            pass_name(e.kind),
            self.at(e.timestamp),
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] #{} {} at {:.1}µs roots={} failures={}",
            e.pass_index,
            pass_name(e.kind),
            self.at(e.timestamp),
            e.roots,
            e.failures,
        );
    }

    fn on_delay_changed(&mut self, e: &DelayChangedEvent) {
        let _ = writeln!(
            self.writer,
            "[delay] #{} {:.1}µs -> {:.1}µs (pass took {:.1}µs)",
            e.pass_index,
            self.span(e.previous),
            self.span(e.current),
            self.span(e.elapsed),
        );
    }

    fn on_trigger(&mut self, e: &TriggerEvent) {
        let kind = match e.kind {
            TriggerKind::ProcessTimer => "timer",
            TriggerKind::DisplayFrame => "frame",
        };
        let action = match e.action {
            TriggerAction::Scheduled => "scheduled",
            TriggerAction::Cancelled => "cancelled",
            TriggerAction::Fired => "fired",
        };
        if e.action == TriggerAction::Scheduled && e.kind == TriggerKind::ProcessTimer {
            let _ = writeln!(
                self.writer,
                "[{kind}] {action} at {:.1}µs delay={:.1}µs",
                self.at(e.timestamp),
                self.span(e.delay),
            );
        } else {
            let _ = writeln!(
                self.writer,
                "[{kind}] {action} at {:.1}µs",
                self.at(e.timestamp)
            );
        }
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        let state = if e.visible { "shown" } else { "hidden" };
        let _ = writeln!(
            self.writer,
            "[visibility] {state} at {:.1}µs",
            self.at(e.timestamp)
        );
    }

    fn on_root_failure(&mut self, e: &RootFailureEvent) {
        let _ = writeln!(
            self.writer,
            "[root:FAILED] #{} {} root={:?} node={:?}",
            e.pass_index,
            pass_name(e.kind),
            e.root,
            e.node,
        );
    }
}
