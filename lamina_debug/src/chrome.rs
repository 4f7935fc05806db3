// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Process and display passes land on separate tracks; the adaptive delay is
//! a counter track.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use lamina_core::time::Timebase;
use lamina_core::trace::{PassKind, TriggerKind};

use crate::recorder::{RecordedEvent, decode};

fn pass_track(kind: PassKind) -> (u32, &'static str) {
    match kind {
        PassKind::Process => (0, "Process"),
        PassKind::Display => (1, "Display"),
    }
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut process_started = 0_u64;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PassBegin(e) => {
                if e.kind == PassKind::Process {
                    process_started = e.timestamp.ticks();
                }
                let (tid, name) = pass_track(e.kind);
                events.push(json!({
                    "ph": "B",
                    "name": name,
                    "cat": "Pass",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": tid,
                    "args": {
                        "pass_index": e.pass_index,
                        "immediate": e.immediate,
                    }
                }));
            }
            RecordedEvent::PassEnd(e) => {
                let (tid, name) = pass_track(e.kind);
                events.push(json!({
                    "ph": "E",
                    "name": name,
                    "cat": "Pass",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": tid,
                    "args": {
                        "pass_index": e.pass_index,
                        "roots": e.roots,
                        "failures": e.failures,
                    }
                }));
            }
            RecordedEvent::DelayChanged(e) => {
                // Stamped at the end of the process pass that was measured.
                let ts = process_started.saturating_add(e.elapsed.ticks());
                events.push(json!({
                    "ph": "C",
                    "name": "UpdateDelay",
                    "cat": "Scheduler",
                    "ts": ticks_to_us(ts, timebase),
                    "pid": 0,
                    "args": {
                        "delay_us": ticks_to_us(e.current.ticks(), timebase),
                    }
                }));
            }
            RecordedEvent::Trigger(e) => {
                let name = match e.kind {
                    TriggerKind::ProcessTimer => "ProcessTimer",
                    TriggerKind::DisplayFrame => "DisplayFrame",
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Trigger",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": 2,
                    "s": "t",
                    "args": {
                        "action": format!("{:?}", e.action),
                        "delay_us": ticks_to_us(e.delay.ticks(), timebase),
                    }
                }));
            }
            RecordedEvent::Visibility(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": if e.visible { "Shown" } else { "Hidden" },
                    "cat": "Environment",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                }));
            }
            RecordedEvent::RootFailure(e) => {
                let (tid, _) = pass_track(e.kind);
                events.push(json!({
                    "ph": "i",
                    "name": "RootFailure",
                    "cat": "Pass",
                    "ts": ticks_to_us(e.timestamp.ticks(), timebase),
                    "pid": 0,
                    "tid": tid,
                    "s": "t",
                    "args": {
                        "pass_index": e.pass_index,
                        "root": format!("{:?}", e.root),
                        "node": e.node.map(|n| format!("{n:?}")),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use lamina_core::time::{Duration, HostTime};
    use lamina_core::trace::{
        DelayChangedEvent, PassBeginEvent, PassEndEvent, TraceSink, TriggerAction, TriggerEvent,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_trigger(&TriggerEvent {
            kind: TriggerKind::DisplayFrame,
            action: TriggerAction::Fired,
            timestamp: HostTime(1_000_000),
            delay: Duration::ZERO,
        });
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 4,
            kind: PassKind::Display,
            timestamp: HostTime(1_000_000),
            immediate: false,
        });
        rec.on_pass_end(&PassEndEvent {
            pass_index: 4,
            kind: PassKind::Display,
            timestamp: HostTime(1_000_100),
            roots: 1,
            failures: 0,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "DisplayFrame");

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "Display");
        assert_eq!(parsed[1]["tid"], 1);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["ts"], 1000.1);
    }

    #[test]
    fn delay_counter_follows_its_pass() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 1,
            kind: PassKind::Process,
            timestamp: HostTime(10_000_000),
            immediate: false,
        });
        rec.on_delay_changed(&DelayChangedEvent {
            pass_index: 1,
            previous: Duration(0),
            current: Duration(2_000_000),
            elapsed: Duration(30_000_000),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[1]["ph"], "C");
        assert_eq!(parsed[1]["ts"], 40_000.0);
        assert_eq!(parsed[1]["args"]["delay_us"], 2_000.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
