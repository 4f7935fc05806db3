// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use lamina_core::time::{Duration, HostTime};
use lamina_core::trace::{
    DelayChangedEvent, PassBeginEvent, PassEndEvent, PassKind, RootFailureEvent, TraceSink,
    TriggerAction, TriggerEvent, TriggerKind, VisibilityEvent,
};
use lamina_core::tree::NodeId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_DELAY_CHANGED: u8 = 3;
const TAG_TRIGGER: u8 = 4;
const TAG_VISIBILITY: u8 = 5;
const TAG_ROOT_FAILURE: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_node(&mut self, id: NodeId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_option_node(&mut self, id: Option<NodeId>) {
        match id {
            Some(id) => {
                self.write_u8(1);
                self.write_node(id);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_pass(&mut self, kind: PassKind) {
        self.write_u8(match kind {
            PassKind::Process => 0,
            PassKind::Display => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_pass(e.kind);
        self.write_u64(e.timestamp.ticks());
        self.write_u8(u8::from(e.immediate));
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(e.pass_index);
        self.write_pass(e.kind);
        self.write_u64(e.timestamp.ticks());
        self.write_u32(e.roots);
        self.write_u32(e.failures);
    }

    fn on_delay_changed(&mut self, e: &DelayChangedEvent) {
        self.write_u8(TAG_DELAY_CHANGED);
        self.write_u64(e.pass_index);
        self.write_u64(e.previous.ticks());
        self.write_u64(e.current.ticks());
        self.write_u64(e.elapsed.ticks());
    }

    fn on_trigger(&mut self, e: &TriggerEvent) {
        self.write_u8(TAG_TRIGGER);
        self.write_u8(match e.kind {
            TriggerKind::ProcessTimer => 0,
            TriggerKind::DisplayFrame => 1,
        });
        self.write_u8(match e.action {
            TriggerAction::Scheduled => 0,
            TriggerAction::Cancelled => 1,
            TriggerAction::Fired => 2,
        });
        self.write_u64(e.timestamp.ticks());
        self.write_u64(e.delay.ticks());
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.write_u8(TAG_VISIBILITY);
        self.write_u64(e.timestamp.ticks());
        self.write_u8(u8::from(e.visible));
    }

    fn on_root_failure(&mut self, e: &RootFailureEvent) {
        self.write_u8(TAG_ROOT_FAILURE);
        self.write_u64(e.pass_index);
        self.write_pass(e.kind);
        self.write_node(e.root);
        self.write_option_node(e.node);
        self.write_u64(e.timestamp.ticks());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`DelayChangedEvent`].
    DelayChanged(DelayChangedEvent),
    /// A [`TriggerEvent`].
    Trigger(TriggerEvent),
    /// A [`VisibilityEvent`].
    Visibility(VisibilityEvent),
    /// A [`RootFailureEvent`].
    RootFailure(RootFailureEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_duration(&mut self) -> Option<Duration> {
        self.read_u64().map(Duration)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_node(&mut self) -> Option<NodeId> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(NodeId::from_raw_parts(index, generation))
    }

    fn read_option_node(&mut self) -> Option<Option<NodeId>> {
        let present = self.read_bool()?;
        let id = self.read_node()?;
        Some(present.then_some(id))
    }

    fn read_pass(&mut self) -> Option<PassKind> {
        Some(match self.read_u8()? {
            0 => PassKind::Process,
            _ => PassKind::Display,
        })
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass_index: self.read_u64()?,
            kind: self.read_pass()?,
            timestamp: self.read_time()?,
            immediate: self.read_bool()?,
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassEndEvent {
            pass_index: self.read_u64()?,
            kind: self.read_pass()?,
            timestamp: self.read_time()?,
            roots: self.read_u32()?,
            failures: self.read_u32()?,
        }))
    }

    fn decode_delay_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DelayChanged(DelayChangedEvent {
            pass_index: self.read_u64()?,
            previous: self.read_duration()?,
            current: self.read_duration()?,
            elapsed: self.read_duration()?,
        }))
    }

    fn decode_trigger(&mut self) -> Option<RecordedEvent> {
        let kind = match self.read_u8()? {
            0 => TriggerKind::ProcessTimer,
            _ => TriggerKind::DisplayFrame,
        };
        let action = match self.read_u8()? {
            0 => TriggerAction::Scheduled,
            1 => TriggerAction::Cancelled,
            _ => TriggerAction::Fired,
        };
        Some(RecordedEvent::Trigger(TriggerEvent {
            kind,
            action,
            timestamp: self.read_time()?,
            delay: self.read_duration()?,
        }))
    }

    fn decode_visibility(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Visibility(VisibilityEvent {
            timestamp: self.read_time()?,
            visible: self.read_bool()?,
        }))
    }

    fn decode_root_failure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RootFailure(RootFailureEvent {
            pass_index: self.read_u64()?,
            kind: self.read_pass()?,
            root: self.read_node()?,
            node: self.read_option_node()?,
            timestamp: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_DELAY_CHANGED => self.decode_delay_changed(),
            TAG_TRIGGER => self.decode_trigger(),
            TAG_VISIBILITY => self.decode_visibility(),
            TAG_ROOT_FAILURE => self.decode_root_failure(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
