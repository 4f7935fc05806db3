// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update scheduling with an adaptive process delay.
//!
//! The [`UpdateManager`] decides *when* process and display passes run over
//! its root nodes. It keeps two trigger slots with its [`Host`]:
//!
//! - a **process timer**, armed after `update_delay` when some root has work
//!   and nothing else is outstanding;
//! - a **display frame**, requested after a process pass leaves display work.
//!
//! At most one of the two is outstanding at any time. Every root gets its
//! process pass before any root gets a display pass, so a half-settled tree
//! is never painted.
//!
//! # Adaptive delay
//!
//! Each process pass is timed against `max(update_delay, pass_budget)`. A
//! pass over budget doubles the delay (starting from `delay_step` when the
//! delay is zero, capped at `max_update_delay`); a pass within budget halves
//! it (floored at `min_update_delay`). Bursts of expensive work therefore
//! back off quickly, and idle periods recover low latency.
//!
//! # Failures
//!
//! A root whose cascade fails is reported in the [`PassReport`], logged, and
//! traced as a [`RootFailureEvent`]; the remaining roots still run and the
//! next trigger is scheduled from the roots' flags as usual.

use std::fmt;

use crate::env::Viewport;
use crate::error::{CascadeError, HookResult};
use crate::flags::NodeFlags;
use crate::host::{FrameHandle, Host, TimerHandle, Trigger};
use crate::time::{Duration, HostTime, Timebase};
use crate::trace::{
    DelayChangedEvent, NoopSink, PassBeginEvent, PassEndEvent, PassKind, RootFailureEvent,
    TraceSink, Tracer, TriggerAction, TriggerEvent, TriggerKind, VisibilityEvent,
};
use crate::tree::{NodeId, NodeTree};

/// Pacing parameters for an [`UpdateManager`], in host ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Floor of the adaptive delay.
    pub min_update_delay: Duration,
    /// Ceiling of the adaptive delay.
    pub max_update_delay: Duration,
    /// Smallest non-zero delay reached when backing off from zero.
    pub delay_step: Duration,
    /// Minimum budget a process pass is measured against.
    pub pass_budget: Duration,
    /// Delay used to re-arm the process timer after an immediate update.
    pub max_process_interval: Duration,
}

impl UpdateConfig {
    /// Default pacing for a host whose ticks are in `timebase`.
    ///
    /// 0 ms floor, 167 ms ceiling, 2 ms step, 12 ms budget and 12 ms
    /// post-immediate interval.
    #[must_use]
    pub const fn for_timebase(timebase: Timebase) -> Self {
        Self {
            min_update_delay: Duration::from_millis(0, timebase),
            max_update_delay: Duration::from_millis(167, timebase),
            delay_step: Duration::from_millis(2, timebase),
            pass_budget: Duration::from_millis(12, timebase),
            max_process_interval: Duration::from_millis(12, timebase),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self::for_timebase(Timebase::NANOS)
    }
}

/// A root whose cascade failed during a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RootFailure {
    /// The root that was being cascaded.
    pub root: NodeId,
    /// What went wrong.
    pub error: CascadeError,
}

/// Summary of one process or display pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    /// Monotonic counter shared by both pass kinds.
    pub pass_index: u64,
    /// Which pass ran.
    pub kind: PassKind,
    /// Host time at the start of the pass.
    pub started: HostTime,
    /// Measured duration.
    pub elapsed: Duration,
    /// Number of roots cascaded.
    pub roots: u32,
    /// Roots whose cascade failed.
    pub failures: Vec<RootFailure>,
}

impl PassReport {
    /// Whether every root completed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives process and display passes over a set of root nodes.
///
/// The manager does not own the [`NodeTree`]; every operation that touches
/// nodes borrows it. Construct one manager per tree and pass it by
/// reference to whatever creates roots.
///
/// # Usage
///
/// ```rust,ignore
/// manager.insert_root(&mut tree, root)?;
/// // event loop:
/// while let Some(trigger) = next_host_trigger() {
///     manager.dispatch(&mut tree, trigger);
/// }
/// ```
pub struct UpdateManager<H: Host, S: TraceSink = NoopSink> {
    host: H,
    sink: S,
    config: UpdateConfig,
    roots: Vec<NodeId>,
    update_delay: Duration,
    process_timer: Option<TimerHandle>,
    display_frame: Option<FrameHandle>,
    pass_index: u64,
    visible: bool,
}

impl<H: Host + fmt::Debug, S: TraceSink> fmt::Debug for UpdateManager<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateManager")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("roots", &self.roots)
            .field("update_delay", &self.update_delay)
            .field("process_timer", &self.process_timer)
            .field("display_frame", &self.display_frame)
            .field("pass_index", &self.pass_index)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl<H: Host> UpdateManager<H> {
    /// Creates a manager that discards trace events.
    #[must_use]
    pub fn new(host: H, config: UpdateConfig) -> Self {
        Self::with_sink(host, config, NoopSink)
    }
}

impl<H: Host, S: TraceSink> UpdateManager<H, S> {
    /// Creates a manager that reports to `sink`.
    ///
    /// Events only reach the sink when the `trace` feature is enabled.
    #[must_use]
    pub fn with_sink(host: H, config: UpdateConfig, sink: S) -> Self {
        Self {
            host,
            sink,
            update_delay: config.min_update_delay,
            config,
            roots: Vec::new(),
            process_timer: None,
            display_frame: None,
            pass_index: 0,
            visible: true,
        }
    }

    // -- Accessors --

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The trace sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The pacing configuration.
    #[must_use]
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// The current adaptive delay.
    #[must_use]
    pub fn update_delay(&self) -> Duration {
        self.update_delay
    }

    /// Whether a process timer is armed.
    #[must_use]
    pub fn has_pending_process(&self) -> bool {
        self.process_timer.is_some()
    }

    /// Whether a display frame is requested.
    #[must_use]
    pub fn has_pending_display(&self) -> bool {
        self.display_frame.is_some()
    }

    /// Whether the host environment is visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The managed roots, in insertion order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    // -- Roots --

    /// Adds a root, mounting it and powering it if the environment is
    /// visible, then schedules a resize and layout.
    ///
    /// # Panics
    ///
    /// Panics if `root` is already managed or has a parent.
    pub fn insert_root(&mut self, tree: &mut NodeTree, root: NodeId) -> HookResult {
        assert!(
            !self.roots.contains(&root),
            "node is already a root: {root:?}"
        );
        assert!(
            tree.parent(root).is_none(),
            "root node has a parent: {root:?}"
        );
        self.roots.push(root);
        tree.context_mut().visible = self.visible;

        if !tree.flags(root).is_mounted() {
            tree.mount(root)?;
        }
        if self.visible && !tree.flags(root).is_powered() {
            tree.power(root)?;
        }
        tree.require_update(root, NodeFlags::NEEDS_RESIZE | NodeFlags::NEEDS_LAYOUT);
        self.schedule_process(tree);
        Ok(())
    }

    /// Removes a root, unpowering and unmounting it. Cancels every pending
    /// trigger when no roots remain.
    ///
    /// # Panics
    ///
    /// Panics if `root` is not managed.
    pub fn remove_root(&mut self, tree: &mut NodeTree, root: NodeId) -> HookResult {
        let Some(pos) = self.roots.iter().position(|&r| r == root) else {
            panic!("node is not a root: {root:?}");
        };
        self.roots.remove(pos);
        if self.roots.is_empty() {
            self.cancel_triggers();
        }

        tree.flags[root.slot()].remove(NodeFlags::IMMEDIATE);
        if tree.flags(root).is_mounted() {
            tree.unmount(root)?;
        }
        Ok(())
    }

    // -- Requests --

    /// Requests `flags` on `id` and schedules (or, if `immediate`, runs) the
    /// passes that consume them.
    ///
    /// Returns the reports of any passes run inline.
    pub fn require_update(
        &mut self,
        tree: &mut NodeTree,
        id: NodeId,
        flags: NodeFlags,
        immediate: bool,
    ) -> Vec<PassReport> {
        tree.require_update(id, flags);
        self.request_update(tree, immediate)
    }

    /// Schedules passes for whatever work the roots carry.
    ///
    /// With `immediate`, pending triggers are cancelled and the process and
    /// display passes run inline on the caller's turn. Roots are marked
    /// [`IMMEDIATE`](NodeFlags::IMMEDIATE) for the duration, and leftover
    /// process work is re-armed at `max_process_interval` at the earliest.
    pub fn request_update(&mut self, tree: &mut NodeTree, immediate: bool) -> Vec<PassReport> {
        if !immediate {
            self.schedule_process(tree);
            return Vec::new();
        }
        self.cancel_triggers();
        for &root in &self.roots {
            tree.flags[root.slot()].insert(NodeFlags::IMMEDIATE);
        }

        let mut reports = vec![self.process_pass(tree, true)];
        if self.roots_need(tree, NodeFlags::needs_display) {
            reports.push(self.run_display_pass(tree, true));
        } else {
            self.schedule_process(tree);
        }

        for &root in &self.roots {
            tree.flags[root.slot()].remove(NodeFlags::IMMEDIATE);
        }
        reports
    }

    /// Delivers a host trigger, running the corresponding pass.
    ///
    /// Triggers that are no longer outstanding (cancelled after the host
    /// queued them) are ignored and return `None`.
    pub fn dispatch(&mut self, tree: &mut NodeTree, trigger: Trigger) -> Option<PassReport> {
        match trigger {
            Trigger::Process => {
                self.process_timer.take()?;
                self.trace_trigger(TriggerKind::ProcessTimer, TriggerAction::Fired, Duration::ZERO);
                Some(self.run_process_pass(tree, false))
            }
            Trigger::Display(frame_time) => {
                self.display_frame.take()?;
                self.trace_trigger(TriggerKind::DisplayFrame, TriggerAction::Fired, Duration::ZERO);
                Some(self.display_pass(tree, false, frame_time))
            }
        }
    }

    // -- Passes --

    /// Runs a process pass over every root, adapts the delay, and schedules
    /// the follow-up trigger.
    pub fn run_process_pass(&mut self, tree: &mut NodeTree, immediate: bool) -> PassReport {
        let report = self.process_pass(tree, immediate);
        if self.roots_need(tree, NodeFlags::needs_display) {
            self.schedule_display();
        } else {
            self.schedule_process(tree);
        }
        report
    }

    /// Runs the process cascades and adapts the delay without arming
    /// anything.
    fn process_pass(&mut self, tree: &mut NodeTree, immediate: bool) -> PassReport {
        self.pass_index += 1;
        let started = self.host.now();
        self.begin_pass(tree, PassKind::Process, started, immediate);

        let failures = self.cascade_roots(tree, PassKind::Process, |tree, root| {
            tree.cascade_process(root, NodeFlags::empty())
        });

        let ended = self.host.now();
        let elapsed = ended.saturating_duration_since(started);
        self.adapt_delay(elapsed);
        self.end_pass(PassKind::Process, started, ended, failures)
    }

    /// Runs a display pass over every root, then re-arms the process timer
    /// if work remains.
    pub fn run_display_pass(&mut self, tree: &mut NodeTree, immediate: bool) -> PassReport {
        let now = self.host.now();
        self.display_pass(tree, immediate, now)
    }

    fn display_pass(
        &mut self,
        tree: &mut NodeTree,
        immediate: bool,
        frame_time: HostTime,
    ) -> PassReport {
        self.pass_index += 1;
        let started = self.host.now();
        self.begin_pass(tree, PassKind::Display, frame_time, immediate);

        let failures = self.cascade_roots(tree, PassKind::Display, |tree, root| {
            tree.cascade_display(root, NodeFlags::empty())
        });

        let ended = self.host.now();
        let report = self.end_pass(PassKind::Display, started, ended, failures);
        self.schedule_process(tree);
        report
    }

    fn begin_pass(&mut self, tree: &mut NodeTree, kind: PassKind, time: HostTime, immediate: bool) {
        let context = tree.context_mut();
        context.update_time = time;
        context.visible = self.visible;
        Tracer::new(&mut self.sink).pass_begin(&PassBeginEvent {
            pass_index: self.pass_index,
            kind,
            timestamp: time,
            immediate,
        });
    }

    fn cascade_roots(
        &mut self,
        tree: &mut NodeTree,
        kind: PassKind,
        mut cascade: impl FnMut(&mut NodeTree, NodeId) -> HookResult,
    ) -> Vec<RootFailure> {
        let mut failures = Vec::new();
        for root in self.roots.clone() {
            if let Err(error) = cascade(tree, root) {
                tracing::error!(
                    ?root,
                    %error,
                    pass = self.pass_index,
                    "root cascade failed; continuing with remaining roots"
                );
                Tracer::new(&mut self.sink).root_failure(&RootFailureEvent {
                    pass_index: self.pass_index,
                    kind,
                    root,
                    node: error.node(),
                    timestamp: self.host.now(),
                });
                failures.push(RootFailure { root, error });
            }
        }
        failures
    }

    fn end_pass(
        &mut self,
        kind: PassKind,
        started: HostTime,
        ended: HostTime,
        failures: Vec<RootFailure>,
    ) -> PassReport {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "root and failure counts fit in u32"
        )]
        let (roots, failed) = (self.roots.len() as u32, failures.len() as u32);
        Tracer::new(&mut self.sink).pass_end(&PassEndEvent {
            pass_index: self.pass_index,
            kind,
            timestamp: ended,
            roots,
            failures: failed,
        });
        PassReport {
            pass_index: self.pass_index,
            kind,
            started,
            elapsed: ended.saturating_duration_since(started),
            roots,
            failures,
        }
    }

    fn adapt_delay(&mut self, elapsed: Duration) {
        let previous = self.update_delay;
        let budget = previous.max(self.config.pass_budget);
        self.update_delay = if elapsed > budget {
            previous
                .saturating_mul(2)
                .max(self.config.delay_step)
                .clamp(self.config.min_update_delay, self.config.max_update_delay)
        } else {
            previous.halved().max(self.config.min_update_delay)
        };
        if self.update_delay != previous {
            Tracer::new(&mut self.sink).delay_changed(&DelayChangedEvent {
                pass_index: self.pass_index,
                previous,
                current: self.update_delay,
                elapsed,
            });
        }
    }

    // -- Environment --

    /// Reacts to the host environment becoming visible or hidden.
    ///
    /// Hiding cancels every trigger, resets the delay, and unpowers all
    /// roots. Showing powers them again and requests a resize and scroll.
    /// Repeating the current state is a no-op. Failures are isolated per
    /// root like pass failures.
    pub fn visibility_changed(&mut self, tree: &mut NodeTree, visible: bool) -> Vec<RootFailure> {
        if visible == self.visible {
            return Vec::new();
        }
        self.visible = visible;
        tree.context_mut().visible = visible;
        tracing::debug!(visible, roots = self.roots.len(), "visibility changed");
        Tracer::new(&mut self.sink).visibility(&VisibilityEvent {
            timestamp: self.host.now(),
            visible,
        });

        let mut failures = Vec::new();
        if visible {
            for root in self.roots.clone() {
                let flags = tree.flags(root);
                if flags.is_mounted()
                    && !flags.is_powered()
                    && let Err(error) = tree.power(root)
                {
                    tracing::error!(?root, %error, "failed to power root");
                    failures.push(RootFailure { root, error });
                }
                tree.require_update(root, NodeFlags::NEEDS_RESIZE | NodeFlags::NEEDS_SCROLL);
            }
            self.schedule_process(tree);
        } else {
            self.cancel_triggers();
            self.update_delay = self.config.min_update_delay;
            for root in self.roots.clone() {
                if tree.flags(root).is_powered()
                    && let Err(error) = tree.unpower(root)
                {
                    tracing::error!(?root, %error, "failed to unpower root");
                    failures.push(RootFailure { root, error });
                }
            }
        }
        failures
    }

    /// Records a new viewport and requests a resize and layout on every
    /// root. An unchanged viewport is a no-op.
    pub fn viewport_changed(&mut self, tree: &mut NodeTree, viewport: Viewport) {
        if tree.context().viewport == viewport {
            return;
        }
        tree.context_mut().viewport = viewport;
        for &root in &self.roots {
            tree.require_update(root, NodeFlags::NEEDS_RESIZE | NodeFlags::NEEDS_LAYOUT);
        }
        self.schedule_process(tree);
    }

    // -- Triggers --

    fn schedule_process(&mut self, tree: &NodeTree) {
        if !self.visible || self.process_timer.is_some() || self.display_frame.is_some() {
            return;
        }
        if !self.roots_need(tree, NodeFlags::needs_update) {
            return;
        }
        let after_immediate = self
            .roots
            .iter()
            .any(|&r| tree.flags(r).contains(NodeFlags::IMMEDIATE));
        let delay = if after_immediate {
            self.update_delay.max(self.config.max_process_interval)
        } else {
            self.update_delay
        };
        self.process_timer = Some(self.host.set_timer(delay));
        tracing::trace!(?delay, "process timer armed");
        self.trace_trigger(TriggerKind::ProcessTimer, TriggerAction::Scheduled, delay);
    }

    fn schedule_display(&mut self) {
        if let Some(timer) = self.process_timer.take() {
            self.host.clear_timer(timer);
            self.trace_trigger(TriggerKind::ProcessTimer, TriggerAction::Cancelled, Duration::ZERO);
        }
        if self.display_frame.is_none() {
            self.display_frame = Some(self.host.request_frame());
            self.trace_trigger(TriggerKind::DisplayFrame, TriggerAction::Scheduled, Duration::ZERO);
        }
    }

    fn cancel_triggers(&mut self) {
        if let Some(timer) = self.process_timer.take() {
            self.host.clear_timer(timer);
            self.trace_trigger(TriggerKind::ProcessTimer, TriggerAction::Cancelled, Duration::ZERO);
        }
        if let Some(frame) = self.display_frame.take() {
            self.host.cancel_frame(frame);
            self.trace_trigger(TriggerKind::DisplayFrame, TriggerAction::Cancelled, Duration::ZERO);
        }
    }

    fn trace_trigger(&mut self, kind: TriggerKind, action: TriggerAction, delay: Duration) {
        Tracer::new(&mut self.sink).trigger(&TriggerEvent {
            kind,
            action,
            timestamp: self.host.now(),
            delay,
        });
    }

    /// Whether any idle, live root has work matching `needs`.
    ///
    /// Display bits parked on culled or hidden roots are not work.
    fn roots_need(&self, tree: &NodeTree, needs: fn(NodeFlags) -> bool) -> bool {
        self.roots.iter().any(|&root| {
            let flags = tree.flags(root);
            if !flags.is_traversable() || flags.is_updating() {
                return false;
            }
            let mut pending = flags & (NodeFlags::PROCESS_MASK | NodeFlags::NEEDS_PROCESS);
            if !flags.is_invisible() {
                pending |= flags & (NodeFlags::DISPLAY_MASK | NodeFlags::NEEDS_DISPLAY);
            }
            needs(pending)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use kurbo::Size;

    use super::*;
    use crate::error::Phase;
    use crate::host::{ManualClock, ManualHost};
    use crate::tree::{Group, Node, NodeCx};

    const MS: u64 = 1_000_000;

    fn manager() -> UpdateManager<ManualHost> {
        UpdateManager::new(ManualHost::new(), UpdateConfig::default())
    }

    /// Advances the shared clock by a fixed cost whenever it changes.
    struct Costly {
        clock: ManualClock,
        cost: Rc<RefCell<Duration>>,
    }

    impl Node for Costly {
        fn on_change(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.clock.advance(*self.cost.borrow());
            Ok(())
        }
    }

    #[test]
    fn default_config_is_in_nanoseconds() {
        let config = UpdateConfig::default();
        assert_eq!(config.min_update_delay, Duration::ZERO);
        assert_eq!(config.max_update_delay, Duration(167 * MS));
        assert_eq!(config.delay_step, Duration(2 * MS));
        assert_eq!(config.pass_budget, Duration(12 * MS));
        assert_eq!(config.max_process_interval, Duration(12 * MS));

        let micros = UpdateConfig::for_timebase(Timebase::MICROS);
        assert_eq!(micros.pass_budget, Duration(12_000));
    }

    #[test]
    fn inserting_a_root_mounts_powers_and_arms_the_timer() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Group);
        mgr.insert_root(&mut tree, root).unwrap();

        assert!(tree.flags(root).is_traversable());
        assert!(mgr.has_pending_process());
        assert!(!mgr.has_pending_display());
        assert_eq!(mgr.roots(), [root]);
    }

    #[test]
    #[should_panic(expected = "node is already a root")]
    fn inserting_a_root_twice_panics() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Group);
        mgr.insert_root(&mut tree, root).unwrap();
        mgr.insert_root(&mut tree, root).unwrap();
    }

    #[test]
    #[should_panic(expected = "node is not a root")]
    fn removing_an_unknown_root_panics() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let node = tree.create_node(Group);
        mgr.remove_root(&mut tree, node).unwrap();
    }

    #[test]
    fn process_pass_hands_off_to_a_display_frame() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Group);
        mgr.insert_root(&mut tree, root).unwrap();

        let trigger = mgr.host_mut().next_trigger().unwrap();
        assert_eq!(trigger, Trigger::Process);
        let report = mgr.dispatch(&mut tree, trigger).unwrap();
        assert_eq!(report.kind, PassKind::Process);
        assert!(report.is_ok());
        assert!(mgr.has_pending_display());
        assert!(!mgr.has_pending_process(), "display frame supersedes the timer");

        let trigger = mgr.host_mut().next_trigger().unwrap();
        let report = mgr.dispatch(&mut tree, trigger).unwrap();
        assert_eq!(report.kind, PassKind::Display);
        assert!(!tree.flags(root).needs_update());
        assert!(!mgr.has_pending_process() && !mgr.has_pending_display());
    }

    #[test]
    fn stale_triggers_are_ignored() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        assert!(mgr.dispatch(&mut tree, Trigger::Process).is_none());
        assert!(
            mgr.dispatch(&mut tree, Trigger::Display(HostTime(0)))
                .is_none()
        );
    }

    #[test]
    fn slow_passes_double_the_delay_and_fast_ones_halve_it() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let cost = Rc::new(RefCell::new(Duration(20 * MS)));
        let root = tree.create_node(Costly {
            clock: mgr.host().clock(),
            cost: cost.clone(),
        });
        mgr.insert_root(&mut tree, root).unwrap();

        for expected in [2, 4, 8] {
            tree.require_update(root, NodeFlags::NEEDS_CHANGE);
            mgr.run_process_pass(&mut tree, false);
            assert_eq!(mgr.update_delay(), Duration(expected * MS));
        }

        *cost.borrow_mut() = Duration(MS);
        for expected in [4, 2, 1] {
            tree.require_update(root, NodeFlags::NEEDS_CHANGE);
            mgr.run_process_pass(&mut tree, false);
            assert_eq!(mgr.update_delay(), Duration(expected * MS));
        }
    }

    #[test]
    fn delay_is_capped() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Costly {
            clock: mgr.host().clock(),
            cost: Rc::new(RefCell::new(Duration(500 * MS))),
        });
        mgr.insert_root(&mut tree, root).unwrap();
        for _ in 0..12 {
            tree.require_update(root, NodeFlags::NEEDS_CHANGE);
            mgr.run_process_pass(&mut tree, false);
        }
        assert_eq!(mgr.update_delay(), mgr.config().max_update_delay);
    }

    #[test]
    fn immediate_updates_run_inline_and_rearm_slowly() {
        struct Busy;
        impl Node for Busy {
            fn on_layout(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
                // More logical work discovered while laying out.
                cx.require_update(NodeFlags::NEEDS_CHANGE);
                Ok(())
            }
        }

        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Busy);
        mgr.insert_root(&mut tree, root).unwrap();
        assert!(mgr.has_pending_process());

        let frames = mgr.host().frames_requested();
        let reports = mgr.require_update(&mut tree, root, NodeFlags::NEEDS_LAYOUT, true);
        assert_eq!(
            mgr.host().frames_requested(),
            frames,
            "inline display pass needs no host frame"
        );
        let kinds: Vec<_> = reports.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, [PassKind::Process, PassKind::Display]);
        assert!(!tree.flags(root).contains(NodeFlags::IMMEDIATE));

        let (_, due) = mgr.host().pending_timer().unwrap();
        assert_eq!(
            due,
            HostTime(12 * MS),
            "re-armed at the post-immediate interval"
        );
        assert!(!mgr.has_pending_display());
    }

    #[test]
    fn hiding_cancels_and_unpowers_and_showing_restores() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Group);
        mgr.insert_root(&mut tree, root).unwrap();

        assert!(mgr.visibility_changed(&mut tree, false).is_empty());
        assert!(!mgr.has_pending_process() && !mgr.has_pending_display());
        assert!(!tree.flags(root).is_powered());
        assert!(!tree.context().visible);
        assert!(mgr.visibility_changed(&mut tree, false).is_empty(), "idempotent");

        tree.require_update(root, NodeFlags::NEEDS_CHANGE);
        mgr.request_update(&mut tree, false);
        assert!(!mgr.has_pending_process(), "nothing runs while hidden");

        mgr.visibility_changed(&mut tree, true);
        let flags = tree.flags(root);
        assert!(flags.is_powered());
        assert!(flags.contains(NodeFlags::NEEDS_RESIZE | NodeFlags::NEEDS_SCROLL));
        assert!(mgr.has_pending_process());
    }

    #[test]
    fn viewport_changes_request_resize_and_layout() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Group);
        mgr.insert_root(&mut tree, root).unwrap();
        while let Some(trigger) = mgr.host_mut().next_trigger() {
            mgr.dispatch(&mut tree, trigger);
        }
        assert!(!tree.flags(root).needs_update());

        let viewport = Viewport::new(Size::new(1024.0, 768.0));
        mgr.viewport_changed(&mut tree, viewport);
        assert_eq!(tree.context().viewport, viewport);
        assert!(
            tree.flags(root)
                .contains(NodeFlags::NEEDS_RESIZE | NodeFlags::NEEDS_LAYOUT)
        );
        assert!(mgr.has_pending_process());

        while let Some(trigger) = mgr.host_mut().next_trigger() {
            mgr.dispatch(&mut tree, trigger);
        }
        mgr.viewport_changed(&mut tree, viewport);
        assert!(!mgr.has_pending_process(), "same viewport is a no-op");
    }

    #[test]
    fn a_failing_root_does_not_stop_the_others() {
        struct Broken;
        impl Node for Broken {
            fn on_resize(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
                Err(CascadeError::hook(Phase::Process, "stale backing element"))
            }
        }

        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let broken = tree.create_node(Broken);
        let healthy = tree.create_node(Group);
        mgr.insert_root(&mut tree, broken).unwrap();
        mgr.insert_root(&mut tree, healthy).unwrap();

        let report = mgr.run_process_pass(&mut tree, false);
        assert_eq!(report.roots, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].root, broken);
        assert_eq!(report.failures[0].error.node(), Some(broken));
        assert!(!tree.flags(healthy).contains(NodeFlags::NEEDS_RESIZE));
        assert!(!tree.flags(broken).intersects(NodeFlags::TRANSIENT_MASK));
    }

    #[test]
    fn removing_the_last_root_cancels_triggers() {
        let mut tree = NodeTree::new();
        let mut mgr = manager();
        let root = tree.create_node(Group);
        mgr.insert_root(&mut tree, root).unwrap();
        mgr.remove_root(&mut tree, root).unwrap();
        assert!(!mgr.has_pending_process());
        assert!(!tree.flags(root).is_mounted());
        assert!(mgr.roots().is_empty());
    }
}
