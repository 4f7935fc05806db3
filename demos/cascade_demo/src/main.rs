// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated host loop that exercises the update manager end to end.
//!
//! Builds a small tree (a root, an animated panel, and a culled off-screen
//! node), then drives it through a [`ManualHost`]: initial mount, a fade
//! animation, a hide/show cycle, a viewport change, and an immediate update.
//! Events go to both a [`PrettyPrintSink`] on stdout and a [`RecorderSink`],
//! which is exported as a Chrome trace JSON file at the end.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};

use lamina_core::animator::{AnimatorRegistry, Ease, Transition, Tween};
use lamina_core::env::Viewport;
use lamina_core::error::HookResult;
use lamina_core::flags::NodeFlags;
use lamina_core::host::{ManualClock, ManualHost};
use lamina_core::manager::{UpdateConfig, UpdateManager};
use lamina_core::render::Renderer;
use lamina_core::time::{Duration, HostTime, Timebase};
use lamina_core::trace::{
    DelayChangedEvent, PassBeginEvent, PassEndEvent, RootFailureEvent, TraceSink, TriggerEvent,
    VisibilityEvent,
};
use lamina_core::tree::{Group, Node, NodeCx, NodeId, NodeTree};

use lamina_debug::pretty::PrettyPrintSink;
use lamina_debug::recorder::RecorderSink;

/// 16.6ms refresh interval in nanoseconds (≈60 Hz).
const FRAME_INTERVAL_NS: u64 = 16_666_667;
/// Upper bound on triggers delivered per phase of the demo.
const MAX_TRIGGERS: usize = 200;
/// Simulated cost of a panel layout.
const LAYOUT_COST_NS: u64 = 3_000_000;

// -- sinks -------------------------------------------------------------------

/// Forwards every event to two sinks.
#[derive(Debug)]
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.0.on_pass_begin(e);
        self.1.on_pass_begin(e);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.0.on_pass_end(e);
        self.1.on_pass_end(e);
    }

    fn on_delay_changed(&mut self, e: &DelayChangedEvent) {
        self.0.on_delay_changed(e);
        self.1.on_delay_changed(e);
    }

    fn on_trigger(&mut self, e: &TriggerEvent) {
        self.0.on_trigger(e);
        self.1.on_trigger(e);
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.0.on_visibility(e);
        self.1.on_visibility(e);
    }

    fn on_root_failure(&mut self, e: &RootFailureEvent) {
        self.0.on_root_failure(e);
        self.1.on_root_failure(e);
    }
}

// -- nodes -------------------------------------------------------------------

/// A panel that fills a fraction of the viewport and fades via `"opacity"`.
struct Panel {
    /// Vertical placement, as a fraction of the viewport height.
    top: f64,
    clock: ManualClock,
}

impl Node for Panel {
    fn register(&mut self, animators: &mut AnimatorRegistry) {
        animators.register("opacity", Tween::new(Some(0.0_f64)));
    }

    fn on_resize(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        let size = cx.context().viewport.size;
        let top = size.height * self.top;
        cx.set_frame(Rect::new(0.0, top, size.width, top + size.height / 2.0));
        cx.require_update(NodeFlags::NEEDS_LAYOUT);
        Ok(())
    }

    fn on_layout(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
        self.clock.advance(Duration(LAYOUT_COST_NS));
        Ok(())
    }
}

// -- renderer ----------------------------------------------------------------

/// Counts draws per node key and logs each one.
struct ConsoleRenderer {
    draws: Rc<RefCell<BTreeMap<String, u32>>>,
}

impl Renderer for ConsoleRenderer {
    fn render(&mut self, tree: &NodeTree, node: NodeId) {
        let key = tree.key(node).unwrap_or("?").to_owned();
        let opacity = tree
            .animator::<Tween<f64>>(node, "opacity")
            .and_then(Tween::value);
        tracing::debug!(%key, frame = ?tree.frame(node), ?opacity, "render");
        *self.draws.borrow_mut().entry(key).or_default() += 1;
    }
}

// -- driver ------------------------------------------------------------------

type Manager = UpdateManager<ManualHost, Tee<PrettyPrintSink<std::io::Stdout>, RecorderSink>>;

/// Delivers host triggers until the manager goes idle. Returns the number of
/// passes run.
fn run_until_idle(manager: &mut Manager, tree: &mut NodeTree) -> usize {
    let mut passes = 0;
    for _ in 0..MAX_TRIGGERS {
        let Some(trigger) = manager.host_mut().next_trigger() else {
            return passes;
        };
        if let Some(report) = manager.dispatch(tree, trigger) {
            passes += 1;
            for failure in &report.failures {
                tracing::warn!(root = ?failure.root, error = %failure.error, "root failed");
            }
        }
    }
    tracing::warn!("trigger budget exhausted; scheduler still busy");
    passes
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let timebase = Timebase::NANOS;

    // -- host and manager --------------------------------------------------
    let clock = ManualClock::new();
    clock.advance_to(HostTime(1_000_000_000)); // start at 1s
    let host = ManualHost::with_clock(clock.clone()).with_frame_interval(Duration(FRAME_INTERVAL_NS));
    let sink = Tee(
        PrettyPrintSink::with_writer(std::io::stdout(), timebase),
        RecorderSink::new(),
    );
    let mut manager = UpdateManager::with_sink(host, UpdateConfig::for_timebase(timebase), sink);

    // -- tree --------------------------------------------------------------
    let mut tree = NodeTree::new();
    let draws = Rc::new(RefCell::new(BTreeMap::new()));
    tree.set_renderer(ConsoleRenderer {
        draws: draws.clone(),
    });
    manager.viewport_changed(&mut tree, Viewport::new(Size::new(800.0, 600.0)));

    let root = tree.create_keyed_node("root", Group);
    let panel = tree.create_keyed_node(
        "panel",
        Panel {
            top: 0.0,
            clock: clock.clone(),
        },
    );
    let offscreen = tree.create_keyed_node(
        "offscreen",
        Panel {
            top: 2.0,
            clock: clock.clone(),
        },
    );
    tree.append_child(root, panel).expect("append panel");
    tree.append_child(root, offscreen).expect("append offscreen");

    // -- 1. mount ----------------------------------------------------------
    println!("== mount");
    manager.insert_root(&mut tree, root).expect("mount root");
    tree.cull(offscreen).expect("cull offscreen");
    let passes = run_until_idle(&mut manager, &mut tree);
    println!("   {passes} passes, delay={:?}", manager.update_delay());

    // -- 2. fade in ----------------------------------------------------------
    println!("== fade in");
    let fade = Transition::new(Duration::from_millis(250, timebase), Ease::InOutCubic);
    tree.animate(panel, "opacity", Some(1.0_f64), Some(fade));
    manager.request_update(&mut tree, false);
    let passes = run_until_idle(&mut manager, &mut tree);
    println!("   {passes} passes");

    // -- 3. hide and show ----------------------------------------------------
    println!("== hide / show");
    manager.visibility_changed(&mut tree, false);
    clock.advance(Duration::from_millis(500, timebase));
    manager.visibility_changed(&mut tree, true);
    let passes = run_until_idle(&mut manager, &mut tree);
    println!("   {passes} passes");

    // -- 4. viewport change --------------------------------------------------
    println!("== viewport");
    manager.viewport_changed(
        &mut tree,
        Viewport::new(Size::new(1280.0, 800.0)).with_pixel_ratio(2.0),
    );
    let passes = run_until_idle(&mut manager, &mut tree);
    println!("   {passes} passes");

    // -- 5. immediate update -------------------------------------------------
    println!("== immediate");
    let reports = manager.require_update(&mut tree, panel, NodeFlags::NEEDS_RENDER, true);
    println!("   {} inline passes", reports.len());
    let passes = run_until_idle(&mut manager, &mut tree);
    println!("   {passes} follow-up passes");

    // -- summary -------------------------------------------------------------
    let hit = tree.hit_test(Point::new(400.0, 100.0));
    println!("hit test (400, 100) -> {:?}", hit.and_then(|id| tree.key(id)));
    for (key, count) in draws.borrow().iter() {
        println!("draws[{key}] = {count}");
    }

    // -- export Chrome trace -------------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    lamina_debug::chrome::export(manager.sink().1.as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}
