// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process and display cascades.
//!
//! Both passes are the same pre-order / post-order walk driven by a
//! different step table:
//!
//! ```text
//! needs_*  ─ filter the requested flags; nothing left → skip subtree
//! will_*   ─ pass hook, then each requested step's will hook (fixed order)
//! on_*     ─ pass hook, then each requested step's on hook (same order)
//! children ─ cascade with this node's step bits
//! did_*    ─ each requested step's did hook (reverse order), then pass hook
//! ```
//!
//! A step runs when either the incoming flags or the node's stored flags
//! request it. The stored bit is cleared before the step's `will*` hook, so
//! a hook that re-requests it schedules the step for the next pass.

use super::cx::NodeCx;
use super::id::NodeId;
use super::node::Node;
use super::store::NodeTree;
use crate::error::HookResult;
use crate::flags::NodeFlags;
use crate::render::Renderer;

type StepHook = fn(&mut dyn Node, &mut NodeCx<'_>) -> HookResult;
type PassHook = fn(&mut dyn Node, NodeFlags, &mut NodeCx<'_>) -> HookResult;
type FilterHook = fn(&dyn Node, NodeFlags, &NodeCx<'_>) -> NodeFlags;
type Effect = fn(&mut NodeTree, NodeId);

struct Step {
    flag: NodeFlags,
    will: StepHook,
    on: StepHook,
    did: StepHook,
    /// Runs before the `on` hook.
    before_on: Option<Effect>,
    /// Runs after the `on` hook.
    after_on: Option<Effect>,
    /// Runs before the `did` hook.
    before_did: Option<Effect>,
}

struct Pass {
    mask: NodeFlags,
    aggregate: NodeFlags,
    active: NodeFlags,
    skips_invisible: bool,
    filter: FilterHook,
    will: PassHook,
    on: PassHook,
    did: PassHook,
    steps: &'static [Step],
}

static PROCESS: Pass = Pass {
    mask: NodeFlags::PROCESS_MASK,
    aggregate: NodeFlags::NEEDS_PROCESS,
    active: NodeFlags::PROCESSING,
    skips_invisible: false,
    filter: |n, flags, cx| n.needs_process(flags, cx),
    will: |n, flags, cx| n.will_process(flags, cx),
    on: |n, flags, cx| n.on_process(flags, cx),
    did: |n, flags, cx| n.did_process(flags, cx),
    steps: &[
        Step {
            flag: NodeFlags::NEEDS_RESIZE,
            will: |n, cx| n.will_resize(cx),
            on: |n, cx| n.on_resize(cx),
            did: |n, cx| n.did_resize(cx),
            before_on: None,
            after_on: None,
            before_did: None,
        },
        Step {
            flag: NodeFlags::NEEDS_SCROLL,
            will: |n, cx| n.will_scroll(cx),
            on: |n, cx| n.on_scroll(cx),
            did: |n, cx| n.did_scroll(cx),
            before_on: None,
            after_on: None,
            before_did: None,
        },
        Step {
            flag: NodeFlags::NEEDS_CHANGE,
            will: |n, cx| n.will_change(cx),
            on: |n, cx| n.on_change(cx),
            did: |n, cx| n.did_change(cx),
            before_on: None,
            after_on: None,
            // Children have contributed; read back what the solver settled.
            before_did: Some(|tree, id| tree.refresh_constraints(id)),
        },
        Step {
            flag: NodeFlags::NEEDS_ANIMATE,
            will: |n, cx| n.will_animate(cx),
            on: |n, cx| n.on_animate(cx),
            did: |n, cx| n.did_animate(cx),
            before_on: Some(|tree, id| {
                let time = tree.context.update_time;
                tree.update_animators(id, time);
            }),
            after_on: None,
            before_did: None,
        },
    ],
};

static DISPLAY: Pass = Pass {
    mask: NodeFlags::DISPLAY_MASK,
    aggregate: NodeFlags::NEEDS_DISPLAY,
    active: NodeFlags::DISPLAYING,
    skips_invisible: true,
    filter: |n, flags, cx| n.needs_display(flags, cx),
    will: |n, flags, cx| n.will_display(flags, cx),
    on: |n, flags, cx| n.on_display(flags, cx),
    did: |n, flags, cx| n.did_display(flags, cx),
    steps: &[
        Step {
            flag: NodeFlags::NEEDS_LAYOUT,
            will: |n, cx| n.will_layout(cx),
            on: |n, cx| n.on_layout(cx),
            did: |n, cx| n.did_layout(cx),
            before_on: None,
            after_on: None,
            before_did: None,
        },
        Step {
            flag: NodeFlags::NEEDS_RENDER,
            will: |n, cx| n.will_render(cx),
            on: |n, cx| n.on_render(cx),
            did: |n, cx| n.did_render(cx),
            before_on: None,
            after_on: Some(|tree, id| tree.with_renderer(|r, tree| r.render(tree, id))),
            before_did: None,
        },
        Step {
            flag: NodeFlags::NEEDS_COMPOSITE,
            will: |n, cx| n.will_composite(cx),
            on: |n, cx| n.on_composite(cx),
            did: |n, cx| n.did_composite(cx),
            before_on: None,
            after_on: Some(|tree, id| tree.with_renderer(|r, tree| r.composite(tree, id))),
            before_did: None,
        },
    ],
};

impl NodeTree {
    /// Runs a process pass over `id` and its subtree.
    ///
    /// `flags` are the process steps inherited from the parent (empty for a
    /// root). Nodes that are not both mounted and powered are skipped with
    /// their subtree. On error the remaining hooks of the failing node and
    /// its ancestors are abandoned, but every transient flag is released.
    pub fn cascade_process(&mut self, id: NodeId, flags: NodeFlags) -> HookResult {
        self.cascade(id, flags, &PROCESS)
    }

    /// Runs a display pass over `id` and its subtree.
    ///
    /// Culled and hidden nodes keep their display bits (including those
    /// inherited from `flags`) and are not descended into, so the work is
    /// found again once they become visible.
    pub fn cascade_display(&mut self, id: NodeId, flags: NodeFlags) -> HookResult {
        self.cascade(id, flags, &DISPLAY)
    }

    fn cascade(&mut self, id: NodeId, incoming: NodeFlags, pass: &'static Pass) -> HookResult {
        self.validate(id);
        let slot = id.slot();
        let own = self.flags[slot];
        if !own.is_traversable() {
            return Ok(());
        }
        self.flags[slot].remove(pass.aggregate);
        if pass.skips_invisible && own.is_invisible() {
            self.flags[slot] |= incoming & pass.mask;
            return Ok(());
        }

        let requested = (incoming & pass.mask) | (own & (pass.mask | pass.aggregate));
        let cascade = self.filter(id, requested, pass.filter);
        if !cascade.intersects(pass.mask | pass.aggregate) {
            return Ok(());
        }

        self.flags[slot].insert(pass.active);
        let result = self.with_traversal(id, |tree| tree.visit(id, cascade, pass));
        if self.is_alive(id) {
            self.flags[slot]
                .remove(pass.active | NodeFlags::ANIMATING | NodeFlags::CONSTRAINING);
        }
        if result.is_err() && self.is_alive(id) {
            self.restore_pending(id, pass);
        }
        let swept = self.sweep_removing(id);
        result.and(swept)
    }

    /// Re-marks `id` with the pass aggregate when a child still carries work
    /// for the pass, so a failed walk does not strand it.
    fn restore_pending(&mut self, id: NodeId, pass: &'static Pass) {
        let pending = self.child_ids(id).into_iter().any(|child| {
            let flags = self.flags[child.slot()];
            !flags.is_removing()
                && !(pass.skips_invisible && flags.is_invisible())
                && flags.intersects(pass.mask | pass.aggregate)
        });
        if pending {
            self.flags[id.slot()].insert(pass.aggregate);
        }
    }

    fn visit(&mut self, id: NodeId, mut cascade: NodeFlags, pass: &'static Pass) -> HookResult {
        let slot = id.slot();
        self.hook(id, |n, cx| (pass.will)(n, cascade, cx))?;

        let mut steps = NodeFlags::empty();
        for step in pass.steps {
            if cascade.contains(step.flag) || self.flags[slot].contains(step.flag) {
                self.flags[slot].remove(step.flag);
                cascade |= step.flag;
                steps |= step.flag;
                self.hook(id, step.will)?;
            }
        }

        self.hook(id, |n, cx| (pass.on)(n, cascade, cx))?;
        for step in pass.steps.iter().filter(|s| steps.contains(s.flag)) {
            if let Some(effect) = step.before_on {
                effect(self, id);
            }
            self.hook(id, step.on)?;
            if let Some(effect) = step.after_on {
                effect(self, id);
            }
        }

        let inherited = cascade & pass.mask;
        self.visit_children(id, |tree, child| tree.cascade(child, inherited, pass))?;

        for step in pass.steps.iter().rev().filter(|s| steps.contains(s.flag)) {
            if let Some(effect) = step.before_did {
                effect(self, id);
            }
            self.hook(id, step.did)?;
        }
        self.hook(id, |n, cx| (pass.did)(n, cascade, cx))
    }

    /// Visits a snapshot of `parent`'s children, applying deferred removals
    /// before a child is visited and right after it returns.
    ///
    /// A failing child does not stop its siblings; the first error is
    /// returned once every child has been visited.
    fn visit_children(
        &mut self,
        parent: NodeId,
        mut visit: impl FnMut(&mut Self, NodeId) -> HookResult,
    ) -> HookResult {
        let mut result = Ok(());
        for child in self.child_ids(parent) {
            if !self.is_child_of(child, parent) {
                continue;
            }
            if self.flags[child.slot()].is_removing() {
                result = result.and(self.detach(child));
                continue;
            }
            result = result.and(visit(self, child));
            if self.is_child_of(child, parent) && self.flags[child.slot()].is_removing() {
                result = result.and(self.detach(child));
            }
        }
        result
    }

    /// Lends the renderer out for one call.
    fn with_renderer(&mut self, draw: impl FnOnce(&mut dyn Renderer, &Self)) {
        let Some(mut renderer) = self.renderer.take() else {
            return;
        };
        draw(&mut *renderer, self);
        if self.renderer.is_none() {
            self.renderer = Some(renderer);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::animator::{AnimatorRegistry, Ease, Transition, Tween};
    use crate::error::{CascadeError, Phase};
    use crate::time::{Duration, HostTime};
    use crate::tree::Group;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Steps {
        log: Log,
    }

    impl Steps {
        fn push(&self, hook: &str) -> HookResult {
            self.log.borrow_mut().push(hook.to_owned());
            Ok(())
        }
    }

    impl Node for Steps {
        fn will_process(&mut self, _: NodeFlags, _: &mut NodeCx<'_>) -> HookResult {
            self.push("will_process")
        }
        fn on_process(&mut self, _: NodeFlags, _: &mut NodeCx<'_>) -> HookResult {
            self.push("on_process")
        }
        fn did_process(&mut self, _: NodeFlags, _: &mut NodeCx<'_>) -> HookResult {
            self.push("did_process")
        }
        fn will_resize(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("will_resize")
        }
        fn on_resize(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("on_resize")
        }
        fn did_resize(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("did_resize")
        }
        fn will_change(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("will_change")
        }
        fn on_change(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("on_change")
        }
        fn did_change(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("did_change")
        }
        fn on_layout(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("on_layout")
        }
        fn on_render(&mut self, _: &mut NodeCx<'_>) -> HookResult {
            self.push("on_render")
        }
    }

    fn live_tree(log: &Log) -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Steps { log: log.clone() });
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        log.borrow_mut().clear();
        (tree, root)
    }

    #[test]
    fn step_tables_follow_the_flag_order() {
        let process: Vec<_> = PROCESS.steps.iter().map(|s| s.flag).collect();
        let display: Vec<_> = DISPLAY.steps.iter().map(|s| s.flag).collect();
        assert_eq!(process, NodeFlags::PROCESS_STEPS);
        assert_eq!(display, NodeFlags::DISPLAY_STEPS);
    }

    #[test]
    fn steps_run_will_then_on_then_did_in_reverse() {
        let log = Log::default();
        let (mut tree, root) = live_tree(&log);
        tree.require_update(root, NodeFlags::NEEDS_CHANGE | NodeFlags::NEEDS_RESIZE);

        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                "will_process",
                "will_resize",
                "will_change",
                "on_process",
                "on_resize",
                "on_change",
                "did_change",
                "did_resize",
                "did_process",
            ]
        );
        let flags = tree.flags(root);
        assert!(!flags.needs_process(), "every process bit consumed");
        assert!(!flags.intersects(NodeFlags::TRANSIENT_MASK));
    }

    #[test]
    fn idle_nodes_are_skipped() {
        let log = Log::default();
        let (mut tree, root) = live_tree(&log);
        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn unpowered_nodes_are_skipped_and_keep_their_bits() {
        let log = Log::default();
        let (mut tree, root) = live_tree(&log);
        tree.unpower(root).unwrap();
        tree.require_update(root, NodeFlags::NEEDS_SCROLL);
        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        assert!(log.borrow().is_empty());
        assert!(tree.flags(root).contains(NodeFlags::NEEDS_SCROLL));
    }

    #[test]
    fn incoming_flags_cascade_to_children() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let child = tree.create_node(Steps { log: log.clone() });
        tree.append_child(root, child).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.cascade_display(root, NodeFlags::empty()).unwrap();
        log.borrow_mut().clear();

        tree.require_update(root, NodeFlags::NEEDS_LAYOUT);
        tree.cascade_display(root, NodeFlags::empty()).unwrap();
        assert_eq!(*log.borrow(), ["on_layout"], "parent layout reaches the child");
    }

    #[test]
    fn filter_hook_can_veto_a_subtree() {
        struct Frozen;
        impl Node for Frozen {
            fn needs_process(&self, _: NodeFlags, _: &NodeCx<'_>) -> NodeFlags {
                NodeFlags::empty()
            }
        }

        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Frozen);
        let child = tree.create_node(Steps { log: log.clone() });
        tree.append_child(root, child).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.require_update(child, NodeFlags::NEEDS_CHANGE);

        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        assert!(log.borrow().is_empty());
        assert!(tree.flags(child).contains(NodeFlags::NEEDS_CHANGE));
    }

    #[test]
    fn hidden_nodes_retain_inherited_display_work() {
        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let child = tree.create_node(Steps { log: log.clone() });
        tree.append_child(root, child).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.set_hidden(child, true);
        tree.require_update(root, NodeFlags::NEEDS_LAYOUT);

        tree.cascade_display(root, NodeFlags::empty()).unwrap();
        assert!(log.borrow().is_empty());
        assert!(tree.flags(child).needs_layout(), "inherited layout retained");
        assert!(!tree.flags(child).contains(NodeFlags::NEEDS_DISPLAY));

        tree.set_hidden(child, false);
        tree.cascade_display(root, NodeFlags::empty()).unwrap();
        assert_eq!(*log.borrow(), ["on_layout", "on_render"]);
    }

    #[test]
    fn rerequested_steps_survive_the_pass() {
        struct Again;
        impl Node for Again {
            fn on_change(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
                cx.require_update(NodeFlags::NEEDS_CHANGE);
                Ok(())
            }
        }

        let mut tree = NodeTree::new();
        let root = tree.create_node(Again);
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.require_update(root, NodeFlags::NEEDS_CHANGE);
        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        let flags = tree.flags(root);
        assert!(flags.contains(NodeFlags::NEEDS_CHANGE | NodeFlags::NEEDS_PROCESS));
    }

    #[test]
    fn failing_hooks_release_transient_flags_up_the_chain() {
        struct Broken;
        impl Node for Broken {
            fn on_resize(&mut self, _: &mut NodeCx<'_>) -> HookResult {
                Err(CascadeError::hook(Phase::Process, "no backing element"))
            }
        }

        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let child = tree.create_node(Broken);
        tree.append_child(root, child).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();

        let err = tree
            .cascade_process(root, NodeFlags::NEEDS_RESIZE)
            .unwrap_err();
        assert_eq!(err.node(), Some(child));
        for id in [root, child] {
            assert!(
                !tree.flags(id).intersects(NodeFlags::TRANSIENT_MASK),
                "{id:?} left mid-traversal"
            );
        }
    }

    #[test]
    fn a_failing_child_does_not_stop_its_siblings() {
        struct Broken;
        impl Node for Broken {
            fn on_resize(&mut self, _: &mut NodeCx<'_>) -> HookResult {
                Err(CascadeError::hook(Phase::Process, "no backing element"))
            }
        }

        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let broken = tree.create_node(Broken);
        let healthy = tree.create_node(Steps { log: log.clone() });
        tree.append_child(root, broken).unwrap();
        tree.append_child(root, healthy).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.require_update(broken, NodeFlags::NEEDS_RESIZE);
        tree.require_update(healthy, NodeFlags::NEEDS_CHANGE);

        let err = tree.cascade_process(root, NodeFlags::empty()).unwrap_err();
        assert_eq!(err.node(), Some(broken));
        assert!(log.borrow().contains(&"on_change".to_owned()));
        assert!(!tree.flags(healthy).needs_process());
        assert!(!tree.flags(root).needs_process(), "nothing left behind");
    }

    #[test]
    fn work_below_a_failing_node_stays_reachable() {
        struct Broken;
        impl Node for Broken {
            fn on_resize(&mut self, _: &mut NodeCx<'_>) -> HookResult {
                Err(CascadeError::hook(Phase::Process, "no backing element"))
            }
        }

        let log = Log::default();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let broken = tree.create_node(Broken);
        let leaf = tree.create_node(Steps { log: log.clone() });
        tree.append_child(root, broken).unwrap();
        tree.append_child(broken, leaf).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.require_update(broken, NodeFlags::NEEDS_RESIZE);
        tree.require_update(leaf, NodeFlags::NEEDS_CHANGE);

        assert!(tree.cascade_process(root, NodeFlags::empty()).is_err());
        assert!(log.borrow().is_empty(), "leaf not reached past the failure");
        for id in [root, broken] {
            assert!(
                tree.flags(id).contains(NodeFlags::NEEDS_PROCESS),
                "{id:?} lost the pending summary"
            );
        }

        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        assert!(log.borrow().contains(&"on_change".to_owned()));
        assert!(!tree.flags(leaf).needs_process());
    }

    #[test]
    fn removals_requested_before_a_failure_are_still_applied() {
        struct Pruner {
            doomed: NodeId,
        }
        impl Node for Pruner {
            fn did_process(&mut self, _: NodeFlags, cx: &mut NodeCx<'_>) -> HookResult {
                cx.remove_child(cx.id(), self.doomed)?;
                Err(CascadeError::hook(Phase::Process, "gave up"))
            }
        }

        let mut tree = NodeTree::new();
        let doomed = tree.create_node(Group);
        let root = tree.create_node(Pruner { doomed });
        tree.append_child(root, doomed).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.require_update(root, NodeFlags::NEEDS_CHANGE);

        assert!(tree.cascade_process(root, NodeFlags::empty()).is_err());
        assert_eq!(tree.parent(doomed), None);
        assert!(!tree.flags(doomed).is_mounted());
        assert!(!tree.flags(doomed).is_removing());
    }

    #[test]
    fn renderer_draws_after_the_render_hook() {
        struct Recording(Log);
        impl Renderer for Recording {
            fn render(&mut self, tree: &NodeTree, node: NodeId) {
                assert!(tree.flags(node).contains(NodeFlags::DISPLAYING));
                self.0.borrow_mut().push("render".into());
            }
            fn composite(&mut self, _: &NodeTree, _: NodeId) {
                self.0.borrow_mut().push("composite".into());
            }
        }

        let log = Log::default();
        let (mut tree, root) = live_tree(&log);
        tree.set_renderer(Recording(log.clone()));
        tree.require_update(root, NodeFlags::NEEDS_RENDER | NodeFlags::NEEDS_COMPOSITE);
        tree.cascade_display(root, NodeFlags::empty()).unwrap();
        assert_eq!(*log.borrow(), ["on_render", "render", "composite"]);
        assert!(tree.take_renderer().is_some(), "renderer handed back");
    }

    #[test]
    fn animate_step_advances_animators_and_requests_render() {
        struct Slider;
        impl Node for Slider {
            fn register(&mut self, animators: &mut AnimatorRegistry) {
                animators.register("x", Tween::new(Some(0.0_f64)));
            }
            fn on_animate(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
                assert!(!cx.flags().contains(NodeFlags::ANIMATING));
                Ok(())
            }
        }

        let mut tree = NodeTree::new();
        let root = tree.create_node(Slider);
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        let slide = Transition::new(Duration(100), Ease::Linear);
        tree.animate(root, "x", Some(10.0_f64), Some(slide));

        tree.context_mut().update_time = HostTime(0);
        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        assert!(tree.flags(root).needs_animate(), "still in flight");

        tree.context_mut().update_time = HostTime(100);
        tree.cascade_process(root, NodeFlags::empty()).unwrap();
        let x = tree.animator::<Tween<f64>>(root, "x").unwrap();
        assert_eq!(x.value(), Some(10.0));
        assert!(!tree.flags(root).needs_animate(), "settled");
        assert!(tree.flags(root).needs_render());
    }
}
