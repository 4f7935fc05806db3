// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The behaviour half of a node: lifecycle and pass hooks.

use core::any::Any;

use kurbo::{Point, Rect};

use super::cx::NodeCx;
use crate::animator::AnimatorRegistry;
use crate::error::HookResult;
use crate::flags::NodeFlags;

/// Hooks a node implements to take part in lifecycle cascades and passes.
///
/// Every axis follows the same `will*` / `on*` / `did*` triple:
///
/// - lifecycle axes (mount, power, cull) run `will*`, flip the flag, run
///   `on*`, recurse into children where the axis cascades, then run `did*`;
/// - process and display steps run every requested `will*` hook before
///   `on*`, recurse into children, and unwind the `did*` hooks in reverse
///   step order.
///
/// All hooks default to doing nothing. A hook that returns an error aborts
/// the rest of that node's cascade; transient flags are still released.
///
/// Implementors are stored as `Box<dyn Node>` and can be recovered with
/// [`NodeTree::node`](super::NodeTree::node).
#[expect(unused_variables, reason = "default hook bodies ignore their arguments")]
pub trait Node: Any {
    /// Registers the node's animated properties. Called once, when the node
    /// is created.
    fn register(&mut self, animators: &mut AnimatorRegistry) {}

    // -- Mount -------------------------------------------------------------

    /// Called before the node is marked mounted.
    fn will_mount(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the node is marked mounted, before its children mount.
    fn on_mount(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after children, animators, and constraints are mounted.
    fn did_mount(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called before anything is torn down.
    fn will_unmount(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after constraints and children are torn down.
    fn on_unmount(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the node is marked unmounted.
    fn did_unmount(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    // -- Power -------------------------------------------------------------

    /// Called before the node is marked powered.
    fn will_power(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the node is marked powered, before its children power.
    fn on_power(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the subtree is powered.
    fn did_power(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called before the subtree is unpowered.
    fn will_unpower(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after children are unpowered.
    fn on_unpower(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the node is marked unpowered.
    fn did_unpower(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    // -- Cull --------------------------------------------------------------

    /// Called before the node is marked culled.
    fn will_cull(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the node is marked culled.
    fn on_cull(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called at the end of the cull transition.
    fn did_cull(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called before the node is marked unculled.
    fn will_uncull(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the node is marked unculled.
    fn on_uncull(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called at the end of the uncull transition.
    fn did_uncull(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    // -- Process pass ------------------------------------------------------

    /// Filters the flags a process pass will act on for this node.
    ///
    /// Returning flags without any process bits skips the node and its
    /// subtree for this pass.
    fn needs_process(&self, flags: NodeFlags, cx: &NodeCx<'_>) -> NodeFlags {
        flags
    }

    /// Called first, with the flags this node will cascade.
    fn will_process(&mut self, flags: NodeFlags, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after every requested `will*` step hook.
    fn on_process(&mut self, flags: NodeFlags, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called last, after children and every `did*` step hook.
    fn did_process(&mut self, flags: NodeFlags, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Resize step, before children.
    fn will_resize(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Resize step, after `on_process`.
    fn on_resize(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Resize step, after children.
    fn did_resize(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Scroll step, before children.
    fn will_scroll(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Scroll step, after `on_process`.
    fn on_scroll(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Scroll step, after children.
    fn did_scroll(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Change step, before children. Seed state children inherit here.
    fn will_change(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Change step, after `on_process`.
    fn on_change(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Change step, after children and after constraint variables refresh.
    fn did_change(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Animate step, before children.
    fn will_animate(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Animate step, after the node's animators advanced.
    fn on_animate(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Animate step, after children.
    fn did_animate(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    // -- Display pass ------------------------------------------------------

    /// Filters the flags a display pass will act on for this node.
    fn needs_display(&self, flags: NodeFlags, cx: &NodeCx<'_>) -> NodeFlags {
        flags
    }

    /// Called first, with the flags this node will cascade.
    fn will_display(&mut self, flags: NodeFlags, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called after every requested `will*` step hook.
    fn on_display(&mut self, flags: NodeFlags, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Called last, after children and every `did*` step hook.
    fn did_display(&mut self, flags: NodeFlags, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Layout step, before children.
    fn will_layout(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Layout step. Assign frames here.
    fn on_layout(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Layout step, after children.
    fn did_layout(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Render step, before children.
    fn will_render(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Render step, before the renderer draws the node.
    fn on_render(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Render step, after children.
    fn did_render(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Composite step, before children.
    fn will_composite(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Composite step, before the renderer composites the node.
    fn on_composite(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    /// Composite step, after children.
    fn did_composite(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
        Ok(())
    }

    // -- Hit testing -------------------------------------------------------

    /// Whether `point` (in the same space as `frame`) hits this node.
    fn hit_test(&self, point: Point, frame: Rect) -> bool {
        frame.contains(point)
    }
}

/// A node with no behaviour of its own, useful for grouping.
#[derive(Clone, Copy, Debug, Default)]
pub struct Group;

impl Node for Group {}
