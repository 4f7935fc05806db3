// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The context handed to node hooks.

use kurbo::Rect;

use super::id::NodeId;
use super::node::Node;
use super::store::NodeTree;
use crate::animator::{Animator, Interpolate, Transition};
use crate::constraint::VariableKey;
use crate::env::UpdateContext;
use crate::error::HookResult;
use crate::flags::NodeFlags;

/// Access to the tree from inside a hook of node `id`.
///
/// The calling node's behaviour is moved out of the tree while its hook
/// runs, so [`NodeTree::node`] returns `None` for it. Everything else
/// (flags, frame, animators, structure) is reachable. Structural edits to a
/// node that is mid-cascade are deferred to its next safe point.
#[derive(Debug)]
pub struct NodeCx<'a> {
    tree: &'a mut NodeTree,
    id: NodeId,
}

impl<'a> NodeCx<'a> {
    pub(crate) fn new(tree: &'a mut NodeTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// The node whose hook is running.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's current flags.
    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.tree.flags(self.id)
    }

    /// The node's key.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.tree.key(self.id)
    }

    /// The node's frame.
    #[must_use]
    pub fn frame(&self) -> Rect {
        self.tree.frame(self.id)
    }

    /// Sets the node's frame.
    pub fn set_frame(&mut self, frame: Rect) {
        self.tree.set_frame(self.id, frame);
    }

    /// The shared update context.
    #[must_use]
    pub fn context(&self) -> &UpdateContext {
        self.tree.context()
    }

    /// The node's parent.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.tree.parent(self.id)
    }

    /// Snapshot of the node's children.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.tree.child_ids(self.id)
    }

    /// Read access to the whole tree.
    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        self.tree
    }

    /// Requests `flags` on this node.
    pub fn require_update(&mut self, flags: NodeFlags) {
        self.tree.require_update(self.id, flags);
    }

    /// Requests `flags` on another node.
    pub fn require_update_of(&mut self, id: NodeId, flags: NodeFlags) {
        self.tree.require_update(id, flags);
    }

    /// One of this node's animators.
    #[must_use]
    pub fn animator<A: Animator>(&self, name: &str) -> Option<&A> {
        self.tree.animator(self.id, name)
    }

    /// One of this node's animators, mutably.
    pub fn animator_mut<A: Animator>(&mut self, name: &str) -> Option<&mut A> {
        self.tree.animator_mut(self.id, name)
    }

    /// Retargets one of this node's tweens. See [`NodeTree::animate`].
    pub fn animate<T: Interpolate>(
        &mut self,
        name: &str,
        state: Option<T>,
        transition: Option<Transition>,
    ) -> bool {
        self.tree.animate(self.id, name, state, transition)
    }

    /// The last solved value of one of this node's variables.
    #[must_use]
    pub fn variable_value(&self, key: VariableKey) -> Option<f64> {
        self.tree
            .constraint_variable(self.id, key)
            .map(|v| v.value)
    }

    /// Creates a detached node.
    pub fn create_node(&mut self, node: impl Node) -> NodeId {
        self.tree.create_node(node)
    }

    /// Appends `child` to `parent`. See [`NodeTree::append_child`].
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> HookResult {
        self.tree.append_child(parent, child)
    }

    /// Removes `child` from `parent`. See [`NodeTree::remove_child`].
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> HookResult {
        self.tree.remove_child(parent, child)
    }

    /// Removes this node from its parent, deferred while the parent is
    /// traversing.
    pub fn remove_from_parent(&mut self) -> HookResult {
        self.tree.remove_from_parent(self.id)
    }
}
