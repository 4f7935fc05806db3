// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and lifecycle.

use std::borrow::Cow;
use std::fmt;

use kurbo::{Point, Rect};

use super::cx::NodeCx;
use super::id::{INVALID, NodeId};
use super::node::Node;
use super::traverse::{Ancestors, Children};
use crate::animator::{Animator, AnimatorRegistry, Interpolate, Transition, Tween};
use crate::constraint::{
    Constraint, ConstraintKey, ConstraintRegistry, ConstraintVariable, LayoutSolver, VariableKey,
};
use crate::env::UpdateContext;
use crate::error::{CascadeError, HookResult};
use crate::flags::NodeFlags;
use crate::render::Renderer;
use crate::time::HostTime;

/// Struct-of-arrays storage for every node, plus the services their hooks
/// share.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed nodes are recycled through a free list, and
/// generation counters make stale handles panic instead of aliasing a new
/// node.
///
/// Lifecycle operations ([`mount`](Self::mount), [`power`](Self::power),
/// [`cull`](Self::cull) and their inverses) run the node's `will*` / `on*` /
/// `did*` hooks and hold [`TRAVERSING`](NodeFlags::TRAVERSING) for their
/// duration. Calling one on a node already in the target state panics.
pub struct NodeTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Per-node state --
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) key: Vec<Option<String>>,
    pub(crate) frame: Vec<Rect>,
    pub(crate) behavior: Vec<Option<Box<dyn Node>>>,
    pub(crate) animators: Vec<Option<AnimatorRegistry>>,
    pub(crate) constraints: Vec<ConstraintRegistry>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Shared services --
    pub(crate) context: UpdateContext,
    pub(crate) solver: Option<Box<dyn LayoutSolver>>,
    pub(crate) renderer: Option<Box<dyn Renderer>>,
    next_constraint: u32,
    next_variable: u32,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTree")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("context", &self.context)
            .field("has_solver", &self.solver.is_some())
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl NodeTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            flags: Vec::new(),
            key: Vec::new(),
            frame: Vec::new(),
            behavior: Vec::new(),
            animators: Vec::new(),
            constraints: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            context: UpdateContext::default(),
            solver: None,
            renderer: None,
            next_constraint: 0,
            next_variable: 0,
        }
    }

    // -- Allocation API --

    /// Creates a detached, unmounted node and returns its handle.
    ///
    /// The node's [`register`](Node::register) hook runs here, so its
    /// animated properties exist before it is ever mounted.
    pub fn create_node(&mut self, node: impl Node) -> NodeId {
        self.create_boxed(None, Box::new(node))
    }

    /// Creates a node carrying a reconciliation key.
    pub fn create_keyed_node(&mut self, key: impl Into<String>, node: impl Node) -> NodeId {
        self.create_boxed(Some(key.into()), Box::new(node))
    }

    fn create_boxed(&mut self, key: Option<String>, mut node: Box<dyn Node>) -> NodeId {
        let mut registry = AnimatorRegistry::new();
        node.register(&mut registry);
        let animators = (!registry.is_empty()).then_some(registry);

        let idx = if let Some(idx) = self.free_list.pop() {
            let slot = idx as usize;
            self.parent[slot] = INVALID;
            self.first_child[slot] = INVALID;
            self.next_sibling[slot] = INVALID;
            self.prev_sibling[slot] = INVALID;
            self.flags[slot] = NodeFlags::empty();
            self.key[slot] = key;
            self.frame[slot] = Rect::ZERO;
            self.behavior[slot] = Some(node);
            self.animators[slot] = animators;
            self.constraints[slot] = ConstraintRegistry::default();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.flags.push(NodeFlags::empty());
            self.key.push(key);
            self.frame.push(Rect::ZERO);
            self.behavior.push(Some(node));
            self.animators.push(animators);
            self.constraints.push(ConstraintRegistry::default());
            self.generation.push(0);
            idx
        };
        self.id_at(idx)
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// A node still attached to an unmounted parent is unlinked first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the node has children, or the node is
    /// mounted (remove it from its parent or unmount it first).
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let slot = id.slot();
        assert!(
            self.first_child[slot] == INVALID,
            "cannot destroy node with children"
        );
        assert!(
            !self.flags[slot].is_mounted(),
            "cannot destroy a mounted node: {id:?}"
        );
        if self.parent[slot] != INVALID {
            self.unlink_from_parent(id.idx);
        }

        self.behavior[slot] = None;
        self.animators[slot] = None;
        self.constraints[slot] = ConstraintRegistry::default();
        self.key[slot] = None;
        self.flags[slot] = NodeFlags::empty();

        // Bump generation so old handles immediately fail validation.
        self.generation[slot] += 1;
        self.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.slot()] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// If `parent` is mounted the child subtree is mounted, and powered if
    /// `parent` is powered; it then requests a resize and a layout.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `child` already has a parent, or
    /// `child` is mounted on its own.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> HookResult {
        self.insert_child(parent, child, None)
    }

    /// Inserts `child` under `parent`, before `before` or last if `None`.
    ///
    /// See [`append_child`](Self::append_child) for the lifecycle effects.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as `append_child`, or if `before`
    /// is not a child of `parent`.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> HookResult {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(p != c, "cannot insert a node into itself");
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.flags[c as usize].is_mounted(),
            "cannot insert a mounted root: {child:?}"
        );
        assert!(
            !self.ancestors(parent).any(|a| a == child),
            "cannot insert a node beneath itself"
        );

        self.parent[c as usize] = p;
        match before {
            Some(sibling) => {
                self.validate(sibling);
                let s = sibling.idx;
                assert!(
                    self.parent[s as usize] == p,
                    "insertion point is not a child of parent"
                );
                self.next_sibling[c as usize] = s;
                self.prev_sibling[c as usize] = self.prev_sibling[s as usize];
                if self.prev_sibling[s as usize] != INVALID {
                    self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
                } else {
                    // `sibling` was the first child.
                    self.first_child[p as usize] = c;
                }
                self.prev_sibling[s as usize] = c;
            }
            None => {
                self.prev_sibling[c as usize] = INVALID;
                self.next_sibling[c as usize] = INVALID;
                if self.first_child[p as usize] == INVALID {
                    self.first_child[p as usize] = c;
                } else {
                    let mut last = self.first_child[p as usize];
                    while self.next_sibling[last as usize] != INVALID {
                        last = self.next_sibling[last as usize];
                    }
                    self.next_sibling[last as usize] = c;
                    self.prev_sibling[c as usize] = last;
                }
            }
        }

        let parent_flags = self.flags[parent.slot()];
        if parent_flags.is_mounted() {
            self.mount_subtree(child)?;
            if parent_flags.is_powered() {
                self.power_subtree(child)?;
            }
            self.require_update(child, NodeFlags::NEEDS_RESIZE | NodeFlags::NEEDS_LAYOUT);
        }
        Ok(())
    }

    /// Removes `child` from `parent`.
    ///
    /// A mounted child is unpowered and unmounted before it is unlinked. If
    /// `parent` is in the middle of a cascade the child is only flagged
    /// [`REMOVING`](NodeFlags::REMOVING) and detached at the parent's next
    /// safe point.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> HookResult {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.slot()] == parent.idx,
            "node is not a child of parent"
        );
        if self.flags[parent.slot()].is_traversing() {
            self.flags[child.slot()].insert(NodeFlags::REMOVING);
            return Ok(());
        }
        self.detach(child)
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) -> HookResult {
        let Some(parent) = self.parent(child) else {
            panic!("node has no parent: {child:?}");
        };
        self.remove_child(parent, child)
    }

    /// Tears down and unlinks a child, whatever its parent is doing.
    pub(crate) fn detach(&mut self, child: NodeId) -> HookResult {
        let slot = child.slot();
        let mut result = Ok(());
        if self.flags[slot].is_powered() {
            result = self.unpower_subtree(child);
        }
        if self.flags[slot].is_mounted() {
            result = result.and(self.unmount_subtree(child));
        }
        self.unlink_from_parent(child.idx);
        self.flags[slot].remove(NodeFlags::REMOVING);
        result
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.slot()];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.slot()])
    }

    /// Returns an iterator over `id` and its ancestors, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.idx)
    }

    /// Snapshot of the current children, safe to iterate while mutating.
    pub(crate) fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    /// Returns the first child of `parent` whose key is `key`.
    #[must_use]
    pub fn child_by_key(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.children(parent)
            .find(|c| self.key[c.slot()].as_deref() == Some(key))
    }

    /// Returns every live node without a parent.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.len)
            .filter(|&idx| {
                self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx)
            })
            .map(|idx| self.id_at(idx))
            .collect()
    }

    // -- Per-node state --

    /// Returns the node's flags.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.validate(id);
        self.flags[id.slot()]
    }

    /// Returns the node's reconciliation key.
    #[must_use]
    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.key[id.slot()].as_deref()
    }

    /// Replaces the node's reconciliation key.
    pub fn set_key(&mut self, id: NodeId, key: Option<String>) {
        self.validate(id);
        self.key[id.slot()] = key;
    }

    /// Returns the node's frame, in its parent's coordinate space.
    #[must_use]
    pub fn frame(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.frame[id.slot()]
    }

    /// Sets the node's frame. Usually called from `on_layout`.
    pub fn set_frame(&mut self, id: NodeId, frame: Rect) {
        self.validate(id);
        self.frame[id.slot()] = frame;
    }

    /// Returns the node's behaviour if it is a `T`.
    #[must_use]
    pub fn node<T: Node>(&self, id: NodeId) -> Option<&T> {
        self.validate(id);
        let node: &dyn core::any::Any = &**self.behavior[id.slot()].as_ref()?;
        node.downcast_ref()
    }

    /// Returns the node's behaviour mutably if it is a `T`.
    pub fn node_mut<T: Node>(&mut self, id: NodeId) -> Option<&mut T> {
        self.validate(id);
        let node: &mut dyn core::any::Any = &mut **self.behavior[id.slot()].as_mut()?;
        node.downcast_mut()
    }

    /// The context handed to hooks.
    #[must_use]
    pub fn context(&self) -> &UpdateContext {
        &self.context
    }

    /// The context handed to hooks, mutably.
    pub fn context_mut(&mut self) -> &mut UpdateContext {
        &mut self.context
    }

    // -- Invalidation --

    /// Requests `flags` on a node.
    ///
    /// Needs bits are ORed into the node, and the matching aggregate bits
    /// ([`NEEDS_PROCESS`](NodeFlags::NEEDS_PROCESS) /
    /// [`NEEDS_DISPLAY`](NodeFlags::NEEDS_DISPLAY)) into the node and every
    /// ancestor. Bits outside [`UPDATE_MASK`](NodeFlags::UPDATE_MASK) are
    /// ignored.
    pub fn require_update(&mut self, id: NodeId, flags: NodeFlags) {
        self.validate(id);
        let needs = flags & NodeFlags::UPDATE_MASK;
        if needs.is_empty() {
            return;
        }
        self.flags[id.slot()] |= needs;
        let aggregate = needs.ancestor_bits();
        let mut idx = id.idx;
        while idx != INVALID {
            self.flags[idx as usize] |= aggregate;
            idx = self.parent[idx as usize];
        }
    }

    /// Whether the node or any ancestor is culled or hidden.
    #[must_use]
    pub fn is_effectively_invisible(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .any(|a| self.flags[a.slot()].is_invisible())
    }

    // -- Lifecycle --

    /// Mounts a node and its subtree.
    ///
    /// Runs `will_mount`, marks the node mounted, runs `on_mount`, mounts the
    /// children, mounts animators, activates constraints, and runs
    /// `did_mount`.
    ///
    /// # Panics
    ///
    /// Panics if the node is already mounted or its parent is not.
    pub fn mount(&mut self, id: NodeId) -> HookResult {
        self.validate(id);
        assert!(
            !self.flags[id.slot()].is_mounted(),
            "node already mounted: {id:?}"
        );
        if let Some(parent) = self.parent(id) {
            assert!(
                self.flags[parent.slot()].is_mounted(),
                "cannot mount a node whose parent is not mounted"
            );
        }
        self.mount_subtree(id)
    }

    /// Unmounts a node and its subtree, unpowering it first if needed.
    ///
    /// # Panics
    ///
    /// Panics if the node is not mounted.
    pub fn unmount(&mut self, id: NodeId) -> HookResult {
        self.validate(id);
        assert!(
            self.flags[id.slot()].is_mounted(),
            "node not mounted: {id:?}"
        );
        if self.flags[id.slot()].is_powered() {
            self.unpower_subtree(id)?;
        }
        self.unmount_subtree(id)
    }

    /// Powers a mounted node and its mounted subtree.
    ///
    /// Powering requests a render and composite so a following display
    /// pass re-derives visual output.
    ///
    /// # Panics
    ///
    /// Panics if the node is not mounted or is already powered.
    pub fn power(&mut self, id: NodeId) -> HookResult {
        self.validate(id);
        let flags = self.flags[id.slot()];
        assert!(flags.is_mounted(), "cannot power an unmounted node: {id:?}");
        assert!(!flags.is_powered(), "node already powered: {id:?}");
        self.power_subtree(id)
    }

    /// Unpowers a node and its subtree.
    ///
    /// # Panics
    ///
    /// Panics if the node is not powered.
    pub fn unpower(&mut self, id: NodeId) -> HookResult {
        self.validate(id);
        assert!(
            self.flags[id.slot()].is_powered(),
            "node not powered: {id:?}"
        );
        self.unpower_subtree(id)
    }

    /// Culls a node, excluding it and its subtree from display passes and
    /// hit testing. Process passes still visit it.
    ///
    /// # Panics
    ///
    /// Panics if the node is already culled.
    pub fn cull(&mut self, id: NodeId) -> HookResult {
        self.validate(id);
        assert!(
            !self.flags[id.slot()].is_culled(),
            "node already culled: {id:?}"
        );
        self.with_traversal(id, |tree| {
            tree.hook(id, |n, cx| n.will_cull(cx))?;
            tree.flags[id.slot()].insert(NodeFlags::CULLED);
            tree.hook(id, |n, cx| n.on_cull(cx))?;
            tree.hook(id, |n, cx| n.did_cull(cx))
        })
    }

    /// Unculls a node and re-requests the display work it skipped.
    ///
    /// # Panics
    ///
    /// Panics if the node is not culled.
    pub fn uncull(&mut self, id: NodeId) -> HookResult {
        self.validate(id);
        assert!(
            self.flags[id.slot()].is_culled(),
            "node not culled: {id:?}"
        );
        self.with_traversal(id, |tree| {
            tree.hook(id, |n, cx| n.will_uncull(cx))?;
            tree.flags[id.slot()].remove(NodeFlags::CULLED);
            tree.hook(id, |n, cx| n.on_uncull(cx))?;
            tree.hook(id, |n, cx| n.did_uncull(cx))
        })?;
        self.request_redisplay(id);
        Ok(())
    }

    /// Hides or shows a node.
    ///
    /// Hidden nodes are skipped by display passes and hit testing like
    /// culled ones. Unlike culling this runs no hooks and repeating the
    /// current state is a no-op.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        self.validate(id);
        let flags = &mut self.flags[id.slot()];
        if flags.is_hidden() == hidden {
            return;
        }
        flags.set(NodeFlags::HIDDEN, hidden);
        if !hidden {
            self.request_redisplay(id);
        }
    }

    fn request_redisplay(&mut self, id: NodeId) {
        let retained = self.flags[id.slot()] & NodeFlags::DISPLAY_MASK;
        self.require_update(id, retained | NodeFlags::NEEDS_RENDER);
    }

    pub(crate) fn mount_subtree(&mut self, id: NodeId) -> HookResult {
        self.hook(id, |n, cx| n.will_mount(cx))?;
        self.flags[id.slot()].insert(NodeFlags::MOUNTED);
        self.with_traversal(id, |tree| {
            tree.hook(id, |n, cx| n.on_mount(cx))?;
            for child in tree.child_ids(id) {
                let flags = tree.flags[child.slot()];
                if tree.is_child_of(child, id) && !flags.is_mounted() && !flags.is_removing() {
                    tree.mount_subtree(child)?;
                }
            }
            if let Some(animators) = &mut tree.animators[id.slot()] {
                animators.mount_all();
            }
            tree.activate_constraints(id)?;
            tree.hook(id, |n, cx| n.did_mount(cx))
        })?;
        self.sweep_removing(id)
    }

    pub(crate) fn unmount_subtree(&mut self, id: NodeId) -> HookResult {
        self.with_traversal(id, |tree| {
            tree.hook(id, |n, cx| n.will_unmount(cx))?;
            if let Some(solver) = tree.solver.as_deref_mut() {
                tree.constraints[id.slot()].deactivate(solver);
            }
            if let Some(animators) = &mut tree.animators[id.slot()]
                && animators.is_mounted()
            {
                animators.unmount_all();
            }
            for child in tree.child_ids(id) {
                if tree.is_child_of(child, id) && tree.flags[child.slot()].is_mounted() {
                    tree.unmount_subtree(child)?;
                }
            }
            tree.hook(id, |n, cx| n.on_unmount(cx))?;
            tree.flags[id.slot()].remove(NodeFlags::MOUNTED);
            tree.hook(id, |n, cx| n.did_unmount(cx))
        })?;
        self.sweep_removing(id)
    }

    pub(crate) fn power_subtree(&mut self, id: NodeId) -> HookResult {
        self.hook(id, |n, cx| n.will_power(cx))?;
        self.flags[id.slot()].insert(NodeFlags::POWERED);
        self.with_traversal(id, |tree| {
            tree.hook(id, |n, cx| n.on_power(cx))?;
            for child in tree.child_ids(id) {
                let flags = tree.flags[child.slot()];
                if tree.is_child_of(child, id)
                    && flags.is_mounted()
                    && !flags.is_powered()
                    && !flags.is_removing()
                {
                    tree.power_subtree(child)?;
                }
            }
            tree.hook(id, |n, cx| n.did_power(cx))
        })?;
        self.sweep_removing(id)?;
        let mut requested = NodeFlags::NEEDS_RENDER | NodeFlags::NEEDS_COMPOSITE;
        if self.animators[id.slot()]
            .as_ref()
            .is_some_and(AnimatorRegistry::is_animating)
        {
            requested |= NodeFlags::NEEDS_ANIMATE;
        }
        self.require_update(id, requested);
        Ok(())
    }

    pub(crate) fn unpower_subtree(&mut self, id: NodeId) -> HookResult {
        self.with_traversal(id, |tree| {
            tree.hook(id, |n, cx| n.will_unpower(cx))?;
            for child in tree.child_ids(id) {
                if tree.is_child_of(child, id) && tree.flags[child.slot()].is_powered() {
                    tree.unpower_subtree(child)?;
                }
            }
            tree.hook(id, |n, cx| n.on_unpower(cx))?;
            tree.flags[id.slot()].remove(NodeFlags::POWERED);
            tree.hook(id, |n, cx| n.did_unpower(cx))
        })?;
        self.sweep_removing(id)
    }

    /// Runs `body` with `TRAVERSING` held on `id`, releasing it on every
    /// path out.
    pub(crate) fn with_traversal(
        &mut self,
        id: NodeId,
        body: impl FnOnce(&mut Self) -> HookResult,
    ) -> HookResult {
        let slot = id.slot();
        let outer = self.flags[slot] & NodeFlags::TRAVERSING;
        self.flags[slot].insert(NodeFlags::TRAVERSING);
        let result = body(self);
        if self.is_alive(id) {
            self.flags[slot].remove(NodeFlags::TRAVERSING);
            self.flags[slot] |= outer;
        }
        result
    }

    /// Detaches children flagged `REMOVING` once `parent` is at a safe point.
    pub(crate) fn sweep_removing(&mut self, parent: NodeId) -> HookResult {
        if !self.is_alive(parent) || self.flags[parent.slot()].is_traversing() {
            return Ok(());
        }
        let mut result = Ok(());
        for child in self.child_ids(parent) {
            if self.flags[child.slot()].is_removing() {
                result = result.and(self.detach(child));
            }
        }
        result
    }

    pub(crate) fn is_child_of(&self, child: NodeId, parent: NodeId) -> bool {
        self.is_alive(child) && self.parent[child.slot()] == parent.idx
    }

    // -- Hook dispatch --

    /// Calls a hook on `id`'s behaviour with a context over this tree.
    ///
    /// The behaviour is moved out of its slot for the duration of the call,
    /// so a hook re-entering its own node sees no behaviour and is skipped.
    pub(crate) fn hook(
        &mut self,
        id: NodeId,
        call: impl FnOnce(&mut dyn Node, &mut NodeCx<'_>) -> HookResult,
    ) -> HookResult {
        let Some(mut node) = self.behavior[id.slot()].take() else {
            return Ok(());
        };
        let result = call(&mut *node, &mut NodeCx::new(self, id));
        if self.is_alive(id) {
            self.behavior[id.slot()] = Some(node);
        }
        result.map_err(|e| e.at(id))
    }

    /// Runs a read-only filter hook, returning `flags` unchanged if the
    /// behaviour is absent.
    pub(crate) fn filter(
        &mut self,
        id: NodeId,
        flags: NodeFlags,
        call: impl FnOnce(&dyn Node, NodeFlags, &NodeCx<'_>) -> NodeFlags,
    ) -> NodeFlags {
        let Some(node) = self.behavior[id.slot()].take() else {
            return flags;
        };
        let filtered = call(&*node, flags, &NodeCx::new(self, id));
        self.behavior[id.slot()] = Some(node);
        filtered
    }

    // -- Animators --

    /// Registers an animator on a node after creation.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or `name` is already registered.
    pub fn register_animator(&mut self, id: NodeId, name: &'static str, animator: impl Animator) {
        self.validate(id);
        let mounted = self.flags[id.slot()].is_mounted();
        self.animators[id.slot()]
            .get_or_insert_with(|| {
                let mut registry = AnimatorRegistry::new();
                if mounted {
                    registry.mount_all();
                }
                registry
            })
            .register(name, animator);
    }

    /// Returns the animator registered under `name` if it is an `A`.
    #[must_use]
    pub fn animator<A: Animator>(&self, id: NodeId, name: &str) -> Option<&A> {
        self.validate(id);
        self.animators[id.slot()].as_ref()?.get(name)
    }

    /// Returns the animator registered under `name` mutably if it is an `A`.
    pub fn animator_mut<A: Animator>(&mut self, id: NodeId, name: &str) -> Option<&mut A> {
        self.validate(id);
        self.animators[id.slot()].as_mut()?.get_mut(name)
    }

    /// Returns the node's animator registry, if it has one.
    #[must_use]
    pub fn animators(&self, id: NodeId) -> Option<&AnimatorRegistry> {
        self.validate(id);
        self.animators[id.slot()].as_ref()
    }

    /// Sets a new state on a [`Tween<T>`] and requests an animate step.
    ///
    /// Returns `false` if no `Tween<T>` is registered under `name`.
    pub fn animate<T: Interpolate>(
        &mut self,
        id: NodeId,
        name: &str,
        state: Option<T>,
        transition: Option<Transition>,
    ) -> bool {
        let Some(tween) = self.animator_mut::<Tween<T>>(id, name) else {
            return false;
        };
        tween.set_state(state, transition);
        self.require_update(id, NodeFlags::NEEDS_ANIMATE);
        true
    }

    /// Advances the node's animators to `time`.
    ///
    /// Holds [`ANIMATING`](NodeFlags::ANIMATING) while the animators run,
    /// then requests what they asked for: their update flags when a value
    /// changed, and another animate step while any is still in flight.
    pub fn update_animators(&mut self, id: NodeId, time: HostTime) {
        self.validate(id);
        let slot = id.slot();
        let Some(registry) = self.animators[slot].as_mut() else {
            return;
        };
        self.flags[slot].insert(NodeFlags::ANIMATING);
        let requested = registry.update_all(time);
        self.flags[slot].remove(NodeFlags::ANIMATING);
        self.require_update(id, requested);
    }

    // -- Constraints --

    /// Installs the layout solver constraints are activated against.
    ///
    /// Install it before mounting: entries of already-mounted nodes are not
    /// re-activated.
    pub fn set_solver(&mut self, solver: impl LayoutSolver + 'static) {
        self.solver = Some(Box::new(solver));
    }

    /// Removes and returns the layout solver.
    pub fn take_solver(&mut self) -> Option<Box<dyn LayoutSolver>> {
        self.solver.take()
    }

    /// The installed layout solver.
    #[must_use]
    pub fn solver(&self) -> Option<&dyn LayoutSolver> {
        self.solver.as_deref()
    }

    /// Adds a constraint to a node, activating it now if the node is
    /// mounted.
    pub fn add_constraint(
        &mut self,
        id: NodeId,
        constraint: Constraint,
    ) -> Result<ConstraintKey, CascadeError> {
        self.validate(id);
        let key = ConstraintKey(self.next_constraint);
        self.next_constraint += 1;
        self.constraints[id.slot()].insert_constraint(key, constraint);
        self.activate_constraints(id)?;
        Ok(key)
    }

    /// Removes a constraint from a node, deactivating it first.
    ///
    /// # Panics
    ///
    /// Panics if the node does not own `key`.
    pub fn remove_constraint(&mut self, id: NodeId, key: ConstraintKey) {
        self.validate(id);
        let solver = self
            .solver
            .as_deref_mut()
            .map(|s| s as &mut dyn LayoutSolver);
        assert!(
            self.constraints[id.slot()].remove_constraint(key, solver),
            "constraint {key:?} not owned by {id:?}"
        );
    }

    /// Adds a variable to a node, activating it now if the node is mounted.
    pub fn add_constraint_variable(
        &mut self,
        id: NodeId,
        name: impl Into<Cow<'static, str>>,
        value: f64,
    ) -> Result<VariableKey, CascadeError> {
        self.validate(id);
        let key = VariableKey(self.next_variable);
        self.next_variable += 1;
        let variable = ConstraintVariable {
            name: name.into(),
            value,
        };
        self.constraints[id.slot()].insert_variable(key, variable);
        self.activate_constraints(id)?;
        Ok(key)
    }

    /// Removes a variable from a node, deactivating it first.
    ///
    /// # Panics
    ///
    /// Panics if the node does not own `key`.
    pub fn remove_constraint_variable(&mut self, id: NodeId, key: VariableKey) {
        self.validate(id);
        let solver = self
            .solver
            .as_deref_mut()
            .map(|s| s as &mut dyn LayoutSolver);
        assert!(
            self.constraints[id.slot()].remove_variable(key, solver),
            "variable {key:?} not owned by {id:?}"
        );
    }

    /// Returns a variable owned by a node.
    #[must_use]
    pub fn constraint_variable(&self, id: NodeId, key: VariableKey) -> Option<&ConstraintVariable> {
        self.validate(id);
        self.constraints[id.slot()].variable(key)
    }

    /// Returns the node's constraint registry.
    #[must_use]
    pub fn constraints(&self, id: NodeId) -> &ConstraintRegistry {
        self.validate(id);
        &self.constraints[id.slot()]
    }

    fn activate_constraints(&mut self, id: NodeId) -> HookResult {
        if !self.flags[id.slot()].is_mounted() {
            return Ok(());
        }
        let Some(solver) = self.solver.as_deref_mut() else {
            return Ok(());
        };
        self.constraints[id.slot()]
            .activate(solver)
            .map_err(|e| CascadeError::Solver {
                node: id,
                message: e.0,
            })
    }

    /// Copies solved values into the node's variables.
    pub(crate) fn refresh_constraints(&mut self, id: NodeId) {
        let slot = id.slot();
        let Some(solver) = self.solver.as_deref() else {
            return;
        };
        self.flags[slot].insert(NodeFlags::CONSTRAINING);
        self.constraints[slot].refresh(solver);
        self.flags[slot].remove(NodeFlags::CONSTRAINING);
    }

    // -- Rendering --

    /// Installs the renderer display passes draw with.
    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) {
        self.renderer = Some(Box::new(renderer));
    }

    /// Removes and returns the renderer.
    pub fn take_renderer(&mut self) -> Option<Box<dyn Renderer>> {
        self.renderer.take()
    }

    // -- Hit testing --

    /// Returns the deepest mounted node under `point`.
    ///
    /// Roots are tested last-created first and children last-to-first, so
    /// later siblings win. `point` is in root space; each level's frames are
    /// relative to their parent. Culled and hidden subtrees are skipped.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.roots()
            .into_iter()
            .rev()
            .find_map(|root| self.hit_test_node(root, point))
    }

    fn hit_test_node(&self, id: NodeId, point: Point) -> Option<NodeId> {
        let slot = id.slot();
        let flags = self.flags[slot];
        if !flags.is_mounted() || flags.is_invisible() {
            return None;
        }
        let frame = self.frame[slot];
        let hit = match &self.behavior[slot] {
            Some(node) => node.hit_test(point, frame),
            None => frame.contains(point),
        };
        if !hit {
            return None;
        }
        let local = point - frame.origin().to_vec2();
        let children = self.child_ids(id);
        children
            .into_iter()
            .rev()
            .find_map(|child| self.hit_test_node(child, local))
            .or(Some(id))
    }

    // -- Internal helpers --

    /// Builds the current handle for a live slot.
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId::new(idx, self.generation[idx as usize])
    }

    /// Panics if `id` is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.slot()] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.slot()]
            } else {
                u32::MAX
            }
        );
    }

    /// Removes `idx` from its parent's child list.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::constraint::Relation;
    use crate::constraint::testing::RecordingSolver;
    use crate::error::Phase;
    use crate::time::Duration;
    use crate::tree::Group;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every lifecycle hook as `"<name>:<hook>"`.
    struct Probe {
        name: &'static str,
        log: Log,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: log.clone(),
            }
        }

        fn push(&self, hook: &str) -> HookResult {
            self.log.borrow_mut().push(format!("{}:{hook}", self.name));
            Ok(())
        }
    }

    impl Node for Probe {
        fn will_mount(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.push("will_mount")
        }
        fn on_mount(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.push("on_mount")
        }
        fn did_mount(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.push("did_mount")
        }
        fn will_unmount(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.push("will_unmount")
        }
        fn did_unmount(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.push("did_unmount")
        }
        fn did_power(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.push("did_power")
        }
        fn did_unpower(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
            self.push("did_unpower")
        }
        fn on_cull(&mut self, cx: &mut NodeCx<'_>) -> HookResult {
            assert!(cx.flags().is_culled(), "flag set before on_cull");
            self.push("on_cull")
        }
    }

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn take(log: &Log) -> Vec<String> {
        core::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn create_and_destroy() {
        let mut tree = NodeTree::new();
        let id = tree.create_node(Group);
        assert!(tree.is_alive(id));
        tree.destroy_node(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = NodeTree::new();
        let old = tree.create_node(Group);
        tree.destroy_node(old);
        let new = tree.create_node(Group);
        assert_eq!(old.index(), new.index(), "slot is reused");
        assert_ne!(old.generation(), new.generation());
        assert!(!tree.is_alive(old));
        assert!(tree.is_alive(new));
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_flags() {
        let mut tree = NodeTree::new();
        let id = tree.create_node(Group);
        tree.destroy_node(id);
        let _ = tree.flags(id);
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut tree = NodeTree::new();
        let parent = tree.create_node(Group);
        let child = tree.create_node(Group);
        tree.append_child(parent, child).unwrap();
        tree.destroy_node(parent);
    }

    #[test]
    fn insert_before_and_query() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let a = tree.create_keyed_node("a", Group);
        let b = tree.create_keyed_node("b", Group);
        let c = tree.create_keyed_node("c", Group);
        tree.append_child(root, a).unwrap();
        tree.append_child(root, c).unwrap();
        tree.insert_child(root, b, Some(c)).unwrap();

        assert_eq!(tree.children(root).collect::<Vec<_>>(), [a, b, c]);
        assert_eq!(tree.child_by_key(root, "b"), Some(b));
        assert_eq!(tree.child_by_key(root, "z"), None);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.roots(), [root]);
        assert_eq!(tree.ancestors(b).collect::<Vec<_>>(), [b, root]);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_insert_panics() {
        let mut tree = NodeTree::new();
        let p = tree.create_node(Group);
        let q = tree.create_node(Group);
        let child = tree.create_node(Group);
        tree.append_child(p, child).unwrap();
        tree.append_child(q, child).unwrap();
    }

    #[test]
    #[should_panic(expected = "beneath itself")]
    fn cycles_are_rejected() {
        let mut tree = NodeTree::new();
        let a = tree.create_node(Group);
        let b = tree.create_node(Group);
        tree.append_child(a, b).unwrap();
        tree.append_child(b, a).unwrap();
    }

    #[test]
    #[should_panic(expected = "node is not a child of parent")]
    fn removing_a_non_child_panics() {
        let mut tree = NodeTree::new();
        let a = tree.create_node(Group);
        let b = tree.create_node(Group);
        tree.remove_child(a, b).unwrap();
    }

    #[test]
    fn mount_runs_hooks_parent_first_and_finishes_children_before_did() {
        let log = log();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Probe::new("root", &log));
        let child = tree.create_node(Probe::new("child", &log));
        tree.append_child(root, child).unwrap();

        tree.mount(root).unwrap();
        assert_eq!(
            take(&log),
            [
                "root:will_mount",
                "root:on_mount",
                "child:will_mount",
                "child:on_mount",
                "child:did_mount",
                "root:did_mount",
            ]
        );
        assert!(tree.flags(child).is_mounted());
        assert!(!tree.flags(root).is_traversing());
    }

    #[test]
    #[should_panic(expected = "node already mounted")]
    fn double_mount_panics() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        tree.mount(root).unwrap();
        tree.mount(root).unwrap();
    }

    #[test]
    #[should_panic(expected = "node not mounted")]
    fn unmount_of_unmounted_panics() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        tree.unmount(root).unwrap();
    }

    #[test]
    #[should_panic(expected = "node already powered")]
    fn double_power_panics() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        tree.power(root).unwrap();
    }

    #[test]
    #[should_panic(expected = "cannot power an unmounted node")]
    fn power_requires_mount() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        tree.power(root).unwrap();
    }

    #[test]
    #[should_panic(expected = "node already culled")]
    fn double_cull_panics() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        tree.cull(root).unwrap();
        tree.cull(root).unwrap();
    }

    #[test]
    #[should_panic(expected = "node not culled")]
    fn uncull_of_unculled_panics() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        tree.uncull(root).unwrap();
    }

    #[test]
    fn inserting_into_a_powered_parent_mounts_and_powers() {
        let log = log();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        tree.mount(root).unwrap();
        tree.power(root).unwrap();

        let child = tree.create_node(Probe::new("child", &log));
        tree.append_child(root, child).unwrap();
        let flags = tree.flags(child);
        assert!(flags.is_traversable());
        assert!(flags.contains(NodeFlags::NEEDS_RESIZE | NodeFlags::NEEDS_LAYOUT));
        assert!(
            tree.flags(root)
                .contains(NodeFlags::NEEDS_PROCESS | NodeFlags::NEEDS_DISPLAY)
        );
        assert_eq!(
            take(&log),
            [
                "child:will_mount",
                "child:on_mount",
                "child:did_mount",
                "child:did_power"
            ]
        );
    }

    #[test]
    fn removing_a_mounted_child_unpowers_then_unmounts() {
        let log = log();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let child = tree.create_node(Probe::new("child", &log));
        tree.append_child(root, child).unwrap();
        tree.mount(root).unwrap();
        tree.power(root).unwrap();
        take(&log);

        tree.remove_from_parent(child).unwrap();
        assert_eq!(
            take(&log),
            ["child:did_unpower", "child:will_unmount", "child:did_unmount"]
        );
        assert_eq!(tree.parent(child), None);
        let flags = tree.flags(child);
        assert!(!flags.is_mounted() && !flags.is_powered());
    }

    #[test]
    fn removal_is_deferred_while_the_parent_traverses() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let child = tree.create_node(Group);
        tree.append_child(root, child).unwrap();

        tree.flags[root.slot()].insert(NodeFlags::TRAVERSING);
        tree.remove_child(root, child).unwrap();
        assert!(tree.flags(child).is_removing());
        assert_eq!(tree.parent(child), Some(root), "still linked");

        tree.flags[root.slot()].remove(NodeFlags::TRAVERSING);
        tree.sweep_removing(root).unwrap();
        assert_eq!(tree.parent(child), None);
        assert!(!tree.flags(child).is_removing());
    }

    #[test]
    fn require_update_propagates_aggregates_to_every_ancestor() {
        let mut tree = NodeTree::new();
        let a = tree.create_node(Group);
        let b = tree.create_node(Group);
        let c = tree.create_node(Group);
        tree.append_child(a, b).unwrap();
        tree.append_child(b, c).unwrap();

        tree.require_update(c, NodeFlags::NEEDS_CHANGE | NodeFlags::MOUNTED);
        assert!(tree.flags(c).contains(NodeFlags::NEEDS_CHANGE));
        assert!(!tree.flags(c).is_mounted(), "lifecycle bits are ignored");
        for id in [a, b] {
            let flags = tree.flags(id);
            assert!(flags.contains(NodeFlags::NEEDS_PROCESS));
            assert!(!flags.intersects(NodeFlags::PROCESS_MASK));
            assert!(!flags.contains(NodeFlags::NEEDS_DISPLAY));
        }

        tree.require_update(c, NodeFlags::NEEDS_RENDER);
        assert!(tree.flags(a).contains(NodeFlags::NEEDS_DISPLAY));
    }

    #[test]
    fn uncull_requests_a_render() {
        let log = log();
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let node = tree.create_node(Probe::new("n", &log));
        tree.append_child(root, node).unwrap();
        tree.cull(node).unwrap();
        assert_eq!(take(&log), ["n:on_cull"]);
        assert!(tree.is_effectively_invisible(node));

        tree.uncull(node).unwrap();
        assert!(tree.flags(node).needs_render());
        assert!(tree.flags(root).contains(NodeFlags::NEEDS_DISPLAY));
        assert!(!tree.flags(node).is_traversing());
    }

    #[test]
    fn set_hidden_is_idempotent() {
        let mut tree = NodeTree::new();
        let node = tree.create_node(Group);
        tree.set_hidden(node, false);
        assert!(tree.flags(node).is_empty());
        tree.set_hidden(node, true);
        tree.set_hidden(node, true);
        assert!(tree.flags(node).is_hidden());
        tree.set_hidden(node, false);
        assert!(tree.flags(node).needs_render());
    }

    #[test]
    fn hook_errors_release_traversing_and_name_the_node() {
        struct Failing;
        impl Node for Failing {
            fn on_mount(&mut self, _cx: &mut NodeCx<'_>) -> HookResult {
                Err(CascadeError::hook(Phase::Mount, "backing element missing"))
            }
        }

        let mut tree = NodeTree::new();
        let id = tree.create_node(Failing);
        let err = tree.mount(id).unwrap_err();
        assert_eq!(err.node(), Some(id));
        assert!(!tree.flags(id).intersects(NodeFlags::TRANSIENT_MASK));
        assert!(tree.node::<Failing>(id).is_some(), "behaviour restored");
    }

    #[test]
    fn hit_test_finds_the_deepest_visible_node() {
        let mut tree = NodeTree::new();
        let root = tree.create_node(Group);
        let panel = tree.create_node(Group);
        let button = tree.create_node(Group);
        tree.append_child(root, panel).unwrap();
        tree.append_child(panel, button).unwrap();
        tree.set_frame(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_frame(panel, Rect::new(10.0, 10.0, 60.0, 60.0));
        tree.set_frame(button, Rect::new(5.0, 5.0, 15.0, 15.0));

        assert_eq!(tree.hit_test(Point::new(20.0, 20.0)), None, "unmounted");
        tree.mount(root).unwrap();
        assert_eq!(tree.hit_test(Point::new(20.0, 20.0)), Some(button));
        assert_eq!(tree.hit_test(Point::new(40.0, 40.0)), Some(panel));
        assert_eq!(tree.hit_test(Point::new(90.0, 90.0)), Some(root));
        assert_eq!(tree.hit_test(Point::new(200.0, 0.0)), None);

        tree.cull(panel).unwrap();
        assert_eq!(tree.hit_test(Point::new(20.0, 20.0)), Some(root));
    }

    #[test]
    fn constraints_activate_on_mount_and_deactivate_on_unmount() {
        let mut tree = NodeTree::new();
        tree.set_solver(RecordingSolver::default());
        let root = tree.create_node(Group);
        let width = tree.add_constraint_variable(root, "width", 0.0).unwrap();
        let con = tree
            .add_constraint(
                root,
                Constraint::new(vec![(width, 1.0)], -100.0, Relation::Eq),
            )
            .unwrap();
        assert!(!tree.constraints(root).is_constraint_active(con), "pending");

        tree.mount(root).unwrap();
        assert!(tree.constraints(root).is_constraint_active(con));
        tree.unmount(root).unwrap();
        assert!(!tree.constraints(root).is_constraint_active(con));
        assert!(tree.take_solver().is_some());
        assert!(tree.solver().is_none());
    }

    #[test]
    #[should_panic(expected = "not owned by")]
    fn removing_a_foreign_constraint_panics() {
        let mut tree = NodeTree::new();
        let a = tree.create_node(Group);
        let b = tree.create_node(Group);
        let key = tree
            .add_constraint(a, Constraint::new(Vec::new(), 0.0, Relation::Le))
            .unwrap();
        tree.remove_constraint(b, key);
    }

    #[test]
    fn animators_follow_the_node_lifecycle() {
        struct Fader;
        impl Node for Fader {
            fn register(&mut self, animators: &mut AnimatorRegistry) {
                animators.register("opacity", Tween::new(Some(1.0_f64)));
            }
        }

        let mut tree = NodeTree::new();
        let id = tree.create_node(Fader);
        assert!(!tree.animators(id).unwrap().is_mounted());
        tree.mount(id).unwrap();
        assert!(tree.animators(id).unwrap().is_mounted());

        let fade = Transition::new(Duration(100), crate::animator::Ease::Linear);
        assert!(tree.animate(id, "opacity", Some(0.0_f64), Some(fade)));
        assert!(!tree.animate(id, "opacity", Some(0.0_f32), None), "wrong type");
        assert!(tree.flags(id).needs_animate());

        tree.update_animators(id, HostTime(0));
        tree.update_animators(id, HostTime(50));
        let opacity = tree.animator::<Tween<f64>>(id, "opacity").unwrap();
        assert_eq!(opacity.value(), Some(0.5));
        assert!(tree.flags(id).needs_render());
        assert!(!tree.flags(id).contains(NodeFlags::ANIMATING));

        tree.unmount(id).unwrap();
        assert!(!tree.animators(id).unwrap().is_mounted());
    }
}
