// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::NodeTree;

/// An iterator over the direct children of a node, first to last.
///
/// Created by [`NodeTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a NodeTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a NodeTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

/// An iterator over a node and its ancestors, nearest first.
///
/// Created by [`NodeTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a NodeTree,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(tree: &'a NodeTree, start: u32) -> Self {
        Self {
            tree,
            current: start,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.parent[idx as usize];
        Some(self.tree.id_at(idx))
    }
}
