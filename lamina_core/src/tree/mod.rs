// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree data model and cascades.
//!
//! A *node* is an element of a retained scene graph. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed, so use-after-free is caught at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - Behaviour: a boxed [`Node`] whose `will*` / `on*` / `did*` hooks run as
//!   the node moves through its lifecycle and through update passes.
//! - State: a [`NodeFlags`](crate::flags::NodeFlags) word, an optional
//!   reconciliation key, a frame, and the node's animators and constraints.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Lifecycle
//!
//! Four independent axes, each guarded against repeated transitions:
//!
//! - **Mount** cascades into children and brings animators and constraints
//!   online.
//! - **Power** cascades into mounted children and requests a render and
//!   composite.
//! - **Cull** is node-local and removes the subtree from display and hit
//!   testing without affecting process passes.
//! - **Process / display** passes ([`NodeTree::cascade_process`],
//!   [`NodeTree::cascade_display`]) visit mounted, powered nodes that have
//!   work, in strict pre-order / post-order.
//!
//! Structural edits made from inside a hook go through [`NodeCx`]; removing
//! a child of a node that is mid-cascade only marks it
//! [`REMOVING`](crate::flags::NodeFlags::REMOVING), and the detach happens
//! at the parent's next safe point.

mod cascade;
mod cx;
mod id;
mod node;
mod store;
mod traverse;

pub use cx::NodeCx;
pub use id::NodeId;
pub use node::{Group, Node};
pub use store::NodeTree;
pub use traverse::{Ancestors, Children};
