// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer contract for drawing backends.
//!
//! Lamina does not draw. The display pass calls an injected [`Renderer`]
//! from each node's render and composite steps, after the node's own
//! `on_render` / `on_composite` hook has run. Raster and GPU backends both
//! implement this trait, and swapping one for the other does not change
//! what the scheduler does.
//!
//! # Display step pseudocode
//!
//! ```rust,ignore
//! // inside the display cascade, for a node whose NEEDS_RENDER was requested
//! node.on_render(&mut cx)?;
//! if let Some(renderer) = renderer.as_deref_mut() {
//!     renderer.render(&tree, id);
//! }
//! ```
//!
//! The renderer only sees `&NodeTree`, so it can read frames, keys, and
//! animator values but cannot touch flags or structure.

use crate::tree::{NodeId, NodeTree};

/// Draws nodes into a backend surface.
pub trait Renderer {
    /// Draws `node`'s own content.
    fn render(&mut self, tree: &NodeTree, node: NodeId);

    /// Composites `node`'s rendered content. Defaults to nothing.
    fn composite(&mut self, tree: &NodeTree, node: NodeId) {
        _ = (tree, node);
    }
}
